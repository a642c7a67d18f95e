// Committed command records and the terminator that closes them.
use std::fmt;

use bstr::ByteSlice;

/// Byte that completes a pending write into a record.
pub const TERMINATOR: u8 = b'\n';

/// One committed command. Immutable once built; owned by whoever holds it.
#[derive(Clone, Eq, PartialEq)]
pub struct Record {
    bytes: Vec<u8>,
}

impl Record {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_terminated(&self) -> bool {
        self.bytes.last() == Some(&TERMINATOR)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for Record {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for Record {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for Record {
    fn from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record(\"{}\")", self.bytes.escape_bytes())
    }
}
