//! Purpose: Accumulate partial writes until a terminator completes a record.
//! Exports: `WriteAccumulator`, `AppendOutcome`.
//! Role: Owns the single pending write buffer of a device; hands completed records out.
//! Invariants: A record completes only when the buffer's final byte is the terminator.
//! Invariants: Every copied byte of a call is consumed, even bytes past an inner terminator.
//! Invariants: On failure (allocation or transfer fault) the pending buffer is unchanged.
use crate::core::error::{Error, ErrorKind};
use crate::core::record::{Record, TERMINATOR};
use crate::core::transfer::ByteSource;

#[derive(Debug, Default, Eq, PartialEq)]
pub struct AppendOutcome {
    pub consumed: usize,
    pub completed: Option<Record>,
}

#[derive(Debug, Default)]
pub struct WriteAccumulator {
    pending: Vec<u8>,
}

impl WriteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<AppendOutcome, Error> {
        let mut source = bytes;
        self.append_from(&mut source)
    }

    /// Copies everything `source` offers onto the pending buffer. A short copy
    /// is accepted and reported through `consumed`.
    pub fn append_from<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<AppendOutcome, Error> {
        let count = source.remaining();
        if count == 0 {
            return Ok(AppendOutcome::default());
        }

        self.pending.try_reserve(count).map_err(|err| {
            Error::new(ErrorKind::OutOfMemory)
                .with_message("pending write buffer growth failed")
                .with_source(err)
        })?;

        let start = self.pending.len();
        self.pending.resize(start + count, 0);
        let copied = match source.read_into(&mut self.pending[start..]) {
            Ok(copied) => copied.min(count),
            Err(err) => {
                self.pending.truncate(start);
                return Err(err);
            }
        };
        self.pending.truncate(start + copied);

        let completed = if copied > 0 && self.pending.last() == Some(&TERMINATOR) {
            Some(Record::new(std::mem::take(&mut self.pending)))
        } else {
            None
        };

        Ok(AppendOutcome {
            consumed: copied,
            completed,
        })
    }

    /// Drops any partial record, returning how many bytes were discarded.
    pub fn discard(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending = Vec::new();
        discarded
    }
}
