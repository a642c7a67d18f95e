//! Purpose: Byte transfer seams between caller memory and device buffers.
//! Exports: `ByteSource`, `ByteSink`.
//! Role: Stand-ins for user-space copy primitives; may copy short or fault.
//! Invariants: A short copy reports the count actually moved; a fault is `TransferFault`.
//! Invariants: On error, implementations must not report any bytes as moved.
use crate::core::error::{Error, ErrorKind};

/// Caller-owned bytes flowing into the device (the write side).
pub trait ByteSource {
    /// Bytes the caller asked to transfer.
    fn remaining(&self) -> usize;

    /// Copies up to `dst.len()` bytes into `dst`, returning how many were copied.
    fn read_into(&mut self, dst: &mut [u8]) -> Result<usize, Error>;
}

/// Caller-owned memory receiving device bytes (the read side).
pub trait ByteSink {
    /// Copies a prefix of `src` out, returning how many bytes were copied.
    fn write_from(&mut self, src: &[u8]) -> Result<usize, Error>;
}

impl ByteSource for &[u8] {
    fn remaining(&self) -> usize {
        self.len()
    }

    fn read_into(&mut self, dst: &mut [u8]) -> Result<usize, Error> {
        let count = dst.len().min(self.len());
        let (head, tail) = self.split_at(count);
        dst[..count].copy_from_slice(head);
        *self = tail;
        Ok(count)
    }
}

impl ByteSink for &mut [u8] {
    fn write_from(&mut self, src: &[u8]) -> Result<usize, Error> {
        let count = src.len().min(self.len());
        let (head, tail) = std::mem::take(self).split_at_mut(count);
        head.copy_from_slice(&src[..count]);
        *self = tail;
        Ok(count)
    }
}

impl ByteSink for Vec<u8> {
    fn write_from(&mut self, src: &[u8]) -> Result<usize, Error> {
        self.try_reserve(src.len()).map_err(|err| {
            Error::new(ErrorKind::OutOfMemory)
                .with_message("read buffer growth failed")
                .with_source(err)
        })?;
        self.extend_from_slice(src);
        Ok(src.len())
    }
}
