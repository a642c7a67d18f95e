//! Purpose: Device session layer serializing reads, writes, and seeks over one record log.
//! Exports: `Device`, `Cursor`, `SeekMode`, `DeviceStats`, `Teardown`.
//! Role: Orchestrates `WriteAccumulator`, `RingStore`, and `offsets` under a single lock.
//! Invariants: Every operation holds the device lock for its whole duration; no partial release.
//! Invariants: Evicted records are released while the lock is still held.
//! Invariants: Nothing blocks waiting for data; an exhausted stream reads zero bytes.
//! Invariants: A failed operation leaves the caller's cursor untouched.
use std::io::SeekFrom;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, trace};

use crate::core::accumulator::WriteAccumulator;
use crate::core::config::DeviceConfig;
use crate::core::error::{Error, ErrorKind};
use crate::core::offsets::{self, StreamPosition};
use crate::core::record::Record;
use crate::core::ring::RingStore;
use crate::core::seekto::{self, DeviceCommand, SEEKTO_LEN, SeekTo};
use crate::core::transfer::{ByteSink, ByteSource};

/// Per-handle byte position in the logical stream. Not shared between handles.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Cursor {
    position: u64,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(position: u64) -> Self {
        Self { position }
    }

    pub fn position(&self) -> u64 {
        self.position
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeekMode {
    Absolute,
    Relative,
    FromEnd,
}

impl SeekMode {
    /// Decodes a raw `whence` value (`SEEK_SET`, `SEEK_CUR`, `SEEK_END`).
    pub fn from_raw(whence: i32) -> Result<Self, Error> {
        match whence {
            libc::SEEK_SET => Ok(SeekMode::Absolute),
            libc::SEEK_CUR => Ok(SeekMode::Relative),
            libc::SEEK_END => Ok(SeekMode::FromEnd),
            _ => Err(Error::new(ErrorKind::InvalidArgument)
                .with_message(format!("unsupported seek mode {whence}"))),
        }
    }

    pub fn from_seek_from(pos: SeekFrom) -> Result<(Self, i64), Error> {
        match pos {
            SeekFrom::Start(offset) => {
                let offset = i64::try_from(offset).map_err(|_| {
                    Error::new(ErrorKind::InvalidArgument)
                        .with_message("seek offset too large")
                        .with_offset(offset)
                })?;
                Ok((SeekMode::Absolute, offset))
            }
            SeekFrom::Current(offset) => Ok((SeekMode::Relative, offset)),
            SeekFrom::End(offset) => Ok((SeekMode::FromEnd, offset)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct DeviceStats {
    pub capacity: usize,
    pub live_records: usize,
    pub stream_len: usize,
    pub pending_len: usize,
}

/// What a shutdown released.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Teardown {
    pub released_records: usize,
    pub released_bytes: usize,
    pub discarded_pending: usize,
}

#[derive(Debug)]
struct DeviceState {
    ring: RingStore,
    pending: WriteAccumulator,
}

#[derive(Debug)]
pub struct Device {
    state: Mutex<DeviceState>,
}

impl Device {
    pub fn new(capacity: usize) -> Result<Self, Error> {
        let ring = RingStore::new(capacity)?;
        Ok(Self {
            state: Mutex::new(DeviceState {
                ring,
                pending: WriteAccumulator::new(),
            }),
        })
    }

    pub fn with_config(config: &DeviceConfig) -> Result<Self, Error> {
        config.validate()?;
        Self::new(config.capacity)
    }

    fn lock(&self) -> Result<MutexGuard<'_, DeviceState>, Error> {
        self.state.lock().map_err(|_| {
            Error::new(ErrorKind::Internal).with_message("device lock poisoned")
        })
    }

    /// Copies at most `count` bytes starting at the cursor, never crossing a
    /// record boundary, and advances the cursor by what the sink accepted.
    pub fn read<S: ByteSink + ?Sized>(
        &self,
        cursor: &mut Cursor,
        count: usize,
        sink: &mut S,
    ) -> Result<usize, Error> {
        let state = self.lock()?;
        let Ok(offset) = usize::try_from(cursor.position) else {
            return Ok(0);
        };
        let Some((record, within)) = state.ring.find_entry_for_offset(offset) else {
            return Ok(0);
        };

        let available = &record.as_bytes()[within..];
        let chunk = &available[..count.min(available.len())];
        let copied = sink.write_from(chunk)?.min(chunk.len());
        cursor.position += copied as u64;
        trace!(offset, copied, "read");
        Ok(copied)
    }

    pub fn read_vec(&self, cursor: &mut Cursor, count: usize) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.read(cursor, count, &mut out)?;
        Ok(out)
    }

    /// Feeds the source into the pending buffer, committing a record when the
    /// buffer ends in the terminator. Returns the bytes consumed.
    pub fn write<S: ByteSource + ?Sized>(&self, source: &mut S) -> Result<usize, Error> {
        let mut state = self.lock()?;
        let outcome = state.pending.append_from(source)?;
        if let Some(record) = outcome.completed {
            debug_assert!(record.is_terminated());
            let len = record.len();
            if let Some(evicted) = state.ring.add_entry(record) {
                debug!(evicted_len = evicted.len(), "evicted oldest record");
                drop(evicted);
            }
            debug!(len, live = state.ring.live_count(), "committed record");
        }
        Ok(outcome.consumed)
    }

    pub fn write_bytes(&self, bytes: &[u8]) -> Result<usize, Error> {
        let mut source = bytes;
        self.write(&mut source)
    }

    /// Moves the cursor; the target must lie in `[0, stream_len]`.
    pub fn seek(&self, cursor: &mut Cursor, mode: SeekMode, offset: i64) -> Result<u64, Error> {
        let state = self.lock()?;
        let total = offsets::total_stream_size(&state.ring) as i128;
        let base = match mode {
            SeekMode::Absolute => 0,
            SeekMode::Relative => i128::from(cursor.position),
            SeekMode::FromEnd => total,
        };
        let target = base + i128::from(offset);
        if target < 0 || target > total {
            return Err(Error::new(ErrorKind::InvalidArgument)
                .with_message("seek target outside stream")
                .with_offset(target));
        }
        cursor.position = target as u64;
        debug!(?mode, offset, position = cursor.position, "seek");
        Ok(cursor.position)
    }

    /// Positions the cursor at byte `byte_offset` of live command `command_index`.
    pub fn seek_to_command(&self, cursor: &mut Cursor, request: SeekTo) -> Result<u64, Error> {
        let state = self.lock()?;
        let position = offsets::command_position(
            &state.ring,
            request.command_index as usize,
            request.byte_offset as usize,
        )?;
        cursor.position = position as u64;
        debug!(
            command = request.command_index,
            offset = request.byte_offset,
            position,
            "seek to command"
        );
        Ok(cursor.position)
    }

    /// Control-command entry point: decodes `cmd`, copies the request out of
    /// `arg`, then runs it.
    pub fn ioctl<S: ByteSource + ?Sized>(
        &self,
        cursor: &mut Cursor,
        cmd: u32,
        arg: &mut S,
    ) -> Result<u64, Error> {
        match seekto::decode_command(cmd)? {
            DeviceCommand::SeekTo => {
                let mut buf = [0u8; SEEKTO_LEN];
                let copied = arg.read_into(&mut buf)?;
                let request = SeekTo::decode(&buf[..copied.min(SEEKTO_LEN)])?;
                self.seek_to_command(cursor, request)
            }
        }
    }

    pub fn stats(&self) -> Result<DeviceStats, Error> {
        let state = self.lock()?;
        Ok(DeviceStats {
            capacity: state.ring.capacity(),
            live_records: state.ring.live_count(),
            stream_len: offsets::total_stream_size(&state.ring),
            pending_len: state.pending.pending_len(),
        })
    }

    /// Record index and in-record offset the cursor currently points at.
    pub fn locate(&self, cursor: &Cursor) -> Result<Option<StreamPosition>, Error> {
        let state = self.lock()?;
        let Ok(offset) = usize::try_from(cursor.position) else {
            return Ok(None);
        };
        Ok(offsets::locate(&state.ring, offset))
    }

    /// Copy of the live records, oldest first.
    pub fn records(&self) -> Result<Vec<Record>, Error> {
        let state = self.lock()?;
        Ok(state.ring.iter().cloned().collect())
    }

    /// Releases every live record and discards any partial write.
    pub fn shutdown(&self) -> Result<Teardown, Error> {
        let mut state = self.lock()?;
        let released = state.ring.init();
        let teardown = Teardown {
            released_records: released.len(),
            released_bytes: released.iter().map(Record::len).sum(),
            discarded_pending: state.pending.discard(),
        };
        drop(released);
        debug!(
            records = teardown.released_records,
            bytes = teardown.released_bytes,
            pending = teardown.discarded_pending,
            "device shut down"
        );
        Ok(teardown)
    }
}
