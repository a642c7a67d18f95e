//! Purpose: Translate between logical stream offsets and (record, byte) positions.
//! Exports: `total_stream_size`, `cumulative_offset_of`, `command_position`, `StreamPosition`.
//! Role: Pure read-side addressing over `RingStore`; callers hold the device lock.
//! Invariants: No side effects; output depends only on the ring's live records.
use crate::core::error::{Error, ErrorKind};
use crate::core::ring::RingStore;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StreamPosition {
    pub record_index: usize,
    pub offset_in_record: usize,
}

/// Sum of the sizes of every live record.
pub fn total_stream_size(ring: &RingStore) -> usize {
    ring.iter().map(|record| record.len()).sum()
}

/// Stream offset at which the `record_index`-th live record starts.
pub fn cumulative_offset_of(ring: &RingStore, record_index: usize) -> usize {
    (0..record_index.min(ring.live_count()))
        .filter_map(|index| ring.nth_live_entry(index))
        .map(|record| record.len())
        .sum()
}

/// Resolves a command-seek pair into a stream offset.
pub fn command_position(
    ring: &RingStore,
    record_index: usize,
    offset_in_record: usize,
) -> Result<usize, Error> {
    if record_index >= ring.live_count() {
        return Err(Error::new(ErrorKind::InvalidArgument)
            .with_message("command index out of range")
            .with_index(record_index as u64));
    }
    let record = ring.nth_live_entry(record_index).ok_or_else(|| {
        Error::new(ErrorKind::InvalidArgument)
            .with_message("command slot is empty")
            .with_index(record_index as u64)
    })?;
    if offset_in_record >= record.len() {
        return Err(Error::new(ErrorKind::InvalidArgument)
            .with_message("offset past end of command")
            .with_index(record_index as u64)
            .with_offset(offset_in_record as u64));
    }
    Ok(cumulative_offset_of(ring, record_index) + offset_in_record)
}

/// Inverse of `command_position` for offsets inside the stream.
pub fn locate(ring: &RingStore, offset: usize) -> Option<StreamPosition> {
    let mut running = 0usize;
    for record_index in 0..ring.live_count() {
        let Some(record) = ring.nth_live_entry(record_index) else {
            continue;
        };
        if offset < running + record.len() {
            return Some(StreamPosition {
                record_index,
                offset_in_record: offset - running,
            });
        }
        running += record.len();
    }
    None
}
