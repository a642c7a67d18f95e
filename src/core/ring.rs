//! Purpose: Fixed-capacity ring of committed records with overwrite-oldest eviction.
//! Exports: `RingStore`, `DEFAULT_CAPACITY`.
//! Role: Pure slot/index bookkeeping; no locking and no allocation policy of its own.
//! Invariants: `head`, `tail` < capacity; live count is capacity when `full`, else `(head - tail) mod capacity`.
//! Invariants: `full` is true iff `head == tail` after the most recent insertion.
//! Invariants: Empty or zero-length slots are skipped during traversal, never read as live.
use crate::core::error::{Error, ErrorKind};
use crate::core::record::Record;

pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug)]
pub struct RingStore {
    slots: Box<[Option<Record>]>,
    head: usize,
    tail: usize,
    full: bool,
}

impl RingStore {
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::new(ErrorKind::InvalidArgument)
                .with_message("ring capacity must be at least one record"));
        }
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).map_err(|err| {
            Error::new(ErrorKind::OutOfMemory)
                .with_message(format!("cannot allocate {capacity} ring slots"))
                .with_source(err)
        })?;
        slots.resize_with(capacity, || None);
        Ok(Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            tail: 0,
            full: false,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Inserts `record` at `head`. When the ring was full, the oldest record is
    /// detached and handed back; the caller owns its release.
    #[must_use = "an evicted record must be released by the caller"]
    pub fn add_entry(&mut self, record: Record) -> Option<Record> {
        let capacity = self.capacity();
        let evicted = if self.full {
            self.tail = (self.tail + 1) % capacity;
            self.slots[self.head].take()
        } else {
            None
        };

        self.slots[self.head] = Some(record);
        self.head = (self.head + 1) % capacity;
        self.full = self.head == self.tail;
        evicted
    }

    pub fn live_count(&self) -> usize {
        if self.full {
            self.capacity()
        } else {
            (self.head + self.capacity() - self.tail) % self.capacity()
        }
    }

    /// The `index`-th live record in chronological order.
    pub fn nth_live_entry(&self, index: usize) -> Option<&Record> {
        if index >= self.live_count() {
            return None;
        }
        let slot = (self.tail + index) % self.capacity();
        live_slot(&self.slots[slot])
    }

    /// Locates the record holding byte `offset` of the logical stream, and the
    /// byte offset within that record. `None` at or past the end of the stream.
    pub fn find_entry_for_offset(&self, offset: usize) -> Option<(&Record, usize)> {
        let mut running = 0usize;
        for record in self.iter() {
            if offset < running + record.len() {
                return Some((record, offset - running));
            }
            running += record.len();
        }
        None
    }

    /// Live records oldest first, skipping any slot that is unexpectedly empty.
    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        (0..self.live_count()).filter_map(move |index| self.nth_live_entry(index))
    }

    /// Resets to zero live records and hands the prior contents, oldest first,
    /// back to the caller.
    #[must_use = "prior records must be released by the caller"]
    pub fn init(&mut self) -> Vec<Record> {
        let count = self.live_count();
        let capacity = self.capacity();
        let mut released = Vec::with_capacity(count);
        for index in 0..count {
            let slot = (self.tail + index) % capacity;
            if let Some(record) = self.slots[slot].take() {
                released.push(record);
            }
        }
        for slot in self.slots.iter_mut() {
            if let Some(record) = slot.take() {
                released.push(record);
            }
        }
        self.head = 0;
        self.tail = 0;
        self.full = false;
        released
    }
}

fn live_slot(slot: &Option<Record>) -> Option<&Record> {
    slot.as_ref().filter(|record| !record.is_empty())
}
