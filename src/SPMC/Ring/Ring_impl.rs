use std::ptr;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam_utils::Backoff;
use tracing::trace;

use super::layout::{
    align_up, SegmentHeader, FRAME_PREFIX, MANDATORY_GAP, QUEUE_MAGIC, QUEUE_VERSION,
};
use super::Ring::Segment;
use crate::error::{MismatchReason, QueueError, Result};

/// Point-in-time copy of both cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursors {
    pub read: usize,
    pub write: usize,
}

impl Segment {
    /// Write magic, version and capacity into a freshly mapped region and
    /// zero both cursors. This should ONLY be called by the creator process,
    /// while it holds the store's exclusive lock.
    ///
    /// # Safety
    /// `base` must point to a writable mapping of at least
    /// `mapped_len(capacity)` bytes.
    pub unsafe fn stamp(base: *mut u8, capacity: u32) -> Self {
        let header = base as *mut SegmentHeader;
        ptr::addr_of_mut!((*header).magic).write(QUEUE_MAGIC);
        ptr::addr_of_mut!((*header).version).write(QUEUE_VERSION);
        ptr::addr_of_mut!((*header).capacity).write(capacity);

        let header = &*header;
        header.read_cursor.store(0, Release);
        header.read_timestamp.store(0, Relaxed);
        header.write_timestamp.store(0, Relaxed);
        header.write_cursor.store(0, Release);

        Self::new(base)
    }

    /// Check that an existing region was stamped with this format and with
    /// the capacity the attacher computed on its own.
    ///
    /// # Safety
    /// `base` must point to a readable mapping of at least the header size.
    pub unsafe fn validate(base: *const u8, expected_capacity: u32) -> Result<(), MismatchReason> {
        let header = &*(base as *const SegmentHeader);
        if header.magic != QUEUE_MAGIC {
            return Err(MismatchReason::BadMagic(header.magic));
        }
        if header.version != QUEUE_VERSION {
            return Err(MismatchReason::Version {
                expected: QUEUE_VERSION,
                found: header.version,
            });
        }
        if header.capacity != expected_capacity {
            return Err(MismatchReason::Capacity {
                expected: expected_capacity,
                found: header.capacity,
            });
        }
        Ok(())
    }

    /// Frame `payload` and publish it. Returns the payload length on success
    /// and 0 when the frame does not fit (or `payload` is empty).
    ///
    /// Single producer only. The CAS serializes the cursor publication, not
    /// the byte copies: two concurrent pushes can both pass the space check
    /// against the same cursor and overwrite each other's bytes.
    pub fn push(&self, payload: &[u8]) -> usize {
        if payload.is_empty() {
            return 0;
        }

        let header = self.header();
        let capacity = self.capacity;
        let mask = capacity - 1;
        let backoff = Backoff::new();

        loop {
            let write_raw = header.write_cursor.load(Acquire);
            let read_raw = header.read_cursor.load(Acquire);
            let write = write_raw as usize & mask;
            let read = read_raw as usize & mask;
            debug_assert!(write % 4 == 0 && read % 4 == 0, "cursor lost alignment");

            let free = capacity - (capacity - read + write) % capacity;
            if free < FRAME_PREFIX + payload.len() + MANDATORY_GAP {
                return 0;
            }

            // free <= capacity, so the length fits in the u32 prefix.
            self.write_at(write, &(payload.len() as u32).to_ne_bytes());
            self.write_at(write + FRAME_PREFIX, payload);
            let next = align_up((write + FRAME_PREFIX + payload.len()) % capacity) % capacity;

            match header
                .write_cursor
                .compare_exchange(write_raw, next as u32, AcqRel, Acquire)
            {
                Ok(_) => {
                    header.write_timestamp.store(unix_seconds(), Relaxed);
                    return payload.len();
                }
                Err(current) => {
                    trace!(expected = write_raw, current, "write cursor moved, retrying");
                    backoff.spin();
                }
            }
        }
    }

    /// Take the frame at the read cursor.
    ///
    /// `take` copies the payload out, given the logical offset of its first
    /// byte and its length. Its result is only kept if this consumer then
    /// wins the CAS on `read_cursor`; otherwise the whole pass is repeated.
    /// Errors from `take` are returned as-is when the cursor has not moved
    /// (the frame really is the next one), without consuming it.
    ///
    /// Returns `Ok(None)` when the queue is empty.
    pub fn pop_with<T>(
        &self,
        mut take: impl FnMut(&Segment, usize, usize) -> Result<T>,
    ) -> Result<Option<T>> {
        let header = self.header();
        let capacity = self.capacity;
        let mask = capacity - 1;
        let backoff = Backoff::new();

        loop {
            let read_raw = header.read_cursor.load(Acquire);
            let write_raw = header.write_cursor.load(Acquire);
            // C writers may leave a cursor equal to `capacity` instead of 0.
            let read = read_raw as usize & mask;
            let write = write_raw as usize & mask;
            if read == write {
                return Ok(None);
            }
            let occupied = (capacity - read + write) % capacity;
            let len = self.read_prefix(read) as usize;

            let taken = if FRAME_PREFIX + len > occupied {
                Err(QueueError::CorruptFrame {
                    offset: read,
                    len,
                    occupied,
                })
            } else {
                take(self, read + FRAME_PREFIX, len)
            };

            let value = match taken {
                Ok(value) => value,
                Err(err) => {
                    // A consumer that lost the race may have read a recycled
                    // prefix; only a still-current frame is reported.
                    if header.read_cursor.load(Acquire) != read_raw {
                        backoff.spin();
                        continue;
                    }
                    return Err(err);
                }
            };

            let next = align_up((read + FRAME_PREFIX + len) % capacity) % capacity;
            match header
                .read_cursor
                .compare_exchange(read_raw, next as u32, AcqRel, Acquire)
            {
                Ok(_) => {
                    header.read_timestamp.store(unix_seconds(), Relaxed);
                    return Ok(Some(value));
                }
                Err(current) => {
                    trace!(expected = read_raw, current, "read cursor moved, retrying");
                    backoff.spin();
                }
            }
        }
    }

    /// Pop the next frame into a freshly allocated vector.
    pub fn pop(&self) -> Result<Option<Vec<u8>>> {
        self.pop_with(|segment, offset, len| {
            let mut payload = vec![0u8; len];
            segment.read_at(offset, &mut payload);
            Ok(payload)
        })
    }

    /// Pop the next frame into `dest`, returning its length (0 when empty).
    /// A frame longer than `dest` is left in place.
    pub fn pop_into(&self, dest: &mut [u8]) -> Result<usize> {
        let popped = self.pop_with(|segment, offset, len| {
            if len > dest.len() {
                return Err(QueueError::DestinationTooSmall {
                    needed: len,
                    available: dest.len(),
                });
            }
            segment.read_at(offset, &mut dest[..len]);
            Ok(len)
        })?;
        Ok(popped.unwrap_or(0))
    }

    /// One acquire-load pair of the cursors. Not linearizable with
    /// concurrent pushes or pops.
    #[inline]
    pub fn cursors(&self) -> Cursors {
        let header = self.header();
        let mask = self.capacity - 1;
        Cursors {
            write: header.write_cursor.load(Acquire) as usize & mask,
            read: header.read_cursor.load(Acquire) as usize & mask,
        }
    }

    /// Framed bytes currently resident, padding included.
    pub fn occupied(&self) -> usize {
        let Cursors { read, write } = self.cursors();
        (self.capacity - read + write) % self.capacity
    }

    /// Buffer length minus the mandatory gap.
    pub fn usable_capacity(&self) -> usize {
        self.capacity - MANDATORY_GAP
    }

    /// Bytes still available for frames (prefix plus payload). A push of
    /// `n` bytes succeeds iff `n + 4 <= free()`.
    pub fn free(&self) -> usize {
        self.usable_capacity().saturating_sub(self.occupied())
    }

    pub fn is_empty(&self) -> bool {
        let Cursors { read, write } = self.cursors();
        read == write
    }

    /// True when not even a one byte push can succeed.
    pub fn is_full(&self) -> bool {
        self.free() < FRAME_PREFIX + 1
    }

    pub fn last_write_time(&self) -> u32 {
        self.header().write_timestamp.load(Relaxed)
    }

    pub fn last_read_time(&self) -> u32 {
        self.header().read_timestamp.load(Relaxed)
    }
}

fn unix_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as u32
}
