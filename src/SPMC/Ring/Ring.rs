// View over one mapped queue segment: header plus circular byte buffer.

use super::layout::{SegmentHeader, HEADER_SIZE};
use std::ptr;

/// A lock-free, single-producer, multi-consumer byte ring view.
///
/// This struct is NOT stored in shared memory. It is a transient view holding
/// pointers into a mapped region; every attached process builds its own.
///
/// ### Concurrency Design:
/// - **Producer (push)**: the single writer copies a length-prefixed frame
///   into the free span past `write_cursor`, then publishes the new cursor
///   with a CAS. Bytes are always written before the cursor moves.
/// - **Consumers (pop)**: readers copy the frame at `read_cursor` and race a
///   CAS to advance it. Exactly one reader wins each frame; losers retry.
///
/// Which bytes are safe to touch is derived entirely from the two cursors.
/// There is no lock over the buffer itself.
pub struct Segment {
    /// Header at offset 0 of the mapping.
    pub(crate) header: *const SegmentHeader,

    /// First byte of the circular buffer, `HEADER_SIZE` past the header.
    pub(crate) buffer: *mut u8,

    /// Buffer length in bytes, cached from the header.
    pub(crate) capacity: usize,
}

unsafe impl Send for Segment {}
unsafe impl Sync for Segment {}

impl Segment {
    /// Build a view over a region whose header already carries a capacity.
    ///
    /// # Safety
    /// `base` must point to a live, 4-byte aligned mapping of at least
    /// `HEADER_SIZE + capacity` bytes that outlives the view.
    pub unsafe fn new(base: *mut u8) -> Self {
        let header = base as *const SegmentHeader;
        let capacity = (*header).capacity as usize;
        Self {
            header,
            buffer: base.add(HEADER_SIZE),
            capacity,
        }
    }

    #[inline]
    pub fn header(&self) -> &SegmentHeader {
        // Safety: the mapping outlives the view (see `new`).
        unsafe { &*self.header }
    }

    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.capacity
    }

    /// Copy `dest.len()` bytes starting at logical `offset`, splitting the
    /// copy in two when it runs past the physical end of the buffer.
    ///
    /// Panics if `dest` is longer than the buffer.
    #[inline]
    pub(crate) fn read_at(&self, offset: usize, dest: &mut [u8]) {
        assert!(
            dest.len() <= self.capacity,
            "read of {} bytes from a {} byte ring",
            dest.len(),
            self.capacity
        );
        let start = offset % self.capacity;
        let first = dest.len().min(self.capacity - start);
        unsafe {
            ptr::copy_nonoverlapping(self.buffer.add(start), dest.as_mut_ptr(), first);
            ptr::copy_nonoverlapping(
                self.buffer,
                dest.as_mut_ptr().add(first),
                dest.len() - first,
            );
        }
    }

    /// Copy `src` to logical `offset`, wrapping to offset 0 when it runs past
    /// the physical end of the buffer.
    ///
    /// Panics if `src` is longer than the buffer.
    #[inline]
    pub(crate) fn write_at(&self, offset: usize, src: &[u8]) {
        assert!(
            src.len() <= self.capacity,
            "write of {} bytes into a {} byte ring",
            src.len(),
            self.capacity
        );
        let start = offset % self.capacity;
        let first = src.len().min(self.capacity - start);
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), self.buffer.add(start), first);
            ptr::copy_nonoverlapping(src.as_ptr().add(first), self.buffer, src.len() - first);
        }
    }

    /// Read the 4-byte length prefix at `offset`.
    #[inline]
    pub(crate) fn read_prefix(&self, offset: usize) -> u32 {
        let mut raw = [0u8; 4];
        self.read_at(offset, &mut raw);
        u32::from_ne_bytes(raw)
    }
}
