use super::*;
use crate::Core::SharedMemory::RawHandle;

/// Introspection on a queue handle.
///
/// Every value is a snapshot of one acquire-load pair of the cursors. They
/// are advisory: none of them synchronizes with or blocks a concurrent
/// producer or consumer.
impl ShmQueue {
    /// Framed bytes currently resident (prefixes and padding included).
    pub fn occupied(&self) -> usize {
        self.segment.occupied()
    }

    /// Usable capacity: the rounded buffer length minus the mandatory gap.
    pub fn capacity(&self) -> usize {
        self.segment.usable_capacity()
    }

    /// Bytes available for new frames. A write of `n` bytes fits iff
    /// `n + 4 <= free()`.
    pub fn free(&self) -> usize {
        self.segment.free()
    }

    pub fn is_empty(&self) -> bool {
        self.segment.is_empty()
    }

    /// True when no non-empty write can currently succeed.
    pub fn is_full(&self) -> bool {
        self.segment.is_full()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Total bytes this handle has mapped: header, buffer and trailing pad.
    pub fn mapped_len(&self) -> usize {
        self.shm.size()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn raw_handle(&self) -> RawHandle {
        self.shm.raw_handle()
    }

    /// Unix seconds of the last successful write, 0 if none yet.
    pub fn last_write_time(&self) -> u32 {
        self.segment.last_write_time()
    }

    /// Unix seconds of the last successful read, 0 if none yet.
    pub fn last_read_time(&self) -> u32 {
        self.segment.last_read_time()
    }

    pub(crate) fn segment(&self) -> &Segment {
        &self.segment
    }
}
