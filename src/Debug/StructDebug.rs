use crate::Core::queue::ShmQueue;
use crate::SPMC::Ring::Segment;
use std::fmt;

/// Debug function for ShmQueue
///
/// Shows:
/// - Backing store path and role
/// - Mapped length
/// - A cursor snapshot of the segment
pub fn debug_shm_queue(queue: &ShmQueue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ShmQueue")
        .field("path", &queue.path())
        .field("mode", &queue.mode())
        .field("mapped_len", &queue.mapped_len())
        .field("segment", queue.segment())
        .finish()
}

/// Debug function for Segment
///
/// Reads the cursors once; the values may be stale by the time they print.
pub fn debug_segment(segment: &Segment, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let cursors = segment.cursors();
    f.debug_struct("Segment")
        .field("buffer", &format_args!("0x{:x}", segment.buffer as usize))
        .field("capacity", &segment.buffer_len())
        .field("read_cursor", &cursors.read)
        .field("write_cursor", &cursors.write)
        .finish_non_exhaustive()
}
