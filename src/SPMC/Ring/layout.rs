use crate::error::{QueueError, Result};
use std::mem::size_of;
use std::sync::atomic::AtomicU32;

/// Two sentinel bytes at offset 0 of every stamped segment.
pub const QUEUE_MAGIC: [u8; 2] = [0x12, 0x34];

/// Layout version. Attachers reject any other value.
pub const QUEUE_VERSION: i32 = 1;

/// Bytes of length prefix in front of every payload.
pub const FRAME_PREFIX: usize = size_of::<u32>();

/// Bytes between `write_cursor` and `read_cursor` that are never filled,
/// so that `read_cursor == write_cursor` only ever means empty.
pub const MANDATORY_GAP: usize = 4;

/// Cursors and frames are kept on this boundary.
pub const FRAME_ALIGN: usize = 4;

/// Smallest buffer that still holds a one byte message.
pub const MIN_CAPACITY: u32 = 16;

/// Slack mapped past the end of the buffer.
pub const TRAILING_PAD: usize = 16;

/// The shared header at offset 0 of the mapped region, followed directly by
/// `capacity` bytes of circular buffer.
///
/// `#[repr(C)]` gives the same offsets as the C `queue_t` the format comes
/// from: magic 0, version 4, capacity 8, read_cursor 76, write_cursor 148,
/// buffer 220. The two cursor groups sit 72 bytes apart so the producer's and
/// the consumers' hot words never share a cache line.
#[repr(C)]
pub struct SegmentHeader {
    pub magic: [u8; 2],
    pub version: i32,
    /// Buffer length in bytes. Power of two, fixed at creation.
    pub capacity: u32,
    pub _pad0: [u8; 64],

    /// Offset of the next unread frame. Advanced only by a consumer's CAS.
    pub read_cursor: AtomicU32,
    /// Unix seconds of the last successful read. Advisory.
    pub read_timestamp: AtomicU32,
    pub _pad1: [u8; 64],

    /// Offset of the next free byte. Advanced only by the producer's CAS.
    pub write_cursor: AtomicU32,
    /// Unix seconds of the last successful write. Advisory.
    pub write_timestamp: AtomicU32,
    pub _pad2: [u8; 64],
}

pub const HEADER_SIZE: usize = size_of::<SegmentHeader>();

/// Round a requested buffer size up to the capacity actually allocated.
///
/// Requests that round below `MIN_CAPACITY` are refused rather than
/// enlarged, so both sides of a segment always agree on its size.
pub fn round_capacity(requested: u32) -> Result<u32> {
    match requested.checked_next_power_of_two() {
        Some(capacity) if capacity >= MIN_CAPACITY => Ok(capacity),
        _ => Err(QueueError::InvalidCapacity(requested as u64)),
    }
}

/// Total bytes mapped for a segment whose buffer holds `capacity` bytes.
pub fn mapped_len(capacity: u32) -> usize {
    HEADER_SIZE + capacity as usize + TRAILING_PAD
}

/// Round `offset` up to the next frame boundary.
#[inline]
pub fn align_up(offset: usize) -> usize {
    (offset + FRAME_ALIGN - 1) & !(FRAME_ALIGN - 1)
}

/// Largest payload a buffer of `capacity` bytes can ever accept.
#[inline]
pub fn max_payload(capacity: usize) -> usize {
    capacity.saturating_sub(FRAME_PREFIX + MANDATORY_GAP)
}
