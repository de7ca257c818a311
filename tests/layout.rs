// Layout conformance tests for the shared segment header.
// The offsets must match the C `queue_t` so that segments stay readable
// by the C library and its Python binding.
use memoffset::offset_of;
use shmq_ring::SPMC::Ring::layout::{
    mapped_len, SegmentHeader, HEADER_SIZE, QUEUE_MAGIC, QUEUE_VERSION, TRAILING_PAD,
};
use std::mem::{align_of, size_of};

#[test]
fn test_segment_header_layout() {
    let size = size_of::<SegmentHeader>();
    let align = align_of::<SegmentHeader>();
    let off_magic = offset_of!(SegmentHeader, magic);
    let off_version = offset_of!(SegmentHeader, version);
    let off_capacity = offset_of!(SegmentHeader, capacity);
    let off_read_cursor = offset_of!(SegmentHeader, read_cursor);
    let off_read_timestamp = offset_of!(SegmentHeader, read_timestamp);
    let off_write_cursor = offset_of!(SegmentHeader, write_cursor);
    let off_write_timestamp = offset_of!(SegmentHeader, write_timestamp);

    println!(
        "SegmentHeader => size: {size}, align: {align}, offsets: [magic:{off_magic}, version:{off_version}, capacity:{off_capacity}, read_cursor:{off_read_cursor}, read_timestamp:{off_read_timestamp}, write_cursor:{off_write_cursor}, write_timestamp:{off_write_timestamp}]"
    );

    assert_eq!(align, 4);
    assert_eq!(off_magic, 0);
    assert_eq!(off_version, 4);
    assert_eq!(off_capacity, 8);
    assert_eq!(off_read_cursor, 76);
    assert_eq!(off_read_timestamp, 80);
    assert_eq!(off_write_cursor, 148);
    assert_eq!(off_write_timestamp, 152);
    assert_eq!(size, 220);
    assert_eq!(HEADER_SIZE, size);
}

#[test]
fn test_cursor_groups_do_not_share_a_cache_line() {
    let read = offset_of!(SegmentHeader, read_cursor);
    let write = offset_of!(SegmentHeader, write_cursor);
    assert!(write - read >= 64);
}

#[test]
fn test_format_constants() {
    assert_eq!(QUEUE_MAGIC, [0x12, 0x34]);
    assert_eq!(QUEUE_VERSION, 1);
    assert_eq!(TRAILING_PAD, 16);
    assert_eq!(mapped_len(1024), 220 + 1024 + 16);
}
