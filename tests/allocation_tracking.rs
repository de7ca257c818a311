// Allocation tracking for the data path.
//
// dhat allows one profiler at a time, so every test here is
// #[serial_test::serial].
//
// cargo test --test allocation_tracking -- --nocapture

use shmq_ring::{Mode, ShmQueue};
use tempfile::tempdir;

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[test]
#[serial_test::serial]
fn write_and_read_into_do_not_allocate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("alloc.map");
    let producer = ShmQueue::open(&path, 4096, Mode::Producer).unwrap();
    let consumer = ShmQueue::open(&path, 4096, Mode::Consumer).unwrap();

    let payload = [7u8; 100];
    let mut buf = [0u8; 128];

    let _profiler = dhat::Profiler::builder().testing().build();
    let before = dhat::HeapStats::get();

    for _ in 0..1_000 {
        assert_eq!(producer.write(&payload), payload.len());
        assert_eq!(consumer.read_into(&mut buf).unwrap(), payload.len());
    }

    let after = dhat::HeapStats::get();
    assert_eq!(
        after.total_blocks, before.total_blocks,
        "hot path allocated {} blocks",
        after.total_blocks - before.total_blocks
    );
}

#[test]
#[serial_test::serial]
fn read_allocates_only_the_returned_message() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("alloc_vec.map");
    let producer = ShmQueue::open(&path, 4096, Mode::Producer).unwrap();
    let consumer = ShmQueue::open(&path, 4096, Mode::Consumer).unwrap();

    let _profiler = dhat::Profiler::builder().testing().build();
    let before = dhat::HeapStats::get();

    for _ in 0..1_000 {
        producer.write(b"payload");
        let message = consumer.read().unwrap();
        assert_eq!(message.as_deref(), Some(&b"payload"[..]));
    }

    let after = dhat::HeapStats::get();
    assert_eq!(after.total_blocks - before.total_blocks, 1_000);
}
