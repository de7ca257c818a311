use shmq_ring::{Mode, ShmQueue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tempfile::tempdir;

fn decode(message: &[u8]) -> u32 {
    u32::from_le_bytes(message[..4].try_into().unwrap())
}

#[test]
fn each_message_reaches_exactly_one_consumer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("spmc.map");

    const CONSUMERS: usize = 4;
    const MESSAGES: u32 = 20_000;

    let producer = ShmQueue::open(&path, 4096, Mode::Producer).unwrap();
    let consumers: Vec<ShmQueue> = (0..CONSUMERS)
        .map(|_| ShmQueue::open(&path, 4096, Mode::Consumer).unwrap())
        .collect();
    let received = AtomicUsize::new(0);

    let per_consumer: Vec<Vec<u32>> = thread::scope(|s| {
        s.spawn(|| {
            for seq in 0..MESSAGES {
                // Vary the length so frames land at every alignment and wrap.
                let mut message = seq.to_le_bytes().to_vec();
                message.resize(4 + (seq as usize % 61), (seq % 251) as u8);
                while producer.write(&message) == 0 {
                    std::hint::spin_loop();
                }
            }
        });

        let handles: Vec<_> = consumers
            .iter()
            .map(|consumer| {
                let received = &received;
                s.spawn(move || {
                    let mut seen = Vec::new();
                    while received.load(Ordering::Acquire) < MESSAGES as usize {
                        match consumer.read().unwrap() {
                            Some(message) => {
                                let seq = decode(&message);
                                assert_eq!(message.len(), 4 + (seq as usize % 61));
                                assert!(message[4..].iter().all(|&b| b == (seq % 251) as u8));
                                seen.push(seq);
                                received.fetch_add(1, Ordering::AcqRel);
                            }
                            None => std::hint::spin_loop(),
                        }
                    }
                    seen
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for seen in &per_consumer {
        assert!(
            seen.windows(2).all(|w| w[0] < w[1]),
            "a consumer saw messages out of cursor order"
        );
    }

    let mut all: Vec<u32> = per_consumer.into_iter().flatten().collect();
    assert_eq!(all.len(), MESSAGES as usize);
    all.sort_unstable();
    assert!(all.iter().copied().eq(0..MESSAGES), "lost or duplicated messages");
    assert!(producer.is_empty());
}

#[test]
fn spsc_throughput_print() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("throughput.map");
    let producer = ShmQueue::open(&path, 1 << 16, Mode::Producer).unwrap();
    let consumer = ShmQueue::open(&path, 1 << 16, Mode::Consumer).unwrap();

    let count = 200_000;
    let start = std::time::Instant::now();

    thread::scope(|s| {
        s.spawn(|| {
            let payload = [0u8; 32];
            for _ in 0..count {
                while producer.write(&payload) == 0 {
                    std::hint::spin_loop();
                }
            }
        });
        s.spawn(|| {
            let mut buf = [0u8; 64];
            let mut rx = 0;
            while rx < count {
                if consumer.read_into(&mut buf).unwrap() > 0 {
                    rx += 1;
                } else {
                    std::hint::spin_loop();
                }
            }
        });
    });

    let elapsed = start.elapsed();
    println!(
        "Throughput: {:.2} million msgs/sec",
        (count as f64 / elapsed.as_secs_f64()) / 1_000_000.0
    );
}
