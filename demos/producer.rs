// In demos/producer.rs
use sha2::{Digest, Sha256};
use shmq_ring::SPMC::QueueBuilder;
use shmq_ring::QueueError;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const QUEUE_SIZE: u32 = 64 * 1024;

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <num_messages> [--auto-exit]", args[0]);
        std::process::exit(1);
    }

    let num_messages: usize = args[1].parse().expect("Invalid number of messages");
    let auto_exit = args.get(2).map(|s| s == "--auto-exit").unwrap_or(false);

    println!("Producer: Precomputing {} hashes...", num_messages);
    let hashes: Vec<String> = (0..num_messages)
        .map(|i| {
            let mut hasher = Sha256::new();
            hasher.update(format!("message_{}", i).as_bytes());
            format!("{:x}", hasher.finalize())
        })
        .collect();

    // Creating the producer stamps a fresh segment, so start it before consumers.
    let producer = QueueBuilder::new().with_size(QUEUE_SIZE).build_producer()?;
    println!(
        "Producer: Created queue at {} (capacity {} bytes)",
        producer.queue().path().display(),
        producer.queue().capacity()
    );

    let keep_alive = Arc::new(AtomicBool::new(true));
    let keep_alive_for_handler = Arc::clone(&keep_alive);
    ctrlc::set_handler(move || {
        keep_alive_for_handler.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let start_send = std::time::Instant::now();
    let mut sent = 0;

    for (i, hash) in hashes.iter().enumerate() {
        if !keep_alive.load(Ordering::SeqCst) {
            break;
        }

        // Format: "message_number:hash"
        let message = format!("{}:{}", i, hash);
        match producer.send_timeout(&message, Duration::from_secs(10)) {
            Ok(()) => {
                sent += 1;
                if sent % 100 == 0 {
                    println!("Sent {} messages", sent);
                }
            }
            Err(QueueError::WouldBlock) => {
                eprintln!("Producer: queue stayed full for 10s, is a consumer running?");
                break;
            }
            Err(e) => {
                eprintln!("Failed to send message {}: {}", i, e);
                break;
            }
        }
    }

    let send_time = start_send.elapsed();
    println!("Producer: Sent {} messages in {:.2?}", sent, send_time);
    println!(
        "Producer: Throughput: {:.2} messages/sec",
        sent as f64 / send_time.as_secs_f64()
    );

    if auto_exit {
        // Give consumers time to drain before the handle unmaps.
        std::thread::sleep(Duration::from_secs(2));
    } else {
        println!("Press Ctrl+C to exit...");
        while keep_alive.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    println!("Producer: Shutting down");
    Ok(())
}
