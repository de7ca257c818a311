// In demos/consumer.rs
use sha2::{Digest, Sha256};
use shmq_ring::SPMC::QueueBuilder;
use std::env;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// Must round to the same capacity as the producer's request.
const QUEUE_SIZE: u32 = 64 * 1024;

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <expected_messages>", args[0]);
        std::process::exit(1);
    }

    let expected_messages: usize = args[1].parse().expect("Invalid number of messages");

    println!("Consumer: Waiting for the producer's segment...");
    let attach_deadline = Instant::now() + Duration::from_secs(5);
    let consumer = loop {
        match QueueBuilder::new().with_size(QUEUE_SIZE).build_consumer() {
            Ok(consumer) => break consumer,
            Err(e) if Instant::now() < attach_deadline => {
                tracing::debug!(error = %e, "segment not ready");
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                eprintln!("Failed to create consumer: {}", e);
                return Err(e.into());
            }
        }
    };

    let start = Instant::now();
    let mut received = 0;
    let mut mismatched = 0;

    println!("\n{:<10} {}", "Msg #", "Hash");
    println!("{}", "=".repeat(80));

    while received < expected_messages {
        match consumer.receive_timeout(Duration::from_secs(5))? {
            Some(data) => {
                let message = String::from_utf8_lossy(&data);
                match message.split_once(':') {
                    Some((num_str, hash)) => {
                        let mut hasher = Sha256::new();
                        hasher.update(format!("message_{}", num_str).as_bytes());
                        if format!("{:x}", hasher.finalize()) != hash {
                            mismatched += 1;
                        }
                        println!("{:<10} {}", num_str, hash);
                    }
                    None => {
                        println!("Invalid format: {}", message);
                        mismatched += 1;
                    }
                }
                received += 1;
            }
            None => {
                eprintln!("Timeout waiting for messages");
                break;
            }
        }
    }

    let elapsed = start.elapsed();
    println!("\n{}", "=".repeat(80));
    println!("Consumer: Received {} messages in {:.2?}", received, elapsed);
    println!(
        "Average: {:.2} messages/second",
        received as f64 / elapsed.as_secs_f64()
    );

    if received == expected_messages && mismatched == 0 {
        println!("All messages received successfully");
        Ok(())
    } else {
        eprintln!("{} of {} messages failed verification", mismatched, received);
        std::process::exit(1);
    }
}
