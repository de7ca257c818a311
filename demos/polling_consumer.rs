// In demos/polling_consumer.rs
// Drains the queue forever, printing each message as text.
use shmq_ring::SPMC::QueueBuilder;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let consumer = QueueBuilder::new().with_size(64 * 1024).build_consumer()?;
    let mut buf = vec![0u8; 256];

    loop {
        match consumer.receive_into(&mut buf) {
            Ok(0) => std::thread::sleep(Duration::from_millis(1)),
            Ok(len) => println!("{}", String::from_utf8_lossy(&buf[..len])),
            Err(shmq_ring::QueueError::DestinationTooSmall { needed, .. }) => {
                buf.resize(needed, 0);
            }
            Err(e) => return Err(e.into()),
        }
    }
}
