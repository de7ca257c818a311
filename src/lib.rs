//! A fixed-capacity, length-framed byte ring in a memory-mapped file.
//!
//! One producer and any number of consumers, in the same or different
//! processes, share the ring without a lock on the data path: the producer
//! publishes frames by compare-and-swap on `write_cursor`, consumers race a
//! compare-and-swap on `read_cursor` so each message goes to exactly one of
//! them. Multiple producers are not supported.
//!
//! ```no_run
//! use shmq_ring::SPMC::QueueBuilder;
//!
//! let producer = QueueBuilder::new().with_path("/dev/shm/demo").with_size(4096).build_producer()?;
//! let consumer = QueueBuilder::new().with_path("/dev/shm/demo").with_size(4096).build_consumer()?;
//!
//! producer.send(b"hello")?;
//! assert_eq!(consumer.receive()?, Some(b"hello".to_vec()));
//! # Ok::<(), shmq_ring::QueueError>(())
//! ```

pub mod error;
pub mod ffi;

// Module naming follows project convention (SPMC = Single-Producer Multi-Consumer)
#[allow(non_snake_case)]
pub mod SPMC;
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
mod Debug;

pub use error::{MismatchReason, QueueError};
pub use Core::{Mode, ShmQueue};
