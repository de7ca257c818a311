use super::{Consumer, Producer};
use crate::error::Result;
use crate::Core::queue::{Mode, ShmQueue};
use std::path::{Path, PathBuf};

/// Default backing store, on tmpfs so the segment never touches a disk.
pub const DEFAULT_PATH: &str = "/dev/shm/shmq_ring";

/// Default requested buffer size in bytes.
pub const DEFAULT_SIZE: u32 = 1024;

#[derive(Debug, Clone)]
pub struct QueueBuilder {
    path: PathBuf,
    size: u32,
}

impl Default for QueueBuilder {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            size: DEFAULT_SIZE,
        }
    }
}

impl QueueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Requested buffer size. Rounded up to a power of two when the queue is
    /// opened; both sides must request sizes that round to the same value.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn open(&self, mode: Mode) -> Result<ShmQueue> {
        ShmQueue::open(&self.path, self.size, mode)
    }

    /// Create (or re-stamp) the segment and return its single producer.
    pub fn build_producer(self) -> Result<Producer> {
        Ok(Producer::new(self.open(Mode::Producer)?))
    }

    /// Attach to an existing segment as one of its consumers.
    pub fn build_consumer(self) -> Result<Consumer> {
        Ok(Consumer::new(self.open(Mode::Consumer)?))
    }
}
