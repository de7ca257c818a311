use crate::error::{QueueError, Result};
use crate::Core::queue::{Mode, ShmQueue};
use crossbeam_utils::Backoff;
use std::time::{Duration, Instant};

/// A reading side of a queue. Any number may be attached to one segment;
/// each message is delivered to exactly one of them.
pub struct Consumer {
    queue: ShmQueue,
}

impl Consumer {
    pub(crate) fn new(queue: ShmQueue) -> Self {
        Self { queue }
    }

    /// Wrap an already opened consumer handle.
    pub fn from_queue(queue: ShmQueue) -> Result<Self> {
        match queue.mode() {
            Mode::Consumer => Ok(Self::new(queue)),
            mode => Err(QueueError::WrongMode(mode)),
        }
    }

    /// Receives a message from the queue if one is available.
    ///
    /// # Returns
    /// * `Ok(Some(data))` if a message was received
    /// * `Ok(None)` if the queue is empty
    pub fn receive(&self) -> Result<Option<Vec<u8>>> {
        self.queue.read()
    }

    /// Receives a message into `buf`, returning its length (0 when empty).
    /// A message that does not fit stays queued.
    pub fn receive_into(&self, buf: &mut [u8]) -> Result<usize> {
        self.queue.read_into(buf)
    }

    /// Receives a message, polling until one arrives or `timeout` elapses.
    ///
    /// The queue has no wake-up signal; this spins, then yields, between
    /// attempts.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let start = Instant::now();
        let backoff = Backoff::new();

        loop {
            if let Some(data) = self.receive()? {
                return Ok(Some(data));
            }
            if start.elapsed() >= timeout {
                return Ok(None);
            }
            if backoff.is_completed() {
                let remaining = timeout.saturating_sub(start.elapsed());
                std::thread::sleep(remaining.min(Duration::from_millis(1)));
            } else {
                backoff.snooze();
            }
        }
    }

    /// The underlying handle, for introspection.
    pub fn queue(&self) -> &ShmQueue {
        &self.queue
    }
}
