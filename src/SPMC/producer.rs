use crate::error::{QueueError, Result};
use crate::Core::queue::{Mode, ShmQueue};
use crate::SPMC::Ring::layout::max_payload;
use crossbeam_utils::Backoff;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// The writing side of a queue.
///
/// A segment supports one producer. Threads of the same process may share a
/// `Producer`: their sends are serialized by an in-process mutex, which keeps
/// the single-writer rule. Producers in different processes are not
/// coordinated and must not write to the same segment.
pub struct Producer {
    queue: ShmQueue,
    write_lock: Mutex<()>,
    max_message_size: usize,
}

impl Producer {
    pub(crate) fn new(queue: ShmQueue) -> Self {
        let max_message_size = max_payload(queue.segment().buffer_len());
        Self {
            queue,
            write_lock: Mutex::new(()),
            max_message_size,
        }
    }

    /// Wrap an already opened producer handle.
    pub fn from_queue(queue: ShmQueue) -> Result<Self> {
        match queue.mode() {
            Mode::Producer => Ok(Self::new(queue)),
            mode => Err(QueueError::WrongMode(mode)),
        }
    }

    /// Sends a message through the queue.
    ///
    /// # Returns
    /// * `Ok(())` if the message was published
    /// * `Err(WouldBlock)` if there is not enough free space right now
    /// * `Err(MessageTooLarge)` if the message could never fit
    /// * `Err(EmptyMessage)` for a zero-length message
    pub fn send<T: AsRef<[u8]>>(&self, message: T) -> Result<()> {
        let message = message.as_ref();
        if message.is_empty() {
            return Err(QueueError::EmptyMessage);
        }
        if message.len() > self.max_message_size {
            return Err(QueueError::MessageTooLarge {
                len: message.len(),
                max: self.max_message_size,
            });
        }

        let _guard = self.write_lock.lock();
        match self.queue.write(message) {
            0 => Err(QueueError::WouldBlock),
            _ => Ok(()),
        }
    }

    /// Keep retrying `send` until it lands or `timeout` elapses.
    pub fn send_timeout<T: AsRef<[u8]>>(&self, message: T, timeout: Duration) -> Result<()> {
        let message = message.as_ref();
        let start = Instant::now();
        let backoff = Backoff::new();

        loop {
            match self.send(message) {
                Err(QueueError::WouldBlock) if start.elapsed() < timeout => backoff.snooze(),
                other => return other,
            }
        }
    }

    /// Largest message this queue can ever accept.
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// The underlying handle, for introspection.
    pub fn queue(&self) -> &ShmQueue {
        &self.queue
    }
}
