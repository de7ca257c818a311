use crate::error::{QueueError, Result};
use crate::Core::lock::FileLock;
use crate::Core::SharedMemory::{create_store, open_store, MappedFile, SharedMemoryBackend};
use crate::SPMC::Ring::layout::{mapped_len, round_capacity};
use crate::SPMC::Ring::Segment;
use std::path::{Path, PathBuf};
#[cfg(debug_assertions)]
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
mod debug;
mod getters;

/// Which cursor a handle may advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Creates (or re-stamps) the segment and advances `write_cursor`.
    Producer,
    /// Attaches to an existing segment and advances `read_cursor`.
    Consumer,
}

/// A process-local handle on a queue segment.
///
/// The mapping is shared with every other process attached to the same
/// backing store. Dropping (or [`destroy`](ShmQueue::destroy)ing) a handle
/// unmaps this view only; the store and other handles are untouched.
pub struct ShmQueue {
    shm: Box<dyn SharedMemoryBackend>,
    segment: Segment,
    mode: Mode,
    path: PathBuf,
    #[cfg(debug_assertions)]
    writing: AtomicBool,
}

impl ShmQueue {
    /// Create or attach a queue at `path`.
    ///
    /// `requested_size` is rounded up to a power of two; that rounded size is
    /// the buffer length, whatever was asked for. A `Producer` creates the
    /// store (or re-stamps an existing one), a `Consumer` attaches and
    /// checks that the stamped layout matches its own rounded size.
    pub fn open(path: impl AsRef<Path>, requested_size: u32, mode: Mode) -> Result<Self> {
        let path = path.as_ref();
        let capacity = round_capacity(requested_size)?;
        let len = mapped_len(capacity);

        let (shm, segment) = match mode {
            Mode::Producer => Self::create(path, capacity, len)?,
            Mode::Consumer => Self::attach(path, capacity, len)?,
        };

        Ok(Self {
            shm,
            segment,
            mode,
            path: path.to_path_buf(),
            #[cfg(debug_assertions)]
            writing: AtomicBool::new(false),
        })
    }

    fn create(path: &Path, capacity: u32, len: usize) -> Result<(Box<dyn SharedMemoryBackend>, Segment)> {
        let shm = MappedFile::map(create_store(path, len)?, path, len)?;

        let segment = {
            let _lock = FileLock::exclusive(shm.file(), path)?;
            // Safety: the mapping is `len` bytes, covering header and buffer.
            unsafe { Segment::stamp(shm.as_ptr(), capacity) }
        };

        info!(path = %path.display(), capacity, mapped_len = len, "created queue segment");
        Ok((Box::new(shm), segment))
    }

    fn attach(path: &Path, capacity: u32, len: usize) -> Result<(Box<dyn SharedMemoryBackend>, Segment)> {
        let file = open_store(path, len).inspect_err(|err| {
            warn!(path = %path.display(), %err, "cannot attach to queue segment");
        })?;
        let shm = MappedFile::map(file, path, len)?;

        // Safety: `open_store` checked the file covers the whole mapping.
        if let Err(reason) = unsafe { Segment::validate(shm.as_ptr(), capacity) } {
            warn!(path = %path.display(), %reason, "queue segment layout mismatch");
            drop(shm);
            return Err(QueueError::LayoutMismatch {
                path: path.to_path_buf(),
                reason,
            });
        }

        let segment = unsafe { Segment::new(shm.as_ptr()) };
        info!(path = %path.display(), capacity, mapped_len = len, "attached to queue segment");
        Ok((Box::new(shm), segment))
    }

    /// Frame and publish `payload`. Returns its length, or 0 when nothing was
    /// written: a consumer handle, an empty payload, or not enough free space
    /// (back-pressure; retry later).
    ///
    /// Only one producer may write to a segment at a time. Nothing here
    /// makes concurrent writers safe.
    pub fn write(&self, payload: &[u8]) -> usize {
        if self.mode != Mode::Producer {
            return 0;
        }
        #[cfg(debug_assertions)]
        let _writer = WriterGuard::enter(&self.writing);
        self.segment.push(payload)
    }

    /// Take the next message. `Ok(None)` when the queue is empty.
    ///
    /// With several consumers each message goes to exactly one of them.
    pub fn read(&self) -> Result<Option<Vec<u8>>> {
        self.segment.pop()
    }

    /// Take the next message into `dest`, returning its length (0 when empty).
    ///
    /// A message longer than `dest` fails with `DestinationTooSmall` and is
    /// left in the queue.
    pub fn read_into(&self, dest: &mut [u8]) -> Result<usize> {
        self.segment.pop_into(dest)
    }

    /// Unmap this handle's view of the segment.
    pub fn destroy(self) {
        drop(self);
    }
}

impl Drop for ShmQueue {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), mode = ?self.mode, "unmapping queue segment");
    }
}

/// Flags overlapping writes on one handle in debug builds.
#[cfg(debug_assertions)]
struct WriterGuard<'a>(&'a AtomicBool);

#[cfg(debug_assertions)]
impl<'a> WriterGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        let busy = flag.swap(true, Ordering::Acquire);
        debug_assert!(!busy, "concurrent writes on a single-producer queue");
        Self(flag)
    }
}

#[cfg(debug_assertions)]
impl Drop for WriterGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
