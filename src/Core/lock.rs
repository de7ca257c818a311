use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;
use std::path::Path;

use crate::error::{QueueError, Result};

/// Exclusive `flock(2)` on a backing store, held while a creator stamps the
/// segment header. Concurrent creators queue up behind it. Released when
/// the guard drops, on every exit path.
///
/// Advisory only: attachers never take it, and the data path never does.
#[derive(Debug)]
pub struct FileLock<'a> {
    file: &'a File,
}

impl<'a> FileLock<'a> {
    /// Block until the exclusive lock on `file` is granted.
    pub fn exclusive(file: &'a File, path: &Path) -> Result<Self> {
        loop {
            if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) } == 0 {
                return Ok(Self { file });
            }
            let source = io::Error::last_os_error();
            if source.kind() != io::ErrorKind::Interrupted {
                return Err(QueueError::StoreUnavailable {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
    }
}
