// File-backed shared memory for queue segments.
// Every attached process maps the same file with MAP_SHARED.

use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::ptr::{self, NonNull};

use tracing::debug;

use crate::error::{MismatchReason, QueueError, Result};

/// Owner and group may read and write the backing store.
pub const STORE_PERMISSIONS: u32 = 0o660;

/// Shared memory backend trait for memory mapping
pub trait SharedMemoryBackend: Send + Sync + Debug {
    /// Get a pointer to the mapped memory region
    fn as_ptr(&self) -> *mut u8;

    /// Get the size of the mapped region in bytes
    fn size(&self) -> usize;

    /// Get the underlying file descriptor
    fn raw_handle(&self) -> RawHandle;
}

/// Platform-specific handle type
#[derive(Debug, Clone, Copy)]
pub enum RawHandle {
    /// Unix file descriptor
    Fd(i32),
}

/// Open or create the backing store at `path` and extend it to `len` bytes.
/// Used by the creating side only.
pub fn create_store(path: &Path, len: usize) -> Result<File> {
    let unavailable = |source: io::Error| QueueError::StoreUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .mode(STORE_PERMISSIONS)
        .open(path)
        .map_err(unavailable)?;

    file.set_len(len as u64).map_err(unavailable)?;
    Ok(file)
}

/// Open an existing backing store for attachment. The file must already
/// hold at least `len` bytes; touching a mapping past end-of-file faults.
pub fn open_store(path: &Path, len: usize) -> Result<File> {
    let unavailable = |source: io::Error| QueueError::StoreUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(unavailable)?;

    let actual = file.metadata().map_err(unavailable)?.len();
    if actual < len as u64 {
        return Err(QueueError::LayoutMismatch {
            path: path.to_path_buf(),
            reason: MismatchReason::StoreTooShort {
                expected: len as u64,
                actual,
            },
        });
    }
    Ok(file)
}

/// A read/write `MAP_SHARED` view of a backing file.
///
/// Dropping it unmaps this process's view only. The file, and every other
/// process's mapping of it, is left alone.
#[derive(Debug)]
pub struct MappedFile {
    ptr: NonNull<u8>,
    size: usize,
    file: File,
}

unsafe impl Send for MappedFile {}
unsafe impl Sync for MappedFile {}

impl MappedFile {
    /// Map the first `size` bytes of `file`.
    pub fn map(file: File, path: &Path, size: usize) -> Result<Self> {
        let map_failed = |source: io::Error| QueueError::MapFailed {
            path: path.to_path_buf(),
            len: size,
            source,
        };

        if size == 0 {
            return Err(map_failed(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot map an empty region",
            )));
        }

        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(map_failed(io::Error::last_os_error()));
        }

        let ptr = NonNull::new(ptr as *mut u8)
            .ok_or_else(|| map_failed(io::Error::other("mmap returned a null pointer")))?;

        Ok(Self { ptr, size, file })
    }

    /// The backing file, kept open for the lifetime of the mapping.
    pub fn file(&self) -> &File {
        &self.file
    }
}

impl Drop for MappedFile {
    fn drop(&mut self) {
        let rc = unsafe { libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.size) };
        if rc != 0 {
            debug!(error = %io::Error::last_os_error(), "munmap failed");
        }
    }
}

impl SharedMemoryBackend for MappedFile {
    fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn size(&self) -> usize {
        self.size
    }

    fn raw_handle(&self) -> RawHandle {
        RawHandle::Fd(self.file.as_raw_fd())
    }
}
