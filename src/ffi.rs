use crate::error::QueueError;
use crate::Core::queue::{Mode, ShmQueue};
use std::ffi::{c_char, CStr};
use std::ptr;
use tracing::error;

// Role constants, shared with shmqueue.h
pub const SHMQ_PRODUCER_MODE: i32 = 1;
pub const SHMQ_CONSUMER_MODE: i32 = 2;

// Error codes
pub const SHMQ_SUCCESS: i32 = 0;
pub const SHMQ_ERROR_NULL_POINTER: i32 = -1;
pub const SHMQ_ERROR_INVALID_ARG: i32 = -2;
pub const SHMQ_ERROR_BUFFER_TOO_SMALL: i32 = -3;
pub const SHMQ_ERROR_CORRUPT: i32 = -4;

/// Handle to a mapped queue (opaque pointer)
pub struct ShmqHandle {
    inner: ShmQueue,
}

fn as_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

/// Create (producer) or attach to (consumer) the queue at `pathname`.
///
/// # Arguments
/// * `pathname` - NUL-terminated path of the backing file.
/// * `size` - Requested buffer size, rounded up to a power of two.
/// * `mode` - `SHMQ_PRODUCER_MODE` or `SHMQ_CONSUMER_MODE`.
///
/// # Returns
/// * Pointer to `ShmqHandle`, or NULL on failure.
#[no_mangle]
pub extern "C" fn shmq_create(pathname: *const c_char, size: u32, mode: i32) -> *mut ShmqHandle {
    if pathname.is_null() {
        error!("shmq_create: null path");
        return ptr::null_mut();
    }

    let mode = match mode {
        SHMQ_PRODUCER_MODE => Mode::Producer,
        SHMQ_CONSUMER_MODE => Mode::Consumer,
        other => {
            error!(mode = other, "shmq_create: unknown mode");
            return ptr::null_mut();
        }
    };

    let path = match unsafe { CStr::from_ptr(pathname) }.to_str() {
        Ok(path) => path,
        Err(e) => {
            error!(error = %e, "shmq_create: path is not UTF-8");
            return ptr::null_mut();
        }
    };

    match ShmQueue::open(path, size, mode) {
        Ok(queue) => Box::into_raw(Box::new(ShmqHandle { inner: queue })),
        Err(e) => {
            error!(error = %e, "shmq_create failed");
            ptr::null_mut()
        }
    }
}

/// Unmap the queue and free the handle. The backing file is kept.
#[no_mangle]
pub extern "C" fn shmq_destroy(handle: *mut ShmqHandle) {
    if !handle.is_null() {
        let handle = unsafe { Box::from_raw(handle) };
        handle.inner.destroy();
    }
}

// -----------------------------------------------------------------------------
// Data path
// -----------------------------------------------------------------------------

/// Write `n` bytes from `src`.
///
/// # Returns
/// * `n` on success.
/// * 0 if the queue lacks space, `n` is 0, or the handle is a consumer.
/// * Negative error code otherwise.
#[no_mangle]
pub extern "C" fn shmq_put(handle: *mut ShmqHandle, src: *const u8, n: u32) -> i32 {
    if handle.is_null() || (src.is_null() && n > 0) {
        return SHMQ_ERROR_NULL_POINTER;
    }
    if n == 0 {
        return 0;
    }

    let queue = unsafe { &(*handle).inner };
    let payload = unsafe { std::slice::from_raw_parts(src, n as usize) };
    as_i32(queue.write(payload))
}

/// Read the next message into `dst`, which holds `n` bytes.
///
/// # Returns
/// * Message length on success, 0 if the queue is empty.
/// * `SHMQ_ERROR_BUFFER_TOO_SMALL` if the message exceeds `n` (it stays queued).
/// * `SHMQ_ERROR_CORRUPT` if the frame at the read cursor is inconsistent.
#[no_mangle]
pub extern "C" fn shmq_get(handle: *mut ShmqHandle, dst: *mut u8, n: u32) -> i32 {
    if handle.is_null() || (dst.is_null() && n > 0) {
        return SHMQ_ERROR_NULL_POINTER;
    }

    let queue = unsafe { &(*handle).inner };
    let dest: &mut [u8] = if n == 0 {
        &mut []
    } else {
        unsafe { std::slice::from_raw_parts_mut(dst, n as usize) }
    };

    match queue.read_into(dest) {
        Ok(len) => as_i32(len),
        Err(QueueError::DestinationTooSmall { .. }) => SHMQ_ERROR_BUFFER_TOO_SMALL,
        Err(e @ QueueError::CorruptFrame { .. }) => {
            error!(error = %e, "shmq_get");
            SHMQ_ERROR_CORRUPT
        }
        Err(e) => {
            error!(error = %e, "shmq_get");
            SHMQ_ERROR_INVALID_ARG
        }
    }
}

// -----------------------------------------------------------------------------
// Introspection
// -----------------------------------------------------------------------------

/// Framed bytes currently in the queue.
#[no_mangle]
pub extern "C" fn shmq_size(handle: *const ShmqHandle) -> i32 {
    if handle.is_null() {
        return SHMQ_ERROR_NULL_POINTER;
    }
    as_i32(unsafe { &(*handle).inner }.occupied())
}

/// Bytes still available for frames.
#[no_mangle]
pub extern "C" fn shmq_left(handle: *const ShmqHandle) -> i32 {
    if handle.is_null() {
        return SHMQ_ERROR_NULL_POINTER;
    }
    as_i32(unsafe { &(*handle).inner }.free())
}

/// Usable capacity (buffer length minus the 4 byte gap).
#[no_mangle]
pub extern "C" fn shmq_capacity(handle: *const ShmqHandle) -> i32 {
    if handle.is_null() {
        return SHMQ_ERROR_NULL_POINTER;
    }
    as_i32(unsafe { &(*handle).inner }.capacity())
}

/// Nonzero when the queue is empty.
#[no_mangle]
pub extern "C" fn shmq_empty(handle: *const ShmqHandle) -> i32 {
    if handle.is_null() {
        return SHMQ_ERROR_NULL_POINTER;
    }
    unsafe { &(*handle).inner }.is_empty() as i32
}

/// Nonzero when no further write can succeed.
#[no_mangle]
pub extern "C" fn shmq_full(handle: *const ShmqHandle) -> i32 {
    if handle.is_null() {
        return SHMQ_ERROR_NULL_POINTER;
    }
    unsafe { &(*handle).inner }.is_full() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use tempfile::tempdir;

    #[test]
    fn put_get_through_c_abi() {
        let dir = tempdir().unwrap();
        let path = CString::new(dir.path().join("ffi.map").to_str().unwrap()).unwrap();

        let producer = shmq_create(path.as_ptr(), 100, SHMQ_PRODUCER_MODE);
        assert!(!producer.is_null());
        let consumer = shmq_create(path.as_ptr(), 100, SHMQ_CONSUMER_MODE);
        assert!(!consumer.is_null());

        assert_eq!(shmq_capacity(producer), 124);
        assert_eq!(shmq_empty(consumer), 1);

        let msg = b"[:]hello";
        assert_eq!(shmq_put(producer, msg.as_ptr(), msg.len() as u32), msg.len() as i32);
        assert_eq!(shmq_put(consumer, msg.as_ptr(), msg.len() as u32), 0);
        assert_eq!(shmq_size(consumer), 12);
        assert_eq!(shmq_left(consumer), 112);

        let mut small = [0u8; 4];
        assert_eq!(
            shmq_get(consumer, small.as_mut_ptr(), small.len() as u32),
            SHMQ_ERROR_BUFFER_TOO_SMALL
        );

        let mut buf = [0u8; 200];
        assert_eq!(shmq_get(consumer, buf.as_mut_ptr(), buf.len() as u32), msg.len() as i32);
        assert_eq!(&buf[..msg.len()], msg);
        assert_eq!(shmq_get(consumer, buf.as_mut_ptr(), buf.len() as u32), 0);

        shmq_destroy(consumer);
        shmq_destroy(producer);
        assert!(dir.path().join("ffi.map").exists());
    }

    #[test]
    fn rejects_null_and_bad_arguments() {
        assert!(shmq_create(ptr::null(), 100, SHMQ_PRODUCER_MODE).is_null());

        let path = CString::new("/nonexistent-dir/q.map").unwrap();
        assert!(shmq_create(path.as_ptr(), 100, 7).is_null());
        assert!(shmq_create(path.as_ptr(), 100, SHMQ_CONSUMER_MODE).is_null());

        assert_eq!(shmq_put(ptr::null_mut(), ptr::null(), 0), SHMQ_ERROR_NULL_POINTER);
        assert_eq!(shmq_get(ptr::null_mut(), ptr::null_mut(), 0), SHMQ_ERROR_NULL_POINTER);
        assert_eq!(shmq_size(ptr::null()), SHMQ_ERROR_NULL_POINTER);
        shmq_destroy(ptr::null_mut());
    }
}
