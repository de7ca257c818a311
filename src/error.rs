use crate::Core::queue::Mode;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why an attaching handle refused an existing segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchReason {
    /// The backing file is shorter than the region the attacher must map.
    StoreTooShort { expected: u64, actual: u64 },
    /// The two sentinel bytes at offset 0 are absent or wrong.
    BadMagic([u8; 2]),
    /// The segment was stamped by an incompatible format version.
    Version { expected: i32, found: i32 },
    /// The stamped buffer length differs from the attacher's rounded request.
    Capacity { expected: u32, found: u32 },
}

impl std::fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MismatchReason::StoreTooShort { expected, actual } => write!(
                f,
                "backing store holds {actual} bytes, at least {expected} required"
            ),
            MismatchReason::BadMagic(found) => {
                write!(f, "bad magic {:#04x} {:#04x}", found[0], found[1])
            }
            MismatchReason::Version { expected, found } => {
                write!(f, "format version {found}, expected {expected}")
            }
            MismatchReason::Capacity { expected, found } => {
                write!(f, "stamped capacity {found}, expected {expected}")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("backing store {path} unavailable: {source}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to map {len} bytes of {path}: {source}")]
    MapFailed {
        path: PathBuf,
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error("segment at {path} does not match: {reason}")]
    LayoutMismatch { path: PathBuf, reason: MismatchReason },

    #[error("requested size {0} cannot be rounded to a power-of-two capacity")]
    InvalidCapacity(u64),

    #[error("queue is full or empty, retry later")]
    WouldBlock,

    #[error("message of {len} bytes can never fit (at most {max} bytes per message)")]
    MessageTooLarge { len: usize, max: usize },

    #[error("empty messages are not framed")]
    EmptyMessage,

    #[error("destination holds {available} bytes but the next message needs {needed}")]
    DestinationTooSmall { needed: usize, available: usize },

    #[error("frame at offset {offset} declares {len} bytes but only {occupied} are resident")]
    CorruptFrame {
        offset: usize,
        len: usize,
        occupied: usize,
    },

    #[error("a {0:?} handle cannot perform this operation")]
    WrongMode(Mode),
}

impl QueueError {
    /// The closest `std::io::ErrorKind`, for callers that work in `io::Result`.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            QueueError::StoreUnavailable { source, .. } => source.kind(),
            QueueError::MapFailed { source, .. } => source.kind(),
            QueueError::LayoutMismatch { .. } => io::ErrorKind::InvalidData,
            QueueError::InvalidCapacity(_) => io::ErrorKind::InvalidInput,
            QueueError::WouldBlock => io::ErrorKind::WouldBlock,
            QueueError::MessageTooLarge { .. } => io::ErrorKind::InvalidInput,
            QueueError::EmptyMessage => io::ErrorKind::InvalidInput,
            QueueError::DestinationTooSmall { .. } => io::ErrorKind::InvalidInput,
            QueueError::CorruptFrame { .. } => io::ErrorKind::InvalidData,
            QueueError::WrongMode(_) => io::ErrorKind::PermissionDenied,
        }
    }
}

impl From<QueueError> for io::Error {
    fn from(err: QueueError) -> Self {
        io::Error::new(err.kind(), err)
    }
}

pub type Result<T, E = QueueError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formatting() {
        let err = QueueError::LayoutMismatch {
            path: PathBuf::from("/dev/shm/q"),
            reason: MismatchReason::Capacity {
                expected: 256,
                found: 128,
            },
        };
        assert_eq!(
            err.to_string(),
            "segment at /dev/shm/q does not match: stamped capacity 128, expected 256"
        );

        let err = QueueError::DestinationTooSmall {
            needed: 40,
            available: 8,
        };
        assert_eq!(
            err.to_string(),
            "destination holds 8 bytes but the next message needs 40"
        );

        let err = QueueError::LayoutMismatch {
            path: PathBuf::from("q"),
            reason: MismatchReason::BadMagic([0, 0]),
        };
        assert_eq!(err.to_string(), "segment at q does not match: bad magic 0x00 0x00");
    }

    #[test]
    fn test_conversion_into_io_error_keeps_kind() {
        fn returns_queue_error() -> Result<()> {
            Err(QueueError::WouldBlock)
        }

        fn uses_question_mark() -> io::Result<()> {
            returns_queue_error()?;
            Ok(())
        }

        let err = uses_question_mark().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

        let source = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: io::Error = QueueError::StoreUnavailable {
            path: PathBuf::from("missing"),
            source,
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
