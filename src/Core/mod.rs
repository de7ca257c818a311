pub mod SharedMemory;
pub mod lock;
pub mod queue;

pub use queue::{Mode, ShmQueue};
pub use SharedMemory::{MappedFile, RawHandle, SharedMemoryBackend};
