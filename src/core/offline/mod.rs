//! Offline action queue.
//!
//! Writes that fail to reach the remote store are persisted as
//! [`QueuedAction`]s under a single storage key and replayed in FIFO order
//! once connectivity returns.

pub mod action;
pub mod queue;
pub mod reconnect;
pub mod replay;
pub mod storage;

pub use action::{ActionKind, QueuedAction};
pub use queue::{CORRUPT_BACKUP_KEY, OfflineQueue, QUEUE_KEY};
pub use reconnect::{ReconnectEvent, ReconnectListener};
pub use replay::{ReplayReport, Replayer};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
