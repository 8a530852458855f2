use super::action::QueuedAction;
use super::storage::KeyValueStore;
use crate::core::recovery::ErrorKind;
use crate::error::QueueError;
use std::sync::{Arc, Mutex};

pub const QUEUE_KEY: &str = "offline_action_queue";
pub const CORRUPT_BACKUP_KEY: &str = "offline_action_queue.corrupt";

/// Durable FIFO of writes that still have to reach the remote store.
///
/// The stored value is always the full list: every mutation loads it,
/// changes it and writes the whole list back.
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
    // serializes load-modify-save so a drain cannot interleave with an enqueue
    guard: Mutex<()>,
}

impl OfflineQueue {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            guard: Mutex::new(()),
        }
    }

    pub fn enqueue(&self, action: QueuedAction) -> Result<(), QueueError> {
        self.enqueue_all(std::iter::once(action))
    }

    /// Appends several actions in iteration order with a single save.
    pub fn enqueue_all(
        &self,
        actions: impl IntoIterator<Item = QueuedAction>,
    ) -> Result<(), QueueError> {
        let _guard = self
            .guard
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut list = self.load()?;
        let before = list.len();
        list.extend(actions);
        if list.len() == before {
            return Ok(());
        }
        self.save(&list)?;
        tracing::debug!(
            added = list.len() - before,
            pending = list.len(),
            "offline queue appended"
        );
        Ok(())
    }

    pub fn has_pending(&self) -> Result<bool, QueueError> {
        Ok(!self.peek_all()?.is_empty())
    }

    pub fn len(&self) -> Result<usize, QueueError> {
        Ok(self.peek_all()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(!self.has_pending()?)
    }

    /// Read-only snapshot; does not clear anything.
    pub fn peek_all(&self) -> Result<Vec<QueuedAction>, QueueError> {
        let _guard = self
            .guard
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.load()
    }

    /// Returns every pending action and resets the stored list to empty.
    pub fn drain_all(&self) -> Result<Vec<QueuedAction>, QueueError> {
        let _guard = self
            .guard
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let list = self.load()?;
        self.save(&[])?;
        Ok(list)
    }

    fn load(&self) -> Result<Vec<QueuedAction>, QueueError> {
        let Some(raw) = self.store.get(QUEUE_KEY)? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str(&raw) {
            Ok(list) => Ok(list),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kind = %ErrorKind::CorruptStorage,
                    recovery = %ErrorKind::CorruptStorage.recovery(),
                    backup_key = CORRUPT_BACKUP_KEY,
                    bytes = raw.len(),
                    "offline queue unreadable; backing it up and starting empty"
                );
                self.store.set(CORRUPT_BACKUP_KEY, &raw)?;
                self.save(&[])?;
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, list: &[QueuedAction]) -> Result<(), QueueError> {
        let serialized = serde_json::to_string(list)?;
        self.store.set(QUEUE_KEY, &serialized)
    }
}
