use super::action::{ActionKind, QueuedAction};
use super::queue::OfflineQueue;
use crate::core::recovery::ErrorKind;
use crate::core::remote::{NoteDraft, RemoteWriter};
use crate::error::{QueueError, RemoteWriteError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::Instrument;

pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(8);

/// Outcome of one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Actions taken off the queue and dispatched.
    pub attempted: usize,
    pub committed: usize,
    /// Dispatched but failed; back in the queue.
    pub requeued: usize,
    /// Carried a type this build cannot dispatch; left queued untouched.
    pub unknown_kind: usize,
    /// Carried no owner id; left queued untouched.
    pub missing_owner: usize,
    /// Another pass was already running; nothing was done.
    pub skipped: bool,
}

impl ReplayReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn still_pending(&self) -> usize {
        self.requeued + self.unknown_kind + self.missing_owner
    }
}

/// Drains the offline queue into a [`RemoteWriter`].
///
/// At most one pass runs at a time. Each action gets its own bounded wait,
/// and a failure only affects that action: it goes back to the queue while
/// the rest of the pass continues.
pub struct Replayer {
    queue: Arc<OfflineQueue>,
    in_progress: AtomicBool,
    action_timeout: Duration,
    // survivors of a pass whose write-back failed; retried on the next pass
    unsaved: Mutex<Vec<QueuedAction>>,
}

struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drained actions that are not confirmed yet.
///
/// If the pass stops before [`settle`](Self::settle) (the future is dropped,
/// or an early return), dropping this puts every one of them back.
struct Unconfirmed<'a> {
    queue: &'a OfflineQueue,
    kept: Vec<QueuedAction>,
    in_flight: Option<QueuedAction>,
    remaining: VecDeque<QueuedAction>,
    settled: bool,
}

impl<'a> Unconfirmed<'a> {
    fn new(queue: &'a OfflineQueue, drained: Vec<QueuedAction>) -> Self {
        Self {
            queue,
            kept: Vec::new(),
            in_flight: None,
            remaining: drained.into(),
            settled: false,
        }
    }

    /// Writes the kept actions back behind whatever is queued now.
    fn settle(mut self) -> Result<(), QueueError> {
        self.settled = true;
        let kept = std::mem::take(&mut self.kept);
        self.queue
            .enqueue_all(kept.iter().cloned())
            .map_err(|source| QueueError::Requeue {
                actions: kept,
                source: Box::new(source),
            })
    }
}

impl Drop for Unconfirmed<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut actions = std::mem::take(&mut self.kept);
        actions.extend(self.in_flight.take());
        actions.extend(self.remaining.drain(..));
        if actions.is_empty() {
            return;
        }

        let count = actions.len();
        match self.queue.enqueue_all(actions) {
            Ok(()) => tracing::warn!(count, "replay pass interrupted; unconfirmed actions re-queued"),
            Err(e) => tracing::error!(
                count,
                error = %e,
                "replay pass interrupted and unconfirmed actions could not be re-queued"
            ),
        }
    }
}

impl Replayer {
    pub fn new(queue: Arc<OfflineQueue>) -> Self {
        Self {
            queue,
            in_progress: AtomicBool::new(false),
            action_timeout: DEFAULT_ACTION_TIMEOUT,
            unsaved: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Actions held in memory because the last write-back failed.
    pub fn unsaved(&self) -> Vec<QueuedAction> {
        self.unsaved
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub async fn replay(&self, writer: &dyn RemoteWriter) -> Result<ReplayReport, QueueError> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("replay already in progress; skipping");
            return Ok(ReplayReport::skipped());
        }
        let _pass = PassGuard(&self.in_progress);

        self.restore_unsaved()?;
        if !self.queue.has_pending()? {
            return Ok(ReplayReport::default());
        }

        let pass_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("offline_replay", %pass_id, backend = writer.name());
        self.run_pass(writer).instrument(span).await
    }

    fn restore_unsaved(&self) -> Result<(), QueueError> {
        let mut unsaved = self
            .unsaved
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if unsaved.is_empty() {
            return Ok(());
        }
        self.queue.enqueue_all(unsaved.iter().cloned())?;
        tracing::info!(count = unsaved.len(), "restored actions from a failed write-back");
        unsaved.clear();
        Ok(())
    }

    async fn run_pass(&self, writer: &dyn RemoteWriter) -> Result<ReplayReport, QueueError> {
        let mut pass = Unconfirmed::new(&self.queue, self.queue.drain_all()?);
        let mut report = ReplayReport::default();

        while let Some(action) = pass.remaining.pop_front() {
            if let ActionKind::Unknown(raw) = &action.kind {
                tracing::warn!(
                    action_type = %raw,
                    kind = %ErrorKind::UnknownAction,
                    recovery = %ErrorKind::UnknownAction.recovery(),
                    "queued action has an unknown type; keeping it"
                );
                report.unknown_kind += 1;
                pass.kept.push(action);
                continue;
            }
            if action.owner_id.trim().is_empty() {
                tracing::warn!(
                    action_type = %action.kind,
                    kind = %ErrorKind::UnknownAction,
                    recovery = %ErrorKind::UnknownAction.recovery(),
                    "queued action has no owner; keeping it"
                );
                report.missing_owner += 1;
                pass.kept.push(action);
                continue;
            }

            report.attempted += 1;
            pass.in_flight = Some(action.clone());
            let written = self.dispatch(writer, &action).await;
            pass.in_flight = None;

            match written {
                Ok(id) => {
                    tracing::debug!(action_type = %action.kind, document = %id, "replayed action");
                    report.committed += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        action_type = %action.kind,
                        kind = %e.kind,
                        error = %e.message,
                        "replay failed; re-queueing"
                    );
                    report.requeued += 1;
                    pass.kept.push(action);
                }
            }
        }

        // Anything enqueued during the pass is already in storage; the
        // survivors are appended behind it.
        if let Err(e) = pass.settle() {
            if let QueueError::Requeue { actions, .. } = &e {
                self.unsaved
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .extend(actions.iter().cloned());
            }
            tracing::error!(error = %e, "could not write replay survivors back");
            return Err(e);
        }

        tracing::info!(
            attempted = report.attempted,
            committed = report.committed,
            requeued = report.requeued,
            unknown_kind = report.unknown_kind,
            missing_owner = report.missing_owner,
            "replay pass finished"
        );
        Ok(report)
    }

    async fn dispatch(
        &self,
        writer: &dyn RemoteWriter,
        action: &QueuedAction,
    ) -> Result<String, RemoteWriteError> {
        let write = async {
            match &action.kind {
                ActionKind::Note => {
                    let note = NoteDraft::new(
                        action.payload_str("title"),
                        action.payload_str("content"),
                    );
                    writer.create_note(&action.owner_id, &note).await
                }
                ActionKind::Diagnostic => {
                    writer
                        .create_diagnostic(&action.owner_id, &action.payload)
                        .await
                }
                ActionKind::Unknown(raw) => Err(RemoteWriteError::new(
                    ErrorKind::UnknownAction,
                    format!("cannot dispatch action type {raw}"),
                )),
            }
        };

        tokio::time::timeout(self.action_timeout, write)
            .await
            .unwrap_or_else(|_| Err(RemoteWriteError::timeout(self.action_timeout)))
    }
}
