//! Bounded, cancellable background work.
//!
//! A [`BackgroundTask`] runs a future on the runtime with an explicit
//! deadline. Whoever holds the handle can cancel it or wait for its single
//! [`TaskOutcome`]; dropping the handle leaves the task running to its
//! deadline.

use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T> {
    Completed(T),
    TimedOut,
    Cancelled,
}

impl<T> TaskOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::TimedOut | Self::Cancelled => None,
        }
    }
}

pub struct BackgroundTask<T> {
    name: &'static str,
    cancel: CancellationToken,
    outcome: oneshot::Receiver<TaskOutcome<T>>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    pub fn spawn<F>(name: &'static str, timeout: Duration, work: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self::spawn_with_token(name, timeout, CancellationToken::new(), work)
    }

    /// Like [`spawn`](Self::spawn) but cancelled along with `parent`.
    pub fn spawn_with_token<F>(
        name: &'static str,
        timeout: Duration,
        parent: CancellationToken,
        work: F,
    ) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let cancel = parent.child_token();
        let (tx, rx) = oneshot::channel();
        let token = cancel.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                () = token.cancelled() => TaskOutcome::Cancelled,
                result = tokio::time::timeout(timeout, work) => match result {
                    Ok(value) => TaskOutcome::Completed(value),
                    Err(_) => TaskOutcome::TimedOut,
                },
            };
            match &outcome {
                TaskOutcome::Completed(_) => tracing::debug!(task = name, "background task completed"),
                TaskOutcome::TimedOut => tracing::warn!(task = name, ?timeout, "background task timed out"),
                TaskOutcome::Cancelled => tracing::debug!(task = name, "background task cancelled"),
            }
            // receiver may be gone; nobody is waiting then
            let _ = tx.send(outcome);
        });

        Self {
            name,
            cancel,
            outcome: rx,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits for the task's outcome.
    pub async fn join(self) -> TaskOutcome<T> {
        // a dropped sender means the task panicked
        self.outcome.await.unwrap_or(TaskOutcome::Cancelled)
    }
}
