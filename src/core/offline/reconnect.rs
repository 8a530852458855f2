use super::replay::{ReplayReport, Replayer};
use crate::core::remote::RemoteWriter;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Connectivity change reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectEvent {
    Online,
    Offline,
}

/// Runs a replay pass every time connectivity comes back.
///
/// Events that pile up while a pass runs are coalesced: only the latest state
/// matters, so a burst of `Online` events produces one extra pass at most.
pub struct ReconnectListener {
    replayer: Arc<Replayer>,
    writer: Arc<dyn RemoteWriter>,
    events: mpsc::Receiver<ReconnectEvent>,
    cancel: CancellationToken,
}

impl ReconnectListener {
    pub fn new(
        replayer: Arc<Replayer>,
        writer: Arc<dyn RemoteWriter>,
        events: mpsc::Receiver<ReconnectEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            replayer,
            writer,
            events,
            cancel,
        }
    }

    /// Listens until cancelled or the sender side is dropped.
    /// Returns the reports of every pass that ran.
    pub async fn run(mut self) -> Vec<ReplayReport> {
        let mut reports = Vec::new();
        loop {
            let event = tokio::select! {
                () = self.cancel.cancelled() => break,
                event = self.events.recv() => match event {
                    Some(event) => self.latest_after(event),
                    None => break,
                },
            };

            if event == ReconnectEvent::Offline {
                tracing::debug!("connectivity lost");
                continue;
            }

            match self.replayer.replay(self.writer.as_ref()).await {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!(error = %e, "replay after reconnect failed"),
            }
        }
        reports
    }

    fn latest_after(&mut self, mut event: ReconnectEvent) -> ReconnectEvent {
        while let Ok(next) = self.events.try_recv() {
            event = next;
        }
        event
    }
}
