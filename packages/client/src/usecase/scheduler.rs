//! Cancellable reconnect timer.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};

/// Owns at most one pending reconnect.
///
/// When the delay elapses a unit value is delivered on the channel given at
/// construction. Scheduling again replaces the pending timer.
#[derive(Debug)]
pub struct ReconnectScheduler {
    due: mpsc::UnboundedSender<()>,
    pending: Option<JoinHandle<()>>,
}

impl ReconnectScheduler {
    pub fn new(due: mpsc::UnboundedSender<()>) -> Self {
        Self { due, pending: None }
    }

    pub fn schedule(&mut self, delay: Duration) {
        self.cancel();
        let due = self.due.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = due.send(());
        }));
        tracing::debug!("Reconnect scheduled in {:?}", delay);
    }

    /// Drop the pending reconnect, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ReconnectScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
