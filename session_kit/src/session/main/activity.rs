use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::storage::{SessionStore, StorageError};
use crate::utils::token_prefix;

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ActivityUpdate {
    pub(super) token: String,
    pub(super) last_activity_at: DateTime<Utc>,
    pub(super) expires_at: DateTime<Utc>,
}

/// Bounded queue feeding a single task that persists activity timestamps.
///
/// Enqueueing never waits. Once the sender is gone the task drains what is
/// left in the queue and exits.
pub(super) struct ActivityWorker {
    sender: Mutex<Option<mpsc::Sender<ActivityUpdate>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ActivityWorker {
    pub(super) fn spawn(store: Arc<dyn SessionStore>, capacity: usize, runtime: &Handle) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        let handle = runtime.spawn(run(store, receiver));
        tracing::debug!("Started activity worker with queue capacity {}", capacity);

        Self {
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Returns false when the update was dropped.
    pub(super) fn enqueue(&self, update: ActivityUpdate) -> bool {
        let Some(sender) = self.sender.lock().ok().and_then(|guard| guard.clone()) else {
            tracing::debug!("Activity worker stopped; dropping update");
            return false;
        };

        match sender.try_send(update) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(update)) => {
                tracing::debug!(
                    "Activity queue full; dropping update for {}",
                    token_prefix(&update.token)
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Activity queue closed; dropping update");
                false
            }
        }
    }

    /// Stops accepting updates and waits until the queued ones are stored.
    pub(super) async fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }

        let handle = self.handle.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("Activity worker failed: {}", e);
            }
        }
    }
}

async fn run(store: Arc<dyn SessionStore>, mut receiver: mpsc::Receiver<ActivityUpdate>) {
    let mut stored = 0usize;
    while let Some(update) = receiver.recv().await {
        match store
            .update_activity(&update.token, update.last_activity_at, update.expires_at)
            .await
        {
            Ok(()) => stored += 1,
            // Destroyed or rotated in the meantime
            Err(StorageError::NotFound) => {
                tracing::debug!(
                    "Session {} gone before activity update",
                    token_prefix(&update.token)
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to store activity for {}: {}",
                    token_prefix(&update.token),
                    e
                );
            }
        }
    }
    tracing::debug!("Activity worker stopped after {} updates", stored);
}
