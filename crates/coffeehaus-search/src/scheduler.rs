//! Detached reconciliation of directory results.

use std::sync::{Arc, Mutex, PoisonError};

use coffeehaus_core::SyncInput;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::reconcile::Reconciler;

/// Accepts directory records for reconciliation without making the caller
/// wait for it.
pub trait SyncScheduler: Send + Sync {
    fn schedule(&self, inputs: Vec<SyncInput>);
}

/// Runs each scheduled batch as its own Tokio task.
///
/// Failures are logged under the task's span and never reach the caller.
/// [`DetachedSync::drain`] waits for in-flight batches, e.g. on shutdown.
pub struct DetachedSync {
    reconciler: Arc<Reconciler>,
    tasks: Mutex<JoinSet<()>>,
}

impl DetachedSync {
    #[must_use]
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self {
            reconciler,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Number of batches spawned and not yet reaped.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Waits for every batch scheduled so far.
    pub async fn drain(&self) {
        let mut tasks = std::mem::take(
            &mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "reconciliation task panicked or was cancelled");
            }
        }
    }
}

impl SyncScheduler for DetachedSync {
    fn schedule(&self, inputs: Vec<SyncInput>) {
        if inputs.is_empty() {
            return;
        }

        let reconciler = Arc::clone(&self.reconciler);
        let span = tracing::info_span!("reconcile", batch = inputs.len());
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::error!(error = %e, "reconciliation task panicked or was cancelled");
            }
        }

        tasks.spawn(
            async move {
                if let Err(e) = reconciler.reconcile(inputs).await {
                    tracing::error!(error = %e, "background reconciliation failed");
                }
            }
            .instrument(span),
        );
    }
}
