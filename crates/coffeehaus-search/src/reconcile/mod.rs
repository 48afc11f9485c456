//! Reconciliation of directory records into the shop store.
//!
//! A batch is de-duplicated, compared against one bulk snapshot read, and
//! written as one batched insert plus fixed-size update chunks. Ids that lose
//! an insert race to a concurrent batch are re-snapshotted and routed through
//! the update path. Reconciling unchanged input again performs no writes.

mod plan;

use std::collections::HashSet;
use std::fmt;
use std::slice;
use std::sync::Arc;

use chrono::Utc;
use coffeehaus_core::SyncInput;

use crate::cache::RecordCache;
use crate::error::{ReconcileError, WriteStage};
use crate::ports::ShopStore;

use plan::{dedupe_last_wins, plan, SyncPlan};

pub const DEFAULT_UPDATE_CHUNK_SIZE: usize = 25;

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Ids another writer created between our snapshot read and insert.
    pub conflicted: usize,
}

/// Decision taken for a single record by [`Reconciler::sync_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        };
        f.write_str(outcome)
    }
}

pub struct Reconciler {
    store: Arc<dyn ShopStore>,
    cache: Arc<RecordCache>,
    update_chunk_size: usize,
}

impl Reconciler {
    /// A zero `update_chunk_size` falls back to [`DEFAULT_UPDATE_CHUNK_SIZE`].
    #[must_use]
    pub fn new(store: Arc<dyn ShopStore>, cache: Arc<RecordCache>, update_chunk_size: usize) -> Self {
        Self {
            store,
            cache,
            update_chunk_size: if update_chunk_size == 0 {
                DEFAULT_UPDATE_CHUNK_SIZE
            } else {
                update_chunk_size
            },
        }
    }

    /// Reconciles a batch of directory records into the store.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::Snapshot`] if the snapshot read fails. Nothing is
    ///   written.
    /// - [`ReconcileError::PartialFailure`] if a write fails. Earlier writes
    ///   stay applied.
    pub async fn reconcile(
        &self,
        inputs: Vec<SyncInput>,
    ) -> Result<ReconcileReport, ReconcileError> {
        if inputs.is_empty() {
            return Ok(ReconcileReport::default());
        }

        let inputs = dedupe_last_wins(inputs);
        let ids: Vec<String> = inputs.iter().map(|i| i.external_id.clone()).collect();
        let snapshots = self
            .store
            .snapshots(&ids)
            .await
            .map_err(|source| ReconcileError::Snapshot {
                count: ids.len(),
                source,
            })?;

        let report = self.apply(plan(inputs, &snapshots)).await?;
        tracing::info!(
            batch = ids.len(),
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            conflicted = report.conflicted,
            "reconciliation complete"
        );
        Ok(report)
    }

    /// Reconciles one record without batching. Decisions match
    /// [`Reconciler::reconcile`] for the same input.
    ///
    /// # Errors
    ///
    /// Same as [`Reconciler::reconcile`].
    pub async fn sync_one(&self, input: SyncInput) -> Result<SyncOutcome, ReconcileError> {
        let snapshots = self
            .store
            .snapshots(slice::from_ref(&input.external_id))
            .await
            .map_err(|source| ReconcileError::Snapshot { count: 1, source })?;

        let external_id = input.external_id.clone();
        let report = self.apply(plan(vec![input], &snapshots)).await?;
        let outcome = if report.created > 0 {
            SyncOutcome::Created
        } else if report.updated > 0 {
            SyncOutcome::Updated
        } else {
            SyncOutcome::Unchanged
        };

        tracing::info!(place_id = %external_id, %outcome, "single record synced");
        Ok(outcome)
    }

    async fn apply(&self, sync_plan: SyncPlan) -> Result<ReconcileReport, ReconcileError> {
        let SyncPlan {
            to_create,
            mut to_update,
            unchanged,
        } = sync_plan;
        let mut report = ReconcileReport {
            unchanged,
            ..ReconcileReport::default()
        };
        let synced_at = Utc::now();
        let mut touched: Vec<String> = Vec::new();

        if !to_create.is_empty() {
            let outcome = self
                .store
                .insert_shops(&to_create, synced_at)
                .await
                .map_err(|source| ReconcileError::PartialFailure {
                    completed: 0,
                    stage: WriteStage::Insert,
                    source,
                })?;
            report.created = outcome.inserted.len();
            report.conflicted = outcome.conflicted.len();
            touched.extend(outcome.inserted);

            if !outcome.conflicted.is_empty() {
                let recheck = self
                    .recheck_conflicts(to_create, &outcome.conflicted, report.created)
                    .await?;
                report.unchanged += recheck.unchanged;
                to_update.extend(recheck.to_update);
            }
        }

        for chunk in to_update.chunks(self.update_chunk_size) {
            let written = self
                .store
                .update_shops(chunk, synced_at)
                .await
                .map_err(|source| ReconcileError::PartialFailure {
                    completed: report.created + report.updated,
                    stage: WriteStage::Update,
                    source,
                })?;
            report.updated += written;
            touched.extend(chunk.iter().map(|input| input.external_id.clone()));
        }

        self.refresh_cache(&touched).await;
        Ok(report)
    }

    /// Plans the inputs whose insert conflicted against fresh snapshots.
    async fn recheck_conflicts(
        &self,
        created_inputs: Vec<SyncInput>,
        conflicted: &[String],
        completed: usize,
    ) -> Result<SyncPlan, ReconcileError> {
        tracing::debug!(count = conflicted.len(), "insert conflicts; rechecking as updates");

        let snapshots = self.store.snapshots(conflicted).await.map_err(|source| {
            ReconcileError::PartialFailure {
                completed,
                stage: WriteStage::ConflictRecheck,
                source,
            }
        })?;

        let conflicted: HashSet<&str> = conflicted.iter().map(String::as_str).collect();
        let inputs: Vec<SyncInput> = created_inputs
            .into_iter()
            .filter(|input| conflicted.contains(input.external_id.as_str()))
            .collect();

        let recheck = plan(inputs, &snapshots);
        for missing in &recheck.to_create {
            tracing::warn!(
                place_id = %missing.external_id,
                "insert conflicted but no stored row was found; skipping"
            );
        }
        Ok(recheck)
    }

    async fn refresh_cache(&self, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        match self.store.find_by_external_ids(ids).await {
            Ok(shops) => {
                for shop in shops {
                    self.cache.put_shop(shop).await;
                }
            }
            Err(e) => {
                tracing::warn!(count = ids.len(), error = %e, "cache refresh after sync failed");
            }
        }
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("update_chunk_size", &self.update_chunk_size)
            .finish_non_exhaustive()
    }
}

