use chrono::Utc;
use tracing::{debug, error, warn};

use crate::{AppError, AppState};
use backend_domain::{fold_deltas, reconcile, ApplySign, GroceryObservation, InventoryChanges, InventoryLedger};

/// Folds one detection's observations into the materialized inventory,
/// taking the inventory lock for the duration.
///
/// Writes are best effort: a failed bulk write is retried line by line and
/// whatever still fails is left stale. Only a failure to read the current
/// lines aborts the call.
pub async fn apply_observations(
    state: &AppState,
    observations: &[GroceryObservation],
    sign: ApplySign,
) -> Result<InventoryChanges, AppError> {
    let _guard = state.inventory_lock.lock().await;
    apply_observations_locked(state, observations, sign).await
}

/// Same as [`apply_observations`] for callers already holding
/// `state.inventory_lock`.
pub(crate) async fn apply_observations_locked(
    state: &AppState,
    observations: &[GroceryObservation],
    sign: ApplySign,
) -> Result<InventoryChanges, AppError> {
    let folded = fold_deltas(observations, sign);
    if folded.dropped > 0 {
        debug!(
            dropped = folded.dropped,
            sign = sign.as_str(),
            "ignored observations without name, location or count"
        );
        state.metrics.record_dropped(folded.dropped);
    }
    if folded.deltas.is_empty() {
        return Ok(InventoryChanges::default());
    }

    let keys = folded
        .deltas
        .iter()
        .map(|delta| delta.key.clone())
        .collect::<Vec<_>>();
    let existing = state.inventory_repo.fetch_lines(&keys).await.map_err(|err| {
        error!("failed to fetch inventory lines: {}", err);
        state.metrics.record_storage_error();
        AppError::Internal(err)
    })?;
    let existing = InventoryLedger::from_lines(existing);

    let changes = reconcile(existing.lines(), &folded.deltas, sign, Utc::now());
    for key in &changes.skipped {
        warn!("no inventory line for '{}' to subtract from, skipping", key);
    }
    write_changes(state, &changes).await;
    Ok(changes)
}

/// Upserts then prunes, falling back to one write per line when a bulk write
/// fails. Lines that still fail are counted and left stale.
pub(crate) async fn write_changes(state: &AppState, changes: &InventoryChanges) {
    if !changes.upserts.is_empty() {
        if let Err(err) = state.inventory_repo.upsert_lines(&changes.upserts).await {
            warn!(
                "bulk upsert of {} inventory lines failed, retrying individually: {}",
                changes.upserts.len(),
                err
            );
            for line in &changes.upserts {
                if let Err(err) = state
                    .inventory_repo
                    .upsert_lines(std::slice::from_ref(line))
                    .await
                {
                    warn!(
                        item = %line.item_name,
                        location = %line.storage_location,
                        "inventory line left stale: {}",
                        err
                    );
                    state.metrics.record_write_failure();
                }
            }
        }
    }

    if !changes.removals.is_empty() {
        if let Err(err) = state.inventory_repo.remove_lines(&changes.removals).await {
            warn!(
                "bulk removal of {} inventory lines failed, retrying individually: {}",
                changes.removals.len(),
                err
            );
            for key in &changes.removals {
                if let Err(err) = state
                    .inventory_repo
                    .remove_lines(std::slice::from_ref(key))
                    .await
                {
                    warn!("inventory line '{}' not pruned: {}", key, err);
                    state.metrics.record_write_failure();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use backend_domain::{InventoryKey, InventoryRepository};
    use backend_infrastructure::MemoryRepository;

    use super::*;
    use crate::test_support::{memory_state, obs, runtime_config, FlakyInventory};

    #[tokio::test]
    async fn add_then_subtract_prunes_lines() {
        let (state, repo) = memory_state();
        let batch = vec![obs("Egg", 6, "Fridge"), obs("Rice", 2, "Pantry")];
        let changes = apply_observations(&state, &batch, ApplySign::Add).await.expect("add");
        assert_eq!(changes.upserts.len(), 2);

        let changes = apply_observations(&state, &[obs("egg", 6, "FRIDGE")], ApplySign::Subtract)
            .await
            .expect("subtract");
        assert_eq!(changes.removals.len(), 1);

        let lines = repo.fetch_all_lines().await.expect("lines");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item_name, "Rice");
    }

    #[tokio::test]
    async fn noise_only_batch_is_a_no_op() {
        let (state, repo) = memory_state();
        let changes = apply_observations(&state, &[obs("", 3, "Fridge"), obs("Milk", 0, "Fridge")], ApplySign::Add)
            .await
            .expect("apply");
        assert!(changes.is_empty());
        assert!(repo.fetch_all_lines().await.expect("lines").is_empty());
    }

    #[tokio::test]
    async fn failed_bulk_write_falls_back_to_single_lines() {
        let detections = Arc::new(MemoryRepository::new());
        let inventory = Arc::new(FlakyInventory {
            inner: MemoryRepository::new(),
            poisoned: InventoryKey::new("Rice", "Pantry"),
            reject_bulk: AtomicBool::new(true),
        });
        let state = AppState::new(runtime_config(), detections.clone(), inventory.clone(), detections);

        let batch = vec![obs("Egg", 6, "Fridge"), obs("Rice", 2, "Pantry"), obs("Milk", 1, "Fridge")];
        apply_observations(&state, &batch, ApplySign::Add).await.expect("best effort");

        let mut names = inventory
            .fetch_all_lines()
            .await
            .expect("lines")
            .into_iter()
            .map(|line| line.item_name)
            .collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, vec!["Egg", "Milk"]);
        assert_eq!(state.metrics.write_failures(), 1);
    }
}
