use chrono::Utc;
use tracing::{error, info};

use crate::commands::inventory_commands::write_changes;
use crate::{AppError, AppState};
use backend_domain::{
    rebuild_inventory, sort_inventory, DetectionOrder, InventoryChanges, InventoryLine,
};

/// Returns the materialized inventory, replaying detection history into it
/// first when it is empty.
pub async fn list_inventory(state: &AppState) -> Result<Vec<InventoryLine>, AppError> {
    let mut lines = fetch_all_lines(state).await?;
    if !lines.is_empty() {
        sort_inventory(&mut lines);
        return Ok(lines);
    }

    let _guard = state.inventory_lock.lock().await;
    // Another request may have rebuilt while we waited.
    let mut lines = fetch_all_lines(state).await?;
    if !lines.is_empty() {
        sort_inventory(&mut lines);
        return Ok(lines);
    }

    let detections = state
        .detection_repo
        .list_detections(DetectionOrder::InsertionAsc)
        .await
        .map_err(|err| {
            error!("failed to load detection history: {}", err);
            state.metrics.record_storage_error();
            AppError::Internal(err)
        })?;
    if detections.is_empty() {
        return Ok(Vec::new());
    }

    let rebuilt = rebuild_inventory(&detections, Utc::now());
    if rebuilt.is_empty() {
        return Ok(rebuilt);
    }
    let changes = InventoryChanges {
        upserts: rebuilt.clone(),
        ..InventoryChanges::default()
    };
    write_changes(state, &changes).await;
    state.metrics.record_rebuild();
    info!(
        lines = rebuilt.len(),
        detections = detections.len(),
        "inventory rebuilt from detection history"
    );
    Ok(rebuilt)
}

async fn fetch_all_lines(state: &AppState) -> Result<Vec<InventoryLine>, AppError> {
    state.inventory_repo.fetch_all_lines().await.map_err(|err| {
        error!("failed to fetch inventory: {}", err);
        state.metrics.record_storage_error();
        AppError::Internal(err)
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use backend_domain::{
        ApplySign, DetectionEvent, DetectionRepository, InventoryKey, InventoryRepository,
    };
    use backend_infrastructure::MemoryRepository;
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::commands::inventory_commands::apply_observations;
    use crate::test_support::{memory_state, obs, runtime_config, FlakyInventory};

    fn counts(lines: &[InventoryLine]) -> BTreeMap<String, i64> {
        lines
            .iter()
            .map(|line| {
                let key = line.key().map(|k| k.as_str().to_string()).unwrap_or_default();
                (key, line.item_count)
            })
            .collect()
    }

    async fn seed_history(state: &AppState, repo: &MemoryRepository) {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("date");
        let batches = vec![
            vec![obs("Egg", 6, "Fridge"), obs("Rice", 1, "Pantry")],
            vec![obs("egg", 3, "fridge"), obs("", 9, "Fridge")],
            vec![obs("Tomato", 2, "Fridge"), obs("tomato", 1, "FRIDGE")],
        ];
        for (offset, groceries) in batches.into_iter().enumerate() {
            let mut detection = DetectionEvent::new(base, groceries);
            detection.created_at = base + Duration::seconds(offset as i64);
            repo.insert_detection(&detection).await.expect("insert");
            apply_observations(state, &detection.groceries, ApplySign::Add)
                .await
                .expect("apply");
        }
    }

    #[tokio::test]
    async fn rebuild_reproduces_incremental_counts() {
        let (state, repo) = memory_state();
        seed_history(&state, &repo).await;
        let incremental = list_inventory(&state).await.expect("list");
        assert_eq!(state.metrics.rebuilds(), 0);

        repo.clear_inventory().await;
        let rebuilt = list_inventory(&state).await.expect("rebuild");
        assert_eq!(state.metrics.rebuilds(), 1);
        assert_eq!(counts(&rebuilt), counts(&incremental));
        assert_eq!(counts(&rebuilt).get("egg|fridge"), Some(&9));
    }

    #[tokio::test]
    async fn repeated_listing_does_not_duplicate() {
        let (state, repo) = memory_state();
        seed_history(&state, &repo).await;
        repo.clear_inventory().await;

        let first = list_inventory(&state).await.expect("first");
        let second = list_inventory(&state).await.expect("second");
        assert_eq!(first, second);
        assert_eq!(state.metrics.rebuilds(), 1);
        assert_eq!(repo.fetch_all_lines().await.expect("stored").len(), first.len());
    }

    #[tokio::test]
    async fn empty_history_yields_empty_inventory() {
        let (state, _repo) = memory_state();
        let lines = list_inventory(&state).await.expect("list");
        assert!(lines.is_empty());
        assert_eq!(state.metrics.rebuilds(), 0);
    }

    #[tokio::test]
    async fn listing_is_sorted_by_name() {
        let (state, repo) = memory_state();
        seed_history(&state, &repo).await;
        let names = list_inventory(&state)
            .await
            .expect("list")
            .into_iter()
            .map(|line| line.item_name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Egg", "Rice", "Tomato"]);
    }

    #[tokio::test]
    async fn concurrent_readers_rebuild_once() {
        let (state, repo) = memory_state();
        seed_history(&state, &repo).await;
        let incremental = list_inventory(&state).await.expect("list");
        repo.clear_inventory().await;

        let (a, b, c, d) = tokio::join!(
            list_inventory(&state),
            list_inventory(&state),
            list_inventory(&state),
            list_inventory(&state),
        );
        for lines in [a, b, c, d] {
            assert_eq!(counts(&lines.expect("list")), counts(&incremental));
        }
        assert_eq!(state.metrics.rebuilds(), 1);
        assert_eq!(
            counts(&repo.fetch_all_lines().await.expect("stored")),
            counts(&incremental)
        );
    }

    #[tokio::test]
    async fn rebuild_retries_lines_one_by_one() {
        let detections = Arc::new(MemoryRepository::new());
        let inventory = Arc::new(FlakyInventory {
            inner: MemoryRepository::new(),
            poisoned: InventoryKey::new("Rice", "Pantry"),
            reject_bulk: AtomicBool::new(true),
        });
        let state = AppState::new(
            runtime_config(),
            detections.clone(),
            inventory.clone(),
            detections.clone(),
        );
        let detection = DetectionEvent::new(
            Utc::now(),
            vec![obs("Egg", 6, "Fridge"), obs("Rice", 2, "Pantry"), obs("Milk", 1, "Fridge")],
        );
        detections.insert_detection(&detection).await.expect("insert");

        let rebuilt = list_inventory(&state).await.expect("rebuild");
        assert_eq!(rebuilt.len(), 3);
        assert_eq!(state.metrics.write_failures(), 1);

        let mut stored = inventory
            .fetch_all_lines()
            .await
            .expect("stored")
            .into_iter()
            .map(|line| line.item_name)
            .collect::<Vec<_>>();
        stored.sort();
        assert_eq!(stored, vec!["Egg", "Milk"]);
    }
}
