use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    detections_recorded: AtomicU64,
    detections_removed: AtomicU64,
    observations_dropped: AtomicU64,
    inventory_rebuilds: AtomicU64,
    inventory_write_failures: AtomicU64,
    storage_errors: AtomicU64,
}

impl Metrics {
    pub fn record_detection(&self) {
        self.detections_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removal(&self) {
        self.detections_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, count: usize) {
        self.observations_dropped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_rebuild(&self) {
        self.inventory_rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.inventory_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_storage_error(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rebuilds(&self) -> u64 {
        self.inventory_rebuilds.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> u64 {
        self.inventory_write_failures.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let recorded = self.detections_recorded.load(Ordering::Relaxed);
        let removed = self.detections_removed.load(Ordering::Relaxed);
        let dropped = self.observations_dropped.load(Ordering::Relaxed);
        let rebuilds = self.inventory_rebuilds.load(Ordering::Relaxed);
        let write_failures = self.inventory_write_failures.load(Ordering::Relaxed);
        let storage_errors = self.storage_errors.load(Ordering::Relaxed);

        format!(
            "# TYPE larder_detections_recorded_total counter\n\
larder_detections_recorded_total {}\n\
# TYPE larder_detections_removed_total counter\n\
larder_detections_removed_total {}\n\
# TYPE larder_observations_dropped_total counter\n\
larder_observations_dropped_total {}\n\
# TYPE larder_inventory_rebuilds_total counter\n\
larder_inventory_rebuilds_total {}\n\
# TYPE larder_inventory_write_failures_total counter\n\
larder_inventory_write_failures_total {}\n\
# TYPE larder_storage_errors_total counter\n\
larder_storage_errors_total {}\n",
            recorded, removed, dropped, rebuilds, write_failures, storage_errors
        )
    }
}
