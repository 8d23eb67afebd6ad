use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::entities::{DetectionEvent, GroceryObservation, InventoryChanges, InventoryLine, DEFAULT_EMOJI};
use crate::utils::natural_cmp;
use crate::value_objects::{ApplySign, InventoryKey};

/// Net signed contribution of one batch to a single inventory key.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryDelta {
    pub key: InventoryKey,
    pub item_name: String,
    pub storage_location: String,
    pub emoji: Option<String>,
    pub delta: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoldedDeltas {
    pub deltas: Vec<InventoryDelta>,
    pub dropped: usize,
}

/// Collapses a batch of observations into one delta per key.
///
/// Observations without a key (blank name or location, zero count) are
/// counted in `dropped` and otherwise ignored. For repeated keys the first
/// spelling wins and the first non-empty emoji is kept.
pub fn fold_deltas(observations: &[GroceryObservation], sign: ApplySign) -> FoldedDeltas {
    let mut by_key: BTreeMap<InventoryKey, InventoryDelta> = BTreeMap::new();
    let mut dropped = 0;
    for observation in observations {
        let Some(key) = observation.inventory_key() else {
            dropped += 1;
            continue;
        };
        let amount = i64::from(observation.item_count) * sign.factor();
        let entry = by_key.entry(key.clone()).or_insert_with(|| InventoryDelta {
            key,
            item_name: observation.item_name.trim().to_string(),
            storage_location: observation.storage_location.trim().to_string(),
            emoji: None,
            delta: 0,
        });
        entry.delta = entry.delta.saturating_add(amount);
        if entry.emoji.is_none() {
            entry.emoji = observation
                .emoji
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(ToString::to_string);
        }
    }
    FoldedDeltas {
        deltas: by_key.into_values().collect(),
        dropped,
    }
}

/// Applies deltas on top of the current lines and reports what to write.
///
/// Lines are only created on the additive path; a subtraction with no line
/// behind it lands in `skipped`. Any line whose count ends at or below zero
/// is reported as a removal instead of an upsert.
pub fn reconcile(
    existing: &HashMap<InventoryKey, InventoryLine>,
    deltas: &[InventoryDelta],
    sign: ApplySign,
    now: DateTime<Utc>,
) -> InventoryChanges {
    let mut changes = InventoryChanges::default();
    for delta in deltas {
        let line = match existing.get(&delta.key) {
            Some(current) => {
                let mut line = current.clone();
                line.item_count = line.item_count.saturating_add(delta.delta);
                if line.emoji.trim().is_empty() {
                    if let Some(emoji) = &delta.emoji {
                        line.emoji = emoji.clone();
                    }
                }
                line.updated_at = now;
                line
            }
            None if sign == ApplySign::Add => InventoryLine {
                item_name: delta.item_name.clone(),
                storage_location: delta.storage_location.clone(),
                item_count: delta.delta,
                emoji: delta
                    .emoji
                    .clone()
                    .unwrap_or_else(|| DEFAULT_EMOJI.to_string()),
                created_at: now,
                updated_at: now,
            },
            None => {
                changes.skipped.push(delta.key.clone());
                continue;
            }
        };
        if line.item_count <= 0 {
            if existing.contains_key(&delta.key) {
                changes.removals.push(delta.key.clone());
            }
        } else {
            changes.upserts.push(line);
        }
    }
    changes
}

/// In-memory inventory keyed case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct InventoryLedger {
    lines: HashMap<InventoryKey, InventoryLine>,
}

impl InventoryLedger {
    pub fn from_lines(lines: impl IntoIterator<Item = InventoryLine>) -> Self {
        let lines = lines
            .into_iter()
            .filter_map(|line| line.key().map(|key| (key, line)))
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &HashMap<InventoryKey, InventoryLine> {
        &self.lines
    }

    pub fn apply(
        &mut self,
        observations: &[GroceryObservation],
        sign: ApplySign,
        now: DateTime<Utc>,
    ) -> InventoryChanges {
        let folded = fold_deltas(observations, sign);
        let changes = reconcile(&self.lines, &folded.deltas, sign, now);
        self.commit(&changes);
        changes
    }

    pub fn commit(&mut self, changes: &InventoryChanges) {
        for line in &changes.upserts {
            if let Some(key) = line.key() {
                self.lines.insert(key, line.clone());
            }
        }
        for key in &changes.removals {
            self.lines.remove(key);
        }
    }

    pub fn into_sorted_lines(self) -> Vec<InventoryLine> {
        let mut lines = self.lines.into_values().collect::<Vec<_>>();
        sort_inventory(&mut lines);
        lines
    }
}

/// Replays every detection, oldest first, into a fresh inventory.
pub fn rebuild_inventory(detections: &[DetectionEvent], now: DateTime<Utc>) -> Vec<InventoryLine> {
    let mut ledger = InventoryLedger::default();
    for detection in detections {
        ledger.apply(&detection.groceries, ApplySign::Add, now);
    }
    ledger.into_sorted_lines()
}

pub fn sort_inventory(lines: &mut [InventoryLine]) {
    lines.sort_by(|a, b| {
        natural_cmp(&a.item_name, &b.item_name)
            .then_with(|| natural_cmp(&a.storage_location, &b.storage_location))
    });
}
