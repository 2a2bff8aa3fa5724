//! Item catalog view: running quantity plus latest descriptive fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stockledger_events::MovementEvent;

/// Per-item rollup derived from a tenant's published events.
///
/// Descriptive fields (`item_name`, `category`, `model`, `unit`,
/// `latest_price`) track the event with the greatest timestamp; on equal
/// timestamps the first-seen event wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub item_id: String,
    pub item_name: String,
    pub category: String,
    pub model: String,
    pub unit: String,
    pub latest_price: f64,
    pub total_quantity: i64,
    pub last_updated: String,
}

/// Fold events into per-item summaries, keyed (and ordered) by `item_id`.
pub fn build_item_summaries(events: &[MovementEvent]) -> BTreeMap<String, ItemSummary> {
    let mut items: BTreeMap<String, ItemSummary> = BTreeMap::new();

    for event in events {
        let summary = items
            .entry(event.item_id.clone())
            .or_insert_with(|| ItemSummary {
                item_id: event.item_id.clone(),
                item_name: event.item_name.clone(),
                category: event.category.clone(),
                model: event.model.clone(),
                unit: event.unit.clone(),
                latest_price: event.unit_price,
                total_quantity: 0,
                last_updated: event.timestamp.clone(),
            });

        if event.is_inbound() {
            summary.total_quantity += event.quantity;
        } else {
            summary.total_quantity -= event.quantity;
        }

        // Strictly-greater: an equal timestamp leaves the stored fields alone.
        if event.timestamp > summary.last_updated {
            summary.latest_price = event.unit_price;
            summary.last_updated = event.timestamp.clone();
            summary.item_name = event.item_name.clone();
            summary.category = event.category.clone();
            summary.model = event.model.clone();
            summary.unit = event.unit.clone();
        }
    }

    items
}

/// Items currently in stock (positive running quantity).
pub fn current_items(events: &[MovementEvent]) -> Vec<ItemSummary> {
    build_item_summaries(events)
        .into_values()
        .filter(|s| s.total_quantity > 0)
        .collect()
}

/// Positive stock summed per category, ordered by category name.
pub fn inventory_by_category(events: &[MovementEvent]) -> BTreeMap<String, i64> {
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();

    for summary in build_item_summaries(events).into_values() {
        if summary.total_quantity > 0 {
            *totals.entry(summary.category).or_insert(0) += summary.total_quantity;
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::movement;
    use stockledger_events::MovementKind;

    #[test]
    fn quantities_accumulate_by_direction() {
        let events = vec![
            movement("T1", "I1", MovementKind::In, 10, 2.0, "2026-01-01T08:00:00"),
            movement("T2", "I1", MovementKind::Out, 3, 2.0, "2026-01-01T09:00:00"),
            movement("T3", "I2", MovementKind::In, 7, 1.0, "2026-01-01T09:30:00"),
        ];

        let items = build_item_summaries(&events);
        assert_eq!(items["I1"].total_quantity, 7);
        assert_eq!(items["I2"].total_quantity, 7);
    }

    #[test]
    fn latest_fields_follow_greatest_timestamp() {
        let mut early = movement("T1", "I1", MovementKind::In, 1, 2.0, "2026-01-01T08:00:00");
        early.item_name = "Old name".into();
        let mut late = movement("T2", "I1", MovementKind::In, 1, 9.0, "2026-01-02T08:00:00");
        late.item_name = "New name".into();

        // Append order does not matter; timestamps decide.
        let items = build_item_summaries(&[late.clone(), early.clone()]);
        assert_eq!(items["I1"].item_name, "New name");
        assert_eq!(items["I1"].latest_price, 9.0);
        assert_eq!(items["I1"].last_updated, "2026-01-02T08:00:00");
    }

    #[test]
    fn equal_timestamps_keep_first_seen_fields() {
        let mut first = movement("T1", "I1", MovementKind::In, 1, 2.0, "2026-01-01T08:00:00");
        first.item_name = "First".into();
        let mut second = movement("T2", "I1", MovementKind::In, 1, 5.0, "2026-01-01T08:00:00");
        second.item_name = "Second".into();

        let items = build_item_summaries(&[first, second]);
        assert_eq!(items["I1"].item_name, "First");
        assert_eq!(items["I1"].latest_price, 2.0);
        // Quantities from both events still count.
        assert_eq!(items["I1"].total_quantity, 2);
    }

    #[test]
    fn current_items_excludes_depleted_stock() {
        let events = vec![
            movement("T1", "I1", MovementKind::In, 5, 1.0, "2026-01-01T08:00:00"),
            movement("T2", "I1", MovementKind::Out, 5, 1.0, "2026-01-01T09:00:00"),
            movement("T3", "I2", MovementKind::In, 2, 1.0, "2026-01-01T09:30:00"),
        ];

        let current = current_items(&events);
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].item_id, "I2");
    }

    #[test]
    fn category_totals_sum_positive_stock_only() {
        let mut a = movement("T1", "I1", MovementKind::In, 5, 1.0, "2026-01-01T08:00:00");
        a.category = "tools".into();
        let mut b = movement("T2", "I2", MovementKind::In, 3, 1.0, "2026-01-01T08:10:00");
        b.category = "tools".into();
        let mut c = movement("T3", "I3", MovementKind::In, 4, 1.0, "2026-01-01T08:20:00");
        c.category = "parts".into();
        let mut d = movement("T4", "I3", MovementKind::Out, 4, 1.0, "2026-01-01T08:30:00");
        d.category = "parts".into();

        let totals = inventory_by_category(&[a, b, c, d]);
        assert_eq!(totals.get("tools"), Some(&8));
        assert_eq!(totals.get("parts"), None);
    }
}
