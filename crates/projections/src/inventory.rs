//! Stock position view: quantity and weighted-average price per
//! `(warehouse, item)` pair.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stockledger_events::MovementEvent;

/// Current stock of one item in one warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryPosition {
    pub item_id: String,
    pub warehouse_id: String,
    pub quantity: i64,
    /// Weighted average of inbound unit prices.
    pub avg_price: f64,
}

/// Fold events into stock positions grouped by warehouse.
///
/// Inbound movements fold the event price into the running weighted
/// average; outbound movements only decrement the quantity. Positions whose
/// quantity ends up at or below zero are filtered from the result, not
/// reported negative.
pub fn calculate_inventory(
    events: &[MovementEvent],
) -> BTreeMap<String, Vec<InventoryPosition>> {
    let mut positions: BTreeMap<(String, String), InventoryPosition> = BTreeMap::new();

    for event in events {
        let key = (event.warehouse_id.clone(), event.item_id.clone());
        let position = positions.entry(key).or_insert_with(|| InventoryPosition {
            item_id: event.item_id.clone(),
            warehouse_id: event.warehouse_id.clone(),
            quantity: 0,
            avg_price: 0.0,
        });

        if event.is_inbound() {
            let total_value =
                position.quantity as f64 * position.avg_price + event.total_amount();
            position.quantity += event.quantity;
            // Guards divide-by-zero when prior outbound drove the quantity
            // negative; the average stays untouched until stock is positive.
            if position.quantity > 0 {
                position.avg_price = total_value / position.quantity as f64;
            }
        } else {
            position.quantity -= event.quantity;
        }
    }

    let mut by_warehouse: BTreeMap<String, Vec<InventoryPosition>> = BTreeMap::new();
    for ((warehouse_id, _), position) in positions {
        if position.quantity > 0 {
            by_warehouse.entry(warehouse_id).or_default().push(position);
        }
    }

    by_warehouse
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::movement;
    use stockledger_events::MovementKind;

    #[test]
    fn inbound_prices_form_weighted_average() {
        let events = vec![
            movement("T1", "I1", MovementKind::In, 10, 2.0, "2026-01-01T08:00:00"),
            movement("T2", "I1", MovementKind::In, 10, 4.0, "2026-01-01T09:00:00"),
        ];

        let inventory = calculate_inventory(&events);
        let positions = &inventory["WH-A"];
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].quantity, 20);
        assert_eq!(positions[0].avg_price, 3.0);
    }

    #[test]
    fn oversold_positions_are_filtered_not_negative() {
        let events = vec![
            movement("T1", "I1", MovementKind::In, 10, 2.0, "2026-01-01T08:00:00"),
            movement("T2", "I1", MovementKind::In, 10, 4.0, "2026-01-01T09:00:00"),
            movement("T3", "I1", MovementKind::Out, 25, 0.0, "2026-01-01T10:00:00"),
        ];

        let inventory = calculate_inventory(&events);
        assert!(inventory.is_empty());
    }

    #[test]
    fn outbound_leaves_average_price_unchanged() {
        let events = vec![
            movement("T1", "I1", MovementKind::In, 10, 2.0, "2026-01-01T08:00:00"),
            movement("T2", "I1", MovementKind::Out, 4, 99.0, "2026-01-01T09:00:00"),
        ];

        let inventory = calculate_inventory(&events);
        let position = &inventory["WH-A"][0];
        assert_eq!(position.quantity, 6);
        assert_eq!(position.avg_price, 2.0);
    }

    #[test]
    fn positions_are_grouped_per_warehouse() {
        let mut a = movement("T1", "I1", MovementKind::In, 5, 1.0, "2026-01-01T08:00:00");
        a.warehouse_id = "WH-A".into();
        let mut b = movement("T2", "I1", MovementKind::In, 3, 1.0, "2026-01-01T09:00:00");
        b.warehouse_id = "WH-B".into();

        let inventory = calculate_inventory(&[a, b]);
        assert_eq!(inventory["WH-A"][0].quantity, 5);
        assert_eq!(inventory["WH-B"][0].quantity, 3);
    }

    #[test]
    fn average_recovers_after_negative_stock() {
        // Sell into the negative first, then restock: the first inbound that
        // leaves the quantity non-positive must not divide by zero.
        let events = vec![
            movement("T1", "I1", MovementKind::Out, 5, 0.0, "2026-01-01T08:00:00"),
            movement("T2", "I1", MovementKind::In, 3, 2.0, "2026-01-01T09:00:00"),
            movement("T3", "I1", MovementKind::In, 4, 2.0, "2026-01-01T10:00:00"),
        ];

        let inventory = calculate_inventory(&events);
        let position = &inventory["WH-A"][0];
        assert_eq!(position.quantity, 2);
        assert!(position.avg_price.is_finite());
    }
}
