//! Inbound/outbound totals over a slice of events.

use serde::{Deserialize, Serialize};

use stockledger_events::MovementEvent;

/// Quantity and amount totals split by movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InOutSummary {
    pub in_quantity: i64,
    pub out_quantity: i64,
    pub in_amount: f64,
    pub out_amount: f64,
}

/// Sum quantities and amounts per direction. Time-range filtering is the
/// caller's job; this folds whatever slice it is given.
pub fn in_out_summary(events: &[MovementEvent]) -> InOutSummary {
    let mut summary = InOutSummary::default();

    for event in events {
        if event.is_inbound() {
            summary.in_quantity += event.quantity;
            summary.in_amount += event.total_amount();
        } else {
            summary.out_quantity += event.quantity;
            summary.out_amount += event.total_amount();
        }
    }

    summary
}
