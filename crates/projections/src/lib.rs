//! `stockledger-projections` — derived views over a tenant's published
//! events.
//!
//! Every builder here is a pure fold: it takes an ordered event slice and
//! returns a fresh value. Nothing is materialized or cached; a view exists
//! only as the return value of a query call.

pub mod documents;
pub mod flows;
pub mod inventory;
pub mod items;

pub use documents::{DocumentSummary, build_document_summaries};
pub use flows::{InOutSummary, in_out_summary};
pub use inventory::{InventoryPosition, calculate_inventory};
pub use items::{ItemSummary, build_item_summaries, current_items, inventory_by_category};

#[cfg(test)]
pub(crate) mod test_support {
    use stockledger_core::TenantId;
    use stockledger_events::{MovementEvent, MovementKind};

    /// Shorthand event for fold tests; document number defaults to
    /// `DOC-<trans_id>` and the warehouse to `WH-A`.
    pub fn movement(
        trans_id: &str,
        item_id: &str,
        kind: MovementKind,
        quantity: i64,
        unit_price: f64,
        timestamp: &str,
    ) -> MovementEvent {
        MovementEvent {
            trans_id: trans_id.to_string(),
            item_id: item_id.to_string(),
            item_name: format!("Item {item_id}"),
            kind,
            quantity,
            unit_price,
            category: "general".to_string(),
            model: "M-1".to_string(),
            unit: "pcs".to_string(),
            partner_id: "P-1".to_string(),
            partner_name: "Partner".to_string(),
            warehouse_id: "WH-A".to_string(),
            document_no: format!("DOC-{trans_id}"),
            timestamp: timestamp.to_string(),
            note: String::new(),
            tenant_id: TenantId::from("mgr-1"),
        }
    }
}
