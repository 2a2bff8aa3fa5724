//! The inventory movement event.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockledger_core::{LedgerError, LedgerResult, TenantId};

use crate::timestamp;

/// Direction of an inventory movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Goods received into a warehouse.
    In,
    /// Goods issued out of a warehouse.
    Out,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            other => Err(LedgerError::invalid_type(other)),
        }
    }
}

/// One inventory movement.
///
/// Events are **immutable facts**: once durably appended to a tenant's
/// ledger they are never mutated or removed. All derived state (stock
/// positions, item catalog, document totals) is recomputed by folding over
/// a tenant's published events.
///
/// All identifier fields are opaque caller-supplied strings; `timestamp` is
/// an ISO-8601 string and is compared lexicographically throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementEvent {
    /// Unique per tenant.
    pub trans_id: String,
    pub item_id: String,
    pub item_name: String,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: i64,
    pub unit_price: f64,
    pub category: String,
    pub model: String,
    pub unit: String,
    /// Supplier (inbound) or customer (outbound).
    pub partner_id: String,
    pub partner_name: String,
    pub warehouse_id: String,
    /// Groups several movements into one document; empty means none.
    pub document_no: String,
    pub timestamp: String,
    pub note: String,
    pub tenant_id: TenantId,
}

impl MovementEvent {
    pub fn total_amount(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }

    pub fn is_inbound(&self) -> bool {
        self.kind == MovementKind::In
    }

    pub fn is_outbound(&self) -> bool {
        self.kind == MovementKind::Out
    }

    /// Field-validity rules shared by live append and recovery integrity
    /// validation.
    ///
    /// Text fields must stay clear of the WAL record delimiters (`|` and
    /// newline); a record containing either could not round-trip through
    /// the line format.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.tenant_id.is_empty() {
            return Err(LedgerError::invalid_parameter("tenant id cannot be empty"));
        }
        if self.trans_id.is_empty() || self.item_id.is_empty() {
            return Err(LedgerError::invalid_parameter(
                "transaction id and item id cannot be empty",
            ));
        }
        if self.quantity <= 0 {
            return Err(LedgerError::invalid_parameter("quantity must be positive"));
        }
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return Err(LedgerError::invalid_parameter(
                "unit price must be non-negative",
            ));
        }
        if !self.timestamp.is_empty() && !timestamp::is_valid(&self.timestamp) {
            return Err(LedgerError::invalid_parameter(
                "timestamp must be ISO-8601 (YYYY-MM-DDTHH:MM:SS...)",
            ));
        }
        for (name, value) in self.text_fields() {
            if value.contains('|') || value.contains('\n') {
                return Err(LedgerError::InvalidParameter(format!(
                    "{name} must not contain '|' or newline"
                )));
            }
        }
        Ok(())
    }

    fn text_fields(&self) -> [(&'static str, &str); 12] {
        [
            ("tenant_id", self.tenant_id.as_str()),
            ("trans_id", &self.trans_id),
            ("item_id", &self.item_id),
            ("item_name", &self.item_name),
            ("category", &self.category),
            ("model", &self.model),
            ("unit", &self.unit),
            ("partner_id", &self.partner_id),
            ("partner_name", &self.partner_name),
            ("warehouse_id", &self.warehouse_id),
            ("document_no", &self.document_no),
            ("note", &self.note),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_event() -> MovementEvent {
        MovementEvent {
            trans_id: "TXN001".into(),
            item_id: "ITEM-1".into(),
            item_name: "Widget".into(),
            kind: MovementKind::In,
            quantity: 5,
            unit_price: 2.5,
            category: "tools".into(),
            model: "W-1".into(),
            unit: "pcs".into(),
            partner_id: "SUP-1".into(),
            partner_name: "Acme".into(),
            warehouse_id: "WH-A".into(),
            document_no: "DOC-1".into(),
            timestamp: "2026-01-05T10:00:00.000Z".into(),
            note: String::new(),
            tenant_id: TenantId::from("mgr-1"),
        }
    }

    #[test]
    fn valid_event_passes() {
        assert!(valid_event().validate().is_ok());
    }

    #[test]
    fn empty_ids_are_rejected() {
        let mut e = valid_event();
        e.trans_id.clear();
        assert!(matches!(
            e.validate(),
            Err(LedgerError::InvalidParameter(_))
        ));

        let mut e = valid_event();
        e.tenant_id = TenantId::default();
        assert!(e.validate().is_err());
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let mut e = valid_event();
        e.quantity = 0;
        assert!(e.validate().is_err());
        e.quantity = -3;
        assert!(e.validate().is_err());
    }

    #[test]
    fn delimiter_in_field_is_rejected() {
        let mut e = valid_event();
        e.note = "a|b".into();
        assert!(e.validate().is_err());

        let mut e = valid_event();
        e.item_name = "line\nbreak".into();
        assert!(e.validate().is_err());
    }

    #[test]
    fn kind_parses_and_displays() {
        assert_eq!("in".parse::<MovementKind>().unwrap(), MovementKind::In);
        assert_eq!("out".parse::<MovementKind>().unwrap(), MovementKind::Out);
        assert!(matches!(
            "transfer".parse::<MovementKind>(),
            Err(LedgerError::InvalidTransactionType(_))
        ));
        assert_eq!(MovementKind::Out.to_string(), "out");
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&valid_event()).unwrap();
        assert!(json.contains("\"type\":\"in\""));
    }
}
