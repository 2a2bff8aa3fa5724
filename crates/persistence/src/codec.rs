//! WAL line codec.
//!
//! One record per line, `|`-delimited, exactly 16 fields:
//!
//! ```text
//! timestamp|tenant_id|trans_id|item_id|item_name|type|quantity|unit_price|category|model|unit|partner_id|partner_name|warehouse_id|document_no|note
//! ```
//!
//! The leading timestamp is the WAL receipt time, not the caller-supplied
//! event timestamp; decoding stamps it back into the event. `unit_price`
//! carries exactly two fractional digits. Field content must not contain
//! `|` or newlines — event validation enforces that before anything is
//! encoded.

use core::str::FromStr;

use thiserror::Error;

use stockledger_core::TenantId;
use stockledger_events::{MovementEvent, MovementKind};

pub const FIELD_COUNT: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {FIELD_COUNT} fields, found {0}")]
    FieldCount(usize),

    #[error("unparseable quantity: {0}")]
    Quantity(String),

    #[error("unparseable unit price: {0}")]
    UnitPrice(String),

    #[error("unknown movement type: {0}")]
    Kind(String),
}

/// Serialize one event as a WAL line (no trailing newline).
pub fn encode_line(receipt_timestamp: &str, tenant_id: &TenantId, event: &MovementEvent) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}|{}|{:.2}|{}|{}|{}|{}|{}|{}|{}|{}",
        receipt_timestamp,
        tenant_id,
        event.trans_id,
        event.item_id,
        event.item_name,
        event.kind,
        event.quantity,
        event.unit_price,
        event.category,
        event.model,
        event.unit,
        event.partner_id,
        event.partner_name,
        event.warehouse_id,
        event.document_no,
        event.note,
    )
}

/// Parse one WAL line back into `(tenant_id, event)`.
///
/// The event's `timestamp` is the line's receipt timestamp and its
/// `tenant_id` is the line's second field.
pub fn decode_line(line: &str) -> Result<(TenantId, MovementEvent), DecodeError> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::FieldCount(fields.len()));
    }

    let quantity = i64::from_str(fields[6])
        .map_err(|_| DecodeError::Quantity(fields[6].to_string()))?;
    let unit_price = f64::from_str(fields[7])
        .map_err(|_| DecodeError::UnitPrice(fields[7].to_string()))?;
    let kind = MovementKind::from_str(fields[5])
        .map_err(|_| DecodeError::Kind(fields[5].to_string()))?;

    let tenant_id = TenantId::from(fields[1]);
    let event = MovementEvent {
        trans_id: fields[2].to_string(),
        item_id: fields[3].to_string(),
        item_name: fields[4].to_string(),
        kind,
        quantity,
        unit_price,
        category: fields[8].to_string(),
        model: fields[9].to_string(),
        unit: fields[10].to_string(),
        partner_id: fields[11].to_string(),
        partner_name: fields[12].to_string(),
        warehouse_id: fields[13].to_string(),
        document_no: fields[14].to_string(),
        timestamp: fields[0].to_string(),
        note: fields[15].to_string(),
        tenant_id: tenant_id.clone(),
    };

    Ok((tenant_id, event))
}
