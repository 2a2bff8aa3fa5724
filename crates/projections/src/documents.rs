//! Document view: one rollup per document number.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stockledger_core::TenantId;
use stockledger_events::{MovementEvent, MovementKind};

/// Per-document rollup. Events with an empty `document_no` belong to no
/// document and are skipped.
///
/// `kind`, partner fields and `tenant_id` come from the first event seen
/// for the document; `timestamp` is the minimum over its events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub document_no: String,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub partner_id: String,
    pub partner_name: String,
    pub tenant_id: TenantId,
    pub timestamp: String,
    pub total_amount: f64,
    pub item_count: u64,
}

/// Fold events into per-document summaries, keyed (and ordered) by
/// `document_no`.
pub fn build_document_summaries(events: &[MovementEvent]) -> BTreeMap<String, DocumentSummary> {
    let mut documents: BTreeMap<String, DocumentSummary> = BTreeMap::new();

    for event in events {
        if event.document_no.is_empty() {
            continue;
        }

        let summary = documents
            .entry(event.document_no.clone())
            .or_insert_with(|| DocumentSummary {
                document_no: event.document_no.clone(),
                kind: event.kind,
                partner_id: event.partner_id.clone(),
                partner_name: event.partner_name.clone(),
                tenant_id: event.tenant_id.clone(),
                timestamp: event.timestamp.clone(),
                total_amount: 0.0,
                item_count: 0,
            });

        summary.total_amount += event.total_amount();
        summary.item_count += 1;

        if event.timestamp < summary.timestamp {
            summary.timestamp = event.timestamp.clone();
        }
    }

    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::movement;

    #[test]
    fn events_without_document_are_skipped() {
        let mut no_doc = movement("T1", "I1", MovementKind::In, 1, 1.0, "2026-01-01T08:00:00");
        no_doc.document_no.clear();
        let with_doc = movement("T2", "I2", MovementKind::In, 2, 3.0, "2026-01-01T09:00:00");

        let docs = build_document_summaries(&[no_doc, with_doc]);
        assert_eq!(docs.len(), 1);
        assert!(docs.contains_key("DOC-T2"));
    }

    #[test]
    fn amounts_and_counts_accumulate() {
        let mut a = movement("T1", "I1", MovementKind::In, 2, 5.0, "2026-01-01T08:00:00");
        a.document_no = "DOC-1".into();
        let mut b = movement("T2", "I2", MovementKind::In, 3, 4.0, "2026-01-01T09:00:00");
        b.document_no = "DOC-1".into();

        let docs = build_document_summaries(&[a, b]);
        let doc = &docs["DOC-1"];
        assert_eq!(doc.total_amount, 22.0);
        assert_eq!(doc.item_count, 2);
    }

    #[test]
    fn document_keeps_earliest_timestamp() {
        let mut late = movement("T1", "I1", MovementKind::In, 1, 1.0, "2026-01-02T08:00:00");
        late.document_no = "DOC-1".into();
        let mut early = movement("T2", "I2", MovementKind::In, 1, 1.0, "2026-01-01T06:00:00");
        early.document_no = "DOC-1".into();

        let docs = build_document_summaries(&[late, early]);
        assert_eq!(docs["DOC-1"].timestamp, "2026-01-01T06:00:00");
    }
}
