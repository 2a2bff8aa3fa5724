//! Store facade: tenant map, durability wiring, query surface.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::{error, info, warn};

use stockledger_core::{LedgerError, LedgerResult, TenantId};
use stockledger_events::{MovementEvent, timestamp};
use stockledger_persistence::{
    PersistenceConfig, PersistenceManager, PersistenceResult, RecoveredData, StorageInfo,
};
use stockledger_projections::{
    DocumentSummary, InOutSummary, InventoryPosition, ItemSummary, build_document_summaries,
    calculate_inventory, current_items, in_out_summary, inventory_by_category,
};

use crate::ledger::{DurabilitySink, Ledger, NoDurability};

// Rough per-event footprint used for the memory estimate, in bytes.
const EVENT_MEMORY_ESTIMATE: usize = 500;

impl DurabilitySink for PersistenceManager {
    fn persist(&self, tenant_id: &TenantId, event: &MovementEvent) -> LedgerResult<()> {
        self.write_to_wal(tenant_id, event)
            .map(|_receipt| ())
            .map_err(|e| LedgerError::wal_write(e.to_string()))
    }
}

/// Aggregate counters for operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemStatus {
    pub total_tenants: usize,
    pub total_transactions: usize,
    pub memory_estimate_kb: usize,
}

/// Event-sourced inventory store: one append-only [`Ledger`] per tenant,
/// durability through the WAL, derived views recomputed per query.
///
/// Reads are lock-free against the published region; the tenant map takes a
/// read lock only to resolve a tenant to its ledger, and a write lock only
/// on the first write or recovery of a previously unseen tenant.
pub struct Store {
    ledgers: RwLock<HashMap<TenantId, Arc<Ledger>>>,
    persistence: Option<Arc<PersistenceManager>>,
}

impl Store {
    /// Open the store over a data directory: acquire the advisory lock,
    /// open the active WAL segment, replay and validate all recovered data.
    ///
    /// Integrity failure degrades to an empty store with a critical log
    /// line; lock and I/O failures are returned so the caller can refuse to
    /// start (a second process on the same directory must not come up).
    pub fn open(config: PersistenceConfig) -> PersistenceResult<Self> {
        let persistence = PersistenceManager::open(config)?;
        let recovered = persistence.recover_from_wal()?;

        let mut ledgers = HashMap::new();
        if recovered.is_empty() {
            info!("no existing data found, starting with an empty store");
        } else {
            match PersistenceManager::validate_integrity(&recovered) {
                Ok(()) => {
                    let tenants = recovered.len();
                    let mut total = 0usize;
                    for (tenant_id, events) in recovered {
                        total += events.len();
                        let ledger = Ledger::restore(tenant_id.clone(), events).map_err(|e| {
                            stockledger_persistence::PersistenceError::IntegrityViolation {
                                tenant: tenant_id.to_string(),
                                reason: e.to_string(),
                            }
                        })?;
                        ledgers.insert(tenant_id, Arc::new(ledger));
                    }
                    info!(tenants, events = total, "recovery complete");
                }
                Err(e) => {
                    // Fail-closed: do not partially adopt recovered data.
                    error!(error = %e, "data integrity validation failed, starting with an empty store");
                    ledgers.clear();
                }
            }
        }

        Ok(Self {
            ledgers: RwLock::new(ledgers),
            persistence: Some(Arc::new(persistence)),
        })
    }

    /// A store with no persistence: nothing is written to disk and nothing
    /// survives the process. For tests, benches and embedding.
    pub fn in_memory() -> Self {
        Self {
            ledgers: RwLock::new(HashMap::new()),
            persistence: None,
        }
    }

    /// Append one movement to `tenant_id`'s ledger, durably logging it
    /// before publication. See [`Ledger::append`] for the full contract.
    pub fn append(&self, tenant_id: &TenantId, mut event: MovementEvent) -> LedgerResult<()> {
        if tenant_id.is_empty() {
            return Err(LedgerError::invalid_parameter("tenant id cannot be empty"));
        }
        if event.tenant_id.is_empty() {
            event.tenant_id = tenant_id.clone();
        } else if event.tenant_id != *tenant_id {
            return Err(LedgerError::invalid_parameter(
                "event tenant id does not match the target tenant",
            ));
        }

        let ledger = self.ledger_or_create(tenant_id);
        match &self.persistence {
            Some(p) => ledger.append(event, p.as_ref()),
            None => ledger.append(event, &NoDurability),
        }
    }

    // ---- transaction queries ------------------------------------------

    /// All published events for a tenant, in append order. Unknown tenants
    /// read as empty.
    pub fn transactions(&self, tenant_id: &TenantId) -> Vec<MovementEvent> {
        self.ledger(tenant_id)
            .map(|l| l.events())
            .unwrap_or_default()
    }

    /// Events whose timestamp falls in `[start, end]` (lexicographic).
    pub fn transactions_in_range(
        &self,
        tenant_id: &TenantId,
        start: &str,
        end: &str,
    ) -> Vec<MovementEvent> {
        self.filtered(tenant_id, |e| timestamp::in_range(&e.timestamp, start, end))
    }

    pub fn transactions_by_item(&self, tenant_id: &TenantId, item_id: &str) -> Vec<MovementEvent> {
        self.filtered(tenant_id, |e| e.item_id == item_id)
    }

    pub fn transactions_by_document(
        &self,
        tenant_id: &TenantId,
        document_no: &str,
    ) -> Vec<MovementEvent> {
        self.filtered(tenant_id, |e| e.document_no == document_no)
    }

    pub fn transactions_by_partner(
        &self,
        tenant_id: &TenantId,
        partner_id: &str,
    ) -> Vec<MovementEvent> {
        self.filtered(tenant_id, |e| e.partner_id == partner_id)
    }

    // ---- derived views -------------------------------------------------

    /// Current stock positions grouped by warehouse.
    pub fn calculate_inventory(
        &self,
        tenant_id: &TenantId,
    ) -> BTreeMap<String, Vec<InventoryPosition>> {
        calculate_inventory(&self.transactions(tenant_id))
    }

    /// Items with positive stock.
    pub fn current_items(&self, tenant_id: &TenantId) -> Vec<ItemSummary> {
        current_items(&self.transactions(tenant_id))
    }

    /// Document rollups, ordered by document number.
    pub fn documents(&self, tenant_id: &TenantId) -> Vec<DocumentSummary> {
        build_document_summaries(&self.transactions(tenant_id))
            .into_values()
            .collect()
    }

    // ---- statistics ----------------------------------------------------

    /// Published event count for a tenant.
    pub fn transaction_count(&self, tenant_id: &TenantId) -> usize {
        self.ledger(tenant_id).map_or(0, |l| l.published_len())
    }

    /// Number of distinct items with positive stock.
    pub fn item_type_count(&self, tenant_id: &TenantId) -> usize {
        self.current_items(tenant_id).len()
    }

    /// Inbound/outbound totals over a time range.
    pub fn in_out_summary(&self, tenant_id: &TenantId, start: &str, end: &str) -> InOutSummary {
        in_out_summary(&self.transactions_in_range(tenant_id, start, end))
    }

    /// Positive stock summed per category.
    pub fn inventory_by_category(&self, tenant_id: &TenantId) -> BTreeMap<String, i64> {
        inventory_by_category(&self.transactions(tenant_id))
    }

    // ---- tenants and system --------------------------------------------

    /// Known tenant ids, sorted.
    pub fn tenant_ids(&self) -> Vec<TenantId> {
        let ledgers = self.ledgers.read().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<TenantId> = ledgers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn has_tenant(&self, tenant_id: &TenantId) -> bool {
        self.ledgers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(tenant_id)
    }

    /// Generate a timestamp-derived transaction id. Collisions are possible
    /// under concurrent generation; the append-time duplicate check is the
    /// backstop.
    pub fn generate_transaction_id(&self) -> String {
        timestamp::generate_transaction_id()
    }

    pub fn system_status(&self) -> SystemStatus {
        let ledgers = self.ledgers.read().unwrap_or_else(|e| e.into_inner());
        let total_transactions: usize = ledgers.values().map(|l| l.published_len()).sum();
        SystemStatus {
            total_tenants: ledgers.len(),
            total_transactions,
            memory_estimate_kb: total_transactions * EVENT_MEMORY_ESTIMATE / 1024,
        }
    }

    // ---- persistence management ----------------------------------------

    /// Snapshot every tenant's full event sequence. Returns the snapshot
    /// path, or `None` when the store runs without persistence.
    pub fn create_snapshot(&self) -> PersistenceResult<Option<PathBuf>> {
        match &self.persistence {
            Some(p) => p.create_snapshot(&self.collect_all()).map(Some),
            None => Ok(None),
        }
    }

    /// Data directory status, or `None` without persistence.
    pub fn storage_info(&self) -> PersistenceResult<Option<StorageInfo>> {
        match &self.persistence {
            Some(p) => p.storage_info().map(Some),
            None => Ok(None),
        }
    }

    // ---- internals -----------------------------------------------------

    fn filtered(
        &self,
        tenant_id: &TenantId,
        filter: impl Fn(&MovementEvent) -> bool,
    ) -> Vec<MovementEvent> {
        self.ledger(tenant_id)
            .map(|l| l.events_where(filter))
            .unwrap_or_default()
    }

    fn ledger(&self, tenant_id: &TenantId) -> Option<Arc<Ledger>> {
        self.ledgers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(tenant_id)
            .cloned()
    }

    /// Resolve or create the tenant's ledger. Creation takes the map's
    /// write lock; the entry API makes the insert race-free when two first
    /// writers arrive together.
    fn ledger_or_create(&self, tenant_id: &TenantId) -> Arc<Ledger> {
        if let Some(ledger) = self.ledger(tenant_id) {
            return ledger;
        }

        let mut ledgers = self.ledgers.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            ledgers
                .entry(tenant_id.clone())
                .or_insert_with(|| Arc::new(Ledger::new(tenant_id.clone()))),
        )
    }

    fn collect_all(&self) -> RecoveredData {
        let ledgers = self.ledgers.read().unwrap_or_else(|e| e.into_inner());
        ledgers
            .iter()
            .map(|(tenant_id, ledger)| (tenant_id.clone(), ledger.events()))
            .collect()
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // Best-effort final snapshot; failure must never propagate out of
        // drop.
        if self.persistence.is_some() {
            match self.create_snapshot() {
                Ok(Some(path)) => info!(snapshot = %path.display(), "final snapshot created"),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "final snapshot failed"),
            }
        }
    }
}
