//! Per-tenant append-only event log with an atomically published length.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use stockledger_core::{LedgerError, LedgerResult, TenantId};
use stockledger_events::MovementEvent;

/// Durability barrier between the duplicate check and the in-memory append.
///
/// `persist` must not return until the event is durable; a failure aborts
/// the append with the ledger's memory state exactly as before the call.
pub trait DurabilitySink: Send + Sync {
    fn persist(&self, tenant_id: &TenantId, event: &MovementEvent) -> LedgerResult<()>;
}

impl<S> DurabilitySink for Arc<S>
where
    S: DurabilitySink + ?Sized,
{
    fn persist(&self, tenant_id: &TenantId, event: &MovementEvent) -> LedgerResult<()> {
        (**self).persist(tenant_id, event)
    }
}

/// Sink for ledgers running without persistence.
#[derive(Debug, Default)]
pub struct NoDurability;

impl DurabilitySink for NoDurability {
    fn persist(&self, _tenant_id: &TenantId, _event: &MovementEvent) -> LedgerResult<()> {
        Ok(())
    }
}

/// Number of storage chunks; capacities double per chunk.
const CHUNK_COUNT: usize = 32;
/// Capacity of the first chunk.
const FIRST_CHUNK_CAP: usize = 64;

type Chunk = Box<[OnceLock<MovementEvent>]>;

/// Map a flat event index to its `(chunk, offset)` location.
///
/// Chunk `c` holds `FIRST_CHUNK_CAP << c` slots and starts at flat index
/// `FIRST_CHUNK_CAP * (2^c - 1)`.
fn locate(index: usize) -> (usize, usize) {
    let chunk = ((index / FIRST_CHUNK_CAP) + 1).ilog2() as usize;
    let chunk_start = FIRST_CHUNK_CAP * ((1usize << chunk) - 1);
    (chunk, index - chunk_start)
}

/// Append-only ordered event store for one tenant.
///
/// Published events live at indices `[0, published_len)`; that range is
/// immutable and safe to read without locks. Storage is a fixed array of
/// lazily-allocated chunks whose slots never move, so a reader copying the
/// published prefix is never invalidated by a concurrent append.
///
/// Writers serialize on an internal mutex held across the whole append
/// protocol (duplicate check, durability barrier, publish); readers never
/// take it. The release-store of the new length pairs with readers'
/// acquire-load: observing the new count implies the slot write and the WAL
/// flush before it.
pub struct Ledger {
    tenant_id: TenantId,
    chunks: [OnceLock<Chunk>; CHUNK_COUNT],
    published: AtomicUsize,
    append_guard: Mutex<()>,
}

impl Ledger {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            chunks: std::array::from_fn(|_| OnceLock::new()),
            published: AtomicUsize::new(0),
            append_guard: Mutex::new(()),
        }
    }

    /// Rebuild a ledger from recovered events, publishing all of them.
    pub fn restore(tenant_id: TenantId, events: Vec<MovementEvent>) -> LedgerResult<Self> {
        let ledger = Self::new(tenant_id);
        let count = events.len();
        for (index, event) in events.into_iter().enumerate() {
            ledger.write_slot(index, event)?;
        }
        ledger.published.store(count, Ordering::Release);
        Ok(ledger)
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Count of events visible to readers.
    pub fn published_len(&self) -> usize {
        self.published.load(Ordering::Acquire)
    }

    /// Append one event: validate, reject duplicates, persist through the
    /// sink, then publish. No side effect on any failure.
    pub fn append(&self, event: MovementEvent, sink: &dyn DurabilitySink) -> LedgerResult<()> {
        event.validate()?;

        let _guard = self.append_guard.lock().unwrap_or_else(|e| e.into_inner());

        let published = self.published.load(Ordering::Acquire);
        if self.contains_trans_id(published, &event.trans_id) {
            return Err(LedgerError::duplicate(&event.trans_id));
        }

        // Capacity is checked before the durability barrier so a WAL record
        // is never written for an event that cannot be appended.
        let (chunk, _) = locate(published);
        if chunk >= CHUNK_COUNT {
            return Err(LedgerError::StorageExhausted(published));
        }

        sink.persist(&self.tenant_id, &event)?;

        self.write_slot(published, event)?;
        self.published.store(published + 1, Ordering::Release);

        Ok(())
    }

    /// Copy the published prefix.
    pub fn events(&self) -> Vec<MovementEvent> {
        let len = self.published_len();
        let mut out = Vec::with_capacity(len);
        self.for_each_published(len, |event| {
            out.push(event.clone());
            true
        });
        out
    }

    /// Copy the published events matching `filter`.
    pub fn events_where(&self, filter: impl Fn(&MovementEvent) -> bool) -> Vec<MovementEvent> {
        let len = self.published_len();
        let mut out = Vec::new();
        self.for_each_published(len, |event| {
            if filter(event) {
                out.push(event.clone());
            }
            true
        });
        out
    }

    fn contains_trans_id(&self, published: usize, trans_id: &str) -> bool {
        let mut found = false;
        self.for_each_published(published, |event| {
            if event.trans_id == trans_id {
                found = true;
                return false;
            }
            true
        });
        found
    }

    /// Walk slots `[0, len)` in order, stopping early when `visit` returns
    /// `false`. `len` must not exceed a previously observed published
    /// length, which guarantees every visited slot is initialized.
    fn for_each_published(&self, len: usize, mut visit: impl FnMut(&MovementEvent) -> bool) {
        let mut index = 0;
        for chunk in &self.chunks {
            if index >= len {
                return;
            }
            let Some(chunk) = chunk.get() else { return };
            for slot in chunk.iter() {
                if index >= len {
                    return;
                }
                let Some(event) = slot.get() else { return };
                if !visit(event) {
                    return;
                }
                index += 1;
            }
        }
    }

    fn write_slot(&self, index: usize, event: MovementEvent) -> LedgerResult<()> {
        let (chunk_index, offset) = locate(index);
        if chunk_index >= CHUNK_COUNT {
            return Err(LedgerError::StorageExhausted(index));
        }

        let chunk = self.chunks[chunk_index].get_or_init(|| {
            let capacity = FIRST_CHUNK_CAP << chunk_index;
            (0..capacity)
                .map(|_| OnceLock::new())
                .collect::<Vec<_>>()
                .into_boxed_slice()
        });

        let inserted = chunk[offset].set(event);
        debug_assert!(inserted.is_ok(), "slot {index} written twice");
        Ok(())
    }
}
