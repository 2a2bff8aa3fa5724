//! `stockledger-store` — the in-memory inventory ledger and its facade.
//!
//! A write enters the [`Store`], is durably appended through the
//! persistence layer, then published into the target tenant's [`Ledger`].
//! Reads load the published length with acquire semantics and copy exactly
//! that prefix; derived views are folded fresh from the copy on every call.

pub mod ledger;
pub mod store;

pub use ledger::{DurabilitySink, Ledger, NoDurability};
pub use store::{Store, SystemStatus};
