//! `stockledger-events` — the immutable inventory movement event.

pub mod movement;
pub mod timestamp;

pub use movement::{MovementEvent, MovementKind};
