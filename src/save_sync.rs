//! Sync orchestrator - moves one save slot between disk and the object store
//!
//! Upload packs the selected slot and sends it under a fresh timestamped key.
//! Download fetches the canonical key and replaces the selected slot with it.
//! Publish is the explicit way to update the canonical key.
//!
//! ## Module Structure
//! - `types.rs`: SyncPhase, SyncReport, Outcome
//! - `pure.rs`: remote key construction
//! - `pipelines.rs`: Orchestrator and its single-flight guard

mod pipelines;
mod pure;
mod types;


// Re-export types
pub use types::Outcome;

// Re-export pipelines
pub use pipelines::Orchestrator;

// Re-export pure functions
pub use pure::canonical_key;
