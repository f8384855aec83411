//! Slot inventory - which local save slots are occupied and what they are called
//!
//! The on-disk convention is pluggable through `SaveLayout`; `ScheduleOneLayout`
//! is the reference deployment.
//!
//! ## Module Structure
//! - `types.rs`: Slot, SlotInventory snapshot
//! - `pure.rs`: slot complement and directory name parsing
//! - `layout.rs`: SaveLayout strategy trait and the Schedule I layout
//! - `operations.rs`: enumeration, name resolution, refresh

mod layout;
mod operations;
mod pure;
mod types;

// Re-export types
pub use types::SlotInventory;

// Re-export layout
pub use layout::{SaveLayout, ScheduleOneLayout};

// Re-export operations
pub use operations::refresh_inventory;
