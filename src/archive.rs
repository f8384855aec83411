//! Archive codec - packs a save slot directory into a zip blob and back
//!
//! ## Module Structure
//! - `pure.rs`: entry name mapping between local paths and archive names
//! - `operations.rs`: zip writing/extraction and the staged swap into place

mod operations;
mod pure;

pub use operations::ArchiveCodec;
pub use pure::ComponentRename;
