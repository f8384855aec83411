//! Config operations - persistence and first-run setup

mod bootstrap;
mod credentials;
mod io;

pub use bootstrap::bootstrap_config;
pub use credentials::{CREDENTIALS_FILE, ensure_credentials_template};
pub use io::ConfigStore;
