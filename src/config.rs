pub mod operations;
pub mod settings;
pub mod types;

// Re-export types
pub use settings::Settings;
pub use types::Config;

// Re-export operations
pub use operations::{
    CREDENTIALS_FILE, ConfigStore, bootstrap_config, ensure_credentials_template,
};
