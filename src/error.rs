//! Error taxonomy for slotsync
//!
//! Every component returns a typed `SyncError`. The orchestrator never retries;
//! it turns the error into a `Failed(kind, message)` outcome for the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Config unreadable: {0}")]
    ConfigUnreadable(String),

    #[error("Config write failed: {0}")]
    ConfigWrite(String),

    #[error("Packing failed: {0}")]
    Pack(String),

    #[error("Unpacking failed: {0}")]
    Unpack(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Save slot {0} is empty, nothing to upload")]
    SlotEmpty(u8),

    #[error("Another sync operation is already running")]
    Busy,
}

/// Discriminant of `SyncError`, reported alongside the message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigUnreadable,
    ConfigWrite,
    Pack,
    Unpack,
    Auth,
    NotFound,
    Transport,
    Upload,
    InvalidConfig,
    SlotEmpty,
    Busy,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::ConfigUnreadable => "ConfigUnreadable",
            ErrorKind::ConfigWrite => "ConfigWriteError",
            ErrorKind::Pack => "PackError",
            ErrorKind::Unpack => "UnpackError",
            ErrorKind::Auth => "AuthError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Transport => "TransportError",
            ErrorKind::Upload => "UploadError",
            ErrorKind::InvalidConfig => "InvalidConfig",
            ErrorKind::SlotEmpty => "SlotEmpty",
            ErrorKind::Busy => "Busy",
        }
    }
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::ConfigUnreadable(_) => ErrorKind::ConfigUnreadable,
            SyncError::ConfigWrite(_) => ErrorKind::ConfigWrite,
            SyncError::Pack(_) => ErrorKind::Pack,
            SyncError::Unpack(_) => ErrorKind::Unpack,
            SyncError::Auth(_) => ErrorKind::Auth,
            SyncError::NotFound(_) => ErrorKind::NotFound,
            SyncError::Transport(_) => ErrorKind::Transport,
            SyncError::Upload(_) => ErrorKind::Upload,
            SyncError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            SyncError::SlotEmpty(_) => ErrorKind::SlotEmpty,
            SyncError::Busy => ErrorKind::Busy,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
