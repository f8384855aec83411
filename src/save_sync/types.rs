use crate::error::{ErrorKind, SyncResult};
use std::fmt;

/// Where an operation currently is
///
/// Uploads go `Packing -> Transferring`, downloads `Fetching -> Finalizing`.
/// Any failure jumps straight to `Failed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncPhase {
    #[default]
    Idle,
    Packing,
    Fetching,
    Transferring,
    Finalizing,
    Succeeded,
    Failed(ErrorKind),
}

/// What a successful operation touched
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub slot: u8,
    pub bucket: String,
    pub key: String,
}

/// The single result reported for every user-triggered action
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Succeeded(SyncReport),
    Failed(ErrorKind, String),
}

impl Outcome {
    pub fn from_result(result: SyncResult<SyncReport>) -> Self {
        match result {
            Ok(report) => Outcome::Succeeded(report),
            Err(e) => Outcome::Failed(e.kind(), e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_kind().is_none()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Succeeded(_) => None,
            Outcome::Failed(kind, _) => Some(*kind),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Succeeded(report) => write!(
                f,
                "Succeeded: slot {} <-> {}/{}",
                report.slot, report.bucket, report.key
            ),
            Outcome::Failed(kind, message) => write!(f, "Failed({}): {}", kind.name(), message),
        }
    }
}
