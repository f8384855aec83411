// Orchestration pipelines for save synchronization
// Combines the slot inventory, archive codec and object store into user-level operations

use crate::archive::ArchiveCodec;
use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::slots::{SaveLayout, SlotInventory, refresh_inventory};
use crate::store::ObjectStore;
use crate::util::remove_quietly;

use super::pure::{canonical_key, timestamp_label, upload_key};
use super::types::{Outcome, SyncPhase, SyncReport};

use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

pub type Clock = Box<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Runs uploads and downloads for one deployment, one at a time
pub struct Orchestrator {
    store: Box<dyn ObjectStore>,
    layout: Box<dyn SaveLayout>,
    codec: ArchiveCodec,
    slot_count: u8,
    inventory: Mutex<SlotInventory>,
    phase: Mutex<SyncPhase>,
    in_flight: AtomicBool,
    clock: Clock,
}

/// Held for the duration of one operation, clears the in-flight flag on drop
pub(super) struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Orchestrator {
    pub fn new(
        store: Box<dyn ObjectStore>,
        layout: Box<dyn SaveLayout>,
        codec: ArchiveCodec,
        slot_count: u8,
        clock: Clock,
    ) -> Self {
        Orchestrator {
            store,
            layout,
            codec,
            slot_count,
            inventory: Mutex::new(SlotInventory::unscanned(slot_count)),
            phase: Mutex::new(SyncPhase::Idle),
            in_flight: AtomicBool::new(false),
            clock,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        *lock(&self.phase)
    }

    /// Snapshot from the last refresh
    pub fn inventory(&self) -> SlotInventory {
        lock(&self.inventory).clone()
    }

    /// Rescan the slots of `cfg.identity` and replace the snapshot
    pub fn refresh(&self, cfg: &Config) -> SlotInventory {
        let fresh = refresh_inventory(self.layout.as_ref(), &cfg.identity, self.slot_count);
        *lock(&self.inventory) = fresh.clone();
        fresh
    }

    pub fn list_buckets(&self) -> SyncResult<Vec<String>> {
        self.store.list_buckets()
    }

    /// Pack the selected slot and upload it under a fresh timestamped key
    pub fn upload(&self, cfg: &Config) -> Outcome {
        self.run("upload", || {
            self.check_uploadable(cfg)?;
            let now = (self.clock)();
            let key = upload_key(&cfg.identity, &cfg.key_prefix, &now);
            let label = format!("upl_{}", timestamp_label(&now));
            self.send_slot(cfg, &label, key)
        })
    }

    /// Pack the selected slot and overwrite the canonical key with it
    pub fn publish(&self, cfg: &Config) -> Outcome {
        self.run("publish", || {
            self.check_uploadable(cfg)?;
            let label = format!("pub_{}", timestamp_label(&(self.clock)()));
            self.send_slot(cfg, &label, canonical_key(&cfg.identity, &cfg.key_prefix))
        })
    }

    /// Fetch the canonical key and replace the selected slot with it
    ///
    /// Allowed whether or not the slot is occupied.
    pub fn download(&self, cfg: &Config) -> Outcome {
        self.run("download", || {
            cfg.validate_for_sync(self.slot_count)?;
            let key = canonical_key(&cfg.identity, &cfg.key_prefix);

            self.set_phase(SyncPhase::Fetching);
            let blob = self.store.download(&cfg.bucket, &key)?;

            self.set_phase(SyncPhase::Finalizing);
            let dest = self.layout.slot_dir(&cfg.identity, cfg.selected_slot);
            let renames = self.layout.archive_renames(&cfg.identity);
            let unpacked = self.codec.unpack(&blob, &dest, &renames);
            remove_quietly(&blob);
            unpacked?;

            self.refresh(cfg);
            Ok(SyncReport {
                slot: cfg.selected_slot,
                bucket: cfg.bucket.clone(),
                key,
            })
        })
    }

    /// Run one operation under the single-flight guard
    ///
    /// The guard is held until the final phase has been recorded, so the
    /// next operation always starts from a settled phase.
    fn run(&self, operation: &str, body: impl FnOnce() -> SyncResult<SyncReport>) -> Outcome {
        let _guard = match self.begin() {
            Ok(guard) => guard,
            Err(e) => {
                // The running operation keeps its phase
                error!("{} refused: {}", operation, e);
                return Outcome::from_result(Err(e));
            }
        };
        self.set_phase(SyncPhase::Idle);
        let result = body();
        self.finish(operation, result)
    }

    pub(super) fn begin(&self) -> SyncResult<FlightGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SyncError::Busy);
        }
        Ok(FlightGuard {
            flag: &self.in_flight,
        })
    }

    /// Upload gate, judged from the last inventory refresh
    fn check_uploadable(&self, cfg: &Config) -> SyncResult<()> {
        cfg.validate_for_sync(self.slot_count)?;
        let inventory = lock(&self.inventory);
        if !inventory.is_occupied(cfg.selected_slot) {
            if !inventory.is_refreshed() {
                debug!("Upload gate checked before any slot scan");
            }
            return Err(SyncError::SlotEmpty(cfg.selected_slot));
        }
        Ok(())
    }

    fn send_slot(&self, cfg: &Config, label: &str, key: String) -> SyncResult<SyncReport> {
        self.set_phase(SyncPhase::Packing);
        let source = self.layout.slot_dir(&cfg.identity, cfg.selected_slot);
        let renames = self.layout.archive_renames(&cfg.identity);
        let blob = self.codec.pack(&source, label, &renames)?;

        self.set_phase(SyncPhase::Transferring);
        let sent = self.store.upload(&blob, &cfg.bucket, &key);
        remove_quietly(&blob);
        sent?;

        Ok(SyncReport {
            slot: cfg.selected_slot,
            bucket: cfg.bucket.clone(),
            key,
        })
    }

    fn set_phase(&self, phase: SyncPhase) {
        *lock(&self.phase) = phase;
    }

    fn finish(&self, operation: &str, result: SyncResult<SyncReport>) -> Outcome {
        match &result {
            Ok(report) => {
                info!(
                    "{} of slot {} via {} succeeded: {}/{}",
                    operation,
                    report.slot,
                    self.store.name(),
                    report.bucket,
                    report.key
                );
                self.set_phase(SyncPhase::Succeeded);
            }
            Err(e) => {
                error!("{} failed: {}", operation, e);
                self.set_phase(SyncPhase::Failed(e.kind()));
            }
        }
        Outcome::from_result(result)
    }
}
