//! Command handlers behind the CLI
//!
//! Every handler ends by printing exactly one `Succeeded` or `Failed(kind)` line.

use crate::archive::ArchiveCodec;
use crate::cli::{Command, ConfigCmd};
use crate::config::{
    Config, ConfigStore, Settings, bootstrap_config, ensure_credentials_template,
};
use crate::error::{SyncError, SyncResult};
use crate::save_sync::{Orchestrator, Outcome, canonical_key};
use crate::slots::{SaveLayout, ScheduleOneLayout};
use crate::store::store_from_settings;
use crate::util::open_path;

use chrono::Local;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use tracing::{debug, info, warn};

/// Fields `config set` may change
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigEdit {
    pub identity: Option<String>,
    pub slot: Option<u8>,
    pub bucket: Option<String>,
    pub key_prefix: Option<String>,
}

impl ConfigEdit {
    /// Apply to `config`, returning whether anything changed
    pub fn apply(&self, config: &mut Config) -> bool {
        let before = config.clone();
        if let Some(identity) = &self.identity {
            config.identity = identity.trim().to_string();
        }
        if let Some(slot) = self.slot {
            config.selected_slot = slot;
        }
        if let Some(bucket) = &self.bucket {
            config.bucket = bucket.trim().to_string();
        }
        if let Some(prefix) = &self.key_prefix {
            config.key_prefix = prefix.trim().to_string();
        }
        *config != before
    }
}

pub fn run(cmd: Command, settings: &Settings) -> ExitCode {
    let layout = ScheduleOneLayout::locate(settings);
    let mut config_store = ConfigStore::default_location(settings);
    let mut config = bootstrap_config(&mut config_store, &layout);
    if let Err(e) = ensure_credentials_template(&settings.config_dir) {
        warn!("{}", e);
    }

    match cmd {
        Command::Status => report(status(&layout, &config, settings)),
        Command::Config { cmd } => match cmd {
            ConfigCmd::Show => report(show_config(&config_store, &config)),
            ConfigCmd::Set {
                steamid,
                slot,
                bucket,
                blob,
            } => {
                let edit = ConfigEdit {
                    identity: steamid,
                    slot,
                    bucket,
                    key_prefix: blob,
                };
                report(set_config(&config_store, &mut config, &edit))
            }
            ConfigCmd::Dir { open } => report(config_dir(settings, open)),
        },
        Command::Buckets => report(orchestrator(layout, settings).and_then(|orch| {
            let buckets = orch.list_buckets()?;
            for bucket in &buckets {
                println!("{}", bucket);
            }
            Ok(format!("{} bucket(s)", buckets.len()))
        })),
        Command::Upload => sync(layout, settings, &config, |orch, cfg| orch.upload(cfg)),
        Command::Publish => sync(layout, settings, &config, |orch, cfg| orch.publish(cfg)),
        Command::Download { yes } => {
            if !yes && !confirm_download(&config) {
                println!("Cancelled: download not confirmed");
                return ExitCode::FAILURE;
            }
            sync(layout, settings, &config, |orch, cfg| orch.download(cfg))
        }
    }
}

fn orchestrator(layout: ScheduleOneLayout, settings: &Settings) -> SyncResult<Orchestrator> {
    let store = store_from_settings(settings)?;
    Ok(Orchestrator::new(
        store,
        Box::new(layout),
        ArchiveCodec::new(settings.scratch_dir.clone()),
        settings.slot_count,
        Box::new(Local::now),
    ))
}

fn sync(
    layout: ScheduleOneLayout,
    settings: &Settings,
    config: &Config,
    op: impl FnOnce(&Orchestrator, &Config) -> Outcome,
) -> ExitCode {
    let orch = match orchestrator(layout, settings) {
        Ok(orch) => orch,
        Err(e) => return report(Err(e)),
    };
    orch.refresh(config);
    let outcome = op(&orch, config);
    debug!("Finished in phase {:?}", orch.phase());
    if let Some(slot) = orch.inventory().get(config.selected_slot) {
        info!("Slot {} holds {}", slot.index, slot.label());
    }
    println!("{}", outcome);
    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report(result: SyncResult<String>) -> ExitCode {
    match result {
        Ok(summary) => {
            println!("Succeeded: {}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Failed({}): {}", e.kind().name(), e);
            ExitCode::FAILURE
        }
    }
}

fn status(layout: &dyn SaveLayout, config: &Config, settings: &Settings) -> SyncResult<String> {
    let inventory = crate::slots::refresh_inventory(layout, &config.identity, settings.slot_count);
    println!("steam id:  {}", display_or_unset(&config.identity));
    println!("bucket:    {}", display_or_unset(&config.bucket));
    println!("blob name: {}", display_or_unset(&config.key_prefix));
    println!("saves:     {}", layout.saves_root().display());
    for slot in inventory.slots() {
        let marker = if slot.index == config.selected_slot { '*' } else { ' ' };
        println!("{} {}: {}", marker, slot.index, slot.label());
    }
    Ok(format!(
        "{} of {} slot(s) occupied, empty: {:?}",
        inventory.occupied().len(),
        inventory.slot_count(),
        inventory.empty()
    ))
}

fn show_config(store: &ConfigStore, config: &Config) -> SyncResult<String> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| SyncError::ConfigUnreadable(e.to_string()))?;
    println!("{}", json);
    Ok(store.path().display().to_string())
}

fn set_config(store: &ConfigStore, config: &mut Config, edit: &ConfigEdit) -> SyncResult<String> {
    let mut edited = config.clone();
    if !edit.apply(&mut edited) {
        return Ok("config unchanged".to_string());
    }
    edited.validate_slot(store.slot_count())?;
    store.save(&edited)?;
    *config = edited;
    Ok(format!("config saved to {}", store.path().display()))
}

fn config_dir(settings: &Settings, open: bool) -> SyncResult<String> {
    std::fs::create_dir_all(&settings.config_dir).map_err(|e| {
        SyncError::ConfigWrite(format!("{}: {}", settings.config_dir.display(), e))
    })?;
    if open && let Err(e) = open_path(&settings.config_dir) {
        warn!("Could not open {}: {}", settings.config_dir.display(), e);
    }
    Ok(settings.config_dir.display().to_string())
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() { "(not set)" } else { value }
}

fn confirm_download(config: &Config) -> bool {
    print!(
        "Replace save slot {} with {}/{}? This cannot be undone [y/N] ",
        config.selected_slot,
        config.bucket,
        canonical_key(&config.identity, &config.key_prefix)
    );
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_store(dir: &std::path::Path) -> ConfigStore {
        let mut store = ConfigStore::in_dir(dir, 5);
        let _ = store.load();
        store
    }

    #[test]
    fn test_edit_reports_changes() {
        let mut config = Config::default();
        assert!(!ConfigEdit::default().apply(&mut config));

        let edit = ConfigEdit {
            bucket: Some(" saves-bucket ".to_string()),
            ..Default::default()
        };
        assert!(edit.apply(&mut config));
        assert_eq!(config.bucket, "saves-bucket");
        assert!(!edit.apply(&mut config));
    }

    #[test]
    fn test_set_config_only_writes_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let store = loaded_store(dir.path());
        let mut config = Config::default();

        let unchanged = set_config(&store, &mut config, &ConfigEdit::default()).unwrap();
        assert_eq!(unchanged, "config unchanged");
        assert!(!store.exists());

        let edit = ConfigEdit {
            slot: Some(2),
            key_prefix: Some("world1".to_string()),
            ..Default::default()
        };
        set_config(&store, &mut config, &edit).unwrap();
        assert!(store.exists());
        assert_eq!(config.selected_slot, 2);
        assert_eq!(config.key_prefix, "world1");
    }

    #[test]
    fn test_set_config_rejects_out_of_range_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = loaded_store(dir.path());
        let mut config = Config::default();

        let edit = ConfigEdit {
            slot: Some(9),
            ..Default::default()
        };
        let err = set_config(&store, &mut config, &edit).unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig(_)));
        assert_eq!(config.selected_slot, 5);
        assert!(!store.exists());
    }
}
