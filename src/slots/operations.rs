// Filesystem operations for the slot inventory

use crate::slots::layout::SaveLayout;
use crate::slots::types::SlotInventory;

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Occupied slot numbers for `identity`, ascending, each at most once
///
/// A missing identity directory simply means nothing is occupied.
pub fn enumerate_occupied(layout: &dyn SaveLayout, identity: &str, slot_count: u8) -> Vec<u8> {
    let identity_dir = layout.identity_dir(identity);
    let Ok(entries) = std::fs::read_dir(&identity_dir) else {
        debug!("No save directory at {}", identity_dir.display());
        return Vec::new();
    };

    let occupied: BTreeSet<u8> = entries
        .filter_map(|e| e.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let slot = layout.parse_slot_dir(&name)?;
            (slot <= slot_count && layout.is_occupied(&entry.path())).then_some(slot)
        })
        .collect();

    occupied.into_iter().collect()
}

/// Display name of one slot; any failure just means "no name"
pub fn resolve_name(layout: &dyn SaveLayout, identity: &str, slot: u8) -> Option<String> {
    let slot_dir = layout.slot_dir(identity, slot);
    match layout.read_display_name(&slot_dir) {
        Ok(name) => name,
        Err(e) => {
            debug!("No display name for slot {}: {}", slot, e);
            None
        }
    }
}

/// Resolve names for every occupied slot concurrently
///
/// One scoped thread per slot, each producing exactly one entry. The map is
/// only assembled after every thread has finished.
pub fn resolve_names(
    layout: &dyn SaveLayout,
    identity: &str,
    occupied: &[u8],
) -> BTreeMap<u8, Option<String>> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = occupied
            .iter()
            .map(|&slot| (slot, scope.spawn(move || resolve_name(layout, identity, slot))))
            .collect();

        handles
            .into_iter()
            .map(|(slot, handle)| (slot, handle.join().ok().flatten()))
            .collect()
    })
}

/// Scan disk and build a fresh inventory snapshot
pub fn refresh_inventory(layout: &dyn SaveLayout, identity: &str, slot_count: u8) -> SlotInventory {
    if identity.trim().is_empty() {
        debug!("No steam id set, every slot reads as empty");
        return SlotInventory::from_scan(slot_count, &[], &BTreeMap::new());
    }

    let occupied = enumerate_occupied(layout, identity, slot_count);
    let names = resolve_names(layout, identity, &occupied);
    info!("Refreshed slots for {}: occupied {:?}", identity, occupied);
    SlotInventory::from_scan(slot_count, &occupied, &names)
}
