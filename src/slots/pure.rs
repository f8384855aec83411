// Pure functions for the slot inventory

use std::collections::BTreeSet;

/// Every slot index in `[1, slot_count]`
pub fn all_slots(slot_count: u8) -> Vec<u8> {
    (1..=slot_count).collect()
}

/// Slots in `[1, slot_count]` that are not in `occupied`
pub fn empty_slots(occupied: &[u8], slot_count: u8) -> Vec<u8> {
    let taken: BTreeSet<u8> = occupied.iter().copied().collect();
    all_slots(slot_count)
        .into_iter()
        .filter(|slot| !taken.contains(slot))
        .collect()
}

/// Parse `<prefix><k>` into `k`, accepting only the canonical spelling of `k`
///
/// `SaveGame_01` is rejected so that a parsed slot always maps back to the
/// same directory name.
pub fn parse_slot_suffix(name: &str, prefix: &str) -> Option<u8> {
    let suffix = name.strip_prefix(prefix)?;
    let slot = suffix.parse::<u8>().ok()?;
    if slot == 0 || slot.to_string() != suffix {
        return None;
    }
    Some(slot)
}
