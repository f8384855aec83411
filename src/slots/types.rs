use crate::slots::pure::{all_slots, empty_slots};
use std::collections::BTreeMap;

/// Derived view of one local save slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub index: u8,
    pub occupied: bool,
    /// Only ever set for occupied slots
    pub display_name: Option<String>,
}

impl Slot {
    /// Label shown next to the slot number
    pub fn label(&self) -> String {
        match (&self.display_name, self.occupied) {
            (Some(name), _) => name.clone(),
            (None, true) => "(unnamed save)".to_string(),
            (None, false) => "(empty)".to_string(),
        }
    }
}

/// Snapshot of every slot in `[1, N]` as of the last refresh
///
/// A refresh replaces the snapshot as a whole; it is never patched in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotInventory {
    slots: Vec<Slot>,
    refreshed: bool,
}

impl SlotInventory {
    /// Inventory that has not been scanned yet: every slot reads as empty
    pub fn unscanned(slot_count: u8) -> Self {
        SlotInventory {
            slots: all_slots(slot_count)
                .into_iter()
                .map(|index| Slot {
                    index,
                    occupied: false,
                    display_name: None,
                })
                .collect(),
            refreshed: false,
        }
    }

    pub fn from_scan(
        slot_count: u8,
        occupied: &[u8],
        names: &BTreeMap<u8, Option<String>>,
    ) -> Self {
        let slots = all_slots(slot_count)
            .into_iter()
            .map(|index| {
                let is_occupied = occupied.contains(&index);
                Slot {
                    index,
                    occupied: is_occupied,
                    display_name: if is_occupied {
                        names.get(&index).cloned().flatten()
                    } else {
                        None
                    },
                }
            })
            .collect();
        SlotInventory {
            slots,
            refreshed: true,
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot_count(&self) -> u8 {
        self.slots.len() as u8
    }

    pub fn is_refreshed(&self) -> bool {
        self.refreshed
    }

    pub fn get(&self, index: u8) -> Option<&Slot> {
        self.slots.iter().find(|s| s.index == index)
    }

    pub fn is_occupied(&self, index: u8) -> bool {
        self.get(index).is_some_and(|s| s.occupied)
    }

    pub fn occupied(&self) -> Vec<u8> {
        self.slots
            .iter()
            .filter(|s| s.occupied)
            .map(|s| s.index)
            .collect()
    }

    /// Complement of `occupied()` over `[1, N]`
    pub fn empty(&self) -> Vec<u8> {
        empty_slots(&self.occupied(), self.slot_count())
    }
}
