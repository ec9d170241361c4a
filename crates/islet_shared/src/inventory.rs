use std::fmt;

use serde::{Deserialize, Serialize};

use crate::block::BlockKind;

/// Kinds the player can carry. Closed set; every kind is a valid hotbar slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    Wood,
    Stone,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Wood, ResourceKind::Stone];

    /// Hotbar slots are 1-based. Anything out of range falls back to wood.
    pub fn from_slot(slot: usize) -> Self {
        slot.checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
            .unwrap_or_default()
    }

    pub fn slot(self) -> usize {
        match self {
            ResourceKind::Wood => 1,
            ResourceKind::Stone => 2,
        }
    }

    pub fn block_kind(self) -> BlockKind {
        match self {
            ResourceKind::Wood => BlockKind::Wood,
            ResourceKind::Stone => BlockKind::Stone,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Wood => "wood",
            ResourceKind::Stone => "stone",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "wood" | "1" => Some(ResourceKind::Wood),
            "stone" | "2" => Some(ResourceKind::Stone),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub wood: u32,
    #[serde(default)]
    pub stone: u32,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counts(wood: u32, stone: u32) -> Self {
        Self { wood, stone }
    }

    pub fn count(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Wood => self.wood,
            ResourceKind::Stone => self.stone,
        }
    }

    fn slot_mut(&mut self, kind: ResourceKind) -> &mut u32 {
        match kind {
            ResourceKind::Wood => &mut self.wood,
            ResourceKind::Stone => &mut self.stone,
        }
    }

    pub fn credit(&mut self, kind: ResourceKind, amount: u32) {
        let slot = self.slot_mut(kind);
        *slot = slot.saturating_add(amount);
    }

    /// Removes one item. Leaves the inventory untouched and returns `false` when empty.
    pub fn try_spend(&mut self, kind: ResourceKind) -> bool {
        let slot = self.slot_mut(kind);
        match slot.checked_sub(1) {
            Some(remaining) => {
                *slot = remaining;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Inventory, ResourceKind};

    #[test]
    fn spending_from_empty_slot_is_rejected_without_mutation() {
        let mut inventory = Inventory::with_counts(0, 2);
        assert!(!inventory.try_spend(ResourceKind::Wood));
        assert_eq!(inventory, Inventory::with_counts(0, 2));

        assert!(inventory.try_spend(ResourceKind::Stone));
        assert!(inventory.try_spend(ResourceKind::Stone));
        assert!(!inventory.try_spend(ResourceKind::Stone));
        assert_eq!(inventory.count(ResourceKind::Stone), 0);
    }

    #[test]
    fn slots_map_to_kinds_with_wood_fallback() {
        assert_eq!(ResourceKind::from_slot(1), ResourceKind::Wood);
        assert_eq!(ResourceKind::from_slot(2), ResourceKind::Stone);
        assert_eq!(ResourceKind::from_slot(0), ResourceKind::Wood);
        assert_eq!(ResourceKind::from_slot(9), ResourceKind::Wood);
        assert_eq!(ResourceKind::Stone.slot(), 2);
    }

    #[test]
    fn credit_saturates() {
        let mut inventory = Inventory::with_counts(u32::MAX - 1, 0);
        inventory.credit(ResourceKind::Wood, 5);
        assert_eq!(inventory.wood, u32::MAX);
    }
}
