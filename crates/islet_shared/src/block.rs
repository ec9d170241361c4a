use std::fmt;
use std::str::FromStr;

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::inventory::ResourceKind;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Grass,
    Stone,
    Wood,
    #[serde(alias = "leaves")]
    Leaf,
    Water,
    Sand,
}

impl BlockKind {
    pub const ALL: [BlockKind; 6] = [
        BlockKind::Grass,
        BlockKind::Stone,
        BlockKind::Wood,
        BlockKind::Leaf,
        BlockKind::Water,
        BlockKind::Sand,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Grass => "grass",
            BlockKind::Stone => "stone",
            BlockKind::Wood => "wood",
            BlockKind::Leaf => "leaf",
            BlockKind::Water => "water",
            BlockKind::Sand => "sand",
        }
    }

    pub fn is_solid(self) -> bool {
        !matches!(self, BlockKind::Water)
    }

    /// Inventory credit granted when a block of this kind is mined.
    pub fn harvest_yield(self) -> Option<ResourceKind> {
        match self {
            BlockKind::Wood => Some(ResourceKind::Wood),
            BlockKind::Stone => Some(ResourceKind::Stone),
            _ => None,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBlockKind(pub String);

impl fmt::Display for UnknownBlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown block kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownBlockKind {}

impl FromStr for BlockKind {
    type Err = UnknownBlockKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grass" => Ok(BlockKind::Grass),
            "stone" => Ok(BlockKind::Stone),
            "wood" => Ok(BlockKind::Wood),
            "leaf" | "leaves" => Ok(BlockKind::Leaf),
            "water" => Ok(BlockKind::Water),
            "sand" => Ok(BlockKind::Sand),
            _ => Err(UnknownBlockKind(s.to_string())),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Provenance {
    Generated,
    UserBuilt,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub pos: IVec3,
    pub kind: BlockKind,
    pub provenance: Provenance,
}

impl Block {
    pub fn is_user_built(&self) -> bool {
        self.provenance == Provenance::UserBuilt
    }
}
