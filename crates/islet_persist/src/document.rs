use glam::{IVec3, Vec3};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use islet_shared::inventory::{Inventory, ResourceKind};
use islet_shared::player::DEFAULT_SPAWN;

use crate::error::PersistError;

/// Integer block position as stored in `terrain`, `trees` and `stones`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    #[serde(deserialize_with = "lenient_coord")]
    pub x: i32,
    #[serde(deserialize_with = "lenient_coord")]
    pub y: i32,
    #[serde(deserialize_with = "lenient_coord")]
    pub z: i32,
}

impl From<IVec3> for GridPos {
    fn from(pos: IVec3) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            z: pos.z,
        }
    }
}

impl From<GridPos> for IVec3 {
    fn from(pos: GridPos) -> Self {
        IVec3::new(pos.x, pos.y, pos.z)
    }
}

/// A user-built block. `kind` is kept as text so one unknown entry does not
/// invalidate the rest of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltBlock {
    #[serde(deserialize_with = "lenient_coord")]
    pub x: i32,
    #[serde(deserialize_with = "lenient_coord")]
    pub y: i32,
    #[serde(deserialize_with = "lenient_coord")]
    pub z: i32,
    #[serde(rename = "type")]
    pub kind: String,
}

impl BuiltBlock {
    pub fn pos(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionDoc {
    #[serde(default)]
    pub x: f32,
    #[serde(default = "default_spawn_y")]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

fn default_spawn_y() -> f32 {
    DEFAULT_SPAWN.y
}

impl Default for PositionDoc {
    fn default() -> Self {
        DEFAULT_SPAWN.into()
    }
}

impl From<Vec3> for PositionDoc {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<PositionDoc> for Vec3 {
    fn from(p: PositionDoc) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

/// Versioned snapshot of world and player, in the JSON shape the save endpoint stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    #[serde(default)]
    pub version: u32,
    #[serde(default, with = "world_seed_serde")]
    pub world_seed: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inventory: Inventory,
    #[serde(default, deserialize_with = "lenient_selected")]
    pub selected_item: ResourceKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub player_position: PositionDoc,
    #[serde(default, deserialize_with = "null_as_default")]
    pub player_rotation: f32,
    #[serde(default = "default_true")]
    pub world_generated: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub terrain: Vec<GridPos>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trees: Vec<GridPos>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stones: Vec<GridPos>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub built_blocks: Vec<BuiltBlock>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub destroyed_resources: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for SaveDocument {
    fn default() -> Self {
        Self {
            version: 0,
            world_seed: None,
            inventory: Inventory::default(),
            selected_item: ResourceKind::Wood,
            player_position: PositionDoc::default(),
            player_rotation: 0.0,
            world_generated: true,
            terrain: Vec::new(),
            trees: Vec::new(),
            stones: Vec::new(),
            built_blocks: Vec::new(),
            destroyed_resources: Vec::new(),
        }
    }
}

impl SaveDocument {
    pub fn from_json(bytes: &[u8]) -> Result<Self, PersistError> {
        serde_json::from_slice(bytes).map_err(|err| PersistError::Malformed(err.to_string()))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, PersistError> {
        serde_json::to_vec(self).map_err(|err| PersistError::Malformed(err.to_string()))
    }
}

/// What a load returned: a marker for accounts with no save yet, or a document.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadResponse {
    FirstTime,
    Document(SaveDocument),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirstTimeProbe {
    #[serde(default)]
    first_time: bool,
}

impl LoadResponse {
    pub fn from_json(bytes: &[u8]) -> Result<Self, PersistError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|err| PersistError::Malformed(err.to_string()))?;
        if value.is_null() {
            return Ok(LoadResponse::FirstTime);
        }

        let probe = FirstTimeProbe::deserialize(&value)
            .map_err(|err| PersistError::Malformed(err.to_string()))?;
        if probe.first_time {
            return Ok(LoadResponse::FirstTime);
        }

        SaveDocument::deserialize(value)
            .map(LoadResponse::Document)
            .map_err(|err| PersistError::Malformed(err.to_string()))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_selected<'de, D>(deserializer: D) -> Result<ResourceKind, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(name)) => ResourceKind::parse(&name).unwrap_or_default(),
        Some(serde_json::Value::Number(slot)) => slot
            .as_u64()
            .map(|slot| ResourceKind::from_slot(slot as usize))
            .unwrap_or_default(),
        _ => ResourceKind::default(),
    })
}

fn lenient_coord<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    struct CoordVisitor;

    impl<'de> Visitor<'de> for CoordVisitor {
        type Value = i32;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("an integer block coordinate")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            i32::try_from(value).map_err(|_| E::custom("block coordinate out of range"))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            i32::try_from(value).map_err(|_| E::custom("block coordinate out of range"))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let rounded = value.round();
            if !rounded.is_finite() || rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
                return Err(E::custom("block coordinate out of range"));
            }
            Ok(rounded as i32)
        }
    }

    deserializer.deserialize_any(CoordVisitor)
}

mod world_seed_serde {
    use super::*;
    use std::fmt;

    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(seed) => serializer.serialize_u64(*seed),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeedVisitor;

        impl<'de> Visitor<'de> for SeedVisitor {
            type Value = Option<u64>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a non-negative world seed as integer or string")
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Some(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(value)
                    .map(Some)
                    .map_err(|_| E::custom("world seed must be non-negative"))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
                    Ok(Some(value as u64))
                } else {
                    Err(E::custom("world seed must be a whole non-negative number"))
                }
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|_| E::custom("invalid world seed string"))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                self.visit_str(&value)
            }
        }

        deserializer.deserialize_any(SeedVisitor)
    }
}
