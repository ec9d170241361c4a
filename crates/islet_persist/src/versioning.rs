use tracing::info;

use islet_shared::inventory::ResourceKind;
use islet_shared::worldgen::{default_islands, Island, TerrainGenerator};

use crate::document::{GridPos, SaveDocument};
use crate::error::PersistError;

pub const CURRENT_SAVE_VERSION: u32 = 2;

/// Inputs a migration step may need beyond the document itself.
#[derive(Debug, Clone)]
pub struct MigrationContext {
    /// Seed used when an old document carries none.
    pub fresh_seed: u64,
    pub islands: Vec<Island>,
}

impl MigrationContext {
    pub fn new(fresh_seed: u64, islands: Vec<Island>) -> Self {
        Self {
            fresh_seed,
            islands,
        }
    }
}

impl Default for MigrationContext {
    fn default() -> Self {
        Self::new(0, default_islands())
    }
}

pub type MigrationStep = fn(SaveDocument, &MigrationContext) -> SaveDocument;

/// Ordered by source version; each step produces `from + 1`.
const MIGRATIONS: &[(u32, MigrationStep)] = &[(1, migrate_v1_to_v2)];

/// Version 0 predates the version field and is read as version 1.
pub fn effective_version(doc: &SaveDocument) -> u32 {
    doc.version.max(1)
}

pub fn migrate(mut doc: SaveDocument, ctx: &MigrationContext) -> Result<SaveDocument, PersistError> {
    let mut version = effective_version(&doc);
    if version == CURRENT_SAVE_VERSION {
        doc.version = version;
        return Ok(doc);
    }

    if version > CURRENT_SAVE_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: version,
            current: CURRENT_SAVE_VERSION,
        });
    }

    while version < CURRENT_SAVE_VERSION {
        let next_version = version + 1;
        let step = MIGRATIONS
            .iter()
            .find(|(from, _)| *from == version)
            .map(|(_, step)| *step)
            .ok_or(PersistError::UnsupportedVersion {
                found: version,
                current: CURRENT_SAVE_VERSION,
            })?;
        info!("Migrating save document v{version} -> v{next_version}");
        doc = step(doc, ctx);
        doc.version = next_version;
        version = next_version;
    }

    Ok(doc)
}

/// Version 1 layouts came from an unseeded generator and cannot be trusted, so the
/// world is regenerated from the seed. Inventory and position carry over.
fn migrate_v1_to_v2(doc: SaveDocument, ctx: &MigrationContext) -> SaveDocument {
    let seed = doc.world_seed.unwrap_or(ctx.fresh_seed);
    let layout = TerrainGenerator::default().generate_seeded(&ctx.islands, seed);

    SaveDocument {
        version: 2,
        world_seed: Some(seed),
        inventory: doc.inventory,
        selected_item: ResourceKind::Wood,
        player_position: doc.player_position,
        player_rotation: 0.0,
        world_generated: true,
        terrain: layout.terrain.into_iter().map(GridPos::from).collect(),
        trees: layout.trees.into_iter().map(GridPos::from).collect(),
        stones: layout.stones.into_iter().map(GridPos::from).collect(),
        built_blocks: Vec::new(),
        destroyed_resources: Vec::new(),
    }
}
