use glam::IVec3;
use tracing::{debug, info, warn};

use islet_shared::block::BlockKind;
use islet_shared::player::PlayerState;
use islet_shared::world::WorldState;
use islet_shared::worldgen::Island;

use crate::document::{BuiltBlock, GridPos, LoadResponse, SaveDocument};
use crate::error::PersistError;
use crate::versioning::{effective_version, migrate, MigrationContext, CURRENT_SAVE_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOrigin {
    Fresh,
    Migrated { from: u32 },
    Restored,
}

/// A ready-to-play world and player, plus whether the result must be written back.
#[derive(Debug)]
pub struct Bootstrap {
    pub world: WorldState,
    pub player: PlayerState,
    pub seed: u64,
    pub origin: BootstrapOrigin,
    pub needs_save: bool,
}

/// Snapshots the world and player into a current-version document.
pub fn save(world: &WorldState, player: &PlayerState, seed: u64) -> SaveDocument {
    let layout = world.layout();
    SaveDocument {
        version: CURRENT_SAVE_VERSION,
        world_seed: Some(seed),
        inventory: player.inventory,
        selected_item: player.selected,
        player_position: player.position.into(),
        player_rotation: player.yaw,
        world_generated: true,
        terrain: layout.terrain.iter().copied().map(GridPos::from).collect(),
        trees: layout.trees.iter().copied().map(GridPos::from).collect(),
        stones: layout.stones.iter().copied().map(GridPos::from).collect(),
        built_blocks: world
            .user_blocks()
            .map(|block| BuiltBlock {
                x: block.pos.x,
                y: block.pos.y,
                z: block.pos.z,
                kind: block.kind.as_str().to_string(),
            })
            .collect(),
        destroyed_resources: world.destroyed_keys().map(str::to_owned).collect(),
    }
}

fn positions(list: &[GridPos]) -> Vec<IVec3> {
    list.iter().copied().map(IVec3::from).collect()
}

/// Rebuilds world and player from a current-version document.
pub fn restore(doc: &SaveDocument, islands: Vec<Island>) -> (WorldState, PlayerState) {
    let mut world = WorldState::new(islands);
    world.load_from(
        positions(&doc.terrain),
        positions(&doc.trees),
        positions(&doc.stones),
        doc.destroyed_resources.iter().cloned(),
    );

    for built in &doc.built_blocks {
        let kind = match built.kind.parse::<BlockKind>() {
            Ok(kind) => kind,
            Err(err) => {
                warn!("Skipping built block at {:?}: {err}", built.pos());
                continue;
            }
        };
        if !world.spawn_block(built.pos(), kind, true) {
            debug!("Built block at {:?} overlaps an existing block; skipped", built.pos());
        }
    }

    let mut player = PlayerState::spawn_at(doc.player_position.into());
    player.yaw = doc.player_rotation;
    player.inventory = doc.inventory;
    player.selected = doc.selected_item;

    (world, player)
}

fn fresh(ctx: &MigrationContext) -> Bootstrap {
    let seed = ctx.fresh_seed;
    Bootstrap {
        world: WorldState::generate(ctx.islands.clone(), seed),
        player: PlayerState::default(),
        seed,
        origin: BootstrapOrigin::Fresh,
        needs_save: true,
    }
}

/// Turns a load result into a playable session. Unreadable or unknown documents are
/// replaced by a fresh world; transport and credential failures are returned.
pub fn bootstrap(
    loaded: Result<LoadResponse, PersistError>,
    ctx: &MigrationContext,
) -> Result<Bootstrap, PersistError> {
    let doc = match loaded {
        Ok(LoadResponse::FirstTime) => {
            info!("No save found; generating a new world with seed {}", ctx.fresh_seed);
            return Ok(fresh(ctx));
        }
        Ok(LoadResponse::Document(doc)) => doc,
        Err(err @ (PersistError::Malformed(_) | PersistError::InvalidFile(_))) => {
            warn!("Save is unreadable ({err}); generating a new world");
            return Ok(fresh(ctx));
        }
        Err(err) => return Err(err),
    };

    let source_version = effective_version(&doc);
    let doc = match migrate(doc, ctx) {
        Ok(doc) => doc,
        Err(err) => {
            warn!("Save cannot be migrated ({err}); generating a new world");
            return Ok(fresh(ctx));
        }
    };

    let seed = doc.world_seed.unwrap_or(ctx.fresh_seed);
    let (world, player) = restore(&doc, ctx.islands.clone());
    let (origin, needs_save) = if source_version < CURRENT_SAVE_VERSION {
        info!(
            "Migrated save v{} -> v{}; world regenerated from seed {}",
            source_version, CURRENT_SAVE_VERSION, seed
        );
        (
            BootstrapOrigin::Migrated {
                from: source_version,
            },
            true,
        )
    } else {
        (BootstrapOrigin::Restored, doc.world_seed.is_none())
    };

    Ok(Bootstrap {
        world,
        player,
        seed,
        origin,
        needs_save,
    })
}

#[cfg(test)]
mod tests {
    use glam::{IVec3, Vec3};

    use islet_shared::block::BlockKind;
    use islet_shared::inventory::{Inventory, ResourceKind};
    use islet_shared::player::PlayerState;
    use islet_shared::world::WorldState;
    use islet_shared::worldgen::{default_islands, Island, TerrainGenerator};

    use super::{bootstrap, restore, save, BootstrapOrigin};
    use crate::document::{BuiltBlock, LoadResponse, SaveDocument};
    use crate::error::PersistError;
    use crate::versioning::{MigrationContext, CURRENT_SAVE_VERSION};

    fn played_world() -> (WorldState, PlayerState) {
        let mut world = WorldState::generate(vec![Island::new(0, 0, 10)], 5);
        let mut player = PlayerState::spawn_at(Vec3::new(1.5, 3.0, -2.0));
        player.yaw = 0.75;
        player.selected = ResourceKind::Stone;

        let resources: Vec<IVec3> = world.resources().take(3).collect();
        for pos in resources {
            world.destroy(pos, &mut player.inventory);
        }
        world.spawn_block(IVec3::new(0, 12, 0), BlockKind::Stone, true);
        world.spawn_block(IVec3::new(1, 12, 0), BlockKind::Wood, true);
        (world, player)
    }

    fn sorted<T: Ord>(mut items: Vec<T>) -> Vec<T> {
        items.sort();
        items
    }

    #[test]
    fn save_restore_save_reproduces_document() {
        let (world, player) = played_world();
        let first = save(&world, &player, 5);
        let (restored_world, restored_player) = restore(&first, world.islands().to_vec());
        let second = save(&restored_world, &restored_player, 5);

        assert_eq!(first.terrain, second.terrain);
        assert_eq!(first.trees, second.trees);
        assert_eq!(first.stones, second.stones);
        assert_eq!(first.built_blocks, second.built_blocks);
        assert_eq!(
            sorted(first.destroyed_resources.clone()),
            sorted(second.destroyed_resources.clone())
        );
        assert_eq!(first.inventory, second.inventory);
        assert_eq!(first.selected_item, second.selected_item);
        assert_eq!(first.player_position, second.player_position);
        assert_eq!(first.player_rotation, second.player_rotation);
        assert_eq!(restored_world.resource_count(), world.resource_count());
    }

    #[test]
    fn restore_skips_unknown_built_kinds() {
        let doc = SaveDocument {
            version: CURRENT_SAVE_VERSION,
            world_seed: Some(1),
            built_blocks: vec![
                BuiltBlock { x: 0, y: 1, z: 0, kind: "stone".into() },
                BuiltBlock { x: 0, y: 2, z: 0, kind: "obsidian".into() },
            ],
            ..SaveDocument::default()
        };
        let (world, _) = restore(&doc, default_islands());
        assert_eq!(world.user_blocks().count(), 1);
        assert!(world.is_resource(IVec3::new(0, 1, 0)));
    }

    #[test]
    fn legacy_document_is_regenerated_and_marked_for_save() {
        let legacy = SaveDocument {
            version: 1,
            world_seed: Some(42),
            inventory: Inventory::with_counts(5, 0),
            ..SaveDocument::default()
        };
        let ctx = MigrationContext::new(3, default_islands());
        let boot = bootstrap(Ok(LoadResponse::Document(legacy)), &ctx).expect("bootstrap");

        assert_eq!(boot.origin, BootstrapOrigin::Migrated { from: 1 });
        assert!(boot.needs_save);
        assert_eq!(boot.seed, 42);
        assert_eq!(boot.player.inventory, Inventory::with_counts(5, 0));

        let expected = TerrainGenerator::default().generate_seeded(&default_islands(), 42);
        assert_eq!(boot.world.layout(), &expected);
        assert_eq!(save(&boot.world, &boot.player, boot.seed).version, CURRENT_SAVE_VERSION);
    }

    #[test]
    fn first_time_and_unreadable_saves_start_fresh() {
        let ctx = MigrationContext::new(11, vec![Island::new(0, 0, 5)]);
        let boot = bootstrap(Ok(LoadResponse::FirstTime), &ctx).expect("bootstrap");
        assert_eq!(boot.origin, BootstrapOrigin::Fresh);
        assert!(boot.needs_save);
        assert_eq!(boot.player.position, Vec3::new(0.0, 10.0, 0.0));

        let boot = bootstrap(Err(PersistError::Malformed("eof".into())), &ctx).expect("bootstrap");
        assert_eq!(boot.origin, BootstrapOrigin::Fresh);
        assert_eq!(boot.seed, 11);
    }

    #[test]
    fn credential_failures_are_not_swallowed() {
        let ctx = MigrationContext::default();
        assert!(matches!(
            bootstrap(Err(PersistError::Unauthorized), &ctx),
            Err(PersistError::Unauthorized)
        ));
    }

    #[test]
    fn current_document_restores_without_resave() {
        let (world, player) = played_world();
        let doc = save(&world, &player, 5);
        let boot = bootstrap(
            Ok(LoadResponse::Document(doc)),
            &MigrationContext::new(0, world.islands().to_vec()),
        )
        .expect("bootstrap");
        assert_eq!(boot.origin, BootstrapOrigin::Restored);
        assert!(!boot.needs_save);
        assert_eq!(boot.player.inventory, player.inventory);
    }
}
