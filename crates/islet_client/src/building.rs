use glam::IVec3;
use tracing::debug;

use islet_shared::block::BlockKind;
use islet_shared::inventory::ResourceKind;
use islet_shared::physics::{Ray, AABB};
use islet_shared::player::PlayerState;
use islet_shared::water::WATER_SURFACE_Y;
use islet_shared::world::{Harvest, RayFilter, WorldState};

pub const MINE_RANGE: f32 = 2.5;
pub const PLACE_RANGE: f32 = 5.0;
const MIN_PLACE_DISTANCE: f32 = 1.5;
const PLAYER_RADIUS: f32 = 0.3;
const PLAYER_HEIGHT: f32 = 1.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceRejection {
    OutOfStock(ResourceKind),
    NoSurface,
    TooClose,
    Occupied,
    InsidePlayer,
    /// Only stone may sit below the water surface.
    Underwater(ResourceKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub pos: IVec3,
    pub kind: BlockKind,
}

fn eye_ray(player: &PlayerState) -> Ray {
    Ray::new(player.eye(), player.look_direction())
}

/// Mines the nearest resource in reach, crediting the player's inventory.
pub fn mine(world: &mut WorldState, player: &mut PlayerState) -> Option<Harvest> {
    let hit = world.raycast(&eye_ray(player), MINE_RANGE, RayFilter::Resources)?;
    let harvest = world.destroy(hit.cell, &mut player.inventory)?;
    debug!(
        "Mined {:?}: {} blocks, +{} wood, +{} stone",
        hit.cell,
        harvest.removed.len(),
        harvest.wood,
        harvest.stone
    );
    Some(harvest)
}

/// Cell a new block would occupy: next to the aimed terrain or user-built face.
pub fn place_target(world: &WorldState, player: &PlayerState) -> Result<IVec3, PlaceRejection> {
    let hit = world
        .raycast(&eye_ray(player), PLACE_RANGE, RayFilter::BuildSurfaces)
        .ok_or(PlaceRejection::NoSurface)?;
    let target = hit.cell + hit.face.normal_ivec3();

    if target.as_vec3().distance(player.position) < MIN_PLACE_DISTANCE {
        return Err(PlaceRejection::TooClose);
    }
    if world.block_at(target).is_some() {
        return Err(PlaceRejection::Occupied);
    }
    let body = AABB::player(player.position, PLAYER_RADIUS, PLAYER_HEIGHT);
    if AABB::block(target).intersects(&body) {
        return Err(PlaceRejection::InsidePlayer);
    }
    Ok(target)
}

/// Places one item of the selected kind. Nothing changes unless this returns `Ok`.
pub fn place(world: &mut WorldState, player: &mut PlayerState) -> Result<Placement, PlaceRejection> {
    let selected = player.selected;
    if player.selected_count() == 0 {
        return Err(PlaceRejection::OutOfStock(selected));
    }

    let target = place_target(world, player)?;
    if (target.y as f32) < WATER_SURFACE_Y && selected != ResourceKind::Stone {
        return Err(PlaceRejection::Underwater(selected));
    }

    let kind = selected.block_kind();
    if !world.spawn_block(target, kind, true) {
        return Err(PlaceRejection::Occupied);
    }
    player.inventory.try_spend(selected);
    debug!("Placed {kind} at {:?}", target);
    Ok(Placement { pos: target, kind })
}

#[cfg(test)]
mod tests {
    use glam::{IVec3, Vec3};

    use islet_shared::block::BlockKind;
    use islet_shared::inventory::{Inventory, ResourceKind};
    use islet_shared::player::PlayerState;
    use islet_shared::world::WorldState;
    use islet_shared::worldgen::{Island, WorldLayout};

    use super::{mine, place, place_target, PlaceRejection, Placement};

    fn meadow(trees: Vec<IVec3>, stones: Vec<IVec3>) -> WorldState {
        let mut terrain = Vec::new();
        for x in -6..=6 {
            for z in -6..=6 {
                terrain.push(IVec3::new(x, 0, z));
            }
        }
        WorldState::from_layout(vec![Island::new(0, 0, 6)], WorldLayout { terrain, trees, stones }, vec![])
    }

    /// Standing on the meadow at the origin, looking down the -Z axis 30 degrees below the horizon.
    fn builder(inventory: Inventory, selected: ResourceKind) -> PlayerState {
        let mut player = PlayerState::spawn_at(Vec3::new(0.0, 0.5, 0.0));
        player.set_pitch(-30f32.to_radians());
        player.inventory = inventory;
        player.selected = selected;
        player
    }

    #[test]
    fn mining_a_trunk_fells_the_tree() {
        let mut world = meadow(vec![IVec3::new(0, 1, -2)], vec![]);
        let mut player = PlayerState::spawn_at(Vec3::new(0.0, 0.5, 0.0));

        let harvest = mine(&mut world, &mut player).expect("trunk in reach");
        assert_eq!(harvest.removed.len(), 20);
        assert_eq!(player.inventory, Inventory::with_counts(3, 0));
        assert!(mine(&mut world, &mut player).is_none());
    }

    #[test]
    fn mining_ignores_terrain_and_out_of_range_stones() {
        let mut world = meadow(vec![], vec![IVec3::new(0, 1, -4)]);
        let mut player = PlayerState::spawn_at(Vec3::new(0.0, 0.3, 0.0));
        assert!(mine(&mut world, &mut player).is_none());

        player.position.z = -1.5;
        let harvest = mine(&mut world, &mut player).expect("stone in reach");
        assert_eq!(harvest.stone, 1);
        assert_eq!(player.inventory.stone, 1);
    }

    #[test]
    fn placing_with_zero_count_is_a_no_op() {
        let mut world = meadow(vec![], vec![]);
        let mut player = builder(Inventory::with_counts(0, 3), ResourceKind::Wood);
        let blocks_before = world.block_count();

        assert_eq!(
            place(&mut world, &mut player),
            Err(PlaceRejection::OutOfStock(ResourceKind::Wood))
        );
        assert_eq!(world.block_count(), blocks_before);
        assert_eq!(world.user_blocks().count(), 0);
        assert_eq!(player.inventory, Inventory::with_counts(0, 3));
    }

    #[test]
    fn placing_on_the_ground_spends_one_item() {
        let mut world = meadow(vec![], vec![]);
        let mut player = builder(Inventory::with_counts(2, 0), ResourceKind::Wood);

        assert_eq!(place_target(&world, &player), Ok(IVec3::new(0, 1, -2)));
        let placed = place(&mut world, &mut player).expect("placement");
        assert_eq!(
            placed,
            Placement {
                pos: IVec3::new(0, 1, -2),
                kind: BlockKind::Wood
            }
        );
        assert_eq!(player.inventory.wood, 1);
        assert!(world.block_at(IVec3::new(0, 1, -2)).is_some_and(|b| b.is_user_built()));

        // The new block's near face is now the first surface, and its neighbour is too close.
        assert_eq!(place_target(&world, &player), Err(PlaceRejection::TooClose));
    }

    #[test]
    fn targets_next_to_the_player_are_rejected() {
        let world = meadow(vec![], vec![]);
        let mut player = builder(Inventory::with_counts(1, 0), ResourceKind::Wood);
        player.set_pitch(-60f32.to_radians());
        assert_eq!(place_target(&world, &player), Err(PlaceRejection::TooClose));

        player.set_pitch(0.0);
        assert_eq!(place_target(&world, &player), Err(PlaceRejection::NoSurface));
    }

    #[test]
    fn resources_are_not_build_surfaces() {
        let world = meadow(vec![], vec![IVec3::new(0, 1, -2)]);
        let player = builder(Inventory::with_counts(1, 0), ResourceKind::Wood);
        // The ray passes the stone and lands on the ground cell the stone already sits on.
        assert_eq!(place_target(&world, &player), Err(PlaceRejection::Occupied));
    }

    #[test]
    fn only_stone_goes_below_the_water_surface() {
        let mut world = WorldState::from_layout(
            vec![Island::new(0, 0, 3)],
            WorldLayout {
                terrain: vec![IVec3::new(0, 0, 0), IVec3::new(0, -2, -2)],
                trees: vec![],
                stones: vec![],
            },
            vec![],
        );
        let mut player = builder(Inventory::with_counts(1, 1), ResourceKind::Wood);
        player.set_pitch(-56f32.to_radians());

        assert_eq!(place_target(&world, &player), Ok(IVec3::new(0, -1, -2)));
        assert_eq!(
            place(&mut world, &mut player),
            Err(PlaceRejection::Underwater(ResourceKind::Wood))
        );
        assert_eq!(player.inventory, Inventory::with_counts(1, 1));

        player.selected = ResourceKind::Stone;
        let placed = place(&mut world, &mut player).expect("stone placement");
        assert_eq!(placed.kind, BlockKind::Stone);
        assert_eq!(player.inventory, Inventory::with_counts(1, 0));
    }
}
