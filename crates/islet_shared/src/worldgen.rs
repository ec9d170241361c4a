use glam::{IVec2, IVec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::block::BlockKind;

/// Columns of open water kept around the terrain bounding box.
pub const WATER_MARGIN: i32 = 8;
const TRUNK_HEIGHT: i32 = 3;
const MIN_EDGE_TREE_SCALE: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Island {
    pub x: i32,
    pub z: i32,
    pub radius: i32,
}

impl Island {
    pub const fn new(x: i32, z: i32, radius: i32) -> Self {
        Self { x, z, radius }
    }

    pub fn center(&self) -> IVec2 {
        IVec2::new(self.x, self.z)
    }
}

pub const DEFAULT_ISLANDS: [Island; 5] = [
    Island::new(0, 0, 12),
    Island::new(30, 30, 12),
    Island::new(-30, 30, 12),
    Island::new(30, -30, 12),
    Island::new(-30, -30, 12),
];

pub fn default_islands() -> Vec<Island> {
    DEFAULT_ISLANDS.to_vec()
}

/// Generated world data that is persisted verbatim: terrain surface blocks and the
/// origins that trees and stones are expanded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldLayout {
    pub terrain: Vec<IVec3>,
    pub trees: Vec<IVec3>,
    pub stones: Vec<IVec3>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainParams {
    pub amplitude: f64,
    pub shore_width: f64,
    pub tree_chance: f64,
    pub stone_chance: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            amplitude: 0.8,
            shore_width: 4.0,
            tree_chance: 0.03,
            stone_chance: 0.03,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TerrainGenerator {
    pub params: TerrainParams,
}

impl TerrainGenerator {
    pub fn new(params: TerrainParams) -> Self {
        Self { params }
    }

    fn surface_noise(world_x: i32, world_z: i32) -> f64 {
        (world_x as f64 * 0.1).sin() * 2.0 + (world_z as f64 * 0.1).cos() * 2.0
    }

    /// Flat inside the island core, sloping down across the shore band.
    fn height_factor(&self, dist: f64, radius: f64) -> f64 {
        -(dist - (radius - self.params.shore_width)).max(0.0)
    }

    fn edge_scale(&self, dist: f64, radius: f64) -> f64 {
        if self.params.shore_width <= 0.0 {
            return 1.0;
        }
        ((radius - dist) / self.params.shore_width).clamp(MIN_EDGE_TREE_SCALE, 1.0)
    }

    pub fn column_height(&self, island: &Island, world_x: i32, world_z: i32) -> i32 {
        let dx = f64::from(world_x - island.x);
        let dz = f64::from(world_z - island.z);
        let dist = (dx * dx + dz * dz).sqrt();
        let raw = Self::surface_noise(world_x, world_z)
            + self.params.amplitude * self.height_factor(dist, f64::from(island.radius));
        (raw.floor() as i32).max(0)
    }

    /// Generates every island, drawing one roll in `[0, 1)` per terrain column.
    pub fn generate_with<F>(&self, islands: &[Island], mut roll: F) -> WorldLayout
    where
        F: FnMut(IVec2) -> f64,
    {
        let mut layout = WorldLayout::default();
        let mut covered: FxHashSet<IVec2> = FxHashSet::default();

        for island in islands {
            let radius = island.radius.max(0);
            let radius_sq = radius * radius;
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    if dx * dx + dz * dz > radius_sq {
                        continue;
                    }

                    let column = IVec2::new(island.x + dx, island.z + dz);
                    if !covered.insert(column) {
                        continue;
                    }

                    let height = self.column_height(island, column.x, column.y);
                    layout.terrain.push(IVec3::new(column.x, height, column.y));

                    let dist = f64::from(dx * dx + dz * dz).sqrt();
                    let tree_threshold =
                        self.params.tree_chance * self.edge_scale(dist, f64::from(radius));
                    let sample = roll(column);
                    let origin = IVec3::new(column.x, height + 1, column.y);
                    if sample < tree_threshold {
                        layout.trees.push(origin);
                    } else if sample < tree_threshold + self.params.stone_chance {
                        layout.stones.push(origin);
                    }
                }
            }
        }

        debug!(
            "Generated {} islands: {} columns, {} trees, {} stones",
            islands.len(),
            layout.terrain.len(),
            layout.trees.len(),
            layout.stones.len()
        );
        layout
    }

    pub fn generate_seeded(&self, islands: &[Island], seed: u64) -> WorldLayout {
        let mut rng = StdRng::seed_from_u64(seed);
        self.generate_with(islands, |_| rng.gen::<f64>())
    }
}

/// Blocks of a tree grown from `origin`: the trunk bottom-up, then the canopy.
pub fn expand_tree(origin: IVec3) -> impl Iterator<Item = (IVec3, BlockKind)> {
    let trunk = (0..TRUNK_HEIGHT).map(move |dy| (origin + IVec3::new(0, dy, 0), BlockKind::Wood));
    let canopy = (-1..=1).flat_map(move |ox| {
        (2..=3).flat_map(move |oy| {
            (-1..=1).map(move |oz| (origin + IVec3::new(ox, oy, oz), BlockKind::Leaf))
        })
    });
    trunk.chain(canopy)
}

/// Columns inside the padded terrain bounding box that have no terrain.
pub fn water_columns(terrain: &[IVec3]) -> Vec<IVec2> {
    let Some(first) = terrain.first() else {
        return Vec::new();
    };

    let mut min = IVec2::new(first.x, first.z);
    let mut max = min;
    let mut land: FxHashSet<IVec2> = FxHashSet::default();
    for pos in terrain {
        let column = IVec2::new(pos.x, pos.z);
        min = min.min(column);
        max = max.max(column);
        land.insert(column);
    }
    min -= IVec2::splat(WATER_MARGIN);
    max += IVec2::splat(WATER_MARGIN);

    let mut columns = Vec::new();
    for x in min.x..=max.x {
        for z in min.y..=max.y {
            let column = IVec2::new(x, z);
            if !land.contains(&column) {
                columns.push(column);
            }
        }
    }
    columns
}
