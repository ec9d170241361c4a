use std::collections::BTreeSet;

use glam::{IVec3, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::block::{Block, BlockKind, Provenance};
use crate::coords::{parse_position_key, planar_distance_sq, position_key};
use crate::inventory::{Inventory, ResourceKind};
use crate::physics::{first_hit, Ray, RayStep};
use crate::player::SPAWN_HEIGHT;
use crate::water::WaterField;
use crate::worldgen::{expand_tree, water_columns, Island, TerrainGenerator, WorldLayout};

pub type TreeId = u32;

/// What a successful `destroy` removed and credited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harvest {
    pub removed: Vec<IVec3>,
    pub tree: Option<TreeId>,
    pub wood: u32,
    pub stone: u32,
}

/// Which live blocks a ray may stop on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayFilter {
    /// Terrain and resources.
    Solid,
    /// Mineable blocks only.
    Resources,
    /// Terrain and user-built blocks: surfaces a block can be placed against.
    BuildSurfaces,
}

#[derive(Debug, Clone, Default)]
pub struct WorldState {
    islands: Vec<Island>,
    layout: WorldLayout,
    blocks: FxHashMap<IVec3, Block>,
    resources: FxHashSet<IVec3>,
    user_blocks: Vec<IVec3>,
    tree_index: FxHashMap<IVec3, TreeId>,
    trees: FxHashMap<TreeId, Vec<IVec3>>,
    next_tree: TreeId,
    destroyed: BTreeSet<String>,
    destroyed_positions: FxHashSet<IVec3>,
    water: WaterField,
}

impl WorldState {
    pub fn new(islands: Vec<Island>) -> Self {
        Self {
            islands,
            ..Self::default()
        }
    }

    /// Fresh world for `seed`, instantiated through the same path as a reload.
    pub fn generate(islands: Vec<Island>, seed: u64) -> Self {
        let layout = TerrainGenerator::default().generate_seeded(&islands, seed);
        Self::from_layout(islands, layout, Vec::new())
    }

    pub fn from_layout(islands: Vec<Island>, layout: WorldLayout, destroyed: Vec<String>) -> Self {
        let mut world = Self::new(islands);
        world.load_from(layout.terrain, layout.trees, layout.stones, destroyed);
        world
    }

    /// Rebuilds every live collection from persisted layout data. Resources whose
    /// key appears in `destroyed_keys` are never instantiated.
    pub fn load_from(
        &mut self,
        terrain: Vec<IVec3>,
        trees: Vec<IVec3>,
        stones: Vec<IVec3>,
        destroyed_keys: impl IntoIterator<Item = String>,
    ) {
        self.blocks.clear();
        self.resources.clear();
        self.user_blocks.clear();
        self.tree_index.clear();
        self.trees.clear();
        self.next_tree = 0;
        self.destroyed.clear();
        self.destroyed_positions.clear();

        for key in destroyed_keys {
            self.record_destroyed_key(key);
        }

        for &pos in &terrain {
            self.insert_block(pos, BlockKind::Grass, Provenance::Generated);
        }

        for &origin in &trees {
            self.grow_tree(origin);
        }

        for &pos in &stones {
            if self.destroyed_positions.contains(&pos) {
                continue;
            }
            if self.insert_block(pos, BlockKind::Stone, Provenance::Generated) {
                self.resources.insert(pos);
            }
        }

        self.water = WaterField::from_columns(water_columns(&terrain));
        self.layout = WorldLayout {
            terrain,
            trees,
            stones,
        };

        debug!(
            "World loaded: {} blocks, {} resources, {} trees, {} destroyed keys, {} water tiles",
            self.blocks.len(),
            self.resources.len(),
            self.trees.len(),
            self.destroyed.len(),
            self.water.len()
        );
    }

    fn record_destroyed_key(&mut self, key: String) {
        if let Some(pos) = parse_position_key(&key) {
            self.destroyed_positions.insert(pos);
        }
        self.destroyed.insert(key);
    }

    fn record_destroyed(&mut self, pos: IVec3) {
        self.destroyed_positions.insert(pos);
        self.destroyed.insert(position_key(pos));
    }

    fn insert_block(&mut self, pos: IVec3, kind: BlockKind, provenance: Provenance) -> bool {
        if self.blocks.contains_key(&pos) {
            return false;
        }
        self.blocks.insert(
            pos,
            Block {
                pos,
                kind,
                provenance,
            },
        );
        true
    }

    fn grow_tree(&mut self, origin: IVec3) {
        let id = self.next_tree;
        let mut members = Vec::new();
        for (pos, kind) in expand_tree(origin) {
            if self.destroyed_positions.contains(&pos) {
                continue;
            }
            if !self.insert_block(pos, kind, Provenance::Generated) {
                continue;
            }
            self.resources.insert(pos);
            self.tree_index.insert(pos, id);
            members.push(pos);
        }

        if !members.is_empty() {
            self.trees.insert(id, members);
            self.next_tree += 1;
        }
    }

    /// Places a block. User-built blocks become mineable and are exported in saves.
    /// Returns `false` when the cell is already occupied.
    pub fn spawn_block(&mut self, pos: IVec3, kind: BlockKind, user_built: bool) -> bool {
        let provenance = if user_built {
            Provenance::UserBuilt
        } else {
            Provenance::Generated
        };
        if !self.insert_block(pos, kind, provenance) {
            return false;
        }
        if user_built {
            self.resources.insert(pos);
            self.user_blocks.push(pos);
        }
        true
    }

    /// Mines the resource at `target`. Tree members take their whole group with them.
    pub fn destroy(&mut self, target: IVec3, inventory: &mut Inventory) -> Option<Harvest> {
        if !self.resources.contains(&target) {
            return None;
        }

        let tree = self.tree_index.get(&target).copied();
        let members = match tree.and_then(|id| self.trees.remove(&id)) {
            Some(members) => members,
            None => vec![target],
        };

        let mut harvest = Harvest {
            removed: Vec::with_capacity(members.len()),
            tree,
            wood: 0,
            stone: 0,
        };

        for pos in members {
            let Some(block) = self.blocks.remove(&pos) else {
                continue;
            };
            self.resources.remove(&pos);
            self.tree_index.remove(&pos);
            if block.is_user_built() {
                self.user_blocks.retain(|built| *built != pos);
            }
            self.record_destroyed(pos);

            let credit = if tree.is_some() {
                (block.kind == BlockKind::Wood).then_some(ResourceKind::Wood)
            } else {
                block.kind.harvest_yield()
            };
            match credit {
                Some(ResourceKind::Wood) => harvest.wood += 1,
                Some(ResourceKind::Stone) => harvest.stone += 1,
                None => {}
            }
            harvest.removed.push(pos);
        }

        inventory.credit(ResourceKind::Wood, harvest.wood);
        inventory.credit(ResourceKind::Stone, harvest.stone);
        Some(harvest)
    }

    pub fn block_at(&self, pos: IVec3) -> Option<&Block> {
        self.blocks.get(&pos)
    }

    pub fn is_solid(&self, pos: IVec3) -> bool {
        self.blocks.get(&pos).is_some_and(|block| block.kind.is_solid())
    }

    pub fn is_resource(&self, pos: IVec3) -> bool {
        self.resources.contains(&pos)
    }

    pub fn tree_of(&self, pos: IVec3) -> Option<TreeId> {
        self.tree_index.get(&pos).copied()
    }

    pub fn tree_members(&self, id: TreeId) -> &[IVec3] {
        self.trees.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn resources(&self) -> impl Iterator<Item = IVec3> + '_ {
        self.resources.iter().copied()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// User-built blocks in placement order.
    pub fn user_blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.user_blocks.iter().filter_map(|pos| self.blocks.get(pos))
    }

    pub fn destroyed_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.destroyed.iter().map(String::as_str)
    }

    pub fn is_destroyed(&self, pos: IVec3) -> bool {
        self.destroyed_positions.contains(&pos)
    }

    pub fn layout(&self) -> &WorldLayout {
        &self.layout
    }

    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    pub fn water(&self) -> &WaterField {
        &self.water
    }

    pub fn animate_water(&mut self, time: f32) {
        self.water.animate(time);
    }

    fn accepts(&self, pos: IVec3, filter: RayFilter) -> bool {
        let Some(block) = self.blocks.get(&pos) else {
            return false;
        };
        match filter {
            RayFilter::Solid => block.kind.is_solid(),
            RayFilter::Resources => self.resources.contains(&pos),
            RayFilter::BuildSurfaces => {
                block.is_user_built() || !self.resources.contains(&pos)
            }
        }
    }

    /// Nearest block along the ray accepted by `filter`.
    pub fn raycast(&self, ray: &Ray, max_distance: f32, filter: RayFilter) -> Option<RayStep> {
        first_hit(ray, max_distance, |cell| self.accepts(cell, filter))
    }

    pub fn nearest_island(&self, position: Vec3) -> Option<&Island> {
        self.islands.iter().min_by(|a, b| {
            let da = planar_distance_sq(position, a.x as f32, a.z as f32);
            let db = planar_distance_sq(position, b.x as f32, b.z as f32);
            da.total_cmp(&db)
        })
    }

    /// Respawn point above the island centre closest to `position`.
    pub fn respawn_point(&self, position: Vec3) -> Vec3 {
        match self.nearest_island(position) {
            Some(island) => Vec3::new(island.x as f32, SPAWN_HEIGHT, island.z as f32),
            None => Vec3::new(0.0, SPAWN_HEIGHT, 0.0),
        }
    }
}
