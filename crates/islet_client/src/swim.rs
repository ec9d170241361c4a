use tracing::{debug, info};

use islet_shared::player::PlayerState;
use islet_shared::world::WorldState;

use crate::input::InputFlags;

const FEET_OFFSET: f32 = -0.5;
const WAIST_OFFSET: f32 = 0.5;
const HEAD_OFFSET: f32 = 1.8;
const HEAD_CLEARANCE: f32 = 0.3;
const WATER_SEARCH_RADIUS: f32 = 1.0;
const FULL_IMMERSION_DEPTH: f32 = 2.0;
const BUOYANCY: f32 = 0.012;
const MAX_RISE_SPEED: f32 = 0.08;
const DRAG_THRESHOLD: f32 = 0.01;
const DRAG: f32 = 0.92;
const SWIM_DEPTH: f32 = 0.5;
const STAMINA_SLICE_SECS: f32 = 0.1;
const SWIM_STAMINA_COST: f32 = 0.01;
const SPRINT_SWIM_STAMINA_COST: f32 = 0.02;
const STAMINA_RECOVERY: f32 = 0.03;
const DROWNING_SINK: f32 = 0.002;
const DROWNING_MAX_SINK_SPEED: f32 = -0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwimState {
    #[default]
    Grounded,
    InWater,
    Swimming,
    Drowning,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwimReport {
    pub state: SwimState,
    pub in_water: bool,
    pub swimming: bool,
    pub depth: f32,
    pub respawned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Immersion {
    surface: f32,
    depth: f32,
}

#[derive(Debug, Clone)]
pub struct SwimSystem {
    drowning_respawn_after: f32,
    state: SwimState,
    drowning_time: f32,
    stamina_clock: f32,
}

impl SwimSystem {
    pub fn new(drowning_respawn_after: f32) -> Self {
        Self {
            drowning_respawn_after: drowning_respawn_after.max(0.0),
            state: SwimState::Grounded,
            drowning_time: 0.0,
            stamina_clock: 0.0,
        }
    }

    pub fn state(&self) -> SwimState {
        self.state
    }

    pub fn drowning_time(&self) -> f32 {
        self.drowning_time
    }

    /// Deepest tile around the player that overlaps its body, if any.
    fn immersion(player: &PlayerState, world: &WorldState) -> Option<Immersion> {
        let feet = player.position.y + FEET_OFFSET;
        let head = player.position.y + HEAD_OFFSET;
        world
            .water()
            .tiles_near(player.position.x, player.position.z, WATER_SEARCH_RADIUS)
            .filter(|tile| feet < tile.top() && head > tile.y - HEAD_CLEARANCE)
            .map(|tile| Immersion {
                surface: tile.top(),
                depth: (tile.top() - feet).max(0.0),
            })
            .max_by(|a, b| a.surface.total_cmp(&b.surface))
    }

    /// Applies buoyancy, drag, stamina and drowning for one tick. Runs before movement.
    pub fn update(
        &mut self,
        player: &mut PlayerState,
        world: &WorldState,
        flags: InputFlags,
        dt: f32,
    ) -> SwimReport {
        let Some(water) = Self::immersion(player, world) else {
            self.drowning_time = 0.0;
            self.tick_stamina(player, false, flags, dt);
            self.transition(SwimState::Grounded);
            return SwimReport {
                state: self.state,
                in_water: false,
                swimming: false,
                depth: 0.0,
                respawned: false,
            };
        };

        let waist = player.position.y + WAIST_OFFSET;
        let head = player.position.y + HEAD_OFFSET;
        let immersion = (water.depth / FULL_IMMERSION_DEPTH).min(1.0);

        if waist < water.surface {
            player.vertical_velocity =
                (player.vertical_velocity + BUOYANCY * immersion).min(MAX_RISE_SPEED);
        }
        if player.vertical_velocity.abs() > DRAG_THRESHOLD {
            player.vertical_velocity *= DRAG;
        }

        let swimming = head < water.surface + HEAD_CLEARANCE
            || (flags.is_moving() && water.depth > SWIM_DEPTH);
        self.tick_stamina(player, swimming, flags, dt);

        let mut respawned = false;
        let state = if swimming && player.stamina <= 0.0 {
            player.vertical_velocity =
                (player.vertical_velocity - DROWNING_SINK).max(DROWNING_MAX_SINK_SPEED);
            self.drowning_time += dt;
            if self.drowning_time >= self.drowning_respawn_after {
                let spawn = world.respawn_point(player.position);
                info!(
                    "Player drowned after {:.1}s; respawning at [{}, {}, {}]",
                    self.drowning_time, spawn.x, spawn.y, spawn.z
                );
                player.teleport(spawn);
                player.set_stamina(player.max_stamina);
                self.drowning_time = 0.0;
                respawned = true;
                SwimState::Grounded
            } else {
                SwimState::Drowning
            }
        } else {
            self.drowning_time = 0.0;
            if swimming {
                SwimState::Swimming
            } else {
                SwimState::InWater
            }
        };
        self.transition(state);

        SwimReport {
            state,
            in_water: !respawned,
            swimming: swimming && !respawned,
            depth: if respawned { 0.0 } else { water.depth },
            respawned,
        }
    }

    fn tick_stamina(&mut self, player: &mut PlayerState, swimming: bool, flags: InputFlags, dt: f32) {
        self.stamina_clock += dt.max(0.0);
        while self.stamina_clock >= STAMINA_SLICE_SECS {
            self.stamina_clock -= STAMINA_SLICE_SECS;
            let delta = if !swimming {
                STAMINA_RECOVERY
            } else if flags.contains(InputFlags::SPRINT) {
                -SPRINT_SWIM_STAMINA_COST
            } else {
                -SWIM_STAMINA_COST
            };
            player.set_stamina(player.stamina + delta);
        }
    }

    fn transition(&mut self, next: SwimState) {
        if self.state != next {
            debug!("Swim state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
