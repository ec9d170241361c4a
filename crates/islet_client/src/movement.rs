use glam::Vec3;
use tracing::info;

use islet_shared::coords::top_face_y;
use islet_shared::physics::Ray;
use islet_shared::player::PlayerState;
use islet_shared::world::{RayFilter, WorldState};

use crate::input::InputFlags;
use crate::swim::SwimReport;

const TURN_SPEED: f32 = 0.05;
const SWIM_TURN_SPEED: f32 = 0.04;
const WALK_STEP: f32 = 0.1;
const SWIM_STEP: f32 = 0.05;
const SWIM_SPRINT_STEP: f32 = 0.08;
const CHEST_HEIGHT: f32 = 0.9;
const COLLISION_RANGE: f32 = 0.4;
const GROUND_PROBE_HEIGHT: f32 = 1.0;
const GROUND_PROBE_RANGE: f32 = 1.05;
const JUMP_VELOCITY: f32 = 0.15;
const GRAVITY: f32 = 0.008;
const TERMINAL_VELOCITY: f32 = -0.5;
const SWIM_STROKE_VELOCITY: f32 = 0.08;
const SWIM_STROKE_COST: f32 = 0.05;
pub const RESPAWN_DEPTH: f32 = -20.0;

/// Water status the swim subsystem computed for this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaterContact {
    pub in_water: bool,
    pub swimming: bool,
}

impl From<&SwimReport> for WaterContact {
    fn from(report: &SwimReport) -> Self {
        Self {
            in_water: report.in_water,
            swimming: report.swimming,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementOutcome {
    pub grounded: bool,
    pub blocked: bool,
    pub respawned: bool,
}

/// Advances the player one tick: turn, translate with collision, ground or swim
/// vertical control, integrate, then the fall-out respawn.
pub fn step(
    player: &mut PlayerState,
    world: &WorldState,
    flags: InputFlags,
    water: WaterContact,
) -> MovementOutcome {
    let mut outcome = MovementOutcome::default();

    let turn = if water.swimming { SWIM_TURN_SPEED } else { TURN_SPEED };
    if flags.contains(InputFlags::TURN_LEFT) {
        player.yaw += turn;
    }
    if flags.contains(InputFlags::TURN_RIGHT) {
        player.yaw -= turn;
    }

    let direction = match (
        flags.contains(InputFlags::FORWARD),
        flags.contains(InputFlags::BACKWARD),
    ) {
        (true, false) => Some(player.forward()),
        (false, true) => Some(-player.forward()),
        _ => None,
    };
    if let Some(direction) = direction {
        let distance = if !water.swimming {
            WALK_STEP
        } else if flags.contains(InputFlags::SPRINT) {
            SWIM_SPRINT_STEP
        } else {
            SWIM_STEP
        };
        outcome.blocked = !translate(player, world, direction, distance);
    }

    if !water.in_water {
        let probe = Ray::new(player.position + Vec3::Y * GROUND_PROBE_HEIGHT, Vec3::NEG_Y);
        match world.raycast(&probe, GROUND_PROBE_RANGE, RayFilter::Solid) {
            Some(hit) => {
                player.position.y = top_face_y(hit.cell);
                player.vertical_velocity = 0.0;
                outcome.grounded = true;
                if flags.contains(InputFlags::JUMP) {
                    player.vertical_velocity = JUMP_VELOCITY;
                }
            }
            None => {
                player.vertical_velocity =
                    (player.vertical_velocity - GRAVITY).max(TERMINAL_VELOCITY);
            }
        }
    } else if player.stamina > 0.0 {
        if flags.contains(InputFlags::JUMP) {
            player.vertical_velocity = SWIM_STROKE_VELOCITY;
            player.set_stamina(player.stamina - SWIM_STROKE_COST);
        } else if flags.contains(InputFlags::DIVE) {
            player.vertical_velocity = -SWIM_STROKE_VELOCITY;
            player.set_stamina(player.stamina - SWIM_STROKE_COST);
        }
    }

    player.position.y += player.vertical_velocity;

    if player.position.y < RESPAWN_DEPTH {
        let spawn = world.respawn_point(player.position);
        info!(
            "Player fell out of the world; respawning at [{}, {}, {}]",
            spawn.x, spawn.y, spawn.z
        );
        player.teleport(spawn);
        outcome.respawned = true;
    }

    outcome
}

/// Moves the player and undoes the move when a block sits within reach of the chest.
fn translate(player: &mut PlayerState, world: &WorldState, direction: Vec3, distance: f32) -> bool {
    let previous = player.position;
    player.position += direction * distance;

    let chest = Ray::new(player.position + Vec3::Y * CHEST_HEIGHT, direction);
    let blocked = world
        .raycast(&chest, COLLISION_RANGE, RayFilter::Solid)
        .is_some_and(|hit| hit.distance < COLLISION_RANGE);
    if blocked {
        player.position = previous;
    }
    !blocked
}
