use glam::Vec3;
use tracing::{debug, info};

use islet_persist::bridge::{self, Bootstrap};
use islet_persist::SaveDocument;
use islet_shared::inventory::ResourceKind;
use islet_shared::player::PlayerState;
use islet_shared::world::{Harvest, WorldState};

use crate::building::{self, PlaceRejection, Placement};
use crate::input::{Action, FrameInput};
use crate::movement::{self, WaterContact};
use crate::swim::{SwimState, SwimSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespawnCause {
    Drowned,
    FellOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Mined(Harvest),
    Placed(Placement),
    PlaceRejected(PlaceRejection),
    BuildModeRequired,
    BuildModeChanged(bool),
    Selected(ResourceKind),
    Teleported(Vec3),
    SwimStateChanged(SwimState),
    Respawned(RespawnCause),
}

#[derive(Debug, Default)]
pub struct TickReport {
    pub events: Vec<GameEvent>,
    /// World or inventory changed in a way worth persisting right away.
    pub save_requested: bool,
}

/// Everything the simulation mutates, owned by the single tick loop.
#[derive(Debug)]
pub struct GameState {
    pub world: WorldState,
    pub player: PlayerState,
    pub seed: u64,
    swim: SwimSystem,
    build_mode: bool,
    clock: f32,
    tick: u64,
}

impl GameState {
    pub fn new(world: WorldState, player: PlayerState, seed: u64, drowning_respawn_after: f32) -> Self {
        Self {
            world,
            player,
            seed,
            swim: SwimSystem::new(drowning_respawn_after),
            build_mode: false,
            clock: 0.0,
            tick: 0,
        }
    }

    pub fn from_bootstrap(boot: Bootstrap, max_stamina: f32, drowning_respawn_after: f32) -> Self {
        let player = boot.player.with_max_stamina(max_stamina);
        Self::new(boot.world, player, boot.seed, drowning_respawn_after)
    }

    pub fn snapshot(&self) -> SaveDocument {
        bridge::save(&self.world, &self.player, self.seed)
    }

    pub fn build_mode(&self) -> bool {
        self.build_mode
    }

    pub fn swim_state(&self) -> SwimState {
        self.swim.state()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn tick(&mut self, input: &FrameInput, dt: f32) -> TickReport {
        let mut report = TickReport::default();
        self.tick += 1;
        self.clock += dt;
        self.world.animate_water(self.clock);

        for action in &input.actions {
            self.apply_action(*action, &mut report);
        }

        let swim_before = self.swim.state();
        let swim = self.swim.update(&mut self.player, &self.world, input.flags, dt);
        if swim.respawned {
            report.events.push(GameEvent::Respawned(RespawnCause::Drowned));
        }

        let moved = movement::step(
            &mut self.player,
            &self.world,
            input.flags,
            WaterContact::from(&swim),
        );
        if moved.respawned {
            report.events.push(GameEvent::Respawned(RespawnCause::FellOut));
        }

        if self.swim.state() != swim_before {
            report.events.push(GameEvent::SwimStateChanged(self.swim.state()));
        }
        report
    }

    fn apply_action(&mut self, action: Action, report: &mut TickReport) {
        match action {
            Action::Mine => {
                if let Some(harvest) = building::mine(&mut self.world, &mut self.player) {
                    report.save_requested = true;
                    report.events.push(GameEvent::Mined(harvest));
                }
            }
            Action::Place => {
                if !self.build_mode {
                    report.events.push(GameEvent::BuildModeRequired);
                    return;
                }
                match building::place(&mut self.world, &mut self.player) {
                    Ok(placement) => {
                        report.save_requested = true;
                        report.events.push(GameEvent::Placed(placement));
                    }
                    Err(rejection) => {
                        debug!("Placement rejected: {rejection:?}");
                        report.events.push(GameEvent::PlaceRejected(rejection));
                    }
                }
            }
            Action::ToggleBuildMode => {
                self.build_mode = !self.build_mode;
                info!("Build mode {}", if self.build_mode { "on" } else { "off" });
                report.events.push(GameEvent::BuildModeChanged(self.build_mode));
            }
            Action::Select(kind) => {
                self.player.selected = kind;
                report.events.push(GameEvent::Selected(kind));
            }
            Action::Look { pitch } => self.player.set_pitch(pitch),
            Action::Teleport { x, y, z } => {
                let target = Vec3::new(x, y, z);
                self.player.teleport(target);
                report.events.push(GameEvent::Teleported(target));
            }
        }
    }
}
