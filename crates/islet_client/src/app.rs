use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use islet_persist::PersistError;

use crate::commands::{self, Command, HELP};
use crate::config::GameConfig;
use crate::game::{GameEvent, GameState, RespawnCause};
use crate::input::{Action, InputFlags, InputState};
use crate::save_queue::SaveQueue;
use crate::session;

const SHUTDOWN_SAVE_GRACE: Duration = Duration::from_secs(1);

pub struct App {
    config: GameConfig,
    game: GameState,
    input: InputState,
    saves: SaveQueue,
    running: Arc<AtomicBool>,
    command_rx: Receiver<Command>,
    tick_limit: Option<u64>,
    autosave_ticks: u64,
    fatal: Option<PersistError>,
}

impl App {
    pub fn new(
        config: GameConfig,
        game: GameState,
        saves: SaveQueue,
        running: Arc<AtomicBool>,
        command_rx: Receiver<Command>,
    ) -> Self {
        let autosave_ticks =
            (config.autosave_secs * config.tick_rate as f32).ceil().max(1.0) as u64;
        Self {
            config,
            game,
            input: InputState::default(),
            saves,
            running,
            command_rx,
            tick_limit: None,
            autosave_ticks,
            fatal: None,
        }
    }

    pub fn with_tick_limit(mut self, limit: Option<u64>) -> Self {
        self.tick_limit = limit;
        self
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn request_save(&mut self) {
        self.saves.request(self.game.snapshot());
    }

    pub fn run(&mut self) -> Result<(), PersistError> {
        let tick_duration = self.config.tick_duration();
        let dt = tick_duration.as_secs_f32();
        info!(
            "Starting Islet at {} ticks/s (autosave every {:.0}s, save backend {})",
            self.config.tick_rate,
            self.config.autosave_secs,
            self.saves.backend().describe()
        );

        while self.running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();

            self.handle_console_commands();
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            if self
                .tick_limit
                .is_some_and(|limit| self.game.tick_count() >= limit)
            {
                info!("Reached tick limit of {}", self.game.tick_count());
                break;
            }

            let frame = self.input.next_frame();
            let report = self.game.tick(&frame, dt);
            for event in &report.events {
                self.log_event(event);
            }
            if report.save_requested || self.game.tick_count() % self.autosave_ticks == 0 {
                self.request_save();
            }
            self.handle_save_results();

            let elapsed = tick_start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            }
        }

        if let Some(err) = self.fatal.take() {
            self.saves.flush(SHUTDOWN_SAVE_GRACE);
            return Err(err);
        }

        info!("Shutting down, saving world...");
        self.request_save();
        let completions = self
            .saves
            .flush(self.config.request_timeout() + SHUTDOWN_SAVE_GRACE);
        match completions.into_iter().last().map(|completion| completion.result) {
            Some(Ok(())) => info!("World saved. Goodbye!"),
            Some(Err(err)) => warn!("Final save failed: {err}. Goodbye!"),
            None => warn!("Final save did not finish in time. Goodbye!"),
        }
        Ok(())
    }

    fn handle_save_results(&mut self) {
        for completion in self.saves.poll() {
            let Err(err) = completion.result else {
                continue;
            };
            if !matches!(err, PersistError::Unauthorized) || self.fatal.is_some() {
                continue;
            }
            session::report_fatal(&err, &self.config);
            self.running.store(false, Ordering::SeqCst);
            self.fatal = Some(err);
        }
    }

    fn handle_console_commands(&mut self) {
        while let Ok(command) = self.command_rx.try_recv() {
            self.execute_console_command(command);
        }
    }

    fn execute_console_command(&mut self, command: Command) {
        match command {
            Command::Noop => {}
            Command::Stop => {
                info!("Shutdown requested via console /stop");
                self.running.store(false, Ordering::SeqCst);
            }
            Command::Help => info!("[CONSOLE] {HELP}"),
            Command::Status => self.log_status(),
            Command::Save => {
                info!("[CONSOLE] saving");
                self.request_save();
            }
            Command::Hold { flags, ticks } => self.input.hold(flags, ticks),
            Command::Halt => self.input.release(),
            Command::Jump => self.input.pulse(InputFlags::JUMP),
            Command::Mine => self.input.push_action(Action::Mine),
            Command::Place => self.input.push_action(Action::Place),
            Command::ToggleBuild => self.input.push_action(Action::ToggleBuildMode),
            Command::Select(kind) => self.input.push_action(Action::Select(kind)),
            Command::Look { degrees } => self.input.push_action(Action::Look {
                pitch: degrees.to_radians(),
            }),
            Command::Teleport { x, y, z } => {
                self.input.push_action(Action::Teleport { x, y, z })
            }
            Command::InvalidUsage(message) => warn!("[CONSOLE] {message}"),
            Command::Unknown(input) => {
                warn!("[CONSOLE] unknown command '{input}' (try /help)")
            }
        }
    }

    fn log_event(&self, event: &GameEvent) {
        match event {
            GameEvent::Mined(harvest) => info!(
                "Harvested {} block(s): +{} wood, +{} stone",
                harvest.removed.len(),
                harvest.wood,
                harvest.stone
            ),
            GameEvent::Placed(placed) => info!(
                "Placed {} at [{}, {}, {}]",
                placed.kind, placed.pos.x, placed.pos.y, placed.pos.z
            ),
            GameEvent::PlaceRejected(rejection) => info!("Cannot place here: {rejection:?}"),
            GameEvent::BuildModeRequired => info!("Enable build mode first (/build)"),
            GameEvent::Selected(kind) => info!("Selected {kind}"),
            GameEvent::Teleported(to) => info!("Teleported to [{}, {}, {}]", to.x, to.y, to.z),
            GameEvent::Respawned(RespawnCause::Drowned) => info!("You drowned"),
            GameEvent::Respawned(RespawnCause::FellOut) => info!("You fell out of the world"),
            GameEvent::BuildModeChanged(_) | GameEvent::SwimStateChanged(_) => {}
        }
    }

    fn log_status(&self) {
        let player = &self.game.player;
        info!(
            "[CONSOLE] tick {} at [{:.2}, {:.2}, {:.2}] yaw {:.2}, stamina {:.1}/{:.1}, {:?}",
            self.game.tick_count(),
            player.position.x,
            player.position.y,
            player.position.z,
            player.yaw,
            player.stamina,
            player.max_stamina,
            self.game.swim_state()
        );
        info!(
            "[CONSOLE] wood {} stone {} (selected {}), build mode {}, {} blocks, {} resources, {} built, input {}, {} superseded save(s)",
            player.inventory.wood,
            player.inventory.stone,
            player.selected,
            if self.game.build_mode() { "on" } else { "off" },
            self.game.world.block_count(),
            self.game.world.resource_count(),
            self.game.world.user_blocks().count(),
            if self.input.is_idle() { "idle" } else { "queued" },
            self.saves.superseded()
        );
    }
}

pub fn run(
    config: GameConfig,
    running: Arc<AtomicBool>,
    tick_limit: Option<u64>,
) -> Result<(), PersistError> {
    let backend = session::open_backend(&config)?;
    let started = session::start(backend.as_ref(), &config, session::fresh_seed());
    let session = match started {
        Ok(session) => session,
        Err(err) => {
            session::report_fatal(&err, &config);
            return Err(err);
        }
    };
    let saves = SaveQueue::new(Arc::clone(&backend)).map_err(|err| PersistError::Io(io::Error::other(err)))?;

    let (command_tx, command_rx) = mpsc::channel();
    spawn_console_command_thread(command_tx);

    let needs_save = session.needs_save;
    let mut app = App::new(config, session.game, saves, running, command_rx).with_tick_limit(tick_limit);
    if needs_save {
        app.request_save();
    }
    app.run()
}

fn spawn_console_command_thread(command_tx: Sender<Command>) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line_result in stdin.lock().lines() {
            let line = match line_result {
                Ok(line) => line,
                Err(err) => {
                    warn!("Failed to read console input: {err}");
                    break;
                }
            };

            let command = commands::parse_command(&line);
            if command_tx.send(command).is_err() {
                break;
            }
        }
    });
}
