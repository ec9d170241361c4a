use std::sync::Arc;

use rand::Rng;
use tracing::{error, info};

use islet_persist::bridge::{bootstrap, BootstrapOrigin};
use islet_persist::{
    LocalFileBackend, MigrationContext, PersistError, RestBackend, SaveBackend,
};

use crate::config::{BackendKind, GameConfig};
use crate::game::GameState;

const FRESH_SEED_RANGE: std::ops::Range<u64> = 0..1_000_000;

pub struct Session {
    pub game: GameState,
    pub origin: BootstrapOrigin,
    /// The loaded document was replaced or upgraded and should be written back.
    pub needs_save: bool,
}

pub fn open_backend(config: &GameConfig) -> Result<Arc<dyn SaveBackend>, PersistError> {
    let backend: Arc<dyn SaveBackend> = match config.backend {
        BackendKind::Remote => Arc::new(RestBackend::new(
            config.api_base_url.clone(),
            config.token.clone(),
            config.request_timeout(),
        )?),
        BackendKind::Local => Arc::new(LocalFileBackend::new(&config.save_path)),
    };
    info!("Using save backend {}", backend.describe());
    Ok(backend)
}

pub fn fresh_seed() -> u64 {
    rand::thread_rng().gen_range(FRESH_SEED_RANGE)
}

/// Loads the player's save and builds the game around it.
pub fn start(
    backend: &dyn SaveBackend,
    config: &GameConfig,
    fresh_seed: u64,
) -> Result<Session, PersistError> {
    let ctx = MigrationContext::new(fresh_seed, config.islands.clone());
    let boot = bootstrap(backend.load(), &ctx)?;
    let origin = boot.origin;
    let needs_save = boot.needs_save;

    let game = GameState::from_bootstrap(boot, config.max_stamina, config.drowning_respawn_secs);
    info!(
        "World ready (seed {}, {} blocks, {} resources, origin {:?})",
        game.seed,
        game.world.block_count(),
        game.world.resource_count(),
        origin
    );
    Ok(Session {
        game,
        origin,
        needs_save,
    })
}

/// Logs a session-ending persistence failure; credential failures point at the login page.
pub fn report_fatal(err: &PersistError, config: &GameConfig) {
    match err {
        PersistError::Unauthorized => error!(
            "Save server rejected the credential; log in again at {}",
            config.login_url
        ),
        other => error!("Could not reach the save backend: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use islet_persist::bridge::BootstrapOrigin;
    use islet_persist::{
        LocalFileBackend, MemoryBackend, PersistError, SaveBackend, SaveDocument,
        CURRENT_SAVE_VERSION,
    };
    use islet_shared::inventory::Inventory;
    use islet_shared::worldgen::Island;

    use super::{fresh_seed, open_backend, start};
    use crate::config::{BackendKind, GameConfig};

    fn small_config() -> GameConfig {
        GameConfig {
            islands: vec![Island::new(0, 0, 6)],
            max_stamina: 5.0,
            ..GameConfig::default()
        }
    }

    #[test]
    fn first_run_generates_a_world_that_needs_saving() {
        let backend = MemoryBackend::new();
        let session = start(&backend, &small_config(), 77).expect("start");
        assert_eq!(session.origin, BootstrapOrigin::Fresh);
        assert!(session.needs_save);
        assert_eq!(session.game.seed, 77);
        assert_eq!(session.game.player.max_stamina, 5.0);
        assert!(session.game.world.block_count() > 0);
    }

    #[test]
    fn legacy_document_is_migrated() {
        let legacy = SaveDocument {
            version: 1,
            world_seed: Some(42),
            inventory: Inventory::with_counts(5, 0),
            ..SaveDocument::default()
        };
        let backend = MemoryBackend::with_document(legacy);
        let session = start(&backend, &small_config(), 1).expect("start");

        assert_eq!(session.origin, BootstrapOrigin::Migrated { from: 1 });
        assert!(session.needs_save);
        assert_eq!(session.game.seed, 42);
        assert_eq!(session.game.player.inventory, Inventory::with_counts(5, 0));
        assert_eq!(session.game.snapshot().version, CURRENT_SAVE_VERSION);
    }

    #[test]
    fn current_document_is_restored_without_a_save() {
        let config = small_config();
        let first = start(&MemoryBackend::new(), &config, 5).expect("start");
        let mut doc = first.game.snapshot();
        doc.player_position = Vec3::new(1.0, 3.0, 2.0).into();

        let session = start(&MemoryBackend::with_document(doc), &config, 9).expect("start");
        assert_eq!(session.origin, BootstrapOrigin::Restored);
        assert!(!session.needs_save);
        assert_eq!(session.game.seed, 5);
        assert_eq!(session.game.player.position, Vec3::new(1.0, 3.0, 2.0));
    }

    struct Rejecting;

    impl SaveBackend for Rejecting {
        fn load(&self) -> Result<islet_persist::LoadResponse, PersistError> {
            Err(PersistError::Unauthorized)
        }

        fn save(&self, _doc: &SaveDocument) -> Result<(), PersistError> {
            Err(PersistError::Unauthorized)
        }

        fn describe(&self) -> String {
            "rejecting".into()
        }
    }

    #[test]
    fn rejected_credential_stops_the_session() {
        let result = start(&Rejecting, &small_config(), 3);
        assert!(matches!(result, Err(PersistError::Unauthorized)));
    }

    #[test]
    fn local_backend_round_trips_through_a_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = GameConfig {
            backend: BackendKind::Local,
            save_path: dir.path().join("world.isav"),
            ..small_config()
        };
        let backend = open_backend(&config).expect("backend");
        let session = start(backend.as_ref(), &config, 11).expect("start");
        backend.save(&session.game.snapshot()).expect("save");

        let reopened = LocalFileBackend::new(&config.save_path);
        let again = start(&reopened, &config, 99).expect("restart");
        assert_eq!(again.origin, BootstrapOrigin::Restored);
        assert_eq!(again.game.seed, 11);
        assert_eq!(again.game.world.block_count(), session.game.world.block_count());
    }

    #[test]
    fn fresh_seeds_stay_in_range() {
        for _ in 0..32 {
            assert!(fresh_seed() < 1_000_000);
        }
    }
}
