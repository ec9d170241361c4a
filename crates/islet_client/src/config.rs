use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use islet_persist::remote::DEFAULT_TIMEOUT;
use islet_shared::player::DEFAULT_MAX_STAMINA;
use islet_shared::worldgen::{default_islands, Island};

pub const DEFAULT_CONFIG_PATH: &str = "islet.toml";
pub const TOKEN_ENV: &str = "ISLET_TOKEN";

const MIN_TICK_RATE: u32 = 1;
const MAX_TICK_RATE: u32 = 240;
const MIN_AUTOSAVE_SECS: f32 = 1.0;
const MIN_MAX_STAMINA: f32 = 1.0;
const MAX_MAX_STAMINA: f32 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    #[serde(default = "default_autosave_secs")]
    pub autosave_secs: f32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_drowning_respawn_secs")]
    pub drowning_respawn_secs: f32,
    #[serde(default = "default_max_stamina")]
    pub max_stamina: f32,
    #[serde(default = "default_islands")]
    pub islands: Vec<Island>,
}

fn default_api_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_login_url() -> String {
    "http://localhost:3000/login".to_string()
}

fn default_save_path() -> PathBuf {
    PathBuf::from("saves/islet.isav")
}

fn default_tick_rate() -> u32 {
    60
}

fn default_autosave_secs() -> f32 {
    30.0
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_drowning_respawn_secs() -> f32 {
    8.0
}

fn default_max_stamina() -> f32 {
    DEFAULT_MAX_STAMINA
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            api_base_url: default_api_base_url(),
            login_url: default_login_url(),
            token: None,
            save_path: default_save_path(),
            tick_rate: default_tick_rate(),
            autosave_secs: default_autosave_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            drowning_respawn_secs: default_drowning_respawn_secs(),
            max_stamina: default_max_stamina(),
            islands: default_islands(),
        }
    }
}

impl GameConfig {
    fn sanitize(mut self) -> Self {
        self.tick_rate = self.tick_rate.clamp(MIN_TICK_RATE, MAX_TICK_RATE);
        if !self.autosave_secs.is_finite() || self.autosave_secs < MIN_AUTOSAVE_SECS {
            self.autosave_secs = MIN_AUTOSAVE_SECS;
        }
        if !self.drowning_respawn_secs.is_finite() || self.drowning_respawn_secs < 0.0 {
            self.drowning_respawn_secs = 0.0;
        }
        self.max_stamina = if self.max_stamina.is_finite() {
            self.max_stamina.clamp(MIN_MAX_STAMINA, MAX_MAX_STAMINA)
        } else {
            DEFAULT_MAX_STAMINA
        };
        if self.islands.is_empty() {
            self.islands = default_islands();
        }
        self.token = self.token.filter(|token| !token.trim().is_empty());
        self
    }

    pub fn parse(contents: &str) -> io::Result<Self> {
        let parsed = toml::from_str::<Self>(contents).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to deserialize config: {e}"),
            )
        })?;
        Ok(parsed.sanitize())
    }

    /// Reads the config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            info!("No config at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn with_env_token(mut self) -> Self {
        if let Ok(token) = env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.token = Some(token);
            }
        }
        self
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate))
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs_f32(self.autosave_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{BackendKind, GameConfig};

    #[test]
    fn empty_file_gives_defaults() {
        let config = GameConfig::parse("").expect("parse");
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.islands.len(), 5);
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
        assert_eq!(config.drowning_respawn_secs, 8.0);
        assert_eq!(config.request_timeout(), islet_persist::remote::DEFAULT_TIMEOUT);
    }

    #[test]
    fn values_are_read_and_clamped() {
        let config = GameConfig::parse(
            r#"
            backend = "local"
            save_path = "custom/save.isav"
            tick_rate = 1000
            autosave_secs = 0.1
            max_stamina = 4.0
            drowning_respawn_secs = 3.5
            token = "   "

            [[islands]]
            x = 4
            z = -4
            radius = 9
            "#,
        )
        .expect("parse");

        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.tick_rate, 240);
        assert_eq!(config.autosave_secs, 1.0);
        assert_eq!(config.max_stamina, 4.0);
        assert_eq!(config.drowning_respawn_secs, 3.5);
        assert_eq!(config.token, None);
        assert_eq!(config.islands.len(), 1);
        assert_eq!(config.islands[0].radius, 9);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = GameConfig::load(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(config.backend, BackendKind::Remote);
    }

    #[test]
    fn malformed_file_is_rejected() {
        assert!(GameConfig::parse("tick_rate = \"fast\"").is_err());
    }
}
