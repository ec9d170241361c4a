use std::sync::Mutex;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::backend::SaveBackend;
use crate::document::{LoadResponse, SaveDocument};
use crate::error::PersistError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Save endpoint reached over HTTP with a bearer credential.
pub struct RestBackend {
    client: Client,
    base_url: String,
    token: Mutex<Option<String>>,
}

impl RestBackend {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PersistError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Mutex::new(token.filter(|token| !token.trim().is_empty())),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn has_credential(&self) -> bool {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    pub fn clear_credential(&self) {
        *self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    fn bearer(&self) -> Result<String, PersistError> {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(PersistError::Unauthorized)
    }

    fn check_status(&self, response: Response) -> Result<Response, PersistError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Save endpoint rejected the credential; clearing it");
            self.clear_credential();
            return Err(PersistError::Unauthorized);
        }
        if !status.is_success() {
            return Err(PersistError::Status {
                code: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl SaveBackend for RestBackend {
    fn load(&self) -> Result<LoadResponse, PersistError> {
        let token = self.bearer()?;
        let url = self.endpoint("game/load");
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .map_err(|err| PersistError::Transport(err.to_string()))?;
        let body = self.check_status(response)?.bytes()?;
        LoadResponse::from_json(&body)
    }

    fn save(&self, doc: &SaveDocument) -> Result<(), PersistError> {
        let token = self.bearer()?;
        let url = self.endpoint("game/save");
        debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(doc)
            .send()
            .map_err(|err| PersistError::Transport(err.to_string()))?;
        self.check_status(response)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
