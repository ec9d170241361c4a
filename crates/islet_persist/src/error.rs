use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("save endpoint unreachable: {0}")]
    Transport(String),
    #[error("save endpoint rejected the credential")]
    Unauthorized,
    #[error("save endpoint answered with status {code}")]
    Status { code: u16 },
    #[error("malformed save document: {0}")]
    Malformed(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unsupported save version {found}; current version is {current}")]
    UnsupportedVersion { found: u32, current: u32 },
    #[error("invalid save file: {0}")]
    InvalidFile(String),
}

impl PersistError {
    /// Failures worth retrying on the next autosave, as opposed to a rejected request.
    pub fn is_transient(&self) -> bool {
        match self {
            PersistError::Transport(_) | PersistError::Io(_) => true,
            PersistError::Status { code } => *code >= 500 || *code == 408 || *code == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for PersistError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) if status == reqwest::StatusCode::UNAUTHORIZED => PersistError::Unauthorized,
            Some(status) => PersistError::Status {
                code: status.as_u16(),
            },
            None if err.is_decode() => PersistError::Malformed(err.to_string()),
            None => PersistError::Transport(err.to_string()),
        }
    }
}
