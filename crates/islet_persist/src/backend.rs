use std::sync::Mutex;

use crate::document::{LoadResponse, SaveDocument};
use crate::error::PersistError;

/// Where save documents live. Calls block; the client runs saves off the tick thread.
pub trait SaveBackend: Send + Sync {
    fn load(&self) -> Result<LoadResponse, PersistError>;

    fn save(&self, doc: &SaveDocument) -> Result<(), PersistError>;

    fn describe(&self) -> String;
}

/// Keeps the last saved document in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    stored: Mutex<Option<SaveDocument>>,
    saves: Mutex<u32>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: SaveDocument) -> Self {
        Self {
            stored: Mutex::new(Some(doc)),
            saves: Mutex::new(0),
        }
    }

    pub fn stored(&self) -> Option<SaveDocument> {
        self.stored
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn save_count(&self) -> u32 {
        *self.saves.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SaveBackend for MemoryBackend {
    fn load(&self) -> Result<LoadResponse, PersistError> {
        Ok(match self.stored() {
            Some(doc) => LoadResponse::Document(doc),
            None => LoadResponse::FirstTime,
        })
    }

    fn save(&self, doc: &SaveDocument) -> Result<(), PersistError> {
        *self
            .stored
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(doc.clone());
        *self.saves.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryBackend, SaveBackend};
    use crate::document::{LoadResponse, SaveDocument};

    #[test]
    fn memory_backend_starts_empty_and_keeps_last_save() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.load().expect("load"), LoadResponse::FirstTime);

        let doc = SaveDocument {
            version: 2,
            world_seed: Some(8),
            ..SaveDocument::default()
        };
        backend.save(&doc).expect("save");
        assert_eq!(backend.load().expect("load"), LoadResponse::Document(doc));
        assert_eq!(backend.save_count(), 1);
    }
}
