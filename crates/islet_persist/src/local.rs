use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::backend::SaveBackend;
use crate::compression::{compress_zstd, decompress_zstd, DEFAULT_ZSTD_LEVEL};
use crate::document::{LoadResponse, SaveDocument};
use crate::error::PersistError;

/// Save document kept in a single file on disk.
#[derive(Debug, Clone)]
pub struct LocalFileBackend {
    path: PathBuf,
    compress: bool,
}

impl LocalFileBackend {
    pub const MAGIC: [u8; 4] = *b"ISAV";
    const WIRE_VERSION_JSON: u8 = 1;
    const WIRE_VERSION_ZSTD: u8 = 2;

    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            compress: true,
        }
    }

    pub fn uncompressed(mut self) -> Self {
        self.compress = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decodes the contents of a save file. Empty input means no save yet.
    pub fn decode(bytes: &[u8]) -> Result<LoadResponse, PersistError> {
        if bytes.is_empty() {
            return Ok(LoadResponse::FirstTime);
        }

        if bytes.len() < Self::MAGIC.len() || bytes[..4] != Self::MAGIC[..] {
            return Err(PersistError::InvalidFile(
                "invalid save file magic; expected ISAV".to_string(),
            ));
        }

        let payload = &bytes[Self::MAGIC.len()..];
        let Some((wire_version, wire_payload)) = payload.split_first() else {
            return Ok(LoadResponse::FirstTime);
        };

        let json = match *wire_version {
            Self::WIRE_VERSION_JSON => wire_payload.to_vec(),
            Self::WIRE_VERSION_ZSTD => decompress_zstd(wire_payload).map_err(|err| {
                PersistError::InvalidFile(format!("failed to decompress save payload: {err}"))
            })?,
            other => {
                return Err(PersistError::InvalidFile(format!(
                    "unsupported save wire format version {other}; expected 1 or 2"
                )))
            }
        };

        LoadResponse::from_json(&json)
    }

    pub fn encode(doc: &SaveDocument, compress: bool) -> Result<Vec<u8>, PersistError> {
        let json = doc.to_json()?;
        let (wire_version, payload) = if compress {
            let compressed = compress_zstd(&json, DEFAULT_ZSTD_LEVEL).map_err(|err| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("failed to compress save payload: {err}"),
                )
            })?;
            (Self::WIRE_VERSION_ZSTD, compressed)
        } else {
            (Self::WIRE_VERSION_JSON, json)
        };

        let mut bytes = Vec::with_capacity(Self::MAGIC.len() + 1 + payload.len());
        bytes.extend_from_slice(&Self::MAGIC);
        bytes.push(wire_version);
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }
}

impl SaveBackend for LocalFileBackend {
    fn load(&self) -> Result<LoadResponse, PersistError> {
        if !self.path.exists() {
            return Ok(LoadResponse::FirstTime);
        }
        let bytes = fs::read(&self.path)?;
        let response = Self::decode(&bytes)?;
        debug!("Loaded save {:?} ({} bytes)", self.path, bytes.len());
        Ok(response)
    }

    fn save(&self, doc: &SaveDocument) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = Self::encode(doc, self.compress)?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, &bytes)?;
        fs::rename(&staging, &self.path)?;
        debug!("Wrote save {:?} ({} bytes)", self.path, bytes.len());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use islet_shared::inventory::Inventory;

    use super::LocalFileBackend;
    use crate::backend::SaveBackend;
    use crate::document::{GridPos, LoadResponse, SaveDocument};
    use crate::error::PersistError;

    fn sample() -> SaveDocument {
        SaveDocument {
            version: 2,
            world_seed: Some(31),
            inventory: Inventory::with_counts(2, 7),
            terrain: (0..50).map(|x| GridPos { x, y: 1, z: -x }).collect(),
            destroyed_resources: vec!["1_2_3".into()],
            ..SaveDocument::default()
        }
    }

    #[test]
    fn missing_and_empty_files_are_first_time() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = LocalFileBackend::new(dir.path().join("save.isav"));
        assert_eq!(backend.load().expect("load"), LoadResponse::FirstTime);

        fs::write(backend.path(), b"").expect("touch");
        assert_eq!(backend.load().expect("load"), LoadResponse::FirstTime);
    }

    #[test]
    fn saved_document_loads_back_compressed_and_plain() {
        let dir = tempfile::tempdir().expect("tempdir");
        for backend in [
            LocalFileBackend::new(dir.path().join("nested/zstd.isav")),
            LocalFileBackend::new(dir.path().join("plain.isav")).uncompressed(),
        ] {
            backend.save(&sample()).expect("save");
            assert_eq!(backend.load().expect("load"), LoadResponse::Document(sample()));
        }
    }

    #[test]
    fn wrong_magic_and_wire_version_are_rejected() {
        assert!(matches!(
            LocalFileBackend::decode(b"NOPE{}"),
            Err(PersistError::InvalidFile(_))
        ));
        assert!(matches!(
            LocalFileBackend::decode(b"ISAV\x09{}"),
            Err(PersistError::InvalidFile(_))
        ));
        assert!(matches!(
            LocalFileBackend::decode(b"ISAV\x01{not json"),
            Err(PersistError::Malformed(_))
        ));
    }
}
