pub mod backend;
pub mod bridge;
pub mod compression;
pub mod document;
pub mod error;
pub mod local;
pub mod remote;
pub mod versioning;

pub use backend::{MemoryBackend, SaveBackend};
pub use bridge::{bootstrap, restore, save, Bootstrap, BootstrapOrigin};
pub use document::{LoadResponse, SaveDocument};
pub use error::PersistError;
pub use local::LocalFileBackend;
pub use remote::RestBackend;
pub use versioning::{migrate, MigrationContext, CURRENT_SAVE_VERSION};
