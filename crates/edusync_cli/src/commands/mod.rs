//! CLI command implementations.

pub mod account;
pub mod courses;
pub mod data;
pub mod sync;
pub mod tasks;

use edusync_channel::{ObjectStoreChannel, ReqwestClient};
use edusync_core::normalize_username;
use edusync_engine::{SyncConfig, SyncEngine};
use edusync_store::{keys, FileStore, LocalStore};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Display label written into every remote `{name, data}` body.
const OBJECT_NAME: &str = "EduSync_Global_DB";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// The engine type every command operates on.
pub type CliEngine = SyncEngine<ObjectStoreChannel<ReqwestClient>, FileStore>;

/// Shared state for one CLI invocation.
pub struct AppContext {
    /// The sync engine over the configured data directory and server.
    pub engine: Arc<CliEngine>,
    session: FileStore,
}

impl AppContext {
    /// Builds the engine stack over `data_dir` and `server`.
    ///
    /// No network traffic happens here; commands that talk to the remote
    /// store trigger it themselves.
    pub fn open(data_dir: &Path, server: &str) -> Result<Self, Box<dyn Error>> {
        tracing::debug!(data_dir = %data_dir.display(), server, "opening client context");
        let store = FileStore::open(data_dir)?;
        let session = FileStore::open(data_dir)?;
        let client = ReqwestClient::new(HTTP_TIMEOUT)?;
        let channel = ObjectStoreChannel::new(server, OBJECT_NAME, client);
        let engine = SyncEngine::new(SyncConfig::new(), channel, store)?;

        Ok(Self {
            engine: Arc::new(engine),
            session,
        })
    }

    /// Returns the active session's username, if logged in.
    pub fn session_user(&self) -> Result<Option<String>, Box<dyn Error>> {
        let stored = self.session.get(keys::SESSION)?;
        Ok(stored
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .map(|name| normalize_username(&name)))
    }

    /// Returns the active session's username or fails with a login hint.
    pub fn require_session(&self) -> Result<String, Box<dyn Error>> {
        self.session_user()?
            .ok_or_else(|| "not logged in (run `edusync login` first)".into())
    }

    /// Persists the active session.
    pub fn set_session(&self, username: &str) -> Result<(), Box<dyn Error>> {
        self.session
            .put(keys::SESSION, normalize_username(username).as_bytes())?;
        Ok(())
    }

    /// Clears the active session.
    pub fn clear_session(&self) -> Result<(), Box<dyn Error>> {
        self.session.remove(keys::SESSION)?;
        Ok(())
    }
}
