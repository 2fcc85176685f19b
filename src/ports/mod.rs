// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::config::EngineConfig;
use crate::error::ClipdeckResult;
use crate::session::SessionState;
use crate::subtitles::TranscriptWord;

/// Port for persisting editor sessions
///
/// Loading returns raw JSON so that hydration can repair damaged fields one by
/// one instead of rejecting the whole file.
#[async_trait]
pub trait SessionStorePort: Send + Sync {
    /// Read a stored session as untyped JSON
    async fn load_session(&self, path: &Path) -> ClipdeckResult<Value>;

    /// Write a session, replacing any previous file atomically
    async fn save_session(&self, path: &Path, session: &SessionState) -> ClipdeckResult<()>;

    /// Read a transcript word list
    async fn load_transcript(&self, path: &Path) -> ClipdeckResult<Vec<TranscriptWord>>;

    /// Check whether a session exists at `path`
    async fn session_exists(&self, path: &Path) -> bool;
}

/// Port for configuration loading
#[async_trait]
pub trait ConfigPort: Send + Sync {
    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`. A missing default file yields the defaults; a missing
    /// explicit file is an error.
    async fn load_config(&self, path: Option<&Path>) -> ClipdeckResult<EngineConfig>;

    /// Path consulted when none is given
    fn default_config_path(&self) -> &Path;
}
