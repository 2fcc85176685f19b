// JSON session store adapter - Session files on the local file system

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{ClipdeckError, ClipdeckResult};
use crate::ports::SessionStorePort;
use crate::session::SessionState;
use crate::subtitles::TranscriptWord;

/// Stores sessions as pretty-printed JSON files
#[derive(Debug, Clone, Default)]
pub struct JsonFileSessionStore;

impl JsonFileSessionStore {
    pub fn new() -> Self {
        Self
    }

    async fn read_json(path: &Path) -> ClipdeckResult<Value> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ClipdeckError::SessionNotFound {
                path: path.display().to_string(),
            },
            _ => ClipdeckError::IoError(e),
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write through a temp file in the target directory so readers never see
    /// a half-written session.
    fn write_atomically(path: PathBuf, content: String) -> ClipdeckResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| ClipdeckError::IoError(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl SessionStorePort for JsonFileSessionStore {
    async fn load_session(&self, path: &Path) -> ClipdeckResult<Value> {
        let value = Self::read_json(path).await?;
        debug!(path = %path.display(), "Session file read");
        Ok(value)
    }

    async fn save_session(&self, path: &Path, session: &SessionState) -> ClipdeckResult<()> {
        let content = serde_json::to_string_pretty(session)?;
        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::write_atomically(target, content))
            .await
            .map_err(|e| ClipdeckError::IoError(std::io::Error::other(e)))??;
        info!(path = %path.display(), clips = session.clips.len(), "Session saved");
        Ok(())
    }

    async fn load_transcript(&self, path: &Path) -> ClipdeckResult<Vec<TranscriptWord>> {
        let value = Self::read_json(path).await?;
        // Either a bare word array or an object carrying a `words` array.
        let words = match value {
            Value::Array(words) => Value::Array(words),
            Value::Object(mut object) => object.remove("words").ok_or_else(|| ClipdeckError::InvalidTranscript {
                message: "expected a `words` array".to_string(),
            })?,
            _ => {
                return Err(ClipdeckError::InvalidTranscript {
                    message: "expected a word array".to_string(),
                })
            }
        };
        serde_json::from_value(words).map_err(|e| ClipdeckError::InvalidTranscript {
            message: e.to_string(),
        })
    }

    async fn session_exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }
}
