// Session interactor - Loads and stores editor sessions through the store port

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::app::editor_interactor::EditorSession;
use crate::domain::config::EngineConfig;
use crate::error::ClipdeckResult;
use crate::ports::SessionStorePort;
use crate::subtitles::TranscriptWord;

/// Interactor for opening and saving sessions
pub struct SessionInteractor {
    store: Arc<dyn SessionStorePort>,
}

impl SessionInteractor {
    /// Create new session interactor with injected store
    pub fn new(store: Arc<dyn SessionStorePort>) -> Self {
        Self { store }
    }

    /// Open a stored session. `media_duration` overrides the stored duration
    /// when given; `words` bound the restored transcript selection.
    pub async fn open(
        &self,
        path: &Path,
        config: &EngineConfig,
        media_duration: Option<f64>,
        words: Vec<TranscriptWord>,
    ) -> ClipdeckResult<EditorSession> {
        let value = self.store.load_session(path).await?;
        let mut editor = EditorSession::new(config, media_duration.unwrap_or(0.0));
        editor.set_words(words);
        editor.hydrate_session_state(&value);
        info!(path = %path.display(), revision = editor.revision(), "Session opened");
        Ok(editor)
    }

    pub async fn save(&self, path: &Path, editor: &EditorSession) -> ClipdeckResult<()> {
        self.store.save_session(path, &editor.export_session_state()).await
    }

    pub async fn load_transcript(&self, path: &Path) -> ClipdeckResult<Vec<TranscriptWord>> {
        let words = self.store.load_transcript(path).await?;
        info!(path = %path.display(), words = words.len(), "Transcript loaded");
        Ok(words)
    }

    pub async fn exists(&self, path: &Path) -> bool {
        self.store.session_exists(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::JsonFileSessionStore;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let interactor = SessionInteractor::new(Arc::new(JsonFileSessionStore::new()));
        let config = EngineConfig::default();

        let mut editor = EditorSession::new(&config, 30.0);
        editor.add_clip(Some("Intro"), 1.0, 4.0).unwrap();
        editor.auto_assemble();
        interactor.save(&path, &editor).await.unwrap();

        let reopened = interactor.open(&path, &config, None, Vec::new()).await.unwrap();
        assert_eq!(reopened.snapshot(), editor.snapshot());
        assert_eq!(reopened.media_duration(), 30.0);
        assert!(!reopened.can_undo());
    }
}
