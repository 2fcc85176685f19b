use std::sync::Arc;

use crate::adapters::{JsonFileSessionStore, TomlConfigAdapter};
use crate::app::session_interactor::SessionInteractor;
use crate::ports::{ConfigPort, SessionStorePort};

pub trait AppContainer: Send + Sync {
    fn session_interactor(&self) -> Arc<SessionInteractor>;
    fn config_port(&self) -> Arc<dyn ConfigPort>;
}

pub struct DefaultAppContainer {
    session_interactor: Arc<SessionInteractor>,
    config_port: Arc<dyn ConfigPort>,
}

impl DefaultAppContainer {
    pub fn new() -> Self {
        let store = Arc::new(JsonFileSessionStore::new());
        let config_port = Arc::new(TomlConfigAdapter::new());

        let session_interactor = Arc::new(SessionInteractor::new(
            Arc::clone(&store) as Arc<dyn SessionStorePort>,
        ));

        Self {
            session_interactor,
            config_port: config_port as Arc<dyn ConfigPort>,
        }
    }
}

impl Default for DefaultAppContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContainer for DefaultAppContainer {
    fn session_interactor(&self) -> Arc<SessionInteractor> {
        Arc::clone(&self.session_interactor)
    }

    fn config_port(&self) -> Arc<dyn ConfigPort> {
        Arc::clone(&self.config_port)
    }
}
