//! Shared handles every page is built from.

use std::sync::Arc;

use crate::{
    config::ClientConfig, navigation::Navigator, query::QueryClient, session::SessionStore,
};

/// Process-wide collaborators handed to every page. Cloning is cheap and
/// every clone shares the same session, cache and navigator.
#[derive(Clone)]
pub struct AppContext {
    /// Client settings.
    pub config: Arc<ClientConfig>,
    /// The single session store.
    pub session: SessionStore,
    /// Query cache shared by every page.
    pub queries: QueryClient,
    /// Hard navigation sink.
    pub navigator: Arc<dyn Navigator>,
}

impl AppContext {
    /// Context with a fresh query cache.
    pub fn new(config: ClientConfig, session: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            config: Arc::new(config),
            session,
            queries: QueryClient::new(),
            navigator,
        }
    }
}
