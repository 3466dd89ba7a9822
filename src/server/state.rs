use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use crate::catalog_link::CatalogSearch;
use crate::identity::{IdentityManager, IdentityStore};
use crate::scrobble::ScrobbleService;

use super::ServerConfig;

pub type GuardedScrobbleService = Arc<dyn ScrobbleService>;
pub type OptionalCatalogSearch = Option<Arc<dyn CatalogSearch>>;
pub type GuardedIdentityManager = Arc<IdentityManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub scrobbler: GuardedScrobbleService,
    pub catalog: OptionalCatalogSearch,
    pub identities: GuardedIdentityManager,
    pub hash: String,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        scrobbler: GuardedScrobbleService,
        catalog: OptionalCatalogSearch,
        identity_store: Arc<dyn IdentityStore>,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            scrobbler,
            catalog,
            identities: Arc::new(IdentityManager::new(identity_store)),
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedScrobbleService {
    fn from_ref(input: &ServerState) -> Self {
        input.scrobbler.clone()
    }
}

impl FromRef<ServerState> for OptionalCatalogSearch {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for GuardedIdentityManager {
    fn from_ref(input: &ServerState) -> Self {
        input.identities.clone()
    }
}
