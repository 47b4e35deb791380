use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::ordering::{OrderedCollection, PgOrderedStore};

/// Shared handles injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: Arc<TokenService>,
    pub subphases: OrderedCollection,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: PgPool, tokens: TokenService, config: AppConfig) -> Self {
        let subphases = OrderedCollection::new(Arc::new(PgOrderedStore::new(pool.clone())));
        Self {
            pool,
            tokens: Arc::new(tokens),
            subphases,
            config: Arc::new(config),
        }
    }
}
