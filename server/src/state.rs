use std::sync::Arc;

use depot::Depot;
use redis::aio::ConnectionManager;

use super::{config::Config, session::init_sessions};

pub struct AppState {
    pub config: Config,
    pub depot: Depot,
    pub sessions: ConnectionManager,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let depot = Depot::new(&config.store_url, &config.store_key);
        let sessions = init_sessions(&config.redis_url).await;

        Arc::new(Self {
            config,
            depot,
            sessions,
        })
    }
}
