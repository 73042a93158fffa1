pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use crate::services::attempt_service::AttemptService;
use crate::store::MemoryStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub attempt_service: AttemptService,
}

impl AppState {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        let attempt_service = AttemptService::new(store.clone());
        Self {
            store,
            attempt_service,
        }
    }
}
