//! Application state shared by all handlers.

use std::sync::Arc;

use crate::services::ReviewService;
use crate::session::SessionStore;
use crate::store::CardStore;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReviewService>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn CardStore>) -> Self {
        Self {
            service: Arc::new(ReviewService::new(store)),
            sessions: Arc::new(SessionStore::new()),
        }
    }
}
