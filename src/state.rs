use std::sync::Arc;

use crate::services::sessions::SessionRegistry;

#[derive(Clone, Default)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
}
