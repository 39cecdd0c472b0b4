//! Shared handler state.

use std::sync::Arc;

use crate::claude::ClaudeClient;

/// Application state shared across all handlers.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    claude: ClaudeClient,
}

impl AppState {
    #[must_use]
    pub fn new(claude: ClaudeClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner { claude }),
        }
    }

    #[must_use]
    pub fn claude(&self) -> &ClaudeClient {
        &self.inner.claude
    }
}
