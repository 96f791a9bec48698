use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Absent without an API key; planning itself never needs it.
    pub text_generator: Option<Arc<dyn TextGenerator>>,
}
