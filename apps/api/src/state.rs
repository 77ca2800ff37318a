use std::sync::Arc;

use crate::config::Config;
use crate::evaluation::Evaluator;
use crate::store::EntityStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Persistence. `PgStore` in production.
    pub store: Arc<dyn EntityStore>,
    /// Pluggable evaluation backend. `LlmEvaluator` in production.
    pub evaluator: Arc<dyn Evaluator>,
    pub config: Config,
}
