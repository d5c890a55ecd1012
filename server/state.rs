use std::sync::Arc;

use plug_vision::Pipeline;

/// Everything a request handler can reach. Built once in `main`, never
/// mutated afterwards, so it is shared without a lock.
pub struct AppState {
    pub pipeline: Pipeline,
    /// Upper bound on request bodies, checked before routing.
    pub max_body_bytes: usize,
}

/// Shared state type: an `Arc<AppState>` passed to every handler.
pub type SharedState = Arc<AppState>;
