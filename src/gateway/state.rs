use std::sync::Arc;

use crate::processor::Processor;
use crate::secretary::Secretary;

/// Shared state handed to every handler.
pub struct AppState {
    pub processor: Processor,
    pub secretary: Arc<Secretary>,
}
