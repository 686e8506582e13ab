use std::sync::Arc;

use lode_core::{CheckpointStore, CompiledFilters, Dialect, FilterCompiler, FilterConfig};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<str>,
    pub filters: Arc<FilterConfig>,
    pub compiled: Arc<CompiledFilters>,
    pub dialect: Dialect,
    pub checkpoint_store: Arc<dyn CheckpointStore>,
}

impl AppState {
    pub fn new(
        connector: &str,
        filters: FilterConfig,
        dialect: Dialect,
        checkpoint_store: Arc<dyn CheckpointStore>,
    ) -> Self {
        let compiled = FilterCompiler::compile(&filters);
        Self {
            connector: Arc::from(connector),
            filters: Arc::new(filters),
            compiled: Arc::new(compiled),
            dialect,
            checkpoint_store,
        }
    }
}
