//! Shared application state for axum handlers.

use std::sync::Arc;

use voicehub_app::grammar_worker::GrammarHandle;
use voicehub_app::ports::{Dispatcher, RegistryRepository};
use voicehub_app::services::command_service::CommandService;
use voicehub_app::services::registry_service::RegistryService;

/// Application state shared across all axum handlers.
///
/// Generic over the registry repository and the dispatcher to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`.
pub struct AppState<R, D> {
    /// Registry edits and snapshots.
    pub registry: Arc<RegistryService<R>>,
    /// Active grammar and regeneration requests.
    pub grammar: GrammarHandle,
    /// Resolution and dispatch of engine output.
    pub commands: Arc<CommandService<D>>,
}

impl<R, D> Clone for AppState<R, D> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            grammar: self.grammar.clone(),
            commands: Arc::clone(&self.commands),
        }
    }
}

impl<R, D> AppState<R, D>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    /// Create a new application state from pre-wrapped `Arc` services.
    ///
    /// The registry service is shared with the grammar worker, which is why
    /// it arrives already wrapped.
    pub fn new(
        registry: Arc<RegistryService<R>>,
        grammar: GrammarHandle,
        commands: CommandService<D>,
    ) -> Self {
        Self {
            registry,
            grammar,
            commands: Arc::new(commands),
        }
    }
}
