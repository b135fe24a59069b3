//! Handlers taking raw inference-engine output.
//!
//! The request body is the engine's text as-is, not a JSON document the
//! extractor would parse for us: a malformed body is an integrity failure of
//! the pipeline, not a client mistake.

use axum::Json;
use axum::extract::State;

use voicehub_app::ports::{Dispatcher, RegistryRepository};
use voicehub_domain::command::DispatchRequest;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/commands/resolve`
pub async fn resolve<R, D>(
    State(state): State<AppState<R, D>>,
    body: String,
) -> Result<Json<DispatchRequest>, ApiError>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    Ok(Json(state.commands.resolve(&body)?))
}

/// `POST /api/commands`
pub async fn execute<R, D>(
    State(state): State<AppState<R, D>>,
    body: String,
) -> Result<Json<DispatchRequest>, ApiError>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    Ok(Json(state.commands.execute(&body).await?))
}
