//! JSON REST handlers for validation and the grammar pipeline.

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use voicehub_app::grammar_worker::GrammarStatus;
use voicehub_app::ports::{Dispatcher, RegistryRepository};
use voicehub_domain::error::{NotFoundError, VoiceHubError};
use voicehub_domain::grammar::ArtifactMetadata;
use voicehub_domain::validation::ValidationReport;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/validation`
pub async fn validation<R, D>(State(state): State<AppState<R, D>>) -> Json<ValidationReport>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    Json(state.registry.validate())
}

/// `GET /api/grammar`
pub async fn status<R, D>(State(state): State<AppState<R, D>>) -> Json<GrammarStatus>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    Json(state.grammar.status())
}

/// `GET /api/grammar/text`
pub async fn text<R, D>(State(state): State<AppState<R, D>>) -> Result<impl IntoResponse, ApiError>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    let artifact = state.grammar.current().ok_or_else(|| {
        VoiceHubError::from(NotFoundError {
            entity: "Grammar",
            id: "active".to_string(),
        })
    })?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        artifact.grammar_text().to_string(),
    ))
}

/// `POST /api/grammar/regenerate`
pub async fn regenerate<R, D>(
    State(state): State<AppState<R, D>>,
) -> Result<Json<ArtifactMetadata>, ApiError>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    let artifact = state.grammar.regenerate().await?;
    Ok(Json(artifact.metadata()))
}
