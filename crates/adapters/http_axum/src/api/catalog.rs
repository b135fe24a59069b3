//! JSON REST handlers for the open sets: device types and locations.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use voicehub_app::ports::{Dispatcher, RegistryRepository};
use voicehub_domain::action::Action;
use voicehub_domain::error::VoiceHubError;
use voicehub_domain::id::{DeviceType, Location};

use crate::error::ApiError;
use crate::state::AppState;

/// A device type and the actions it accepts.
#[derive(Serialize, Deserialize)]
pub struct DeviceTypeBody {
    pub name: String,
    pub actions: Vec<Action>,
}

/// Request body for `POST /api/locations`.
#[derive(Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
}

/// Possible responses from the create endpoints.
pub enum CreateResponse<T> {
    Created(Json<T>),
    Existing(Json<T>),
}

impl<T: Serialize> IntoResponse for CreateResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
            Self::Existing(json) => json.into_response(),
        }
    }
}

/// `GET /api/device-types`
pub async fn list_device_types<R, D>(
    State(state): State<AppState<R, D>>,
) -> Json<Vec<DeviceTypeBody>>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    let types = state
        .registry
        .list_device_types()
        .into_iter()
        .map(|(device_type, actions)| DeviceTypeBody {
            name: device_type.into(),
            actions,
        })
        .collect();
    Json(types)
}

/// `POST /api/device-types`
pub async fn create_device_type<R, D>(
    State(state): State<AppState<R, D>>,
    Json(req): Json<DeviceTypeBody>,
) -> Result<CreateResponse<DeviceTypeBody>, ApiError>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    let device_type = DeviceType::new(&req.name).map_err(VoiceHubError::from)?;
    state
        .registry
        .add_device_type(device_type.clone(), req.actions)
        .await?;
    let actions = state
        .registry
        .snapshot()
        .vocabulary(&device_type)
        .map(<[Action]>::to_vec)
        .unwrap_or_default();
    Ok(CreateResponse::Created(Json(DeviceTypeBody {
        name: device_type.into(),
        actions,
    })))
}

/// `GET /api/locations`
pub async fn list_locations<R, D>(State(state): State<AppState<R, D>>) -> Json<Vec<Location>>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    Json(state.registry.list_locations())
}

/// `POST /api/locations`
pub async fn create_location<R, D>(
    State(state): State<AppState<R, D>>,
    Json(req): Json<CreateLocationRequest>,
) -> Result<CreateResponse<Location>, ApiError>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    let location = Location::new(&req.name).map_err(VoiceHubError::from)?;
    if state.registry.add_location(location.clone()).await? {
        Ok(CreateResponse::Created(Json(location)))
    } else {
        Ok(CreateResponse::Existing(Json(location)))
    }
}
