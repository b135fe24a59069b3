//! JSON REST handlers for devices and imports.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use voicehub_app::ports::{Dispatcher, RegistryRepository};
use voicehub_app::services::registry_service::{ImportReport, ImportedDevice};
use voicehub_domain::device::{Device, RawDescriptor, ValueRange};
use voicehub_domain::error::VoiceHubError;
use voicehub_domain::id::{DeviceId, DeviceType, Location};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `PUT /api/devices/{id}`.
#[derive(Deserialize)]
pub struct UpsertDeviceRequest {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub device_type: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub raw: RawDescriptor,
    pub value_range: Option<ValueRange>,
}

fn enabled_by_default() -> bool {
    true
}

/// Request body for `PUT /api/devices/{id}/enabled`.
#[derive(Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

/// Request body for `PUT /api/devices/{id}/assignment`.
#[derive(Deserialize)]
pub struct AssignRequest {
    pub device_type: String,
    pub location: String,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Device>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from endpoints returning a single device.
pub enum DeviceResponse {
    Ok(Json<Device>),
}

impl IntoResponse for DeviceResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

fn parse_id(raw: &str) -> Result<DeviceId, ApiError> {
    DeviceId::new(raw).map_err(|err| VoiceHubError::from(err).into())
}

/// `GET /api/devices`
pub async fn list<R, D>(State(state): State<AppState<R, D>>) -> ListResponse
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    ListResponse::Ok(Json(state.registry.list_devices()))
}

/// `GET /api/devices/{id}`
pub async fn get<R, D>(
    State(state): State<AppState<R, D>>,
    Path(id): Path<String>,
) -> Result<DeviceResponse, ApiError>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    let device = state.registry.get_device(&parse_id(&id)?)?;
    Ok(DeviceResponse::Ok(Json(device)))
}

/// `PUT /api/devices/{id}`
pub async fn upsert<R, D>(
    State(state): State<AppState<R, D>>,
    Path(id): Path<String>,
    Json(req): Json<UpsertDeviceRequest>,
) -> Result<DeviceResponse, ApiError>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    let mut builder = Device::builder(parse_id(&id)?)
        .enabled(req.enabled)
        .raw(req.raw);
    if let Some(device_type) = req.device_type {
        builder = builder.device_type(DeviceType::new(&device_type).map_err(VoiceHubError::from)?);
    }
    if let Some(location) = req.location {
        builder = builder.location(Location::new(&location).map_err(VoiceHubError::from)?);
    }
    if let Some(value_range) = req.value_range {
        builder = builder.value_range(value_range);
    }
    let device = state.registry.upsert_device(builder.build()).await?;
    Ok(DeviceResponse::Ok(Json(device)))
}

/// `PUT /api/devices/{id}/enabled`
pub async fn set_enabled<R, D>(
    State(state): State<AppState<R, D>>,
    Path(id): Path<String>,
    Json(req): Json<SetEnabledRequest>,
) -> Result<DeviceResponse, ApiError>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    let device = state
        .registry
        .set_enabled(&parse_id(&id)?, req.enabled)
        .await?;
    Ok(DeviceResponse::Ok(Json(device)))
}

/// `PUT /api/devices/{id}/assignment`
pub async fn assign<R, D>(
    State(state): State<AppState<R, D>>,
    Path(id): Path<String>,
    Json(req): Json<AssignRequest>,
) -> Result<DeviceResponse, ApiError>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    let device_type = DeviceType::new(&req.device_type).map_err(VoiceHubError::from)?;
    let location = Location::new(&req.location).map_err(VoiceHubError::from)?;
    let device = state
        .registry
        .assign(&parse_id(&id)?, device_type, location)
        .await?;
    Ok(DeviceResponse::Ok(Json(device)))
}

/// `POST /api/import`
pub async fn import<R, D>(
    State(state): State<AppState<R, D>>,
    Json(batch): Json<Vec<ImportedDevice>>,
) -> Result<Json<ImportReport>, ApiError>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    let report = state.registry.import(batch).await?;
    Ok(Json(report))
}
