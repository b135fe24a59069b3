//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod catalog;
#[allow(clippy::missing_errors_doc)]
pub mod commands;
#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod grammar;

use axum::Router;
use axum::routing::{get, post, put};

use voicehub_app::ports::{Dispatcher, RegistryRepository};

use crate::state::AppState;

/// Build the `/api` router.
pub fn routes<R, D>() -> Router<AppState<R, D>>
where
    R: RegistryRepository + 'static,
    D: Dispatcher + 'static,
{
    Router::new()
        // Devices
        .route("/devices", get(devices::list::<R, D>))
        .route(
            "/devices/{id}",
            get(devices::get::<R, D>).put(devices::upsert::<R, D>),
        )
        .route("/devices/{id}/enabled", put(devices::set_enabled::<R, D>))
        .route("/devices/{id}/assignment", put(devices::assign::<R, D>))
        .route("/import", post(devices::import::<R, D>))
        // Open sets
        .route(
            "/device-types",
            get(catalog::list_device_types::<R, D>).post(catalog::create_device_type::<R, D>),
        )
        .route(
            "/locations",
            get(catalog::list_locations::<R, D>).post(catalog::create_location::<R, D>),
        )
        // Grammar
        .route("/validation", get(grammar::validation::<R, D>))
        .route("/grammar", get(grammar::status::<R, D>))
        .route("/grammar/text", get(grammar::text::<R, D>))
        .route("/grammar/regenerate", post(grammar::regenerate::<R, D>))
        // Commands
        .route("/commands", post(commands::execute::<R, D>))
        .route("/commands/resolve", post(commands::resolve::<R, D>))
}
