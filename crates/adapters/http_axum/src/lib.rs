//! # voicehub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for editing the device registry
//!   (`/api/devices`, `/api/device-types`, `/api/locations`, `/api/import`)
//! - Expose the **grammar pipeline**: validation report, status, active
//!   grammar text, immediate regeneration
//! - Accept **engine output** and resolve or dispatch it (`/api/commands`)
//! - Map application errors into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `voicehub-app` (for port traits and services) and `voicehub-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
