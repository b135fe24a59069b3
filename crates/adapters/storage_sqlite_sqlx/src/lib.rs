//! # voicehub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the storage port traits defined in `voicehub-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `voicehub-app` (for port traits) and `voicehub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod artifact_cache;
pub mod error;
pub mod pool;
pub mod registry_repo;

pub use artifact_cache::SqliteArtifactCache;
pub use pool::{Config, Database};
pub use registry_repo::SqliteRegistryRepository;
