//! `SQLite` implementation of [`RegistryRepository`].

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use voicehub_app::ports::{Changeset, RegistryRepository};
use voicehub_domain::action::Action;
use voicehub_domain::device::{Device, RawDescriptor, ValueRange};
use voicehub_domain::error::VoiceHubError;
use voicehub_domain::id::{DeviceId, DeviceType, Location};
use voicehub_domain::registry::Registry;

use crate::error::StorageError;

fn decode<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

/// Wrapper for converting database rows into domain [`Device`].
struct Wrapper(Device);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let enabled: bool = row.try_get("enabled")?;
        let device_type: Option<String> = row.try_get("device_type")?;
        let location: Option<String> = row.try_get("location")?;
        let raw: String = row.try_get("raw")?;
        let value_range: Option<String> = row.try_get("value_range")?;

        let id = DeviceId::from_str(&id).map_err(decode)?;
        let device_type = device_type
            .as_deref()
            .map(DeviceType::from_str)
            .transpose()
            .map_err(decode)?;
        let location = location
            .as_deref()
            .map(Location::from_str)
            .transpose()
            .map_err(decode)?;
        let raw: RawDescriptor = serde_json::from_str(&raw).map_err(decode)?;
        let value_range: Option<ValueRange> = value_range
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(decode)?;

        Ok(Self(Device {
            id,
            enabled,
            device_type,
            location,
            raw,
            value_range,
        }))
    }
}

/// Custom device type row.
struct TypeRow(DeviceType, Vec<Action>);

impl<'r> FromRow<'r, SqliteRow> for TypeRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let name: String = row.try_get("name")?;
        let actions: String = row.try_get("actions")?;
        let name = DeviceType::from_str(&name).map_err(decode)?;
        let actions = serde_json::from_str(&actions).map_err(decode)?;
        Ok(Self(name, actions))
    }
}

const SELECT_VERSION: &str = "SELECT version FROM registry_meta WHERE id = 1";
const SELECT_TYPES: &str = "SELECT name, actions FROM device_types ORDER BY name";
const SELECT_LOCATIONS: &str = "SELECT name FROM locations ORDER BY name";
const SELECT_DEVICES: &str = "SELECT * FROM devices ORDER BY id";

const UPSERT_VERSION: &str = r"
    INSERT INTO registry_meta (id, version) VALUES (1, ?)
    ON CONFLICT (id) DO UPDATE SET version = excluded.version
";
const UPSERT_TYPE: &str = r"
    INSERT INTO device_types (name, actions) VALUES (?, ?)
    ON CONFLICT (name) DO UPDATE SET actions = excluded.actions
";
const INSERT_LOCATION: &str = "INSERT OR IGNORE INTO locations (name) VALUES (?)";
const UPSERT_DEVICE: &str = r"
    INSERT INTO devices (id, enabled, device_type, location, raw, value_range)
    VALUES (?, ?, ?, ?, ?, ?)
    ON CONFLICT (id) DO UPDATE SET
        enabled = excluded.enabled,
        device_type = excluded.device_type,
        location = excluded.location,
        raw = excluded.raw,
        value_range = excluded.value_range
";

/// `SQLite`-backed registry repository.
pub struct SqliteRegistryRepository {
    pool: SqlitePool,
}

impl SqliteRegistryRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn load_registry(pool: &SqlitePool) -> Result<Option<Registry>, StorageError> {
    let Some((version,)): Option<(i64,)> =
        sqlx::query_as(SELECT_VERSION).fetch_optional(pool).await?
    else {
        return Ok(None);
    };
    let types: Vec<TypeRow> = sqlx::query_as(SELECT_TYPES).fetch_all(pool).await?;
    let locations: Vec<(String,)> = sqlx::query_as(SELECT_LOCATIONS).fetch_all(pool).await?;
    let devices: Vec<Wrapper> = sqlx::query_as(SELECT_DEVICES).fetch_all(pool).await?;

    let locations = locations
        .into_iter()
        .map(|(name,)| Location::from_str(&name))
        .collect::<Result<Vec<_>, _>>()?;
    let registry = Registry::restore(
        u64::try_from(version)?,
        types.into_iter().map(|row| (row.0, row.1)),
        locations,
        devices.into_iter().map(|w| w.0),
    )?;
    Ok(Some(registry))
}

async fn commit_changeset(pool: &SqlitePool, changeset: Changeset) -> Result<(), StorageError> {
    let version = i64::try_from(changeset.version)?;
    let mut tx = pool.begin().await?;

    for (device_type, actions) in &changeset.custom_types {
        sqlx::query(UPSERT_TYPE)
            .bind(device_type.as_str())
            .bind(serde_json::to_string(actions)?)
            .execute(&mut *tx)
            .await?;
    }
    for location in &changeset.locations {
        sqlx::query(INSERT_LOCATION)
            .bind(location.as_str())
            .execute(&mut *tx)
            .await?;
    }
    for device in &changeset.devices {
        let value_range = device
            .value_range
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        sqlx::query(UPSERT_DEVICE)
            .bind(device.id.as_str())
            .bind(device.enabled)
            .bind(device.device_type.as_ref().map(DeviceType::as_str))
            .bind(device.location.as_ref().map(Location::as_str))
            .bind(serde_json::to_string(&device.raw)?)
            .bind(value_range)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query(UPSERT_VERSION)
        .bind(version)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

impl RegistryRepository for SqliteRegistryRepository {
    fn load(&self) -> impl Future<Output = Result<Option<Registry>, VoiceHubError>> + Send {
        let pool = self.pool.clone();
        async move { Ok(load_registry(&pool).await?) }
    }

    fn commit(
        &self,
        changeset: Changeset,
    ) -> impl Future<Output = Result<(), VoiceHubError>> + Send {
        let pool = self.pool.clone();
        async move { Ok(commit_changeset(&pool, changeset).await?) }
    }
}
