//! `SQLite` implementation of [`ArtifactCache`].
//!
//! Artifacts are stored as JSON next to the output format version and the
//! grammar options they were generated with. Rows written by another format
//! version or with other options are ignored on load; rows of other registry
//! versions are pruned on the next store.

use std::future::Future;

use sqlx::SqlitePool;

use voicehub_app::ports::ArtifactCache;
use voicehub_domain::error::VoiceHubError;
use voicehub_domain::grammar::{FORMAT_VERSION, GrammarArtifact, GrammarOptions};

use crate::error::StorageError;

const SELECT_BY_KEY: &str = r"
    SELECT payload FROM grammar_artifacts
    WHERE registry_version = ? AND format_version = ? AND options = ?
";
const UPSERT: &str = r"
    INSERT INTO grammar_artifacts (registry_version, format_version, generated_at, options, payload)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT (registry_version) DO UPDATE SET
        format_version = excluded.format_version,
        generated_at = excluded.generated_at,
        options = excluded.options,
        payload = excluded.payload
";
const PRUNE: &str = "DELETE FROM grammar_artifacts WHERE registry_version != ?";

/// `SQLite`-backed grammar artifact cache.
pub struct SqliteArtifactCache {
    pool: SqlitePool,
}

impl SqliteArtifactCache {
    /// Create a new cache using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn load_artifact(
    pool: &SqlitePool,
    registry_version: u64,
    options: &str,
) -> Result<Option<GrammarArtifact>, StorageError> {
    let row: Option<(String,)> = sqlx::query_as(SELECT_BY_KEY)
        .bind(i64::try_from(registry_version)?)
        .bind(i64::from(FORMAT_VERSION))
        .bind(options)
        .fetch_optional(pool)
        .await?;
    row.map(|(payload,)| serde_json::from_str(&payload))
        .transpose()
        .map_err(StorageError::from)
}

fn encode_options(options: &GrammarOptions) -> Result<String, StorageError> {
    Ok(serde_json::to_string(options)?)
}

/// Row values of an artifact.
struct ArtifactRow {
    registry_version: i64,
    generated_at: String,
    options: String,
    payload: String,
}

fn encode(artifact: &GrammarArtifact) -> Result<ArtifactRow, StorageError> {
    Ok(ArtifactRow {
        registry_version: i64::try_from(artifact.source_registry_version())?,
        generated_at: artifact.generated_at().to_rfc3339(),
        options: encode_options(artifact.options())?,
        payload: serde_json::to_string(artifact)?,
    })
}

async fn store_artifact(pool: &SqlitePool, row: ArtifactRow) -> Result<(), StorageError> {
    let registry_version = row.registry_version;
    let mut tx = pool.begin().await?;
    sqlx::query(UPSERT)
        .bind(registry_version)
        .bind(i64::from(FORMAT_VERSION))
        .bind(row.generated_at)
        .bind(row.options)
        .bind(row.payload)
        .execute(&mut *tx)
        .await?;
    sqlx::query(PRUNE)
        .bind(registry_version)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

impl ArtifactCache for SqliteArtifactCache {
    fn load(
        &self,
        registry_version: u64,
        options: &GrammarOptions,
    ) -> impl Future<Output = Result<Option<GrammarArtifact>, VoiceHubError>> + Send {
        let pool = self.pool.clone();
        let options = encode_options(options);
        async move {
            let options = options?;
            Ok(load_artifact(&pool, registry_version, &options).await?)
        }
    }

    fn store(
        &self,
        artifact: &GrammarArtifact,
    ) -> impl Future<Output = Result<(), VoiceHubError>> + Send {
        let pool = self.pool.clone();
        let row = encode(artifact);
        async move { Ok(store_artifact(&pool, row?).await?) }
    }
}
