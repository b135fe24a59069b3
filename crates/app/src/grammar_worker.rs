//! Background grammar regeneration.
//!
//! The [`GrammarWorker`] runs on its own task. It watches registry
//! snapshots, waits for a quiet period after the last edit, then validates
//! and generates on the blocking pool. A successful artifact replaces the
//! active one in a single `watch` send; a failed run keeps the previous one
//! serving and records the failure in [`GrammarStatus`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use voicehub_domain::error::{IntegrityError, VoiceHubError};
use voicehub_domain::grammar::{ArtifactMetadata, GrammarArtifact, GrammarOptions, generate};
use voicehub_domain::registry::RegistrySnapshot;
use voicehub_domain::validation::{Conflict, IncompleteDevice, validate};

use crate::ports::ArtifactCache;

type Reply = oneshot::Sender<Result<Arc<GrammarArtifact>, VoiceHubError>>;

/// Tuning of the regeneration loop.
#[derive(Debug, Clone)]
pub struct GrammarWorkerConfig {
    /// Quiet period after the last registry edit before regenerating.
    pub debounce: Duration,
    pub options: GrammarOptions,
}

impl Default for GrammarWorkerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            options: GrammarOptions::default(),
        }
    }
}

/// Health of the grammar pipeline.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GrammarStatus {
    /// Artifact currently serving, if any.
    pub active: Option<ArtifactMetadata>,
    /// Registry version of the last attempt.
    pub registry_version: u64,
    pub conflicts: Vec<Conflict>,
    pub incomplete: Vec<IncompleteDevice>,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// Cheap, cloneable access to the active artifact.
#[derive(Debug, Clone)]
pub struct GrammarHandle {
    artifact: watch::Receiver<Option<Arc<GrammarArtifact>>>,
    status: watch::Receiver<GrammarStatus>,
    requests: mpsc::Sender<Reply>,
}

impl GrammarHandle {
    /// The artifact serving right now.
    #[must_use]
    pub fn current(&self) -> Option<Arc<GrammarArtifact>> {
        self.artifact.borrow().clone()
    }

    #[must_use]
    pub fn status(&self) -> GrammarStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified every time a new artifact becomes active.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<GrammarArtifact>>> {
        self.artifact.clone()
    }

    /// Regenerate from the latest snapshot now, skipping the debounce.
    ///
    /// # Errors
    ///
    /// Returns the generation error (conflicts, empty registry), or
    /// [`IntegrityError::GeneratorStopped`] when the worker is gone.
    pub async fn regenerate(&self) -> Result<Arc<GrammarArtifact>, VoiceHubError> {
        let (reply, outcome) = oneshot::channel();
        self.requests
            .send(reply)
            .await
            .map_err(|_| IntegrityError::GeneratorStopped)?;
        outcome
            .await
            .map_err(|_| IntegrityError::GeneratorStopped)?
    }
}

/// Owner of the regeneration loop.
pub struct GrammarWorker<C> {
    cache: C,
    config: GrammarWorkerConfig,
    artifact: watch::Sender<Option<Arc<GrammarArtifact>>>,
    status: watch::Sender<GrammarStatus>,
}

impl<C: ArtifactCache + 'static> GrammarWorker<C> {
    /// Spawn the worker on the current runtime.
    ///
    /// The worker first looks for a cached artifact matching the current
    /// registry version and grammar options, and only generates when there
    /// is none.
    pub fn spawn(
        cache: C,
        registry: watch::Receiver<RegistrySnapshot>,
        config: GrammarWorkerConfig,
    ) -> (GrammarHandle, JoinHandle<()>) {
        let (artifact, artifact_rx) = watch::channel(None);
        let (status, status_rx) = watch::channel(GrammarStatus::default());
        let (requests_tx, requests) = mpsc::channel(8);
        let worker = Self {
            cache,
            config,
            artifact,
            status,
        };
        let task = tokio::spawn(worker.run(registry, requests));
        let handle = GrammarHandle {
            artifact: artifact_rx,
            status: status_rx,
            requests: requests_tx,
        };
        (handle, task)
    }

    async fn run(
        self,
        mut registry: watch::Receiver<RegistrySnapshot>,
        mut requests: mpsc::Receiver<Reply>,
    ) {
        let initial = registry.borrow_and_update().clone();
        let mut deadline = if self.warm_start(&initial).await {
            None
        } else {
            Some(Instant::now())
        };

        loop {
            let quiet = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                changed = registry.changed() => {
                    if changed.is_err() {
                        tracing::debug!("registry closed, stopping grammar worker");
                        break;
                    }
                    deadline = Some(Instant::now() + self.config.debounce);
                }
                request = requests.recv() => {
                    let Some(reply) = request else {
                        tracing::debug!("all grammar handles dropped, stopping grammar worker");
                        break;
                    };
                    deadline = None;
                    let snapshot = registry.borrow_and_update().clone();
                    let _ = reply.send(self.regenerate(snapshot).await);
                }
                () = quiet => {
                    deadline = None;
                    let snapshot = registry.borrow_and_update().clone();
                    if self.is_current(&snapshot) {
                        continue;
                    }
                    let _ = self.regenerate(snapshot).await;
                }
            }
        }
    }

    /// Publish a cached artifact for `snapshot`. Returns `true` on a hit.
    async fn warm_start(&self, snapshot: &RegistrySnapshot) -> bool {
        let options = &self.config.options;
        match self.cache.load(snapshot.version(), options).await {
            Ok(Some(artifact)) if artifact.options() == options => {
                tracing::info!(
                    registry_version = snapshot.version(),
                    "grammar restored from cache"
                );
                let report = validate(snapshot);
                self.publish(Arc::new(artifact), report.conflicts, report.incomplete);
                true
            }
            Ok(Some(_)) => {
                tracing::info!("cached grammar built with other options, regenerating");
                false
            }
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read grammar cache");
                false
            }
        }
    }

    fn is_current(&self, snapshot: &RegistrySnapshot) -> bool {
        self.artifact
            .borrow()
            .as_ref()
            .is_some_and(|artifact| {
                artifact.source_registry_version() == snapshot.version()
                    && artifact.options() == &self.config.options
            })
    }

    #[tracing::instrument(skip_all, fields(registry_version = snapshot.version()))]
    async fn regenerate(
        &self,
        snapshot: RegistrySnapshot,
    ) -> Result<Arc<GrammarArtifact>, VoiceHubError> {
        let report = validate(&snapshot);
        for conflict in &report.conflicts {
            tracing::warn!(
                device_type = %conflict.device_type,
                location = %conflict.location,
                devices = ?conflict.device_ids,
                "conflicting device mapping"
            );
        }
        for incomplete in &report.incomplete {
            tracing::warn!(
                device_id = %incomplete.device_id,
                missing = ?incomplete.missing,
                "enabled device left out of the grammar"
            );
        }

        let options = self.config.options.clone();
        let job = snapshot.clone();
        let generated = match tokio::task::spawn_blocking(move || generate(&job, &options)).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "grammar generation task failed");
                Err(IntegrityError::GenerationAborted.into())
            }
        };

        match generated {
            Ok(artifact) => {
                let artifact = Arc::new(artifact);
                tracing::info!(pairs = artifact.pair_index().len(), "grammar regenerated");
                if let Err(err) = self.cache.store(&artifact).await {
                    tracing::warn!(error = %err, "failed to cache grammar");
                }
                self.publish(artifact.clone(), report.conflicts, report.incomplete);
                Ok(artifact)
            }
            Err(err) => {
                tracing::warn!(error = %err, "grammar regeneration failed, keeping previous grammar");
                self.status.send_modify(|status| {
                    status.registry_version = snapshot.version();
                    status.conflicts = report.conflicts;
                    status.incomplete = report.incomplete;
                    status.last_error = Some(err.to_string());
                    status.last_attempt_at = Some(Utc::now());
                });
                Err(err)
            }
        }
    }

    fn publish(
        &self,
        artifact: Arc<GrammarArtifact>,
        conflicts: Vec<Conflict>,
        incomplete: Vec<IncompleteDevice>,
    ) {
        let metadata = artifact.metadata();
        self.artifact.send_replace(Some(artifact));
        self.status.send_modify(|status| {
            status.registry_version = metadata.source_registry_version;
            status.active = Some(metadata);
            status.conflicts = conflicts;
            status.incomplete = incomplete;
            status.last_error = None;
            status.last_attempt_at = Some(Utc::now());
        });
    }
}
