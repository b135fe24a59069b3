//! Registry service: serialised edits over a copy-on-write registry.
//!
//! Writers take the edit lock, apply their change to a private copy of the
//! current snapshot, persist the resulting [`Changeset`] and only then publish
//! the new snapshot. Readers clone the published `Arc` and never wait on a
//! writer; a failed write leaves both the store and the published snapshot
//! untouched.

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};

use voicehub_domain::action::Action;
use voicehub_domain::classifier::classify;
use voicehub_domain::device::{Device, RawDescriptor, ValueRange};
use voicehub_domain::error::{NotFoundError, VoiceHubError};
use voicehub_domain::id::{DeviceId, DeviceType, Location};
use voicehub_domain::registry::{Registry, RegistrySnapshot};
use voicehub_domain::validation::{ValidationReport, validate};

use crate::ports::{Changeset, RegistryRepository};

/// One descriptor of an import batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedDevice {
    pub id: DeviceId,
    /// New devices default to disabled.
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub raw: RawDescriptor,
    #[serde(default)]
    pub value_range: Option<ValueRange>,
}

/// Outcome of an import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub created: Vec<DeviceId>,
    pub updated: Vec<DeviceId>,
    pub unchanged: Vec<DeviceId>,
    /// Devices still missing a type or a location after classification.
    pub unclassified: Vec<DeviceId>,
    pub new_locations: Vec<Location>,
    pub registry_version: u64,
}

/// Application service owning the device registry.
pub struct RegistryService<R> {
    repo: R,
    write_lock: Mutex<()>,
    snapshots: watch::Sender<RegistrySnapshot>,
}

impl<R: RegistryRepository> RegistryService<R> {
    /// Load the persisted registry, or start from the built-in types.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn load(repo: R) -> Result<Self, VoiceHubError> {
        let registry = repo.load().await?.unwrap_or_default();
        tracing::info!(
            version = registry.version(),
            devices = registry.devices().count(),
            "registry loaded"
        );
        Ok(Self {
            repo,
            write_lock: Mutex::new(()),
            snapshots: watch::Sender::new(registry.into_snapshot()),
        })
    }

    /// The current registry version, shared.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every published edit.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RegistrySnapshot> {
        self.snapshots.subscribe()
    }

    /// # Errors
    ///
    /// Returns [`VoiceHubError::NotFound`] when no device with `id` exists.
    pub fn get_device(&self, id: &DeviceId) -> Result<Device, VoiceHubError> {
        self.snapshot()
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError::device(id).into())
    }

    #[must_use]
    pub fn list_devices(&self) -> Vec<Device> {
        self.snapshot().devices().cloned().collect()
    }

    #[must_use]
    pub fn list_device_types(&self) -> Vec<(DeviceType, Vec<Action>)> {
        self.snapshot()
            .device_types()
            .map(|(device_type, actions)| (device_type.clone(), actions.to_vec()))
            .collect()
    }

    #[must_use]
    pub fn list_locations(&self) -> Vec<Location> {
        self.snapshot().locations().cloned().collect()
    }

    /// Run the uniqueness validator over the current snapshot.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        validate(&self.snapshot())
    }

    /// Insert or replace a device.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the device references an unknown
    /// type or location, or a storage error.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id))]
    pub async fn upsert_device(&self, device: Device) -> Result<Device, VoiceHubError> {
        self.mutate(move |registry| {
            registry.upsert(device.clone())?;
            Ok(device)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`VoiceHubError::NotFound`] for an unknown id, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn set_enabled(&self, id: &DeviceId, enabled: bool) -> Result<Device, VoiceHubError> {
        self.mutate(|registry| registry.set_enabled(id, enabled).cloned())
            .await
    }

    /// Map a device onto a `(type, location)` pair.
    ///
    /// Conflicts with other devices are allowed here; they block the next
    /// grammar regeneration instead.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown type or location,
    /// [`VoiceHubError::NotFound`] for an unknown id, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn assign(
        &self,
        id: &DeviceId,
        device_type: DeviceType,
        location: Location,
    ) -> Result<Device, VoiceHubError> {
        self.mutate(|registry| registry.assign(id, device_type, location).cloned())
            .await
    }

    /// Register a custom device type.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a duplicate type or an empty
    /// vocabulary, or a storage error.
    #[tracing::instrument(skip(self, actions))]
    pub async fn add_device_type(
        &self,
        device_type: DeviceType,
        actions: Vec<Action>,
    ) -> Result<(), VoiceHubError> {
        self.mutate(|registry| Ok(registry.add_custom_type(device_type, actions)?))
            .await
    }

    /// Declare a location. Returns `false` when it already existed.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn add_location(&self, location: Location) -> Result<bool, VoiceHubError> {
        self.mutate(|registry| Ok(registry.add_custom_location(location)))
            .await
    }

    /// Classify and upsert a batch of imported descriptors in one change.
    ///
    /// Known devices keep the type and location they already have; only the
    /// missing half is filled from the classifier.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a descriptor cannot be stored, in
    /// which case nothing from the batch is applied, or a storage error.
    #[tracing::instrument(skip(self, batch), fields(batch = batch.len()))]
    pub async fn import(&self, batch: Vec<ImportedDevice>) -> Result<ImportReport, VoiceHubError> {
        let report = self
            .mutate(|registry| {
                let mut report = ImportReport::default();
                for item in batch {
                    import_one(registry, item, &mut report)?;
                }
                report.registry_version = registry.version();
                Ok(report)
            })
            .await?;
        tracing::info!(
            created = report.created.len(),
            updated = report.updated.len(),
            unclassified = report.unclassified.len(),
            "import applied"
        );
        Ok(report)
    }

    /// Apply `edit` to a copy of the registry, persist, then publish.
    async fn mutate<T>(
        &self,
        edit: impl FnOnce(&mut Registry) -> Result<T, VoiceHubError>,
    ) -> Result<T, VoiceHubError> {
        let _guard = self.write_lock.lock().await;
        let current = self.snapshot();
        let mut next = current.to_registry();
        let output = edit(&mut next)?;
        if next.version() == current.version() {
            return Ok(output);
        }
        let changeset = Changeset::between(&current, &next);
        if let Err(err) = self.repo.commit(changeset).await {
            tracing::error!(error = %err, "failed to persist registry change");
            return Err(err);
        }
        tracing::debug!(version = next.version(), "registry snapshot published");
        self.snapshots.send_replace(next.into_snapshot());
        Ok(output)
    }
}

fn import_one(
    registry: &mut Registry,
    item: ImportedDevice,
    report: &mut ImportReport,
) -> Result<(), VoiceHubError> {
    let classification = classify(&item.raw);
    if let Some(location) = &classification.location
        && registry.add_custom_location(location.clone())
    {
        report.new_locations.push(location.clone());
    }

    let existing = registry.get(&item.id).cloned();
    let device = match &existing {
        Some(existing) => Device {
            id: item.id.clone(),
            enabled: item.enabled.unwrap_or(existing.enabled),
            device_type: existing
                .device_type
                .clone()
                .or(classification.device_type),
            location: existing.location.clone().or(classification.location),
            raw: item.raw,
            value_range: item.value_range.or(existing.value_range),
        },
        None => Device {
            id: item.id.clone(),
            enabled: item.enabled.unwrap_or(false),
            device_type: classification.device_type,
            location: classification.location,
            raw: item.raw,
            value_range: item.value_range,
        },
    };

    if !device.is_classified() {
        report.unclassified.push(item.id.clone());
    }
    let changed = existing.as_ref() != Some(&device);
    registry.upsert(device)?;
    match (existing, changed) {
        (None, _) => report.created.push(item.id),
        (Some(_), true) => report.updated.push(item.id),
        (Some(_), false) => report.unchanged.push(item.id),
    }
    Ok(())
}
