//! Storage ports: registry persistence and the grammar artifact cache.

use std::future::Future;

use voicehub_domain::action::Action;
use voicehub_domain::device::Device;
use voicehub_domain::error::VoiceHubError;
use voicehub_domain::grammar::{GrammarArtifact, GrammarOptions};
use voicehub_domain::id::{DeviceType, Location};
use voicehub_domain::registry::Registry;

/// Everything that changed between two registry versions.
///
/// Registry edits only ever add or replace entries, so a change set never
/// carries deletions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    pub version: u64,
    pub devices: Vec<Device>,
    pub custom_types: Vec<(DeviceType, Vec<Action>)>,
    pub locations: Vec<Location>,
}

impl Changeset {
    /// Diff `after` against `before`.
    #[must_use]
    pub fn between(before: &Registry, after: &Registry) -> Self {
        let devices = after
            .devices()
            .filter(|device| before.get(&device.id) != Some(*device))
            .cloned()
            .collect();
        let custom_types = after
            .custom_types()
            .filter(|(device_type, _)| before.vocabulary(device_type).is_none())
            .map(|(device_type, actions)| (device_type.clone(), actions.to_vec()))
            .collect();
        let locations = after
            .locations()
            .filter(|location| !before.knows_location(location))
            .cloned()
            .collect();
        Self {
            version: after.version(),
            devices,
            custom_types,
            locations,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty() && self.custom_types.is_empty() && self.locations.is_empty()
    }
}

/// Durable home of the device registry.
pub trait RegistryRepository: Send + Sync {
    /// Load the persisted registry, `None` when nothing was ever committed.
    fn load(&self) -> impl Future<Output = Result<Option<Registry>, VoiceHubError>> + Send;

    /// Apply a change set atomically: either every row and the new version
    /// are written, or nothing is.
    fn commit(&self, changeset: Changeset)
    -> impl Future<Output = Result<(), VoiceHubError>> + Send;
}

/// Cache of generated artifacts keyed by the registry version and the
/// grammar options they came from.
pub trait ArtifactCache: Send + Sync {
    /// Artifact generated from exactly `registry_version` with `options`, if
    /// cached. An artifact built with other options is a miss.
    fn load(
        &self,
        registry_version: u64,
        options: &GrammarOptions,
    ) -> impl Future<Output = Result<Option<GrammarArtifact>, VoiceHubError>> + Send;

    /// Store an artifact, replacing older ones.
    fn store(
        &self,
        artifact: &GrammarArtifact,
    ) -> impl Future<Output = Result<(), VoiceHubError>> + Send;
}
