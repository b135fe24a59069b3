//! Device mapping registry.
//!
//! Holds every known [`Device`] plus the open sets of device types (each with
//! its action vocabulary) and locations. The registry does not enforce the
//! one-device-per-pair invariant on its own: a user may hold conflicting state
//! while editing, and [`crate::validation::validate`] is run before each
//! grammar regeneration instead.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;
use std::sync::Arc;

use crate::action::{Action, BUILTIN_VOCABULARY};
use crate::device::Device;
use crate::error::{ConfigurationError, NotFoundError, VoiceHubError};
use crate::id::{DeviceId, DeviceType, Location};

/// Devices, known types and known locations, versioned.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    version: u64,
    devices: BTreeMap<DeviceId, Device>,
    device_types: BTreeMap<DeviceType, Vec<Action>>,
    custom_types: BTreeSet<DeviceType>,
    locations: BTreeSet<Location>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Empty registry knowing only the built-in device types.
    #[must_use]
    pub fn new() -> Self {
        let device_types = BUILTIN_VOCABULARY
            .iter()
            .filter_map(|(name, actions)| {
                DeviceType::new(name)
                    .ok()
                    .map(|device_type| (device_type, actions.to_vec()))
            })
            .collect();
        Self {
            version: 0,
            devices: BTreeMap::new(),
            device_types,
            custom_types: BTreeSet::new(),
            locations: BTreeSet::new(),
        }
    }

    /// Rebuild a registry from persisted parts.
    ///
    /// # Errors
    ///
    /// Fails when a custom type is invalid or a device references a type or
    /// location that is not part of the restored sets.
    pub fn restore(
        version: u64,
        custom_types: impl IntoIterator<Item = (DeviceType, Vec<Action>)>,
        locations: impl IntoIterator<Item = Location>,
        devices: impl IntoIterator<Item = Device>,
    ) -> Result<Self, ConfigurationError> {
        let mut registry = Self::new();
        for (device_type, actions) in custom_types {
            registry.insert_custom_type(device_type, actions)?;
        }
        registry.locations.extend(locations);
        for device in devices {
            registry.check_membership(&device)?;
            registry.devices.insert(device.id.clone(), device);
        }
        registry.version = version;
        Ok(registry)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn get(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn list_enabled(&self) -> impl Iterator<Item = &Device> {
        self.devices.values().filter(|device| device.enabled)
    }

    /// Known types with their vocabularies, built-in and custom.
    pub fn device_types(&self) -> impl Iterator<Item = (&DeviceType, &[Action])> {
        self.device_types
            .iter()
            .map(|(device_type, actions)| (device_type, actions.as_slice()))
    }

    /// Custom types only, in the shape they are persisted.
    pub fn custom_types(&self) -> impl Iterator<Item = (&DeviceType, &[Action])> {
        self.custom_types
            .iter()
            .filter_map(|device_type| self.device_types.get_key_value(device_type))
            .map(|(device_type, actions)| (device_type, actions.as_slice()))
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    #[must_use]
    pub fn vocabulary(&self, device_type: &DeviceType) -> Option<&[Action]> {
        self.device_types.get(device_type).map(Vec::as_slice)
    }

    #[must_use]
    pub fn knows_location(&self, location: &Location) -> bool {
        self.locations.contains(location)
    }

    /// Insert or replace a device.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownType`] or
    /// [`ConfigurationError::UnknownLocation`] when the device references a
    /// value outside the open sets.
    pub fn upsert(&mut self, device: Device) -> Result<(), ConfigurationError> {
        self.check_membership(&device)?;
        if self.devices.get(&device.id) == Some(&device) {
            return Ok(());
        }
        self.devices.insert(device.id.clone(), device);
        self.bump();
        Ok(())
    }

    /// Enable or disable a device.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceHubError::NotFound`] for an unknown id.
    pub fn set_enabled(&mut self, id: &DeviceId, enabled: bool) -> Result<&Device, VoiceHubError> {
        let device = self
            .devices
            .get_mut(id)
            .ok_or_else(|| NotFoundError::device(id))?;
        let changed = device.enabled != enabled;
        device.enabled = enabled;
        if changed {
            self.bump();
        }
        Ok(&self.devices[id])
    }

    /// Map a device to a `(type, location)` pair.
    ///
    /// Does not check uniqueness against other devices.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownType`],
    /// [`ConfigurationError::UnknownLocation`] or [`VoiceHubError::NotFound`].
    pub fn assign(
        &mut self,
        id: &DeviceId,
        device_type: DeviceType,
        location: Location,
    ) -> Result<&Device, VoiceHubError> {
        if !self.device_types.contains_key(&device_type) {
            return Err(ConfigurationError::UnknownType(device_type).into());
        }
        if !self.locations.contains(&location) {
            return Err(ConfigurationError::UnknownLocation(location).into());
        }
        let device = self
            .devices
            .get_mut(id)
            .ok_or_else(|| NotFoundError::device(id))?;
        let changed = device.device_type.as_ref() != Some(&device_type)
            || device.location.as_ref() != Some(&location);
        device.device_type = Some(device_type);
        device.location = Some(location);
        if changed {
            self.bump();
        }
        Ok(&self.devices[id])
    }

    /// Register a user-defined device type with its action vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateType`] when the type already
    /// exists and [`ConfigurationError::EmptyVocabulary`] when `actions` is
    /// empty.
    pub fn add_custom_type(
        &mut self,
        device_type: DeviceType,
        actions: Vec<Action>,
    ) -> Result<(), ConfigurationError> {
        self.insert_custom_type(device_type, actions)?;
        self.bump();
        Ok(())
    }

    /// Declare a location. Returns `false` when it was already known.
    pub fn add_custom_location(&mut self, location: Location) -> bool {
        let inserted = self.locations.insert(location);
        if inserted {
            self.bump();
        }
        inserted
    }

    /// Immutable, shareable copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot(Arc::new(self.clone()))
    }

    #[must_use]
    pub fn into_snapshot(self) -> RegistrySnapshot {
        RegistrySnapshot(Arc::new(self))
    }

    fn insert_custom_type(
        &mut self,
        device_type: DeviceType,
        mut actions: Vec<Action>,
    ) -> Result<(), ConfigurationError> {
        if self.device_types.contains_key(&device_type) {
            return Err(ConfigurationError::DuplicateType(device_type));
        }
        let mut seen = BTreeSet::new();
        actions.retain(|action| seen.insert(*action));
        if actions.is_empty() {
            return Err(ConfigurationError::EmptyVocabulary(device_type));
        }
        self.custom_types.insert(device_type.clone());
        self.device_types.insert(device_type, actions);
        Ok(())
    }

    fn check_membership(&self, device: &Device) -> Result<(), ConfigurationError> {
        if let Some(device_type) = &device.device_type
            && !self.device_types.contains_key(device_type)
        {
            return Err(ConfigurationError::UnknownType(device_type.clone()));
        }
        if let Some(location) = &device.location
            && !self.locations.contains(location)
        {
            return Err(ConfigurationError::UnknownLocation(location.clone()));
        }
        Ok(())
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}

/// Read-only view of a [`Registry`] at a given version.
///
/// Cloning is cheap: all clones share the same underlying registry.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot(Arc<Registry>);

impl Deref for RegistrySnapshot {
    type Target = Registry;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for RegistrySnapshot {
    fn default() -> Self {
        Registry::new().into_snapshot()
    }
}

impl RegistrySnapshot {
    /// Owned, mutable copy to derive the next version from.
    #[must_use]
    pub fn to_registry(&self) -> Registry {
        Registry::clone(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> DeviceId {
        DeviceId::new(value).unwrap()
    }

    fn ty(value: &str) -> DeviceType {
        DeviceType::new(value).unwrap()
    }

    fn loc(value: &str) -> Location {
        Location::new(value).unwrap()
    }

    fn registry_with_lounge() -> Registry {
        let mut registry = Registry::new();
        registry.add_custom_location(loc("lounge"));
        registry.upsert(Device::builder(id("d1")).build()).unwrap();
        registry
    }

    #[test]
    fn should_start_empty_with_builtin_types() {
        let registry = Registry::new();
        assert_eq!(registry.version(), 0);
        assert_eq!(registry.devices().count(), 0);
        assert_eq!(registry.locations().count(), 0);
        assert!(registry.vocabulary(&ty("lights")).is_some());
        assert_eq!(registry.custom_types().count(), 0);
    }

    #[test]
    fn should_bump_version_on_every_mutation() {
        let mut registry = registry_with_lounge();
        assert_eq!(registry.version(), 2);

        registry.assign(&id("d1"), ty("lights"), loc("lounge")).unwrap();
        assert_eq!(registry.version(), 3);

        registry.set_enabled(&id("d1"), false).unwrap();
        assert_eq!(registry.version(), 4);

        registry
            .add_custom_type(ty("sprinkler"), vec![Action::On, Action::Off])
            .unwrap();
        assert_eq!(registry.version(), 5);
    }

    #[test]
    fn should_not_bump_version_when_nothing_changes() {
        let mut registry = registry_with_lounge();
        let before = registry.version();
        assert!(!registry.add_custom_location(loc("Lounge")));
        registry.set_enabled(&id("d1"), true).unwrap();
        registry.upsert(Device::builder(id("d1")).build()).unwrap();
        assert_eq!(registry.version(), before);
    }

    #[test]
    fn should_bump_once_per_effective_toggle_or_assignment() {
        let mut registry = registry_with_lounge();
        registry.assign(&id("d1"), ty("lights"), loc("lounge")).unwrap();
        let assigned = registry.version();

        registry.assign(&id("d1"), ty("lights"), loc("lounge")).unwrap();
        assert_eq!(registry.version(), assigned);

        registry.set_enabled(&id("d1"), false).unwrap();
        registry.set_enabled(&id("d1"), false).unwrap();
        assert_eq!(registry.version(), assigned + 1);

        registry.set_enabled(&id("d1"), true).unwrap();
        assert_eq!(registry.version(), assigned + 2);
        assert!(registry.get(&id("d1")).unwrap().enabled);
    }

    #[test]
    fn should_reject_assignment_to_unknown_type() {
        let mut registry = registry_with_lounge();
        let result = registry.assign(&id("d1"), ty("toaster"), loc("lounge"));
        assert!(matches!(
            result,
            Err(VoiceHubError::Configuration(ConfigurationError::UnknownType(_)))
        ));
    }

    #[test]
    fn should_reject_assignment_to_unknown_location() {
        let mut registry = registry_with_lounge();
        let result = registry.assign(&id("d1"), ty("lights"), loc("attic"));
        assert!(matches!(
            result,
            Err(VoiceHubError::Configuration(
                ConfigurationError::UnknownLocation(_)
            ))
        ));
    }

    #[test]
    fn should_return_not_found_for_unknown_device() {
        let mut registry = registry_with_lounge();
        assert!(matches!(
            registry.set_enabled(&id("nope"), true),
            Err(VoiceHubError::NotFound(_))
        ));
        assert!(matches!(
            registry.assign(&id("nope"), ty("lights"), loc("lounge")),
            Err(VoiceHubError::NotFound(_))
        ));
    }

    #[test]
    fn should_allow_conflicting_assignments_while_editing() {
        let mut registry = registry_with_lounge();
        registry.upsert(Device::builder(id("d2")).build()).unwrap();
        registry.assign(&id("d1"), ty("lights"), loc("lounge")).unwrap();
        registry.assign(&id("d2"), ty("lights"), loc("lounge")).unwrap();
        assert_eq!(registry.list_enabled().count(), 2);
    }

    #[test]
    fn should_reject_upsert_with_unknown_type() {
        let mut registry = Registry::new();
        let device = Device::builder(id("d1")).device_type(ty("toaster")).build();
        assert!(matches!(
            registry.upsert(device),
            Err(ConfigurationError::UnknownType(_))
        ));
    }

    #[test]
    fn should_reject_duplicate_and_empty_custom_types() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.add_custom_type(ty("lights"), vec![Action::On]),
            Err(ConfigurationError::DuplicateType(_))
        ));
        assert!(matches!(
            registry.add_custom_type(ty("sprinkler"), vec![]),
            Err(ConfigurationError::EmptyVocabulary(_))
        ));
        assert_eq!(registry.version(), 0);
    }

    #[test]
    fn should_deduplicate_custom_vocabulary() {
        let mut registry = Registry::new();
        registry
            .add_custom_type(ty("sprinkler"), vec![Action::On, Action::Off, Action::On])
            .unwrap();
        assert_eq!(
            registry.vocabulary(&ty("sprinkler")).unwrap(),
            &[Action::On, Action::Off]
        );
    }

    #[test]
    fn should_keep_snapshot_unchanged_after_mutation() {
        let mut registry = registry_with_lounge();
        let snapshot = registry.snapshot();
        registry.set_enabled(&id("d1"), false).unwrap();

        assert!(snapshot.get(&id("d1")).unwrap().enabled);
        assert_eq!(snapshot.version() + 1, registry.version());
    }

    #[test]
    fn should_restore_persisted_parts() {
        let device = Device::builder(id("d1"))
            .device_type(ty("sprinkler"))
            .location(loc("garden"))
            .build();
        let registry = Registry::restore(
            42,
            vec![(ty("sprinkler"), vec![Action::On, Action::Off])],
            vec![loc("garden")],
            vec![device.clone()],
        )
        .unwrap();

        assert_eq!(registry.version(), 42);
        assert_eq!(registry.get(&id("d1")), Some(&device));
        assert_eq!(registry.custom_types().count(), 1);
    }

    #[test]
    fn should_refuse_to_restore_dangling_location() {
        let device = Device::builder(id("d1")).location(loc("garden")).build();
        let result = Registry::restore(1, vec![], vec![], vec![device]);
        assert!(matches!(result, Err(ConfigurationError::UnknownLocation(_))));
    }
}
