//! Uniqueness validation of `(device type, location)` pairs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConflictError;
use crate::id::{DeviceId, DeviceType, Location};
use crate::registry::Registry;

/// Two or more enabled devices claiming the same pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub device_type: DeviceType,
    pub location: Location,
    pub device_ids: Vec<DeviceId>,
}

/// What an enabled device is still missing before it can be addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Missing {
    DeviceType,
    Location,
    Both,
}

/// Enabled device excluded from the grammar because it is partially configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncompleteDevice {
    pub device_id: DeviceId,
    pub missing: Missing,
}

/// Result of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub conflicts: Vec<Conflict>,
    /// Warnings only: incomplete devices never block generation.
    pub incomplete: Vec<IncompleteDevice>,
}

impl ValidationReport {
    /// No conflicts were found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// # Errors
    ///
    /// Returns a [`ConflictError`] carrying every conflict when the report is not ok.
    pub fn into_result(self) -> Result<Vec<IncompleteDevice>, ConflictError> {
        if self.conflicts.is_empty() {
            Ok(self.incomplete)
        } else {
            Err(ConflictError {
                conflicts: self.conflicts,
            })
        }
    }
}

/// Group enabled, fully classified devices by pair and report every group
/// with more than one member.
#[must_use]
pub fn validate(registry: &Registry) -> ValidationReport {
    let mut groups: BTreeMap<(&DeviceType, &Location), Vec<DeviceId>> = BTreeMap::new();
    let mut incomplete = Vec::new();

    for device in registry.list_enabled() {
        match (&device.device_type, &device.location) {
            (Some(device_type), Some(location)) => groups
                .entry((device_type, location))
                .or_default()
                .push(device.id.clone()),
            (None, Some(_)) => incomplete.push(IncompleteDevice {
                device_id: device.id.clone(),
                missing: Missing::DeviceType,
            }),
            (Some(_), None) => incomplete.push(IncompleteDevice {
                device_id: device.id.clone(),
                missing: Missing::Location,
            }),
            (None, None) => incomplete.push(IncompleteDevice {
                device_id: device.id.clone(),
                missing: Missing::Both,
            }),
        }
    }

    let conflicts = groups
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|((device_type, location), device_ids)| Conflict {
            device_type: device_type.clone(),
            location: location.clone(),
            device_ids,
        })
        .collect();

    ValidationReport {
        conflicts,
        incomplete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;

    fn id(value: &str) -> DeviceId {
        DeviceId::new(value).unwrap()
    }

    fn registry(devices: &[(&str, bool, Option<&str>, Option<&str>)]) -> Registry {
        let mut registry = Registry::new();
        for loc in ["lounge", "bedroom"] {
            registry.add_custom_location(Location::new(loc).unwrap());
        }
        for (device_id, enabled, ty, loc) in devices {
            let mut builder = Device::builder(id(device_id)).enabled(*enabled);
            if let Some(ty) = ty {
                builder = builder.device_type(DeviceType::new(ty).unwrap());
            }
            if let Some(loc) = loc {
                builder = builder.location(Location::new(loc).unwrap());
            }
            registry.upsert(builder.build()).unwrap();
        }
        registry
    }

    #[test]
    fn should_report_ok_for_unique_pairs() {
        let registry = registry(&[
            ("d1", true, Some("lights"), Some("lounge")),
            ("d2", true, Some("lights"), Some("bedroom")),
            ("d3", true, Some("heating"), Some("lounge")),
        ]);
        let report = validate(&registry);
        assert!(report.is_ok());
        assert!(report.incomplete.is_empty());
    }

    #[test]
    fn should_report_conflict_listing_both_devices() {
        let registry = registry(&[
            ("d1", true, Some("lights"), Some("lounge")),
            ("d2", true, Some("lights"), Some("lounge")),
        ]);
        let report = validate(&registry);
        assert!(!report.is_ok());
        assert_eq!(report.conflicts.len(), 1);
        let conflict = &report.conflicts[0];
        assert_eq!(conflict.device_type.as_str(), "lights");
        assert_eq!(conflict.location.as_str(), "lounge");
        assert_eq!(conflict.device_ids, vec![id("d1"), id("d2")]);
    }

    #[test]
    fn should_ignore_disabled_devices() {
        let registry = registry(&[
            ("d1", true, Some("lights"), Some("lounge")),
            ("d2", false, Some("lights"), Some("lounge")),
        ]);
        assert!(validate(&registry).is_ok());
    }

    #[test]
    fn should_warn_about_incomplete_devices_without_failing() {
        let registry = registry(&[
            ("d1", true, Some("lights"), None),
            ("d2", true, None, Some("lounge")),
            ("d3", true, None, None),
            ("d4", false, None, None),
        ]);
        let report = validate(&registry);
        assert!(report.is_ok());
        let missing: Vec<_> = report.incomplete.iter().map(|i| i.missing).collect();
        assert_eq!(
            missing,
            vec![Missing::Location, Missing::DeviceType, Missing::Both]
        );
    }

    #[test]
    fn should_turn_conflicts_into_error() {
        let registry = registry(&[
            ("d1", true, Some("lights"), Some("lounge")),
            ("d2", true, Some("lights"), Some("lounge")),
        ]);
        let err = validate(&registry).into_result().unwrap_err();
        assert_eq!(err.conflicts.len(), 1);
    }
}
