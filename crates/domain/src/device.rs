//! Device: one controllable unit exposed by the home-automation backend.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::id::{DeviceId, DeviceType, Location};

/// A controllable unit and its `(type, location)` mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub enabled: bool,
    pub device_type: Option<DeviceType>,
    pub location: Option<Location>,
    /// Source attributes, only read by the classifier.
    #[serde(default)]
    pub raw: RawDescriptor,
    pub value_range: Option<ValueRange>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder(id: DeviceId) -> DeviceBuilder {
        DeviceBuilder::new(id)
    }

    /// Both a type and a location are set.
    #[must_use]
    pub fn is_classified(&self) -> bool {
        self.device_type.is_some() && self.location.is_some()
    }

    /// The `(type, location)` pair when the device takes part in grammar generation.
    #[must_use]
    pub fn grammar_pair(&self) -> Option<(&DeviceType, &Location)> {
        if !self.enabled {
            return None;
        }
        self.device_type.as_ref().zip(self.location.as_ref())
    }
}

/// Raw attributes reported by an external source.
///
/// Field names follow the common shape of home-automation exports:
/// `stable_id` is the backend's entity identifier (`light.bedroom_ceiling`),
/// `domain` its platform (`light`, `switch`, `cover`, …).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDescriptor {
    pub stable_id: Option<String>,
    pub domain: Option<String>,
    pub display_name: Option<String>,
    pub device_class: Option<String>,
    pub area: Option<String>,
    pub parent_area: Option<String>,
    pub parent_name: Option<String>,
}

impl RawDescriptor {
    /// Platform domain, explicit or taken from the `stable_id` prefix.
    #[must_use]
    pub fn platform(&self) -> Option<String> {
        if let Some(domain) = self.domain.as_deref().filter(|d| !d.trim().is_empty()) {
            return Some(domain.trim().to_lowercase());
        }
        self.stable_id
            .as_deref()
            .and_then(|id| id.split_once('.'))
            .map(|(prefix, _)| prefix.trim().to_lowercase())
            .filter(|prefix| !prefix.is_empty())
    }
}

/// Unit of a device's native control range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Percent,
    Celsius,
    Fahrenheit,
    Level,
}

impl Unit {
    /// Number of decimals a converted value is rounded to.
    #[must_use]
    pub fn decimals(self) -> u8 {
        match self {
            Self::Celsius | Self::Fahrenheit => 1,
            Self::Percent | Self::Level => 0,
        }
    }
}

/// Native numeric control range of a device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawValueRange")]
pub struct ValueRange {
    min: f64,
    max: f64,
    unit: Unit,
}

#[derive(Deserialize)]
struct RawValueRange {
    min: f64,
    max: f64,
    unit: Unit,
}

impl TryFrom<RawValueRange> for ValueRange {
    type Error = ConfigurationError;

    fn try_from(raw: RawValueRange) -> Result<Self, Self::Error> {
        Self::new(raw.min, raw.max, raw.unit)
    }
}

impl ValueRange {
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidValueRange`] unless `min < max`
    /// and both bounds are finite.
    pub fn new(min: f64, max: f64, unit: Unit) -> Result<Self, ConfigurationError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(ConfigurationError::InvalidValueRange { min, max });
        }
        Ok(Self { min, max, unit })
    }

    /// The 0–100 percent range used for devices without a declared range.
    #[must_use]
    pub fn percent() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            unit: Unit::Percent,
        }
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[must_use]
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Range is already the standard 0–100 scale.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_zero_to_hundred(&self) -> bool {
        self.min == 0.0 && self.max == 100.0
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug)]
pub struct DeviceBuilder {
    id: DeviceId,
    enabled: bool,
    device_type: Option<DeviceType>,
    location: Option<Location>,
    raw: RawDescriptor,
    value_range: Option<ValueRange>,
}

impl DeviceBuilder {
    fn new(id: DeviceId) -> Self {
        Self {
            id,
            enabled: true,
            device_type: None,
            location: None,
            raw: RawDescriptor::default(),
            value_range: None,
        }
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = Some(device_type);
        self
    }

    #[must_use]
    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn raw(mut self, raw: RawDescriptor) -> Self {
        self.raw = raw;
        self
    }

    #[must_use]
    pub fn value_range(mut self, value_range: ValueRange) -> Self {
        self.value_range = Some(value_range);
        self
    }

    #[must_use]
    pub fn build(self) -> Device {
        Device {
            id: self.id,
            enabled: self.enabled,
            device_type: self.device_type,
            location: self.location,
            raw: self.raw,
            value_range: self.value_range,
        }
    }
}
