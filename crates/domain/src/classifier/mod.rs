//! Best-effort `(device type, location)` guess for imported devices.
//!
//! Location and type are classified independently. Both are pure functions
//! of the [`RawDescriptor`]; the keyword tables in [`keywords`] are the only
//! place to touch when a new synonym is needed.

pub mod device_type;
pub mod keywords;
pub mod location;

use serde::Serialize;

use crate::device::RawDescriptor;
use crate::id::{DeviceType, Location};

pub use device_type::classify_device_type;
pub use location::{LocationSource, classify_location};

/// Outcome of classifying one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub device_type: Option<DeviceType>,
    pub location: Option<Location>,
    pub location_source: Option<LocationSource>,
}

impl Classification {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.device_type.is_some() && self.location.is_some()
    }
}

/// Classify a raw descriptor.
#[must_use]
pub fn classify(raw: &RawDescriptor) -> Classification {
    let (location, location_source) = match classify_location(raw) {
        Some((location, source)) => (Some(location), Some(source)),
        None => (None, None),
    };
    Classification {
        device_type: classify_device_type(raw),
        location,
        location_source,
    }
}
