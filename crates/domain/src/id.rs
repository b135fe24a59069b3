//! Typed identifiers and names.
//!
//! [`DeviceId`] is opaque: it is kept exactly as the backend reports it.
//! [`DeviceType`] and [`Location`] are members of open, user-extensible
//! enumerations and are normalised on construction so that `"Living  Room"`
//! and `"living room"` name the same location.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Opaque, stable identifier of a device on the home-automation backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a backend identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidName`] when `value` is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, ConfigurationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ConfigurationError::InvalidName(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

/// Normalise a user or source supplied name: trim, lower-case and collapse
/// inner whitespace.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '\'')
}

macro_rules! define_name {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Normalise and validate a name.
            ///
            /// # Errors
            ///
            /// Returns [`ConfigurationError::InvalidName`] when the normalised
            /// name is empty or contains characters other than alphanumerics,
            /// space, `-`, `_` and `'`.
            pub fn new(raw: &str) -> Result<Self, ConfigurationError> {
                let normalized = normalize_name(raw);
                if normalized.is_empty() || !normalized.chars().all(is_name_char) {
                    return Err(ConfigurationError::InvalidName(raw.to_string()));
                }
                Ok(Self(normalized))
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ConfigurationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ConfigurationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(&value)
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> Self {
                name.0
            }
        }
    };
}

define_name!(
    /// Kind of controllable unit (`lights`, `heating`, `blinds`, …).
    DeviceType
);

define_name!(
    /// Place a device lives in (`lounge`, `bedroom`, …).
    Location
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_normalize_case_and_whitespace() {
        let location = Location::new("  Living   Room ").unwrap();
        assert_eq!(location.as_str(), "living room");
        assert_eq!(location, Location::new("living room").unwrap());
    }

    #[test]
    fn should_reject_blank_names() {
        assert!(matches!(
            DeviceType::new("   "),
            Err(ConfigurationError::InvalidName(_))
        ));
    }

    #[test]
    fn should_reject_quotes_and_backslashes() {
        assert!(Location::new("the \"den\"").is_err());
        assert!(Location::new(r"back\slash").is_err());
    }

    #[test]
    fn should_accept_apostrophes_and_unicode() {
        assert_eq!(Location::new("Kid's Room").unwrap().as_str(), "kid's room");
        assert_eq!(Location::new("Salón").unwrap().as_str(), "salón");
    }

    #[test]
    fn should_keep_device_id_verbatim() {
        let id = DeviceId::new("light.Bedroom_Ceiling").unwrap();
        assert_eq!(id.as_str(), "light.Bedroom_Ceiling");
    }

    #[test]
    fn should_reject_blank_device_id() {
        assert!(DeviceId::new("").is_err());
    }

    #[test]
    fn should_normalize_when_deserializing() {
        let parsed: DeviceType = serde_json::from_str("\"Lights\"").unwrap();
        assert_eq!(parsed.as_str(), "lights");
        assert!(serde_json::from_str::<DeviceType>("\"\"").is_err());
    }
}
