//! Common error types used across the workspace.
//!
//! Errors are grouped by who has to react to them:
//! - [`ConfigurationError`]: the registry edit is rejected, the registry stays editable
//! - [`ConflictError`]: grammar regeneration is blocked, the previous grammar keeps serving
//! - [`IntegrityError`]: the engine and the resolver disagree, resolution fails closed
//! - [`SemanticError`]: the command itself is rejected
//! - [`ExternalError`]: an out-of-process collaborator failed, never retried here

use crate::action::Action;
use crate::id::{DeviceId, DeviceType, Location};
use crate::validation::Conflict;

/// Top-level error for every voicehub layer.
#[derive(Debug, thiserror::Error)]
pub enum VoiceHubError {
    #[error("configuration error")]
    Configuration(#[from] ConfigurationError),

    #[error("conflicting device mappings")]
    Conflict(#[from] ConflictError),

    #[error("integrity error")]
    Integrity(#[from] IntegrityError),

    #[error("command rejected")]
    Semantic(#[from] SemanticError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("external call failed")]
    External(#[from] ExternalError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Rejected registry edits.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unknown device type '{0}'")]
    UnknownType(DeviceType),

    #[error("unknown location '{0}'")]
    UnknownLocation(Location),

    #[error("no enabled device has both a type and a location")]
    EmptyRegistry,

    #[error("invalid name '{0}'")]
    InvalidName(String),

    #[error("device type '{0}' already exists")]
    DuplicateType(DeviceType),

    #[error("device type '{0}' needs at least one action")]
    EmptyVocabulary(DeviceType),

    #[error("invalid value range [{min}, {max}]")]
    InvalidValueRange { min: f64, max: f64 },
}

/// Uniqueness violations found right before a regeneration.
#[derive(Debug, thiserror::Error)]
#[error("{} conflicting (type, location) pairs", .conflicts.len())]
pub struct ConflictError {
    pub conflicts: Vec<Conflict>,
}

/// The active grammar and the resolver disagree, or the grammar pipeline is unavailable.
#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    #[error("no device is mapped to ({device_type}, {location})")]
    UnmappedPair {
        device_type: DeviceType,
        location: Location,
    },

    #[error("no grammar has been generated yet")]
    NoActiveGrammar,

    #[error("malformed command: {0}")]
    MalformedCommand(String),

    #[error("grammar generation was aborted")]
    GenerationAborted,

    #[error("grammar worker is not running")]
    GeneratorStopped,
}

/// User-facing rejections of a specific command.
#[derive(Debug, thiserror::Error)]
pub enum SemanticError {
    #[error("action '{action}' is not allowed for '{device_type}'")]
    IllegalAction { action: String, device_type: DeviceType },

    #[error("action '{0}' needs a value")]
    MissingValue(Action),

    #[error("'{0}' is not a numeric value")]
    InvalidValue(String),

    #[error("value {value} is outside [{min}, {max}]")]
    ValueOutOfRange { value: f64, min: f64, max: f64 },
}

/// A lookup by identifier found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} '{id}' not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

impl NotFoundError {
    #[must_use]
    pub fn device(id: &DeviceId) -> Self {
        Self {
            entity: "Device",
            id: id.to_string(),
        }
    }
}

/// Failures of out-of-process collaborators (inference engine, backend).
#[derive(Debug, thiserror::Error)]
pub enum ExternalError {
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout {
        operation: &'static str,
        after_ms: u64,
    },

    #[error("{operation} failed")]
    Failed {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_typed_errors_into_top_level_error() {
        let err: VoiceHubError = ConfigurationError::EmptyRegistry.into();
        assert!(matches!(
            err,
            VoiceHubError::Configuration(ConfigurationError::EmptyRegistry)
        ));

        let err: VoiceHubError = NotFoundError::device(&DeviceId::new("d1").unwrap()).into();
        assert!(matches!(err, VoiceHubError::NotFound(_)));
    }

    #[test]
    fn should_describe_not_found_with_entity_and_id() {
        let err = NotFoundError::device(&DeviceId::new("light.kitchen").unwrap());
        assert_eq!(err.to_string(), "Device 'light.kitchen' not found");
    }

    #[test]
    fn should_count_conflicts_in_message() {
        let err = ConflictError { conflicts: vec![] };
        assert_eq!(err.to_string(), "0 conflicting (type, location) pairs");
    }
}
