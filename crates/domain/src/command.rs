//! Structured commands emitted by the inference engine and their resolution.
//!
//! The engine output is a compact JSON object constrained by the active
//! grammar. [`Command::parse`] turns it into a typed [`Command`] and
//! [`resolve`] maps that command, through the artifact the grammar came from,
//! onto a concrete device and backend service.

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::device::{Unit, ValueRange};
use crate::error::{IntegrityError, SemanticError, VoiceHubError};
use crate::grammar::GrammarArtifact;
use crate::id::{DeviceId, DeviceType, Location};

/// Lowest value of the standardised command scale.
pub const SCALE_MIN: f64 = 1.0;
/// Highest value of the standardised command scale.
pub const SCALE_MAX: f64 = 100.0;

/// Exact wire shape of an engine command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireCommand {
    #[serde(rename = "deviceType")]
    pub device_type: String,
    pub action: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A parsed engine command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "WireCommand")]
pub struct Command {
    pub device_type: DeviceType,
    pub action: Action,
    pub location: Location,
    pub value: Option<f64>,
}

impl Command {
    /// Parse raw engine output.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::MalformedCommand`] when the text is not the
    /// expected object, [`SemanticError::IllegalAction`] for an unknown action
    /// token and [`SemanticError::InvalidValue`] for a non-numeric value.
    pub fn parse(raw: &str) -> Result<Self, VoiceHubError> {
        let wire: WireCommand = serde_json::from_str(raw)
            .map_err(|err| IntegrityError::MalformedCommand(err.to_string()))?;
        Self::try_from(wire)
    }
}

impl TryFrom<WireCommand> for Command {
    type Error = VoiceHubError;

    fn try_from(wire: WireCommand) -> Result<Self, Self::Error> {
        let device_type = DeviceType::new(&wire.device_type)
            .map_err(|err| IntegrityError::MalformedCommand(err.to_string()))?;
        let location = Location::new(&wire.location)
            .map_err(|err| IntegrityError::MalformedCommand(err.to_string()))?;
        let action = wire
            .action
            .parse::<Action>()
            .map_err(|_| SemanticError::IllegalAction {
                action: wire.action.clone(),
                device_type: device_type.clone(),
            })?;
        let value = wire.value.as_deref().map(parse_value).transpose()?;
        Ok(Self {
            device_type,
            action,
            location,
            value,
        })
    }
}

impl From<Command> for WireCommand {
    fn from(command: Command) -> Self {
        Self {
            device_type: command.device_type.into(),
            action: command.action.token().to_string(),
            location: command.location.into(),
            value: command.value.map(|value| value.to_string()),
        }
    }
}

fn parse_value(raw: &str) -> Result<f64, SemanticError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| SemanticError::InvalidValue(raw.to_string()))
}

/// Neutral request handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub device_id: DeviceId,
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_value: Option<f64>,
}

/// Resolve a command against the artifact of the grammar that produced it.
///
/// # Errors
///
/// - [`IntegrityError::UnmappedPair`] when no device owns the pair,
/// - [`SemanticError::IllegalAction`] when the type does not accept the action,
/// - [`SemanticError::MissingValue`] when a numeric action has no value,
/// - [`SemanticError::ValueOutOfRange`] when the converted value leaves the
///   device's native range.
pub fn resolve(
    command: &Command,
    artifact: &GrammarArtifact,
) -> Result<DispatchRequest, VoiceHubError> {
    let unmapped = || IntegrityError::UnmappedPair {
        device_type: command.device_type.clone(),
        location: command.location.clone(),
    };
    let device_id = artifact
        .pair_index()
        .get(&command.device_type, &command.location)
        .ok_or_else(unmapped)?;
    let vocabulary = artifact
        .vocabulary(&command.device_type)
        .ok_or_else(unmapped)?;
    if !vocabulary.contains(&command.action) {
        return Err(SemanticError::IllegalAction {
            action: command.action.token().to_string(),
            device_type: command.device_type.clone(),
        }
        .into());
    }

    let converted_value = if command.action.is_numeric() {
        let value = command
            .value
            .ok_or(SemanticError::MissingValue(command.action))?;
        let range = artifact
            .value_range(device_id)
            .copied()
            .unwrap_or_else(ValueRange::percent);
        Some(convert(value, &range)?)
    } else {
        None
    };

    Ok(DispatchRequest {
        device_id: device_id.clone(),
        service_name: command.action.service_name().to_string(),
        converted_value,
    })
}

/// Map a standardised value onto a device's native range.
///
/// Ranges that already span 0 to 100 take the value unchanged. Otherwise the
/// value is clamped below at 1 and mapped linearly so that 1 lands on `min`
/// and 100 on `max`.
///
/// # Errors
///
/// Returns [`SemanticError::ValueOutOfRange`] when the result leaves the range.
pub fn convert(value: f64, range: &ValueRange) -> Result<f64, SemanticError> {
    let native = if range.is_zero_to_hundred() {
        value
    } else {
        let value = value.max(SCALE_MIN);
        range.min() + (value - SCALE_MIN) * (range.max() - range.min()) / (SCALE_MAX - SCALE_MIN)
    };
    let rounded = round(native, range.unit());
    if range.contains(rounded) {
        Ok(rounded)
    } else {
        Err(SemanticError::ValueOutOfRange {
            value: rounded,
            min: range.min(),
            max: range.max(),
        })
    }
}

fn round(value: f64, unit: Unit) -> f64 {
    let factor = 10_f64.powi(i32::from(unit.decimals()));
    (value * factor).round() / factor
}
