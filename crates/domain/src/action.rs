//! Action tokens and the built-in vocabulary table.
//!
//! Every device type owns an ordered list of the actions it accepts. The
//! grammar generator emits one alternative per action, and the resolver
//! rejects any action outside that list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An action token as it appears in engine output (`"on"`, `"set-percent"`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    On,
    Off,
    Toggle,
    Open,
    Close,
    Stop,
    SetPercent,
    SetTemperature,
    Increase,
    Decrease,
    Play,
    Pause,
    VolumeUp,
    VolumeDown,
}

/// Which bounded literal set a numeric action's value is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Percent,
    Temperature,
}

impl Action {
    pub const ALL: [Self; 14] = [
        Self::On,
        Self::Off,
        Self::Toggle,
        Self::Open,
        Self::Close,
        Self::Stop,
        Self::SetPercent,
        Self::SetTemperature,
        Self::Increase,
        Self::Decrease,
        Self::Play,
        Self::Pause,
        Self::VolumeUp,
        Self::VolumeDown,
    ];

    /// Token used on the wire and in the grammar.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Toggle => "toggle",
            Self::Open => "open",
            Self::Close => "close",
            Self::Stop => "stop",
            Self::SetPercent => "set-percent",
            Self::SetTemperature => "set-temperature",
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::VolumeUp => "volume-up",
            Self::VolumeDown => "volume-down",
        }
    }

    /// Backend service invoked for this action.
    #[must_use]
    pub fn service_name(self) -> &'static str {
        match self {
            Self::On => "turn_on",
            Self::Off => "turn_off",
            Self::Toggle => "toggle",
            Self::Open => "open_cover",
            Self::Close => "close_cover",
            Self::Stop => "stop",
            Self::SetPercent => "set_percentage",
            Self::SetTemperature => "set_temperature",
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::Play => "media_play",
            Self::Pause => "media_pause",
            Self::VolumeUp => "volume_up",
            Self::VolumeDown => "volume_down",
        }
    }

    /// `Some` for actions that carry a value.
    #[must_use]
    pub fn value_kind(self) -> Option<ValueKind> {
        match self {
            Self::SetPercent => Some(ValueKind::Percent),
            Self::SetTemperature => Some(ValueKind::Temperature),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        self.value_kind().is_some()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error returned when parsing an unknown action token.
#[derive(Debug, thiserror::Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.token() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

use Action::{
    Close, Decrease, Increase, Off, On, Open, Pause, Play, SetPercent, SetTemperature, Stop,
    Toggle, VolumeDown, VolumeUp,
};

/// Built-in device types and their vocabularies, in declaration order.
pub const BUILTIN_VOCABULARY: &[(&str, &[Action])] = &[
    ("lights", &[On, Off, Toggle, SetPercent]),
    ("heating", &[On, Off, SetTemperature, Increase, Decrease]),
    ("blinds", &[Open, Close, Stop, SetPercent]),
    ("switch", &[On, Off, Toggle]),
    ("fan", &[On, Off, Toggle, SetPercent]),
    ("tv", &[On, Off, Play, Pause, VolumeUp, VolumeDown]),
    ("music", &[On, Off, Play, Pause, Stop, VolumeUp, VolumeDown]),
    ("media", &[On, Off, Play, Pause, VolumeUp, VolumeDown]),
];

/// Look up the built-in vocabulary of a device type name.
#[must_use]
pub fn builtin_vocabulary(device_type: &str) -> Option<&'static [Action]> {
    BUILTIN_VOCABULARY
        .iter()
        .find(|(name, _)| *name == device_type)
        .map(|(_, actions)| *actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_every_token_back_to_its_action() {
        for action in Action::ALL {
            assert_eq!(action.token().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn should_serialize_with_the_wire_token() {
        let json = serde_json::to_string(&Action::SetPercent).unwrap();
        assert_eq!(json, "\"set-percent\"");
        let json = serde_json::to_string(&Action::VolumeDown).unwrap();
        assert_eq!(json, "\"volume-down\"");
    }

    #[test]
    fn should_reject_unknown_token() {
        assert!("dim".parse::<Action>().is_err());
    }

    #[test]
    fn should_map_on_to_turn_on_service() {
        assert_eq!(Action::On.service_name(), "turn_on");
        assert_eq!(Action::Off.service_name(), "turn_off");
    }

    #[test]
    fn should_flag_only_set_actions_as_numeric() {
        let numeric: Vec<_> = Action::ALL.into_iter().filter(|a| a.is_numeric()).collect();
        assert_eq!(numeric, vec![Action::SetPercent, Action::SetTemperature]);
    }

    #[test]
    fn should_expose_heating_vocabulary() {
        let heating = builtin_vocabulary("heating").unwrap();
        assert!(heating.contains(&Action::SetTemperature));
        assert!(!heating.contains(&Action::Toggle));
        assert!(builtin_vocabulary("toaster").is_none());
    }

    #[test]
    fn should_not_repeat_actions_within_a_vocabulary() {
        for (name, actions) in BUILTIN_VOCABULARY {
            let mut seen = actions.to_vec();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), actions.len(), "duplicate action in {name}");
        }
    }
}
