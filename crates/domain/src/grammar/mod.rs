//! Grammar generation.
//!
//! [`generate`] turns a registry into a [`GrammarArtifact`]: the GBNF text the
//! inference engine decodes against, plus the index the resolver uses to map
//! a decoded `(type, location)` pair back to its device. Only enabled devices
//! with both a type and a location take part, and only the locations actually
//! in use become grammar-legal.

mod gbnf;

pub use gbnf::FORMAT_VERSION;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::{Action, ValueKind};
use crate::device::{Device, ValueRange};
use crate::error::{ConfigurationError, VoiceHubError};
use crate::id::{DeviceId, DeviceType, Location};
use crate::registry::Registry;
use crate::validation::validate;

/// Lowest temperature literal: the bottom of the standardised command scale.
const SCALE_FIRST: u32 = 1;
/// Highest percent and temperature literal.
const SCALE_LAST: u32 = 100;

/// Spacing of the literal value alternatives emitted for numeric actions.
///
/// Temperature literals are points on the standardised 1 to 100 command
/// scale, not degrees: the resolver rescales them into each device's native
/// range, so `1` reaches the range minimum and `100` its maximum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarOptions {
    pub percent_step: u32,
    pub temperature_step: u32,
}

impl Default for GrammarOptions {
    fn default() -> Self {
        Self {
            percent_step: 10,
            temperature_step: 1,
        }
    }
}

impl GrammarOptions {
    /// Literal values the grammar accepts for a value kind, ascending.
    ///
    /// Both kinds always end on 100; percent starts at 0, temperature at 1.
    #[must_use]
    pub fn values(&self, kind: ValueKind) -> Vec<u32> {
        let (first, step) = match kind {
            ValueKind::Percent => (0, self.percent_step),
            ValueKind::Temperature => (SCALE_FIRST, self.temperature_step),
        };
        let step = usize::try_from(step.max(1)).unwrap_or(usize::MAX);
        let mut values = vec![first];
        values.extend(
            (0..=SCALE_LAST)
                .step_by(step)
                .filter(|value| *value > first),
        );
        if values.last() != Some(&SCALE_LAST) {
            values.push(SCALE_LAST);
        }
        values
    }
}

/// `(type, location) → device` map of a generated grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PairEntry>", into = "Vec<PairEntry>")]
pub struct PairIndex(BTreeMap<(DeviceType, Location), DeviceId>);

/// One row of a [`PairIndex`], as serialised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairEntry {
    pub device_type: DeviceType,
    pub location: Location,
    pub device_id: DeviceId,
}

impl From<Vec<PairEntry>> for PairIndex {
    fn from(entries: Vec<PairEntry>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|entry| ((entry.device_type, entry.location), entry.device_id))
                .collect(),
        )
    }
}

impl From<PairIndex> for Vec<PairEntry> {
    fn from(index: PairIndex) -> Self {
        index
            .0
            .into_iter()
            .map(|((device_type, location), device_id)| PairEntry {
                device_type,
                location,
                device_id,
            })
            .collect()
    }
}

impl PairIndex {
    #[must_use]
    pub fn get(&self, device_type: &DeviceType, location: &Location) -> Option<&DeviceId> {
        // BTreeMap lookups need an owned tuple key
        self.0.get(&(device_type.clone(), location.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeviceType, &Location, &DeviceId)> {
        self.0
            .iter()
            .map(|((device_type, location), device_id)| (device_type, location, device_id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Generated grammar plus everything needed to resolve its sentences.
///
/// Never mutated after creation; a regeneration produces a new artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarArtifact {
    grammar_text: String,
    pair_index: PairIndex,
    vocabularies: BTreeMap<DeviceType, Vec<Action>>,
    value_ranges: BTreeMap<DeviceId, ValueRange>,
    generated_at: DateTime<Utc>,
    source_registry_version: u64,
    options: GrammarOptions,
}

/// Summary of an artifact for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub format_version: u32,
    pub source_registry_version: u64,
    pub generated_at: DateTime<Utc>,
    pub pairs: usize,
}

impl GrammarArtifact {
    #[must_use]
    pub fn grammar_text(&self) -> &str {
        &self.grammar_text
    }

    #[must_use]
    pub fn pair_index(&self) -> &PairIndex {
        &self.pair_index
    }

    /// Vocabulary of a device type present in the grammar.
    #[must_use]
    pub fn vocabulary(&self, device_type: &DeviceType) -> Option<&[Action]> {
        self.vocabularies.get(device_type).map(Vec::as_slice)
    }

    #[must_use]
    pub fn value_range(&self, device_id: &DeviceId) -> Option<&ValueRange> {
        self.value_ranges.get(device_id)
    }

    #[must_use]
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    #[must_use]
    pub fn source_registry_version(&self) -> u64 {
        self.source_registry_version
    }

    /// Options the grammar text was generated with.
    #[must_use]
    pub fn options(&self) -> &GrammarOptions {
        &self.options
    }

    #[must_use]
    pub fn metadata(&self) -> ArtifactMetadata {
        ArtifactMetadata {
            format_version: FORMAT_VERSION,
            source_registry_version: self.source_registry_version,
            generated_at: self.generated_at,
            pairs: self.pair_index.len(),
        }
    }
}

/// Validate `registry` and generate its grammar.
///
/// # Errors
///
/// Returns [`VoiceHubError::Conflict`] when two enabled devices share a
/// pair, and [`ConfigurationError::EmptyRegistry`] when no enabled device
/// has both a type and a location. Callers keep their previous artifact in
/// both cases.
pub fn generate(
    registry: &Registry,
    options: &GrammarOptions,
) -> Result<GrammarArtifact, VoiceHubError> {
    validate(registry).into_result()?;

    let mut by_type: BTreeMap<&DeviceType, BTreeMap<&Location, &Device>> = BTreeMap::new();
    for device in registry.list_enabled() {
        if let Some((device_type, location)) = device.grammar_pair() {
            by_type
                .entry(device_type)
                .or_default()
                .insert(location, device);
        }
    }
    if by_type.is_empty() {
        return Err(ConfigurationError::EmptyRegistry.into());
    }

    let mut sections = Vec::with_capacity(by_type.len());
    for (device_type, devices) in &by_type {
        let actions = registry
            .vocabulary(device_type)
            .ok_or_else(|| ConfigurationError::UnknownType((*device_type).clone()))?;
        sections.push(gbnf::TypeSection {
            device_type,
            locations: devices.keys().copied().collect(),
            actions,
        });
    }

    let grammar_text = gbnf::write_grammar(&sections, options, registry.version());

    let mut pairs = BTreeMap::new();
    let mut value_ranges = BTreeMap::new();
    for (device_type, devices) in &by_type {
        for (location, device) in devices {
            pairs.insert(
                ((*device_type).clone(), (*location).clone()),
                device.id.clone(),
            );
            if let Some(range) = device.value_range {
                value_ranges.insert(device.id.clone(), range);
            }
        }
    }

    let vocabularies = sections
        .iter()
        .map(|section| (section.device_type.clone(), section.actions.to_vec()))
        .collect();

    Ok(GrammarArtifact {
        grammar_text,
        pair_index: PairIndex(pairs),
        vocabularies,
        value_ranges,
        generated_at: Utc::now(),
        source_registry_version: registry.version(),
        options: options.clone(),
    })
}

/// Locations the artifact's grammar accepts for `device_type`.
#[must_use]
pub fn locations_for<'a>(
    artifact: &'a GrammarArtifact,
    device_type: &DeviceType,
) -> BTreeSet<&'a Location> {
    artifact
        .pair_index
        .iter()
        .filter(|(ty, _, _)| *ty == device_type)
        .map(|(_, location, _)| location)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Unit;

    fn id(value: &str) -> DeviceId {
        DeviceId::new(value).unwrap()
    }

    fn ty(value: &str) -> DeviceType {
        DeviceType::new(value).unwrap()
    }

    fn loc(value: &str) -> Location {
        Location::new(value).unwrap()
    }

    fn registry(devices: &[(&str, &str, &str)]) -> Registry {
        let mut registry = Registry::new();
        for name in ["lounge", "bedroom", "kitchen", "attic"] {
            registry.add_custom_location(loc(name));
        }
        for (device_id, device_type, location) in devices {
            registry
                .upsert(
                    Device::builder(id(device_id))
                        .device_type(ty(device_type))
                        .location(loc(location))
                        .build(),
                )
                .unwrap();
        }
        registry
    }

    /// Literal alternatives of a rule, with the JSON quotes stripped.
    fn rule_literals(text: &str, rule: &str) -> Vec<String> {
        let prefix = format!("{rule} ::= ");
        let line = text
            .lines()
            .find(|line| line.starts_with(&prefix))
            .unwrap_or_else(|| panic!("missing rule {rule}"));
        line[prefix.len()..]
            .split(" | ")
            .map(|alt| alt.trim_matches('"').trim_matches(['\\', '"']).to_string())
            .collect()
    }

    #[test]
    fn should_index_single_device() {
        let artifact = generate(&registry(&[("d1", "lights", "lounge")]), &GrammarOptions::default())
            .unwrap();
        assert_eq!(
            artifact.pair_index().get(&ty("lights"), &loc("lounge")),
            Some(&id("d1"))
        );
        assert_eq!(artifact.pair_index().len(), 1);
        assert!(artifact.grammar_text().contains("root ::= lights-command\n"));
    }

    #[test]
    fn should_emit_exact_command_shape() {
        let artifact = generate(&registry(&[("d1", "lights", "lounge")]), &GrammarOptions::default())
            .unwrap();
        let text = artifact.grammar_text();
        assert!(text.contains(
            r#"lights-command ::= "{\"deviceType\":\"lights\",\"action\":" lights-action ",\"location\":" lights-location "}""#
        ));
        assert!(text.contains(
            r#""{\"deviceType\":\"lights\",\"action\":\"set-percent\",\"location\":" lights-location ",\"value\":" percent-value "}""#
        ));
    }

    #[test]
    fn should_only_emit_locations_in_use() {
        let artifact = generate(
            &registry(&[("d1", "lights", "lounge"), ("d2", "heating", "bedroom")]),
            &GrammarOptions::default(),
        )
        .unwrap();
        let text = artifact.grammar_text();
        assert_eq!(rule_literals(text, "location"), vec!["bedroom", "lounge"]);
        assert_eq!(rule_literals(text, "device-type"), vec!["heating", "lights"]);
        assert_eq!(rule_literals(text, "lights-location"), vec!["lounge"]);
        assert_eq!(rule_literals(text, "heating-location"), vec!["bedroom"]);
        assert!(!text.contains("attic"));
    }

    #[test]
    fn should_pair_every_producible_location_with_an_indexed_device() {
        let artifact = generate(
            &registry(&[
                ("d1", "lights", "lounge"),
                ("d2", "lights", "bedroom"),
                ("d3", "heating", "bedroom"),
                ("d4", "blinds", "kitchen"),
            ]),
            &GrammarOptions::default(),
        )
        .unwrap();
        let text = artifact.grammar_text();
        for name in ["lights", "heating", "blinds"] {
            for location in rule_literals(text, &format!("{name}-location")) {
                assert!(
                    artifact.pair_index().get(&ty(name), &loc(&location)).is_some(),
                    "({name}, {location}) is producible but not indexed"
                );
            }
            let expected: Vec<String> = locations_for(&artifact, &ty(name))
                .into_iter()
                .map(|l| l.to_string())
                .collect();
            assert_eq!(rule_literals(text, &format!("{name}-location")), expected);
        }
        assert_eq!(artifact.pair_index().len(), 4);
    }

    #[test]
    fn should_emit_type_specific_actions() {
        let artifact = generate(
            &registry(&[("d1", "heating", "lounge"), ("d2", "blinds", "lounge")]),
            &GrammarOptions::default(),
        )
        .unwrap();
        let text = artifact.grammar_text();
        assert_eq!(
            rule_literals(text, "heating-action"),
            vec!["on", "off", "increase", "decrease"]
        );
        assert_eq!(rule_literals(text, "blinds-action"), vec!["open", "close", "stop"]);
        assert!(text.contains(r#"\"action\":\"set-temperature\""#));
    }

    #[test]
    fn should_bound_numeric_values() {
        let artifact = generate(
            &registry(&[("d1", "heating", "lounge"), ("d2", "lights", "lounge")]),
            &GrammarOptions::default(),
        )
        .unwrap();
        let text = artifact.grammar_text();
        let percent = rule_literals(text, "percent-value");
        assert_eq!(percent.len(), 11);
        assert_eq!(percent.first().map(String::as_str), Some("0"));
        assert_eq!(percent.last().map(String::as_str), Some("100"));
        let temperature = rule_literals(text, "temperature-value");
        assert_eq!(temperature.len(), 100);
        assert_eq!(temperature.first().map(String::as_str), Some("1"));
        assert_eq!(temperature.last().map(String::as_str), Some("100"));
    }

    #[test]
    fn should_space_temperature_literals_over_the_command_scale() {
        let options = GrammarOptions {
            temperature_step: 25,
            ..GrammarOptions::default()
        };
        assert_eq!(
            options.values(ValueKind::Temperature),
            vec![1, 25, 50, 75, 100]
        );
        assert_eq!(
            f64::from(*options.values(ValueKind::Temperature).last().unwrap()),
            crate::command::SCALE_MAX
        );
        assert_eq!(
            f64::from(options.values(ValueKind::Temperature)[0]),
            crate::command::SCALE_MIN
        );
    }

    #[test]
    fn should_record_generation_options_on_the_artifact() {
        let options = GrammarOptions {
            percent_step: 25,
            ..GrammarOptions::default()
        };
        let artifact = generate(&registry(&[("d1", "lights", "lounge")]), &options).unwrap();
        assert_eq!(artifact.options(), &options);
        assert_eq!(
            rule_literals(artifact.grammar_text(), "percent-value"),
            vec!["0", "25", "50", "75", "100"]
        );
    }

    #[test]
    fn should_skip_value_rules_when_unused() {
        let artifact = generate(&registry(&[("d1", "switch", "lounge")]), &GrammarOptions::default())
            .unwrap();
        let text = artifact.grammar_text();
        assert!(!text.contains("percent-value"));
        assert!(!text.contains("temperature-value"));
    }

    #[test]
    fn should_always_include_hundred_percent() {
        let options = GrammarOptions {
            percent_step: 30,
            ..GrammarOptions::default()
        };
        assert_eq!(options.values(ValueKind::Percent), vec![0, 30, 60, 90, 100]);
    }

    #[test]
    fn should_fail_on_conflicts() {
        let result = generate(
            &registry(&[("d1", "lights", "lounge"), ("d2", "lights", "lounge")]),
            &GrammarOptions::default(),
        );
        let Err(VoiceHubError::Conflict(err)) = result else {
            panic!("expected a conflict");
        };
        assert_eq!(err.conflicts[0].device_ids, vec![id("d1"), id("d2")]);
    }

    #[test]
    fn should_fail_on_empty_registry() {
        let mut registry = registry(&[("d1", "lights", "lounge")]);
        registry.set_enabled(&id("d1"), false).unwrap();
        registry.upsert(Device::builder(id("d2")).build()).unwrap();
        assert!(matches!(
            generate(&registry, &GrammarOptions::default()),
            Err(VoiceHubError::Configuration(ConfigurationError::EmptyRegistry))
        ));
    }

    #[test]
    fn should_exclude_incomplete_devices() {
        let mut registry = registry(&[("d1", "lights", "lounge")]);
        registry
            .upsert(Device::builder(id("d2")).device_type(ty("heating")).build())
            .unwrap();
        let artifact = generate(&registry, &GrammarOptions::default()).unwrap();
        assert_eq!(artifact.pair_index().len(), 1);
        assert!(!artifact.grammar_text().contains("heating"));
    }

    #[test]
    fn should_produce_identical_text_for_identical_registry() {
        let registry = registry(&[("d1", "lights", "lounge"), ("d2", "music", "kitchen")]);
        let a = generate(&registry, &GrammarOptions::default()).unwrap();
        let b = generate(&registry, &GrammarOptions::default()).unwrap();
        assert_eq!(a.grammar_text(), b.grammar_text());
        assert_eq!(a.pair_index(), b.pair_index());
        assert_eq!(a.source_registry_version(), registry.version());
    }

    #[test]
    fn should_handle_custom_types_with_numeric_only_vocabulary() {
        let mut registry = registry(&[]);
        registry
            .add_custom_type(ty("Robot Vacuum"), vec![Action::SetPercent])
            .unwrap();
        registry
            .upsert(
                Device::builder(id("vac"))
                    .device_type(ty("robot vacuum"))
                    .location(loc("kitchen"))
                    .build(),
            )
            .unwrap();
        let artifact = generate(&registry, &GrammarOptions::default()).unwrap();
        let text = artifact.grammar_text();
        assert!(text.contains("root ::= robot-vacuum-command\n"));
        assert!(!text.contains("robot-vacuum-action"));
        assert!(text.contains(r#"\"deviceType\":\"robot vacuum\""#));
    }

    #[test]
    fn should_carry_value_ranges_of_indexed_devices() {
        let mut registry = registry(&[]);
        registry
            .upsert(
                Device::builder(id("rad"))
                    .device_type(ty("heating"))
                    .location(loc("lounge"))
                    .value_range(ValueRange::new(15.0, 25.0, Unit::Celsius).unwrap())
                    .build(),
            )
            .unwrap();
        let artifact = generate(&registry, &GrammarOptions::default()).unwrap();
        assert_eq!(artifact.value_range(&id("rad")).unwrap().max(), 25.0);
        assert!(artifact.vocabulary(&ty("heating")).is_some());
        assert!(artifact.vocabulary(&ty("lights")).is_none());
    }

    #[test]
    fn should_roundtrip_artifact_through_serde_json() {
        let artifact = generate(&registry(&[("d1", "lights", "lounge")]), &GrammarOptions::default())
            .unwrap();
        let json = serde_json::to_string(&artifact).unwrap();
        let parsed: GrammarArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, artifact);
    }
}
