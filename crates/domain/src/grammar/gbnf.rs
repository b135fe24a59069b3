//! GBNF text emission.
//!
//! The produced language is the set of compact JSON objects
//! `{"deviceType":"<t>","action":"<a>","location":"<l>"}` and
//! `{"deviceType":"<t>","action":"<a>","location":"<l>","value":"<n>"}`.
//! Key order, delimiters and quoting are part of the engine contract: any
//! change here must bump [`FORMAT_VERSION`].

use std::collections::BTreeSet;
use std::fmt::Write as _;

use super::GrammarOptions;
use crate::action::{Action, ValueKind};
use crate::id::{DeviceType, Location};

/// Version of the structured output shape.
pub const FORMAT_VERSION: u32 = 2;

const PERCENT_RULE: &str = "percent-value";
const TEMPERATURE_RULE: &str = "temperature-value";

/// Per-type input to the writer: in-use locations and vocabulary.
pub(super) struct TypeSection<'a> {
    pub device_type: &'a DeviceType,
    pub locations: Vec<&'a Location>,
    pub actions: &'a [Action],
}

pub(super) fn write_grammar(
    sections: &[TypeSection<'_>],
    options: &GrammarOptions,
    registry_version: u64,
) -> String {
    let prefixes = rule_prefixes(sections.iter().map(|section| section.device_type));
    let mut out = String::new();

    let _ = writeln!(
        out,
        "# voicehub command grammar v{FORMAT_VERSION}, registry version {registry_version}"
    );

    let roots: Vec<String> = prefixes.iter().map(|p| format!("{p}-command")).collect();
    let _ = writeln!(out, "root ::= {}", roots.join(" | "));

    let types = sections.iter().map(|section| quoted(section.device_type.as_str()));
    let _ = writeln!(out, "device-type ::= {}", alternatives(types));

    let all_locations: BTreeSet<&Location> = sections
        .iter()
        .flat_map(|section| section.locations.iter().copied())
        .collect();
    let locations = all_locations.iter().map(|location| quoted(location.as_str()));
    let _ = writeln!(out, "location ::= {}", alternatives(locations));

    let mut kinds = BTreeSet::new();
    for (section, prefix) in sections.iter().zip(&prefixes) {
        write_type_rules(&mut out, section, prefix, &mut kinds);
    }

    if kinds.contains(&ValueKind::Percent) {
        let values = options.values(ValueKind::Percent);
        let _ = writeln!(out, "{PERCENT_RULE} ::= {}", value_alternatives(&values));
    }
    if kinds.contains(&ValueKind::Temperature) {
        let values = options.values(ValueKind::Temperature);
        let _ = writeln!(out, "{TEMPERATURE_RULE} ::= {}", value_alternatives(&values));
    }

    out
}

fn value_rule(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Percent => PERCENT_RULE,
        ValueKind::Temperature => TEMPERATURE_RULE,
    }
}

fn write_type_rules(
    out: &mut String,
    section: &TypeSection<'_>,
    prefix: &str,
    kinds: &mut BTreeSet<ValueKind>,
) {
    let device_type = section.device_type.as_str();
    let plain: Vec<Action> = section
        .actions
        .iter()
        .copied()
        .filter(|action| !action.is_numeric())
        .collect();

    if !plain.is_empty() {
        let tokens = plain.iter().map(|action| quoted(action.token()));
        let _ = writeln!(out, "{prefix}-action ::= {}", alternatives(tokens));
    }

    let locations = section.locations.iter().map(|location| quoted(location.as_str()));
    let _ = writeln!(out, "{prefix}-location ::= {}", alternatives(locations));

    let mut commands = Vec::new();
    if !plain.is_empty() {
        commands.push(format!(
            "{} {prefix}-action {} {prefix}-location {}",
            literal(&format!(r#"{{"deviceType":"{device_type}","action":"#)),
            literal(r#","location":"#),
            literal("}"),
        ));
    }
    for action in section.actions.iter().copied() {
        let Some(kind) = action.value_kind() else {
            continue;
        };
        kinds.insert(kind);
        commands.push(format!(
            "{} {prefix}-location {} {} {}",
            literal(&format!(
                r#"{{"deviceType":"{device_type}","action":"{}","location":"#,
                action.token()
            )),
            literal(r#","value":"#),
            value_rule(kind),
            literal("}"),
        ));
    }
    let _ = writeln!(out, "{prefix}-command ::= {}", commands.join(" | "));
}

/// Assign every device type a unique rule-name prefix made of `[a-z0-9-]`.
fn rule_prefixes<'a>(types: impl Iterator<Item = &'a DeviceType>) -> Vec<String> {
    let mut used = BTreeSet::<String>::new();
    types
        .map(|device_type| {
            let base = sanitize(device_type.as_str());
            let mut candidate = base.clone();
            let mut n = 1;
            while used.contains(&candidate) {
                n += 1;
                candidate = format!("{base}-{n}");
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}

fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "type".to_string()
    } else {
        trimmed.to_string()
    }
}

/// GBNF literal for raw text; escapes `"` and `\`.
fn literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// GBNF literal for a JSON string value (`"lights"` including the quotes).
fn quoted(value: &str) -> String {
    literal(&format!("\"{value}\""))
}

fn alternatives(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(" | ")
}

fn value_alternatives(values: &[u32]) -> String {
    alternatives(values.iter().map(|value| quoted(&value.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_escape_quotes_in_literals() {
        assert_eq!(literal(r#"{"a":"#), r#""{\"a\":""#);
        assert_eq!(quoted("lights"), r#""\"lights\"""#);
    }

    #[test]
    fn should_sanitize_rule_prefixes() {
        assert_eq!(sanitize("robot vacuum"), "robot-vacuum");
        assert_eq!(sanitize("kid's  toys"), "kid-s-toys");
        assert_eq!(sanitize("café"), "caf");
        assert_eq!(sanitize("ñ"), "type");
    }

    #[test]
    fn should_deduplicate_colliding_prefixes() {
        let a = DeviceType::new("tv room").unwrap();
        let b = DeviceType::new("tv-room").unwrap();
        let c = DeviceType::new("tv_room").unwrap();
        let prefixes = rule_prefixes([&a, &b, &c].into_iter());
        assert_eq!(prefixes, vec!["tv-room", "tv-room-2", "tv-room-3"]);
    }
}
