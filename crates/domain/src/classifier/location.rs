//! Location cascade.

use serde::{Deserialize, Serialize};

use super::keywords::{LOCATION_ALIASES, LOCATION_KEYWORDS, haystack};
use crate::device::RawDescriptor;
use crate::id::{Location, normalize_name};

/// Which strategy produced a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    DirectArea,
    ParentArea,
    IdentifierKeyword,
    NameKeyword,
    ParentNameKeyword,
}

type Strategy = fn(&RawDescriptor) -> Option<Location>;

/// Strategies in priority order.
const STRATEGIES: [(LocationSource, Strategy); 5] = [
    (LocationSource::DirectArea, direct_area),
    (LocationSource::ParentArea, parent_area),
    (LocationSource::IdentifierKeyword, identifier_keyword),
    (LocationSource::NameKeyword, name_keyword),
    (LocationSource::ParentNameKeyword, parent_name_keyword),
];

/// Run the cascade, first strategy yielding a location wins.
#[must_use]
pub fn classify_location(raw: &RawDescriptor) -> Option<(Location, LocationSource)> {
    STRATEGIES
        .iter()
        .find_map(|(source, strategy)| strategy(raw).map(|location| (location, *source)))
}

/// Normalise an area name and map it through the alias table.
#[must_use]
pub fn normalize_area(area: &str) -> Option<Location> {
    let normalized = normalize_name(&area.replace('_', " "));
    let canonical = LOCATION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map_or(normalized.as_str(), |(_, canonical)| *canonical);
    Location::new(canonical).ok()
}

/// First location of the keyword table matching `text`.
#[must_use]
pub fn keyword_location(text: &str) -> Option<Location> {
    let hay = haystack(text);
    LOCATION_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| hay.contains(keyword)))
        .and_then(|(location, _)| Location::new(location).ok())
}

fn direct_area(raw: &RawDescriptor) -> Option<Location> {
    raw.area.as_deref().and_then(normalize_area)
}

fn parent_area(raw: &RawDescriptor) -> Option<Location> {
    raw.parent_area.as_deref().and_then(normalize_area)
}

fn identifier_keyword(raw: &RawDescriptor) -> Option<Location> {
    raw.stable_id.as_deref().and_then(keyword_location)
}

fn name_keyword(raw: &RawDescriptor) -> Option<Location> {
    raw.display_name.as_deref().and_then(keyword_location)
}

fn parent_name_keyword(raw: &RawDescriptor) -> Option<Location> {
    raw.parent_name.as_deref().and_then(keyword_location)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawDescriptor {
        RawDescriptor::default()
    }

    #[test]
    fn should_prefer_direct_area_over_everything() {
        let descriptor = RawDescriptor {
            area: Some("Master Bedroom".to_string()),
            parent_area: Some("Kitchen".to_string()),
            stable_id: Some("light.lounge_lamp".to_string()),
            ..raw()
        };
        let (location, source) = classify_location(&descriptor).unwrap();
        assert_eq!(location.as_str(), "bedroom");
        assert_eq!(source, LocationSource::DirectArea);
    }

    #[test]
    fn should_fall_back_to_parent_area() {
        let descriptor = RawDescriptor {
            parent_area: Some("living".to_string()),
            stable_id: Some("light.kitchen_spots".to_string()),
            ..raw()
        };
        let (location, source) = classify_location(&descriptor).unwrap();
        assert_eq!(location.as_str(), "living room");
        assert_eq!(source, LocationSource::ParentArea);
    }

    #[test]
    fn should_keep_unaliased_area_names() {
        let descriptor = RawDescriptor {
            area: Some("Wine_Cellar".to_string()),
            ..raw()
        };
        let (location, _) = classify_location(&descriptor).unwrap();
        assert_eq!(location.as_str(), "wine cellar");
    }

    #[test]
    fn should_match_identifier_before_display_name() {
        let descriptor = RawDescriptor {
            stable_id: Some("light.kitchen_spots".to_string()),
            display_name: Some("Lounge spots".to_string()),
            ..raw()
        };
        let (location, source) = classify_location(&descriptor).unwrap();
        assert_eq!(location.as_str(), "kitchen");
        assert_eq!(source, LocationSource::IdentifierKeyword);
    }

    #[test]
    fn should_match_display_name() {
        let descriptor = RawDescriptor {
            stable_id: Some("light.ceiling_1".to_string()),
            display_name: Some("Bedroom Ceiling Light".to_string()),
            ..raw()
        };
        let (location, source) = classify_location(&descriptor).unwrap();
        assert_eq!(location.as_str(), "bedroom");
        assert_eq!(source, LocationSource::NameKeyword);
    }

    #[test]
    fn should_match_parent_display_name_last() {
        let descriptor = RawDescriptor {
            stable_id: Some("sensor.hue_1".to_string()),
            display_name: Some("Motion".to_string()),
            parent_name: Some("Hallway sensor".to_string()),
            ..raw()
        };
        let (location, source) = classify_location(&descriptor).unwrap();
        assert_eq!(location.as_str(), "hallway");
        assert_eq!(source, LocationSource::ParentNameKeyword);
    }

    #[test]
    fn should_resolve_master_bathroom_to_bathroom() {
        let location = keyword_location("Master Bathroom Fan").unwrap();
        assert_eq!(location.as_str(), "bathroom");
    }

    #[test]
    fn should_leave_location_empty_when_nothing_matches() {
        let descriptor = RawDescriptor {
            stable_id: Some("switch.plug_3".to_string()),
            display_name: Some("Plug 3".to_string()),
            ..raw()
        };
        assert!(classify_location(&descriptor).is_none());
    }

    #[test]
    fn should_skip_blank_area() {
        let descriptor = RawDescriptor {
            area: Some("   ".to_string()),
            stable_id: Some("light.office_desk".to_string()),
            ..raw()
        };
        let (location, source) = classify_location(&descriptor).unwrap();
        assert_eq!(location.as_str(), "office");
        assert_eq!(source, LocationSource::IdentifierKeyword);
    }
}
