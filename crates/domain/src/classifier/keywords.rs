//! Keyword tables driving classification.
//!
//! Matching is case-insensitive substring matching over text where `_` and
//! `.` have been turned into spaces. Table order is significant: the first
//! entry whose keywords match wins.

/// Source area names that map to a canonical location.
pub const LOCATION_ALIASES: &[(&str, &str)] = &[
    ("living", "living room"),
    ("livingroom", "living room"),
    ("family room", "living room"),
    ("master bedroom", "bedroom"),
    ("master", "bedroom"),
    ("main bedroom", "bedroom"),
    ("bed room", "bedroom"),
    ("ensuite", "bathroom"),
    ("en suite", "bathroom"),
    ("toilet", "bathroom"),
    ("kitchenette", "kitchen"),
    ("hall", "hallway"),
    ("corridor", "hallway"),
    ("study", "office"),
];

/// `location → keywords`, scanned in declaration order.
///
/// `bathroom` precedes `bedroom` so that "master bathroom" is not taken for
/// a bedroom through the `master` keyword.
pub const LOCATION_KEYWORDS: &[(&str, &[&str])] = &[
    ("bathroom", &["bathroom", "ensuite", "en suite", "shower", "toilet"]),
    ("bedroom", &["bedroom", "bed room", "master"]),
    ("kitchen", &["kitchen", "kitchenette"]),
    ("living room", &["living room", "livingroom", "living", "family room"]),
    ("lounge", &["lounge", "sitting room"]),
    ("dining room", &["dining"]),
    ("office", &["office", "study"]),
    ("hallway", &["hallway", "corridor", "landing", "entrance"]),
    ("nursery", &["nursery", "kids room"]),
    ("garage", &["garage"]),
    ("garden", &["garden", "patio", "terrace", "backyard"]),
];

/// Platform domains with a fixed device type.
pub const DOMAIN_TYPES: &[(&str, &str)] = &[
    ("light", "lights"),
    ("climate", "heating"),
    ("water_heater", "heating"),
    ("fan", "fan"),
];

/// Generic on/off domains only classified as lights on a lighting keyword.
pub const SWITCH_DOMAINS: &[&str] = &["switch", "input_boolean"];

pub const LIGHTING_KEYWORDS: &[&str] = &[
    "light",
    "lamp",
    "bulb",
    "led",
    "chandelier",
    "sconce",
    "spotlight",
];

pub const MEDIA_DOMAINS: &[&str] = &["media_player"];

pub const DISPLAY_KEYWORDS: &[&str] = &["tv", "television", "telly", "projector", "display"];

pub const AUDIO_KEYWORDS: &[&str] = &[
    "speaker", "audio", "music", "radio", "stereo", "soundbar", "sonos", "amp",
];

pub const COVER_DOMAINS: &[&str] = &["cover"];

pub const NON_BLIND_KEYWORDS: &[&str] = &["garage", "door", "gate", "shutter"];

/// Lower-case `text` and turn identifier separators into spaces.
#[must_use]
pub fn haystack(text: &str) -> String {
    text.to_lowercase().replace(['_', '.'], " ")
}

/// Whether any of `keywords` occurs in any of the haystacks.
#[must_use]
pub fn contains_any(haystacks: &[&str], keywords: &[&str]) -> bool {
    haystacks
        .iter()
        .any(|hay| keywords.iter().any(|keyword| hay.contains(keyword)))
}
