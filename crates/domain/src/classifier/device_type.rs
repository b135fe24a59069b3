//! Device type rules.

use super::keywords::{
    AUDIO_KEYWORDS, COVER_DOMAINS, DISPLAY_KEYWORDS, DOMAIN_TYPES, LIGHTING_KEYWORDS,
    MEDIA_DOMAINS, NON_BLIND_KEYWORDS, SWITCH_DOMAINS, contains_any, haystack,
};
use crate::device::RawDescriptor;
use crate::id::DeviceType;

/// Media players: first keyword set found in id, name or device class wins.
const MEDIA_RULES: &[(&[&str], &str)] = &[(DISPLAY_KEYWORDS, "tv"), (AUDIO_KEYWORDS, "music")];
const MEDIA_FALLBACK: &str = "music";

/// Guess a device type from the platform domain and descriptive text.
///
/// Returns `None` when the domain is unknown, and for generic switches
/// without a lighting keyword: those are left for the user to assign rather
/// than guessed.
#[must_use]
pub fn classify_device_type(raw: &RawDescriptor) -> Option<DeviceType> {
    let platform = raw.platform()?;
    let platform = platform.as_str();
    let id = raw.stable_id.as_deref().map(haystack).unwrap_or_default();
    let name = raw.display_name.as_deref().map(haystack).unwrap_or_default();
    let class = raw.device_class.as_deref().map(haystack).unwrap_or_default();

    let type_name = if let Some((_, ty)) = DOMAIN_TYPES.iter().find(|(d, _)| *d == platform) {
        *ty
    } else if SWITCH_DOMAINS.contains(&platform) {
        if !contains_any(&[id.as_str(), name.as_str()], LIGHTING_KEYWORDS) {
            return None;
        }
        "lights"
    } else if MEDIA_DOMAINS.contains(&platform) {
        let texts = [id.as_str(), name.as_str(), class.as_str()];
        MEDIA_RULES
            .iter()
            .find(|(keywords, _)| contains_any(&texts, keywords))
            .map_or(MEDIA_FALLBACK, |(_, ty)| *ty)
    } else if COVER_DOMAINS.contains(&platform) {
        if contains_any(&[id.as_str(), name.as_str()], NON_BLIND_KEYWORDS) {
            "switch"
        } else {
            "blinds"
        }
    } else {
        return None;
    };
    DeviceType::new(type_name).ok()
}
