//! Response classification against a definition's marker sets
//!
//! Pure functions: identical inputs always yield the identical status.

use crate::catalog::{MarkerSet, ProbeDefinition};
use crate::models::ProbeStatus;
use regex::Regex;

/// Evaluates a marker set against a response
pub fn marker_matches(set: &MarkerSet, status_code: u16, body: &str) -> bool {
    if set.status.contains(&status_code) {
        return true;
    }
    if set.strings.iter().any(|s| body.contains(s.as_str())) {
        return true;
    }
    set.patterns.iter().any(|p| {
        // Patterns are validated at catalog load time
        Regex::new(p).map(|re| re.is_match(body)).unwrap_or(false)
    })
}

/// Classifies a response into an existence status.
///
/// Exists markers are checked before not-found markers: a response matching
/// both is treated as Exists, surfacing the ambiguity to the reviewer rather
/// than hiding a potential hit.
pub fn classify(def: &ProbeDefinition, status_code: u16, body: &str) -> ProbeStatus {
    if let Some((min, max)) = def.valid_status {
        if status_code < min || status_code > max {
            if def.not_found.status.contains(&status_code) {
                return ProbeStatus::NotFound;
            }
            return ProbeStatus::Unknown;
        }
    }

    if marker_matches(&def.exists, status_code, body) {
        return ProbeStatus::Exists;
    }
    if marker_matches(&def.not_found, status_code, body) {
        return ProbeStatus::NotFound;
    }

    ProbeStatus::Unknown
}
