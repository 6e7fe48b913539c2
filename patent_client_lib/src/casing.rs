//! Key casing conversions between remote payloads and canonical field names.

use std::sync::OnceLock;

use regex::Regex;

fn acronym_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("static regex"))
}

fn word_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").expect("static regex"))
}

/// Converts a camelCase, PascalCase or kebab-case key to snake_case.
///
/// Runs of capitals are treated as one word (`HTTPStatus` -> `http_status`).
/// Already-canonical keys are returned unchanged.
pub fn underscore(key: &str) -> String {
    let out = acronym_boundary().replace_all(key, "${1}_${2}");
    let out = word_boundary().replace_all(&out, "${1}_${2}");
    out.replace('-', "_").to_lowercase()
}

/// Converts a snake_case key to lower camelCase (`trial_number` -> `trialNumber`).
pub fn camelize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for (i, c) in key.chars().enumerate() {
        if c == '_' && i > 0 {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else if i == 0 {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
