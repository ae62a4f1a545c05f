// SPDX-License-Identifier: PMPL-1.0-or-later
//! Pure validation and formatting rules used by resource operations.

use std::sync::OnceLock;

use regex::Regex;

/// Whether `color` is a valid label color: exactly six lowercase hex
/// digits, nothing else. Invalid colors are rejected, never coerced.
pub fn is_label_color(color: &str) -> bool {
    static COLOR: OnceLock<Regex> = OnceLock::new();
    COLOR
        .get_or_init(|| Regex::new(r"^[0-9a-f]{6}$").expect("static pattern"))
        .is_match(color)
}

/// Display name derived from a login: `some-user` becomes `Some User`.
/// Used for users that tests reference without registering explicitly.
pub fn display_name(login: &str) -> String {
    login
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
