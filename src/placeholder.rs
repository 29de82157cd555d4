//! Exact-match substitution of `[[TOKEN]]` placeholders.
//!
//! Values are inserted as literal text: no character in a value has any
//! special meaning here, so `&`, `\`, `$` and friends come out unchanged.

use std::collections::BTreeMap;

pub const DESCRIPTION: &str = "DESCRIPTION";
pub const COMMAND: &str = "COMMAND";
pub const UNIT_NAME: &str = "UNIT_NAME";
pub const TIMER_SPEC: &str = "TIMER_SPEC";
pub const FREQUENCY: &str = "FREQUENCY";
pub const CALENDAR: &str = "CALENDAR";

pub const RECOGNIZED: &[&str] = &[
    DESCRIPTION,
    COMMAND,
    UNIT_NAME,
    TIMER_SPEC,
    FREQUENCY,
    CALENDAR,
];

/// Placeholder name → replacement value.
pub type Bindings = BTreeMap<&'static str, String>;

pub fn token(name: &str) -> String {
    format!("[[{}]]", name)
}

/// Replace every occurrence of every bound token in one left-to-right pass,
/// so inserted values are never scanned again. Unbound tokens are left alone.
pub fn substitute(text: &str, bindings: &Bindings) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("[[") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let bound = after
            .find("]]")
            .and_then(|end| bindings.get(&after[..end]).map(|value| (end, value)));
        match bound {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                // Step over one bracket only: `[[[TOKEN]]]` holds a token at the next offset.
                out.push('[');
                rest = &rest[start + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn contains(text: &str, name: &str) -> bool {
    text.contains(&token(name))
}

/// Names of all `[[TOKEN]]` markers still present, in order of appearance,
/// without duplicates. A token is `[[` + uppercase/digit/underscore + `]]`.
pub fn remaining(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("[[") {
        let after = &rest[start + 2..];
        match after.find("]]") {
            Some(end) => {
                let name = &after[..end];
                let well_formed = !name.is_empty()
                    && name
                        .chars()
                        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
                if well_formed {
                    if !found.iter().any(|f| f == name) {
                        found.push(name.to_string());
                    }
                    rest = &after[end + 2..];
                } else {
                    rest = &rest[start + 1..];
                }
            }
            None => break,
        }
    }
    found
}
