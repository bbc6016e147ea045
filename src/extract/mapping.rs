// Reverse mapping for grouped labels.
//
// The delegated clusterer gets back `{"cluster key": ["member", ...]}`.
// Inverting that gives member -> key, which is then applied as a plain
// substitution over a column of values.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Invert `key -> [members]` into `member -> key`.
///
/// Keys are visited in their original order, so a member listed under two
/// keys maps to the later one. A bare string value counts as a one-member
/// list. Non-string members are skipped.
pub fn reverse_mapping(groups: &Map<String, Value>) -> HashMap<String, String> {
    let mut reverse = HashMap::new();
    for (key, members) in groups {
        match members {
            Value::Array(items) => {
                for member in items.iter().filter_map(Value::as_str) {
                    reverse.insert(member.to_string(), key.clone());
                }
            }
            Value::String(member) => {
                reverse.insert(member.clone(), key.clone());
            }
            _ => {}
        }
    }
    reverse
}

/// Replace every value that has an entry in `reverse`; leave the rest as-is.
pub fn apply_mapping(values: &[String], reverse: &HashMap<String, String>) -> Vec<String> {
    values
        .iter()
        .map(|v| reverse.get(v).unwrap_or(v).clone())
        .collect()
}

/// `reverse_mapping` + `apply_mapping` over a parsed value. Anything other
/// than an object leaves `values` unchanged.
pub fn replace_from_groups(values: &[String], groups: &Value) -> Vec<String> {
    match groups.as_object() {
        Some(map) => apply_mapping(values, &reverse_mapping(map)),
        None => values.to_vec(),
    }
}
