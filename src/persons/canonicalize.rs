// Surname canonicalization for person mentions.
//
// Models often write a full name once and the bare surname afterwards
// ("Mario Rossi" ... "Rossi"). One pass registers every multi-token name
// under its last token; a second pass replaces bare single-token mentions
// with the registered full name. The table is rebuilt on every call from
// the batch being processed.

use std::collections::HashMap;
use std::str::FromStr;

use tracing::{debug, warn};

/// What to do when two different full names share a surname.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SurnamePolicy {
    /// The last full name seen for a surname wins. Earlier ones are lost.
    #[default]
    LastWriteWins,
    /// Ambiguous surnames are left unresolved.
    KeepAmbiguous,
}

impl FromStr for SurnamePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-write-wins" | "last" => Ok(Self::LastWriteWins),
            "keep-ambiguous" | "keep" => Ok(Self::KeepAmbiguous),
            other => anyhow::bail!(
                "unknown surname policy {other:?} (expected last-write-wins or keep-ambiguous)"
            ),
        }
    }
}

/// Canonicalize with the default last-write-wins policy.
pub fn canonicalize(names: &[String]) -> Vec<String> {
    canonicalize_with(names, SurnamePolicy::default())
}

/// Map every bare surname to the full name registered for it.
///
/// Same length and order as the input. Multi-token names and unmatched
/// single tokens pass through unchanged.
pub fn canonicalize_with(names: &[String], policy: SurnamePolicy) -> Vec<String> {
    let table = surname_table(names, policy);
    let mut replaced = 0usize;

    let out = names
        .iter()
        .map(|name| {
            let mut tokens = name.split_whitespace();
            match (tokens.next(), tokens.next()) {
                (Some(single), None) => match table.get(single) {
                    Some(full) => {
                        replaced += 1;
                        full.clone()
                    }
                    None => name.clone(),
                },
                _ => name.clone(),
            }
        })
        .collect();

    debug!(
        mentions = names.len(),
        surnames = table.len(),
        replaced = replaced,
        "Canonicalized person mentions"
    );

    out
}

/// Build the surname -> full name table for one batch.
pub fn surname_table(names: &[String], policy: SurnamePolicy) -> HashMap<String, String> {
    let mut table: HashMap<String, String> = HashMap::new();
    let mut ambiguous: Vec<String> = Vec::new();

    for name in names {
        let tokens: Vec<&str> = name.split_whitespace().collect();
        if tokens.len() < 2 {
            continue;
        }
        let surname = tokens[tokens.len() - 1];
        if let Some(previous) = table.insert(surname.to_string(), name.clone()) {
            if previous != *name && !ambiguous.iter().any(|s| s == surname) {
                ambiguous.push(surname.to_string());
            }
        }
    }

    if !ambiguous.is_empty() {
        warn!(
            surnames = ?ambiguous,
            policy = ?policy,
            "Several full names share a surname"
        );
        if policy == SurnamePolicy::KeepAmbiguous {
            for surname in &ambiguous {
                table.remove(surname);
            }
        }
    }

    table
}

/// Title-case a name: first letter of every alphabetic run upper-cased,
/// the rest lower-cased ("d'ALEMA" -> "D'Alema").
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
