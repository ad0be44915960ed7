//! Agent identity normalization.
//!
//! Sources name agents three different ways: an email-like login
//! (`jdoe@domain.com`), a bare caller username (`JDoe`), and free-text person
//! names (`Doe, John`). Everything is reduced to an [`AgentKey`] before any
//! merge. Free-text names reach a key through the [`Roster`], which the dials
//! export populates with each agent's `First L` display name.
//!
//! Known upstream mismatches are corrected by [`IdentityOverrides`], an
//! explicit table loaded once from config and never mutated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::RecordIssue;
use crate::error::ReconError;
use crate::model::AgentKey;

// ---------------------------------------------------------------------------
// Override table
// ---------------------------------------------------------------------------

/// Explicit identity corrections.
///
/// Missing tables fall back to the built-in defaults; a table given in config
/// replaces the corresponding default entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityOverrides {
    /// Username alias → canonical username.
    pub usernames: BTreeMap<String, String>,
    /// Nickname → first name as it appears in the dials export.
    pub first_names: BTreeMap<String, String>,
    /// `First L` display name → canonical username, for names the roster
    /// cannot resolve on its own.
    pub display_names: BTreeMap<String, String>,
}

impl Default for IdentityOverrides {
    fn default() -> Self {
        Self {
            usernames: BTreeMap::from([
                ("mgarcia".to_string(), "ysanchez".to_string()),
                ("mperez".to_string(), "ysanchez".to_string()),
            ]),
            first_names: BTreeMap::from([
                ("Ally".to_string(), "Allison".to_string()),
                ("Matt".to_string(), "Matthew".to_string()),
                ("Mike".to_string(), "Michael".to_string()),
            ]),
            display_names: BTreeMap::new(),
        }
    }
}

impl IdentityOverrides {
    /// An override table with no entries.
    pub fn empty() -> Self {
        Self {
            usernames: BTreeMap::new(),
            first_names: BTreeMap::new(),
            display_names: BTreeMap::new(),
        }
    }

    /// Reject entries that would make normalization non-idempotent or that
    /// can never match.
    pub fn validate(&self) -> Result<(), ReconError> {
        let aliases: BTreeMap<String, String> = self
            .usernames
            .iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_lowercase()))
            .collect();

        for (alias, target) in &aliases {
            if !is_username(alias) {
                return Err(ReconError::ConfigValidation(format!(
                    "identity.usernames: '{alias}' is not a username"
                )));
            }
            if !is_username(target) {
                return Err(ReconError::ConfigValidation(format!(
                    "identity.usernames: '{alias}' maps to '{target}', which is not a username"
                )));
            }
            if alias != target {
                if let Some(next) = aliases.get(target) {
                    if next != target {
                        return Err(ReconError::ConfigValidation(format!(
                            "identity.usernames: '{alias}' -> '{target}' -> '{next}' is a chain; map '{alias}' to '{next}' directly"
                        )));
                    }
                }
            }
        }

        for (nick, first) in &self.first_names {
            if nick.trim().is_empty() || first.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "identity.first_names: empty name".into(),
                ));
            }
        }

        for (display, target) in &self.display_names {
            if display.split_whitespace().count() < 2 {
                return Err(ReconError::ConfigValidation(format!(
                    "identity.display_names: '{display}' is not a 'First L' name"
                )));
            }
            if !is_username(&target.trim().to_lowercase()) {
                return Err(ReconError::ConfigValidation(format!(
                    "identity.display_names: '{display}' maps to '{target}', which is not a username"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum RosterEntry {
    Unique(AgentKey),
    /// Two different agents share this display name.
    Ambiguous,
}

/// Display name → agent key, built from a source that carries both.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: BTreeMap<String, RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, display: &str, agent: &AgentKey) {
        let key = fold_display(display);
        let entry = match self.entries.get(&key) {
            None => RosterEntry::Unique(agent.clone()),
            Some(RosterEntry::Unique(existing)) if existing != agent => {
                log::warn!("display name '{display}' is shared by '{existing}' and '{agent}'");
                RosterEntry::Ambiguous
            }
            Some(_) => return,
        };
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, display: &str) -> Option<&RosterEntry> {
        self.entries.get(&fold_display(display))
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Maps raw identity strings to canonical keys.
#[derive(Debug, Clone)]
pub struct IdentityNormalizer {
    usernames: BTreeMap<String, String>,
    first_names: BTreeMap<String, String>,
    display_names: BTreeMap<String, String>,
}

impl IdentityNormalizer {
    pub fn new(overrides: &IdentityOverrides) -> Self {
        Self {
            usernames: overrides
                .usernames
                .iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_lowercase()))
                .collect(),
            first_names: overrides
                .first_names
                .iter()
                .map(|(k, v)| (k.trim().to_lowercase(), capitalize(v.trim())))
                .collect(),
            display_names: overrides
                .display_names
                .iter()
                .map(|(k, v)| (fold_display(k), v.trim().to_lowercase()))
                .collect(),
        }
    }

    /// Username from a login or email: text before `@`, lowercased, with the
    /// username override applied.
    pub fn normalize_username(&self, raw: &str) -> Option<AgentKey> {
        let local = raw.trim().split('@').next().unwrap_or("").trim().to_lowercase();
        if !is_username(&local) {
            return None;
        }
        let canonical = self.usernames.get(&local).cloned().unwrap_or(local);
        Some(AgentKey::new(canonical))
    }

    /// `First L` from separate first and last name fields. Only the first
    /// word of the first name is kept, and the nickname override applies.
    pub fn display_name(&self, first: &str, last: &str) -> Option<String> {
        let first = first.split_whitespace().next()?;
        if !first.chars().any(|c| c.is_alphabetic()) {
            return None;
        }
        let first = capitalize(first);
        let first = self
            .first_names
            .get(&first.to_lowercase())
            .cloned()
            .unwrap_or(first);
        let initial = last.chars().find(|c| c.is_alphabetic())?;
        Some(format!("{first} {}", initial.to_uppercase()))
    }

    /// `First L` from free text: `Last, First [Middle]` or `First [Middle] Last`.
    pub fn parse_person_name(&self, text: &str) -> Option<String> {
        let text = text.trim();
        if let Some((last, first)) = text.split_once(',') {
            return self.display_name(first, last);
        }
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() < 2 {
            return None;
        }
        self.display_name(words[0], words[words.len() - 1])
    }

    /// Resolve a `First L` display name: explicit override first, then the
    /// roster.
    pub fn resolve_display(&self, roster: &Roster, display: &str) -> Result<AgentKey, RecordIssue> {
        if let Some(target) = self.display_names.get(&fold_display(display)) {
            return self
                .normalize_username(target)
                .ok_or(RecordIssue::UnparseableIdentity);
        }
        match roster.lookup(display) {
            Some(RosterEntry::Unique(agent)) => Ok(agent.clone()),
            Some(RosterEntry::Ambiguous) | None => Err(RecordIssue::UnresolvedName),
        }
    }
}

fn is_username(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// First letter upper, rest lower.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// Case- and whitespace-insensitive form of a display name.
fn fold_display(s: &str) -> String {
    s.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
