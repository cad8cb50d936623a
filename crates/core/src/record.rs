//! Persisted row types for the three Ordbok tables.
//!
//! These are the value objects that flow through the system: a caller submits
//! a verb entry → the dispatcher validates it → the record store persists it.
//! Field names are renamed in serde to match the canonical CSV headers, so the
//! on-disk header row is stable across releases.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Placeholder written into contact fields the dialog never fills in.
pub const PLACEHOLDER: &str = "N/A";

/// A row in the Dictionary table: one verb with its four conjugated forms and
/// a translation. `infinitive` is the dedup key — unique within the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbEntry {
    pub infinitive: String,
    pub present: String,
    pub past: String,
    #[serde(rename = "pastParticiple")]
    pub past_participle: String,
    pub translation: String,
}

impl VerbEntry {
    pub fn new(
        infinitive: impl Into<String>,
        present: impl Into<String>,
        past: impl Into<String>,
        past_participle: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            infinitive: infinitive.into(),
            present: present.into(),
            past: past.into(),
            past_participle: past_participle.into(),
            translation: translation.into(),
        }
    }

    /// The five textual fields, in table-column order. Search matches against
    /// every one of them.
    pub fn fields(&self) -> [&str; 5] {
        [
            &self.infinitive,
            &self.present,
            &self.past,
            &self.past_participle,
            &self.translation,
        ]
    }
}

impl std::fmt::Display for VerbEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.infinitive, self.present, self.past, self.past_participle, self.translation
        )
    }
}

/// A caller-submitted candidate entry awaiting privileged review.
///
/// Identity is ordinal position in the live sequence, not a stable id:
/// deleting or reordering shifts the indices of all following rows. The
/// submitter fields survive edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub infinitive: String,
    pub present: String,
    pub past: String,
    #[serde(rename = "pastParticiple")]
    pub past_participle: String,
    pub translation: String,
    #[serde(rename = "submitterId")]
    pub submitter_id: String,
    #[serde(rename = "submitterName")]
    pub submitter_name: String,
    #[serde(rename = "contactInfo")]
    pub contact_info: String,
}

impl Suggestion {
    /// Wrap a verb entry with its submitter's identity.
    pub fn from_entry(
        entry: VerbEntry,
        submitter_id: impl Into<String>,
        submitter_name: Option<&str>,
    ) -> Self {
        Self {
            infinitive: entry.infinitive,
            present: entry.present,
            past: entry.past,
            past_participle: entry.past_participle,
            translation: entry.translation,
            submitter_id: submitter_id.into(),
            submitter_name: submitter_name.unwrap_or(PLACEHOLDER).to_string(),
            contact_info: PLACEHOLDER.to_string(),
        }
    }

    /// The verb fields alone, as a Dictionary row (used when promoting).
    pub fn entry(&self) -> VerbEntry {
        VerbEntry {
            infinitive: self.infinitive.clone(),
            present: self.present.clone(),
            past: self.past.clone(),
            past_participle: self.past_participle.clone(),
            translation: self.translation.clone(),
        }
    }
}

/// An upserted record of a non-privileged caller's identity and last-seen
/// time. Keyed by `user_id`. The privileged caller is never recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    #[serde(rename = "contactInfo")]
    pub contact_info: String,
    #[serde(rename = "lastActiveTimestamp")]
    pub last_active: String,
}

impl Contact {
    pub fn new(user_id: impl Into<String>, username: Option<&str>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.unwrap_or(PLACEHOLDER).to_string(),
            contact_info: PLACEHOLDER.to_string(),
            last_active: now_timestamp(),
        }
    }

    /// Refresh the mutable fields on an upsert hit.
    pub fn touch(&mut self, username: Option<&str>) {
        self.username = username.unwrap_or(PLACEHOLDER).to_string();
        self.last_active = now_timestamp();
    }
}

/// Wall-clock timestamp in the table's `lastActiveTimestamp` format.
pub fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
