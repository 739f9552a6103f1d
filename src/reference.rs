//! Curriculum ("PPCT") and equipment reference tables.
//!
//! Both tables share one matching rule: case-insensitively, the entry subject either equals the
//! queried subject or is a prefix of it, and the lesson numbers are equal as strings. The first
//! match in table order wins; further matches are reported but never used.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumEntry {
    pub subject: String,
    #[serde(deserialize_with = "lesson_number_from_json")]
    pub lesson_number: String,
    pub lesson_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentConfigEntry {
    pub subject: String,
    #[serde(deserialize_with = "lesson_number_from_json")]
    pub lesson_number: String,
    pub equipment_name: String,
    #[serde(default)]
    pub quantity: String,
}

impl CurriculumEntry {
    pub fn new(
        subject: impl Into<String>,
        lesson_number: impl ToString,
        lesson_name: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            lesson_number: lesson_number.to_string(),
            lesson_name: lesson_name.into(),
        }
    }
}

impl EquipmentConfigEntry {
    pub fn new(
        subject: impl Into<String>,
        lesson_number: impl ToString,
        equipment_name: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            lesson_number: lesson_number.to_string(),
            equipment_name: equipment_name.into(),
            quantity: quantity.into(),
        }
    }

    /// Quantity to request: the configured one, else "1" when equipment is named, else empty.
    pub fn effective_quantity(&self) -> String {
        if !self.quantity.trim().is_empty() {
            self.quantity.clone()
        } else if !self.equipment_name.is_empty() {
            "1".to_string()
        } else {
            String::new()
        }
    }
}

/// Stored lesson numbers are strings, but hand-edited JSON often carries bare integers.
fn lesson_number_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(value) => value.to_string(),
    })
}

/// Anything keyed by (subject, lesson number).
pub trait ReferenceEntry {
    fn subject(&self) -> &str;
    fn lesson_number(&self) -> &str;

    fn matches(&self, subject_lower: &str, lesson_number: &str) -> bool {
        let entry_subject = self.subject().to_lowercase();
        let subject_ok = entry_subject == subject_lower || subject_lower.starts_with(&entry_subject);
        subject_ok && self.lesson_number().trim() == lesson_number.trim()
    }
}

impl ReferenceEntry for CurriculumEntry {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn lesson_number(&self) -> &str {
        &self.lesson_number
    }
}

impl ReferenceEntry for EquipmentConfigEntry {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn lesson_number(&self) -> &str {
        &self.lesson_number
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a, T> {
    /// First entry in table order; `ambiguous_with` counts the later entries that also matched.
    Match { entry: &'a T, ambiguous_with: usize },
    NoMatch,
}

impl<'a, T> Lookup<'a, T> {
    pub fn entry(&self) -> Option<&'a T> {
        match self {
            Lookup::Match { entry, .. } => Some(*entry),
            Lookup::NoMatch => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Lookup::Match { ambiguous_with, .. } if *ambiguous_with > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceTable<T> {
    entries: Vec<T>,
}

pub type CurriculumTable = ReferenceTable<CurriculumEntry>;
pub type EquipmentTable = ReferenceTable<EquipmentConfigEntry>;

impl<T> Default for ReferenceTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> From<Vec<T>> for ReferenceTable<T> {
    fn from(entries: Vec<T>) -> Self {
        Self { entries }
    }
}

impl<T: ReferenceEntry> ReferenceTable<T> {
    pub fn new(entries: Vec<T>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, subject: &str, lesson_number: &str) -> Option<&T> {
        let subject_lower = subject.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.matches(&subject_lower, lesson_number))
    }

    pub fn lookup(&self, subject: &str, lesson_number: &str) -> Lookup<'_, T> {
        let subject_lower = subject.to_lowercase();
        let mut hits = self
            .entries
            .iter()
            .filter(|entry| entry.matches(&subject_lower, lesson_number));
        match hits.next() {
            Some(entry) => Lookup::Match {
                entry,
                ambiguous_with: hits.count(),
            },
            None => Lookup::NoMatch,
        }
    }
}
