//! Editable CV model, persisted CV record and the user profile record.
//!
//! The editable model is what the editor mutates. The persisted record is the
//! only shape the backend understands, and it is deliberately narrower:
//! `summary`, `projects` and `certifications` have no counterpart in
//! [`CvRecord`]. They are dropped on every save and come back empty on every
//! load. Downstream consumers rely on the record shape as it is, so widening it
//! is a contract change, not a bug fix.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::photo::asset::AssetReference;

// ────────────────────────────────────────────────────────────────────────────
// Entries
// ────────────────────────────────────────────────────────────────────────────

/// An item of a repeatable section. The id is only used to reconcile list
/// items in the editor and never reaches the backend.
pub trait Entry {
    /// Prefix of ids minted for this section (`work`, `edu`, ...).
    const ID_PREFIX: &'static str;

    fn id(&self) -> &str;

    /// A blank entry carrying `id`.
    fn blank(id: String) -> Self;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkEntry {
    pub id: String,
    pub title: String,
    pub company: String,
    pub period: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EducationEntry {
    pub id: String,
    pub degree: String,
    pub institution: String,
    pub period: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub technologies: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificationEntry {
    pub id: String,
    pub name: String,
    pub issuer: String,
    pub date: String,
}

macro_rules! impl_entry {
    ($ty:ty, $prefix:literal) => {
        impl Entry for $ty {
            const ID_PREFIX: &'static str = $prefix;

            fn id(&self) -> &str {
                &self.id
            }

            fn blank(id: String) -> Self {
                Self {
                    id,
                    ..Default::default()
                }
            }
        }
    };
}

impl_entry!(WorkEntry, "work");
impl_entry!(EducationEntry, "edu");
impl_entry!(ProjectEntry, "project");
impl_entry!(CertificationEntry, "cert");

/// Mints an id that cannot collide with the index-based ids assigned at decode
/// time (`work-0`, `edu-3`, ...).
pub fn new_entry_id<T: Entry>() -> String {
    format!("{}-{}", T::ID_PREFIX, Uuid::new_v4().simple())
}

/// Appends a blank entry with a fresh id and returns it for editing.
pub fn push_entry<T: Entry>(entries: &mut Vec<T>) -> &mut T {
    entries.push(T::blank(new_entry_id::<T>()));
    let last = entries.len() - 1;
    &mut entries[last]
}

pub fn find_entry_mut<'a, T: Entry>(entries: &'a mut [T], id: &str) -> Option<&'a mut T> {
    entries.iter_mut().find(|e| e.id() == id)
}

/// Removes the entry with `id`, keeping the order of the others.
pub fn remove_entry<T: Entry>(entries: &mut Vec<T>, id: &str) -> Option<T> {
    let idx = entries.iter().position(|e| e.id() == id)?;
    Some(entries.remove(idx))
}

// ────────────────────────────────────────────────────────────────────────────
// Editable model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditableCv {
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Editor only, never persisted.
    pub summary: String,
    pub work_experience: Vec<WorkEntry>,
    pub education: Vec<EducationEntry>,
    /// Insertion order is the display order. Go through [`EditableCv::add_skill`]
    /// for user input so duplicates are rejected.
    pub skills: Vec<String>,
    /// Editor only, never persisted.
    pub projects: Vec<ProjectEntry>,
    /// Editor only, never persisted.
    pub certifications: Vec<CertificationEntry>,
    pub photo: Option<AssetReference>,
}

impl EditableCv {
    /// Adds a skill at the end of the list.
    ///
    /// The text is trimmed first. Returns `false` when it is blank or already
    /// present (exact match), in which case the list is untouched.
    pub fn add_skill(&mut self, skill: &str) -> bool {
        let skill = skill.trim();
        if skill.is_empty() || self.skills.iter().any(|s| s == skill) {
            return false;
        }
        self.skills.push(skill.to_string());
        true
    }

    pub fn remove_skill(&mut self, skill: &str) -> bool {
        let before = self.skills.len();
        self.skills.retain(|s| s != skill);
        self.skills.len() != before
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Persisted shapes
// ────────────────────────────────────────────────────────────────────────────

/// The flat record the backend stores. Work and education entries are
/// `|`-joined strings, see [`crate::cv::codec`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub work_experience: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub photo: Option<AssetReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
}
