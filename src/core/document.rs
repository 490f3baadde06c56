use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Canonical tag set: trimmed, lowercase, deduplicated and sorted.
///
/// Catalogue rows carry tags as a comma-separated string. They are parsed
/// once here so every filter compares the same normalized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated tag list (`"Policy, refunds"`)
    pub fn parse(raw: &str) -> Self {
        raw.split(',').collect()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(&tag.trim().to_lowercase())
    }

    /// True when every tag in `other` is also present here
    pub fn is_superset_of(&self, other: &TagSet) -> bool {
        self.0.is_superset(&other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        )
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(","))
    }
}

/// Catalogue entry describing one business document on disk
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: i64,
    pub module: String,
    pub path: PathBuf,
    pub tags: TagSet,
}

impl Document {
    pub fn new(id: i64, module: impl Into<String>, path: impl Into<PathBuf>, tags: &str) -> Self {
        Self {
            id,
            module: module.into(),
            path: path.into(),
            tags: TagSet::parse(tags),
        }
    }

    /// Exact module match (when given) plus tag superset match (when given)
    pub fn matches(&self, module: Option<&str>, tags: Option<&TagSet>) -> bool {
        if let Some(module) = module {
            if self.module != module {
                return false;
            }
        }
        tags.map_or(true, |wanted| self.tags.is_superset_of(wanted))
    }
}
