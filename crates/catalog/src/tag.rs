//! Normalized product tags.
//!
//! Source data describes what a product targets as comma-joined prose
//! (`"Breakouts & blemishes, Enlarged pores"`). Tags are normalized once, at
//! ingestion time, into a set of [`Tag`]s so matching never re-parses text.

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single normalized tag.
///
/// Equality, ordering and hashing use a case- and punctuation-insensitive key,
/// so `"Dull skin"`, `"dull-skin"` and `"DullSkin"` are the same tag. The
/// display label is PascalCase (`DullSkin`), with `&` spelled as `And`.
#[derive(Debug, Clone)]
pub struct Tag {
    key: String,
    label: String,
}

impl Tag {
    /// Normalize free text into a tag. Returns `None` when nothing alphanumeric remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let expanded = raw.replace('&', " and ");
        let mut label = String::with_capacity(expanded.len());

        for word in expanded
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                label.extend(first.to_uppercase());
                label.push_str(chars.as_str());
            }
        }

        if label.is_empty() {
            return None;
        }

        let key = label.to_lowercase();
        Some(Self { key, label })
    }

    /// PascalCase display label.
    pub fn as_str(&self) -> &str {
        &self.label
    }

    /// Comparison key (lowercase, alphanumeric only).
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl core::fmt::Display for Tag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.label)
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Tag::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid tag: {raw:?}")))
    }
}

/// An ordered set of normalized tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<Tag>);

impl TagSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Parse a comma-separated list of free-text tags, dropping empty entries.
    pub fn parse_list(raw: &str) -> Self {
        raw.split(',').filter_map(Tag::parse).collect()
    }

    /// Build a set from already-canonical labels (e.g. static lookup tables).
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        labels.into_iter().filter_map(Tag::parse).collect()
    }

    pub fn insert(&mut self, tag: Tag) -> bool {
        self.0.insert(tag)
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.0.contains(tag)
    }

    /// True when the two sets share at least one tag.
    pub fn intersects(&self, other: &TagSet) -> bool {
        let (small, large) = if self.0.len() <= other.0.len() {
            (&self.0, &other.0)
        } else {
            (&other.0, &self.0)
        };
        small.iter().any(|t| large.contains(t))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl core::fmt::Display for TagSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for tag in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            f.write_str(tag.as_str())?;
        }
        Ok(())
    }
}
