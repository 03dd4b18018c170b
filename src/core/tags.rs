//! Hierarchical gameplay tags.
//!
//! Tags are dotted paths such as `Event.Montage.WeaponHit`. They key effect
//! containers, gate effect entries, and name presentation cues.
//!
//! ## Matching
//!
//! A tag *matches* another when it is equal to it or nested below it:
//! `Status.Bleeding.Heavy` matches `Status.Bleeding` and `Status`, but not
//! `Status.Bleed`. Exact matching compares the full path.
//!
//! ```
//! use dino_abilities::core::{GameplayTag, TagSet};
//!
//! let heavy: GameplayTag = "Status.Bleeding.Heavy".parse().unwrap();
//! let bleeding: GameplayTag = "Status.Bleeding".parse().unwrap();
//! assert!(heavy.matches(&bleeding));
//! assert!(!bleeding.matches(&heavy));
//!
//! let owned: TagSet = [heavy].into_iter().collect();
//! assert!(owned.has_tag(&bleeding));
//! assert!(!owned.has_tag_exact(&bleeding));
//! ```

use std::str::FromStr;
use std::sync::Arc;

use im::OrdSet;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Errors produced when constructing a tag from a path.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    /// The path was empty.
    #[error("gameplay tag path is empty")]
    Empty,

    /// The path contained an empty segment (`A..B`, `.A`, `A.`).
    #[error("gameplay tag `{0}` has an empty segment")]
    EmptySegment(String),

    /// The path contained whitespace.
    #[error("gameplay tag `{0}` contains whitespace")]
    Whitespace(String),
}

/// An immutable, cheaply cloned hierarchical tag.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameplayTag(Arc<str>);

impl GameplayTag {
    /// Create a tag from a dotted path.
    pub fn new(path: &str) -> Result<Self, TagError> {
        validate_path(path)?;
        Ok(Self(Arc::from(path)))
    }

    /// The full dotted path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this tag equals `other` or is nested below it.
    #[must_use]
    pub fn matches(&self, other: &GameplayTag) -> bool {
        let path = self.as_str();
        let parent = other.as_str();
        path == parent
            || (path.len() > parent.len()
                && path.starts_with(parent)
                && path.as_bytes()[parent.len()] == b'.')
    }

    /// True if both tags have the same full path.
    #[must_use]
    pub fn matches_exact(&self, other: &GameplayTag) -> bool {
        self.0 == other.0
    }

    /// Number of path segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.split('.').count()
    }
}

fn validate_path(path: &str) -> Result<(), TagError> {
    if path.is_empty() {
        return Err(TagError::Empty);
    }
    if path.chars().any(char::is_whitespace) {
        return Err(TagError::Whitespace(path.to_string()));
    }
    if path.split('.').any(str::is_empty) {
        return Err(TagError::EmptySegment(path.to_string()));
    }
    Ok(())
}

impl FromStr for GameplayTag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for GameplayTag {
    type Error = TagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_path(&value)?;
        Ok(Self(Arc::from(value)))
    }
}

impl From<GameplayTag> for String {
    fn from(tag: GameplayTag) -> Self {
        tag.0.to_string()
    }
}

impl std::fmt::Debug for GameplayTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag({})", self.0)
    }
}

impl std::fmt::Display for GameplayTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Interns tag paths so equal tags share one allocation.
#[derive(Clone, Debug, Default)]
pub struct TagRegistry {
    tags: FxHashMap<Box<str>, GameplayTag>,
}

impl TagRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the interned tag for a path, creating it on first request.
    pub fn request(&mut self, path: &str) -> Result<GameplayTag, TagError> {
        if let Some(tag) = self.tags.get(path) {
            return Ok(tag.clone());
        }
        let tag = GameplayTag::new(path)?;
        self.tags.insert(path.into(), tag.clone());
        Ok(tag)
    }

    /// Look up a previously requested tag.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<GameplayTag> {
        self.tags.get(path).cloned()
    }

    /// Number of interned tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if no tags have been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// A set of tags, e.g. the tags an actor currently owns.
///
/// Backed by a persistent set so snapshots onto effect specs are O(1).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(OrdSet<GameplayTag>);

impl TagSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag. Returns false if it was already present.
    pub fn insert(&mut self, tag: GameplayTag) -> bool {
        self.0.insert(tag).is_none()
    }

    /// Remove a tag. Returns true if it was present.
    pub fn remove(&mut self, tag: &GameplayTag) -> bool {
        self.0.remove(tag).is_some()
    }

    /// True if any owned tag matches `tag` hierarchically.
    #[must_use]
    pub fn has_tag(&self, tag: &GameplayTag) -> bool {
        self.0.iter().any(|owned| owned.matches(tag))
    }

    /// True if `tag` is owned exactly.
    #[must_use]
    pub fn has_tag_exact(&self, tag: &GameplayTag) -> bool {
        self.0.contains(tag)
    }

    /// True if every tag in `tags` is matched. Empty `tags` is always true.
    #[must_use]
    pub fn has_all(&self, tags: &TagSet) -> bool {
        tags.iter().all(|tag| self.has_tag(tag))
    }

    /// True if at least one tag in `tags` is matched. Empty `tags` is false.
    #[must_use]
    pub fn has_any(&self, tags: &TagSet) -> bool {
        tags.iter().any(|tag| self.has_tag(tag))
    }

    /// Union of both sets.
    #[must_use]
    pub fn union(&self, other: &TagSet) -> TagSet {
        Self(self.0.clone().union(other.0.clone()))
    }

    /// Add every tag from `other`.
    pub fn extend_from(&mut self, other: &TagSet) {
        for tag in other.iter() {
            self.0.insert(tag.clone());
        }
    }

    /// Iterate in path order.
    pub fn iter(&self) -> impl Iterator<Item = &GameplayTag> {
        self.0.iter()
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<GameplayTag> for TagSet {
    fn from_iter<I: IntoIterator<Item = GameplayTag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<GameplayTag> for TagSet {
    fn extend<I: IntoIterator<Item = GameplayTag>>(&mut self, iter: I) {
        for tag in iter {
            self.0.insert(tag);
        }
    }
}

/// Required and ignored tags checked against an actor's owned tags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequirements {
    /// All of these must be owned.
    #[serde(default)]
    pub require: TagSet,
    /// None of these may be owned.
    #[serde(default)]
    pub ignore: TagSet,
}

impl TagRequirements {
    /// Requirements that are always met.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a required tag (builder pattern).
    #[must_use]
    pub fn requiring(mut self, tag: GameplayTag) -> Self {
        self.require.insert(tag);
        self
    }

    /// Add an ignored tag (builder pattern).
    #[must_use]
    pub fn ignoring(mut self, tag: GameplayTag) -> Self {
        self.ignore.insert(tag);
        self
    }

    /// True if there is nothing to check.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.require.is_empty() && self.ignore.is_empty()
    }

    /// Check the requirements against a set of owned tags.
    #[must_use]
    pub fn requirements_met(&self, owned: &TagSet) -> bool {
        owned.has_all(&self.require) && !owned.has_any(&self.ignore)
    }
}
