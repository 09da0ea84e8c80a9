use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Tag;
use crate::Taggable;

/// An immutable set of [`Tag`]s.
///
/// The set is stored behind an [`Arc`], so cloning a TagSet is cheap and clones share the same
/// allocation. Every derivation ([`TagSet::union`], [`TagSet::difference`]) builds a fresh set,
/// the original is never modified. Two TagSets are equal iff they contain the same tags,
/// regardless of the order they were inserted in.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet {
    tags: Arc<BTreeSet<Tag>>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate over the tags in their sort order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    /// All tags with the given name, whatever their payload.
    pub fn tags_of_kind<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags.iter().filter(move |tag| tag.is_kind(name))
    }

    pub fn is_superset(&self, other: &TagSet) -> bool {
        self.tags.is_superset(&other.tags)
    }

    /// A new set holding the tags of `self` and `tags`.
    pub fn union(&self, tags: impl IntoIterator<Item = Tag>) -> Self {
        let mut tags = tags.into_iter().peekable();
        if tags.peek().is_none() {
            return self.clone();
        }

        let mut new = BTreeSet::clone(&self.tags);
        new.extend(tags);
        new.into()
    }

    /// A new set holding the tags of `self` that are not in `tags`.
    pub fn difference(&self, tags: impl IntoIterator<Item = Tag>) -> Self {
        let removed: BTreeSet<Tag> = tags.into_iter().collect();
        if removed.is_empty() {
            return self.clone();
        }

        self.tags.difference(&removed).cloned().collect()
    }

    /// Whether two sets share the same allocation. Equal sets are not necessarily shared.
    pub fn ptr_eq(&self, other: &TagSet) -> bool {
        Arc::ptr_eq(&self.tags, &other.tags)
    }
}

impl Taggable for TagSet {
    fn tags(&self) -> &TagSet {
        self
    }

    fn with_tags(&self, tags: TagSet) -> Self {
        tags
    }
}

impl std::fmt::Debug for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.tags.iter()).finish()
    }
}

impl std::fmt::Display for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", itertools::join(self.tags.iter(), ", "))
    }
}

impl From<BTreeSet<Tag>> for TagSet {
    fn from(value: BTreeSet<Tag>) -> Self {
        Self {
            tags: Arc::new(value),
        }
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        iter.into_iter().collect::<BTreeSet<Tag>>().into()
    }
}

impl<const N: usize> From<[Tag; N]> for TagSet {
    fn from(value: [Tag; N]) -> Self {
        value.into_iter().collect()
    }
}

impl From<Tag> for TagSet {
    fn from(value: Tag) -> Self {
        [value].into()
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::collections::btree_set::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}
