use crate::Tag;
use crate::TagSet;

/// Something that carries a [`TagSet`] and can produce a copy of itself with different tags.
///
/// Implementors are immutable values: every method returns a new value and leaves `self`
/// untouched, which is what makes them safe to share between readers. Only [`Taggable::tags`] and
/// [`Taggable::with_tags`] need to be implemented, the set operations are derived from them.
pub trait Taggable: Sized {
    fn tags(&self) -> &TagSet;

    /// A copy of `self` with the tag field replaced by `tags`.
    fn with_tags(&self, tags: TagSet) -> Self;

    /// A copy of `self` tagged with the union of the current tags and `tags`. Passing no tags is a
    /// no-op.
    fn tagged(&self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.with_tags(self.tags().union(tags))
    }

    /// A copy of `self` without `tags`. Tags that are not present are ignored.
    fn without_tags(&self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.with_tags(self.tags().difference(tags))
    }

    fn has_tag(&self, tag: &Tag) -> bool {
        self.tags().contains(tag)
    }
}

