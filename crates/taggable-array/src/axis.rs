use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::TagSet;
use crate::Taggable;

/// Records the tags of one dimension of a [`TaggedBuffer`](crate::TaggedBuffer).
///
/// An Axis holds no reference to the buffer it describes; it is positionally correlated with the
/// buffer's shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Axis {
    tags: TagSet,
}

impl Axis {
    pub fn new(tags: impl Into<TagSet>) -> Self {
        Self { tags: tags.into() }
    }
}

impl Taggable for Axis {
    fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn with_tags(&self, tags: TagSet) -> Self {
        Self { tags }
    }
}

impl From<TagSet> for Axis {
    fn from(value: TagSet) -> Self {
        Self { tags: value }
    }
}

static UNTAGGED_AXES: Lazy<RwLock<HashMap<usize, Arc<[Axis]>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// `ndim` axes without any tags.
///
/// The result is cached per rank and shared between all callers, so every untagged buffer of the
/// same rank points to the same allocation.
pub fn untagged_axes(ndim: usize) -> Arc<[Axis]> {
    if let Some(axes) = UNTAGGED_AXES
        .read()
        .ok()
        .and_then(|cache| cache.get(&ndim).cloned())
    {
        return axes;
    }

    let Ok(mut cache) = UNTAGGED_AXES.write() else {
        // a poisoned cache only costs us the sharing
        return build_untagged_axes(ndim);
    };

    cache
        .entry(ndim)
        .or_insert_with(|| {
            debug!("caching untagged axes for rank {ndim}");
            build_untagged_axes(ndim)
        })
        .clone()
}

fn build_untagged_axes(ndim: usize) -> Arc<[Axis]> {
    (0..ndim).map(|_| Axis::default()).collect()
}
