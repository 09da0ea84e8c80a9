use std::sync::Arc;

use log::trace;

use crate::axis::untagged_axes;
use crate::buffer::{Buffer, CopyQueue};
use crate::Axis;
use crate::Tag;
use crate::TagSet;
use crate::Taggable;
use crate::TaggedBufferError;

/// Arguments of [`TaggedBuffer::copy`].
///
/// Supplying `tags` or `axes` selects a metadata copy that aliases the source storage. Supplying
/// neither selects a data copy onto `queue`. The two modes cannot be combined.
#[derive(Debug, Clone)]
pub struct CopyArgs<Q> {
    queue: CopyQueue<Q>,
    tags: Option<TagSet>,
    axes: Option<Arc<[Axis]>>,
}

impl<Q> Default for CopyArgs<Q> {
    fn default() -> Self {
        Self {
            queue: CopyQueue::Inherit,
            tags: None,
            axes: None,
        }
    }
}

impl<Q> CopyArgs<Q> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(mut self, queue: impl Into<CopyQueue<Q>>) -> Self {
        self.queue = queue.into();
        self
    }

    pub fn tags(mut self, tags: impl Into<TagSet>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn axes(mut self, axes: impl Into<Arc<[Axis]>>) -> Self {
        self.axes = Some(axes.into());
        self
    }

    fn is_metadata_copy(&self) -> bool {
        self.tags.is_some() || self.axes.is_some()
    }
}

/// A [`Buffer`] together with tags describing the whole array and one [`Axis`] per dimension.
///
/// A TaggedBuffer is never modified. Every operation returns a new instance that either aliases
/// the storage of `self` (when only metadata changes) or owns a fresh copy of it (when the data is
/// copied to a queue). In both cases the number of axes equals the number of dimensions.
#[derive(Debug, Clone)]
pub struct TaggedBuffer<B> {
    buffer: B,
    tags: TagSet,
    axes: Arc<[Axis]>,
}

impl<B: Buffer> TaggedBuffer<B> {
    /// Wrap `buffer`. Without `axes` every dimension gets an untagged [`Axis`].
    pub fn new(
        buffer: B,
        axes: Option<Vec<Axis>>,
        tags: TagSet,
    ) -> Result<Self, TaggedBufferError> {
        let axes: Arc<[Axis]> = match axes {
            Some(axes) => axes.into(),
            None => untagged_axes(buffer.ndim()),
        };
        Self::from_parts(buffer, tags, axes)
    }

    /// Wrap `buffer` without any tags.
    pub fn untagged(buffer: B) -> Self {
        let axes = untagged_axes(buffer.ndim());
        Self {
            buffer,
            tags: TagSet::default(),
            axes,
        }
    }

    /// Lift a plain buffer into a tagged one that aliases the same storage. See
    /// [`to_tagged_buffer`].
    pub fn from_buffer(
        buffer: &B,
        axes: Option<Vec<Axis>>,
        tags: TagSet,
    ) -> Result<Self, TaggedBufferError> {
        Self::new(buffer.alias(), axes, tags)
    }

    fn from_parts(buffer: B, tags: TagSet, axes: Arc<[Axis]>) -> Result<Self, TaggedBufferError> {
        if axes.len() != buffer.ndim() {
            return Err(TaggedBufferError::ShapeAxisMismatch {
                ndim: buffer.ndim(),
                axes: axes.len(),
            });
        }

        trace!(
            "tagged buffer on storage {} with shape {:?} and tags {}",
            buffer.storage_id(),
            buffer.shape(),
            tags
        );
        Ok(Self { buffer, tags, axes })
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn axis(&self, index: usize) -> Option<&Axis> {
        self.axes.get(index)
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn shape(&self) -> &[usize] {
        self.buffer.shape()
    }

    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    /// Drop the metadata and return the underlying buffer.
    pub fn into_buffer(self) -> B {
        self.buffer
    }

    /// Derive a new TaggedBuffer.
    ///
    /// If `args` carries tags or axes, the result aliases the storage of `self` and takes the given
    /// tags and axes, falling back to those of `self` for the one that is missing. Otherwise the
    /// data is copied to the queue in `args` and the result keeps the tags and axes of `self`.
    ///
    /// Fails with [`TaggedBufferError::IncompatibleCopyArguments`] if a queue is given together
    /// with tags or axes.
    pub fn copy(&self, args: CopyArgs<B::Queue>) -> Result<Self, TaggedBufferError> {
        if args.is_metadata_copy() {
            if !args.queue.is_inherit() {
                return Err(TaggedBufferError::IncompatibleCopyArguments);
            }

            trace!("metadata copy of storage {}", self.buffer.storage_id());
            let tags = args.tags.unwrap_or_else(|| self.tags.clone());
            let axes = args.axes.unwrap_or_else(|| self.axes.clone());
            Self::from_parts(self.buffer.alias(), tags, axes)
        } else {
            let buffer = self
                .buffer
                .copy(args.queue)
                .map_err(|e| TaggedBufferError::Buffer(Box::new(e)))?;
            trace!(
                "data copy of storage {} into storage {}",
                self.buffer.storage_id(),
                buffer.storage_id()
            );
            Self::from_parts(buffer, self.tags.clone(), self.axes.clone())
        }
    }

    /// Copy the data to `queue`, keeping tags and axes.
    pub fn copy_to(
        &self,
        queue: impl Into<CopyQueue<B::Queue>>,
    ) -> Result<Self, TaggedBufferError> {
        self.copy(CopyArgs::new().queue(queue))
    }

    /// An alias of `self` with all axes replaced.
    pub fn with_axes(&self, axes: impl Into<Arc<[Axis]>>) -> Result<Self, TaggedBufferError> {
        self.copy(CopyArgs::new().axes(axes))
    }

    /// An alias of `self` with `tags` added to the axis at `axis_index`. All other axes and the
    /// whole-array tags are left as they are.
    pub fn with_tagged_axis(
        &self,
        axis_index: usize,
        tags: impl IntoIterator<Item = Tag>,
    ) -> Result<Self, TaggedBufferError> {
        self.with_modified_axis(axis_index, |axis| axis.tagged(tags))
    }

    /// An alias of `self` with `tags` removed from the axis at `axis_index`.
    pub fn with_untagged_axis(
        &self,
        axis_index: usize,
        tags: impl IntoIterator<Item = Tag>,
    ) -> Result<Self, TaggedBufferError> {
        self.with_modified_axis(axis_index, |axis| axis.without_tags(tags))
    }

    fn with_modified_axis(
        &self,
        axis_index: usize,
        modify: impl FnOnce(&Axis) -> Axis,
    ) -> Result<Self, TaggedBufferError> {
        let Some(axis) = self.axes.get(axis_index) else {
            return Err(TaggedBufferError::AxisOutOfRange {
                axis: axis_index,
                ndim: self.ndim(),
            });
        };

        let modified = modify(axis);
        let axes: Arc<[Axis]> = self
            .axes
            .iter()
            .enumerate()
            .map(|(i, axis)| {
                if i == axis_index {
                    modified.clone()
                } else {
                    axis.clone()
                }
            })
            .collect();
        self.with_axes(axes)
    }
}

impl<B: Buffer> Taggable for TaggedBuffer<B> {
    fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// A metadata copy that aliases the storage of `self`.
    fn with_tags(&self, tags: TagSet) -> Self {
        Self {
            buffer: self.buffer.alias(),
            tags,
            axes: self.axes.clone(),
        }
    }
}

/// Lift `buffer` into a [`TaggedBuffer`] that aliases its storage, offset, strides, queue and
/// events, with the given metadata attached. `buffer` itself is left untouched.
///
/// If `axes` is `None`, every dimension gets an untagged [`Axis`]. Otherwise there has to be
/// exactly one axis per dimension.
pub fn to_tagged_buffer<B: Buffer>(
    buffer: &B,
    axes: Option<Vec<Axis>>,
    tags: TagSet,
) -> Result<TaggedBuffer<B>, TaggedBufferError> {
    TaggedBuffer::from_buffer(buffer, axes, tags)
}
