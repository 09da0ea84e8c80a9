//! # taggable-array
//! Metadata tags for N-dimensional numeric buffers. A [`TaggedBuffer`] carries a [`TagSet`]
//! describing the whole array and one [`Axis`] per dimension, so that passes working on the
//! runtime representation of an array can still tell, say, a reduction axis from a batch axis.
//! # Quickstart
//! Wrap any type implementing [`Buffer`] with [`to_tagged_buffer`] or [`TaggedBuffer::new`], then
//! derive new buffers with [`TaggedBuffer::with_tagged_axis`], [`Taggable::tagged`] or
//! [`TaggedBuffer::copy`]. Tags are carried along by every derivation; only metadata copies share
//! storage with their source. [`HostBuffer`] is a host-memory Buffer to get started with.
mod axis;
pub mod buffer;
pub mod host;
mod metadata;
mod tag;
mod tag_set;
mod taggable;
mod tagged_buffer;
mod tagged_buffer_error;
pub use axis::untagged_axes;
pub use axis::Axis;
pub use buffer::Buffer;
pub use buffer::CopyQueue;
pub use buffer::DType;
pub use buffer::Order;
pub use buffer::StorageId;
pub use host::HostBuffer;
pub use host::HostBufferError;
pub use host::HostQueue;
pub use metadata::ArrayMetadata;
pub use tag::Tag;
pub use tag::TagParseError;
pub use tag_set::TagSet;
pub use taggable::Taggable;
pub use tagged_buffer::to_tagged_buffer;
pub use tagged_buffer::CopyArgs;
pub use tagged_buffer::TaggedBuffer;
pub use tagged_buffer_error::TaggedBufferError;
