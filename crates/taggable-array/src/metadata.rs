use serde::{Deserialize, Serialize};

use crate::buffer::{Buffer, DType, StorageId};
use crate::Axis;
use crate::TagSet;
use crate::Taggable;
use crate::TaggedBuffer;

/// A serializable snapshot of the metadata of a [`TaggedBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayMetadata {
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub strides: Vec<isize>,
    pub offset: usize,
    pub storage: StorageId,
    pub tags: TagSet,
    pub axes: Vec<Axis>,
}

impl<B: Buffer> From<&TaggedBuffer<B>> for ArrayMetadata {
    fn from(value: &TaggedBuffer<B>) -> Self {
        let buffer = value.buffer();
        Self {
            shape: buffer.shape().to_vec(),
            dtype: buffer.dtype(),
            strides: buffer.strides().to_vec(),
            offset: buffer.offset(),
            storage: buffer.storage_id(),
            tags: value.tags().clone(),
            axes: value.axes().to_vec(),
        }
    }
}

impl<B: Buffer> TaggedBuffer<B> {
    pub fn metadata(&self) -> ArrayMetadata {
        ArrayMetadata::from(self)
    }
}
