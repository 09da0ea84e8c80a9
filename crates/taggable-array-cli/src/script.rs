//! Scripts of tag operations, one JSON object per line.
use serde::{Deserialize, Serialize};
use simple_log::log::debug;
use taggable_array::{
    CopyArgs, CopyQueue, HostBuffer, HostQueue, Tag, TagSet, Taggable, TaggedBuffer,
    TaggedBufferError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Add tags to the whole array.
    Tag { tags: Vec<Tag> },
    /// Remove tags from the whole array.
    Untag { tags: Vec<Tag> },
    /// Replace the whole-array tags.
    SetTags { tags: Vec<Tag> },
    TagAxis { axis: usize, tags: Vec<Tag> },
    UntagAxis { axis: usize, tags: Vec<Tag> },
    /// Copy the data, optionally to another queue.
    Copy {
        #[serde(default)]
        queue: QueueSpec,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueSpec {
    #[default]
    Inherit,
    Detached,
    #[serde(untagged)]
    Id(u32),
}

impl From<QueueSpec> for CopyQueue<HostQueue> {
    fn from(value: QueueSpec) -> Self {
        match value {
            QueueSpec::Inherit => CopyQueue::Inherit,
            QueueSpec::Detached => CopyQueue::Detached,
            QueueSpec::Id(id) => CopyQueue::To(HostQueue(id)),
        }
    }
}

impl Step {
    pub fn apply(
        &self,
        buffer: &TaggedBuffer<HostBuffer>,
    ) -> Result<TaggedBuffer<HostBuffer>, TaggedBufferError> {
        debug!("applying {self:?}");
        match self {
            Self::Tag { tags } => Ok(buffer.tagged(tags.iter().cloned())),
            Self::Untag { tags } => Ok(buffer.without_tags(tags.iter().cloned())),
            Self::SetTags { tags } => {
                buffer.copy(CopyArgs::new().tags(tags.iter().cloned().collect::<TagSet>()))
            }
            Self::TagAxis { axis, tags } => buffer.with_tagged_axis(*axis, tags.iter().cloned()),
            Self::UntagAxis { axis, tags } => {
                buffer.with_untagged_axis(*axis, tags.iter().cloned())
            }
            Self::Copy { queue } => buffer.copy_to(*queue),
        }
    }
}
