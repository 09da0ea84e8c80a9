//! The capability a numeric buffer has to provide in order to carry tags.
//!
//! This crate does not allocate, schedule or compute anything itself. A [`Buffer`] is an
//! externally managed resource (device memory, a queue, pending events...) and
//! [`TaggedBuffer`](crate::TaggedBuffer) only needs enough of it to tell storage apart and to
//! ask for aliases and copies.
use serde::{Deserialize, Serialize};

/// Element type of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum DType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    C64,
    C128,
}

impl DType {
    /// Size of one element in bytes.
    pub fn itemsize(&self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 | Self::C64 => 8,
            Self::C128 => 16,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::C64 => "c64",
            Self::C128 => "c128",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for DType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "bool" => Self::Bool,
            "i8" | "int8" => Self::I8,
            "i16" | "int16" => Self::I16,
            "i32" | "int32" => Self::I32,
            "i64" | "int64" => Self::I64,
            "u8" | "uint8" => Self::U8,
            "u16" | "uint16" => Self::U16,
            "u32" | "uint32" => Self::U32,
            "u64" | "uint64" => Self::U64,
            "f32" | "float32" => Self::F32,
            "f64" | "float64" => Self::F64,
            "c64" | "complex64" => Self::C64,
            "c128" | "complex128" => Self::C128,
            other => return Err(format!("unknown dtype {other}")),
        })
    }
}

/// Memory layout used when strides are not given explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Row major, last axis varies fastest.
    #[default]
    C,
    /// Column major, first axis varies fastest.
    F,
}

impl Order {
    /// Contiguous byte strides of `shape` in this order, or `None` if the buffer would span more
    /// bytes than `isize` can address.
    pub fn contiguous_strides(&self, shape: &[usize], itemsize: usize) -> Option<Vec<isize>> {
        let indices: Vec<usize> = match self {
            Self::C => (0..shape.len()).rev().collect(),
            Self::F => (0..shape.len()).collect(),
        };

        let mut strides = vec![0isize; shape.len()];
        let mut step = isize::try_from(itemsize).ok()?;
        for i in indices {
            strides[i] = step;
            step = step.checked_mul(isize::try_from(shape[i].max(1)).ok()?)?;
        }
        Some(strides)
    }
}

/// Identity of an underlying storage allocation. Two buffers with the same StorageId alias the
/// same memory.
///
/// An id must not be handed out again for a different allocation, not even after the first one
/// was freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorageId(usize);

impl From<usize> for StorageId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for StorageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Which queue a data copy should be placed on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CopyQueue<Q> {
    /// Stay on the queue of the source buffer.
    #[default]
    Inherit,
    /// Detach the copy from any queue.
    Detached,
    /// Place the copy on the given queue.
    To(Q),
}

impl<Q> CopyQueue<Q> {
    pub fn is_inherit(&self) -> bool {
        matches!(self, Self::Inherit)
    }

    /// Resolve against the queue of the source buffer.
    pub fn resolve(self, current: Option<&Q>) -> Option<Q>
    where
        Q: Clone,
    {
        match self {
            Self::Inherit => current.cloned(),
            Self::Detached => None,
            Self::To(queue) => Some(queue),
        }
    }
}

impl<Q> From<Q> for CopyQueue<Q> {
    fn from(value: Q) -> Self {
        Self::To(value)
    }
}

/// An N-dimensional numeric buffer managed outside of this crate.
///
/// `alias` and `copy` are the two ways of deriving a buffer: an alias refers to the same
/// storage, offset and strides as `self`, while a copy may allocate new storage on a different
/// queue.
pub trait Buffer: Sized + std::fmt::Debug {
    type Queue: Clone + PartialEq + std::fmt::Debug;
    type Error: std::error::Error + Send + Sync + 'static;

    fn shape(&self) -> &[usize];

    fn ndim(&self) -> usize {
        self.shape().len()
    }

    fn dtype(&self) -> DType;

    fn order(&self) -> Order;

    /// Byte strides, one per dimension.
    fn strides(&self) -> &[isize];

    /// Byte offset into the storage.
    fn offset(&self) -> usize;

    /// Number of elements.
    fn size(&self) -> usize;

    fn storage_id(&self) -> StorageId;

    fn queue(&self) -> Option<&Self::Queue>;

    /// A new handle to the same storage, with every resource field (offset, strides, queue,
    /// context, allocator, pending events) carried over.
    fn alias(&self) -> Self;

    /// Copy the data into new storage, placed on `queue`.
    fn copy(&self, queue: CopyQueue<Self::Queue>) -> Result<Self, Self::Error>;
}
