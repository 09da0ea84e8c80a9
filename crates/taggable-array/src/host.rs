//! A [`Buffer`] backed by host memory.
//!
//! HostBuffer treats queues, contexts and events as opaque handles that are carried along but
//! never scheduled on. Storage is reference counted and never written to after creation, so any
//! number of aliases can be read concurrently.
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::{Buffer, CopyQueue, DType, Order, StorageId};

/// Handle to a compute queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostQueue(pub u32);

/// Handle to the context a buffer was created in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostContext(pub u32);

/// A pending operation on a buffer's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Event(u64);

impl Event {
    fn next() -> Self {
        static NEXT_EVENT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT_EVENT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Bytes of one allocation together with the id every alias of it reports.
#[derive(Debug)]
struct Storage {
    id: StorageId,
    bytes: Vec<u8>,
}

impl Storage {
    fn new(bytes: Vec<u8>) -> Arc<Self> {
        static NEXT_STORAGE: AtomicUsize = AtomicUsize::new(1);
        let id = StorageId::from(NEXT_STORAGE.fetch_add(1, Ordering::Relaxed));
        Arc::new(Self { id, bytes })
    }
}

#[derive(Error, Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum HostBufferError {
    #[error("shape has {shape} dimensions but {strides} strides were given")]
    StridesMismatch { shape: usize, strides: usize },

    #[error("buffer needs {required} bytes of storage but only {available} are available")]
    OutOfBounds { required: usize, available: usize },

    #[error("could not allocate {0} bytes")]
    Allocation(usize),

    #[error("buffer layout is too large to be addressed")]
    Overflow,
}

#[derive(Debug, Clone)]
pub struct HostBuffer {
    storage: Arc<Storage>,
    shape: Vec<usize>,
    dtype: DType,
    order: Order,
    strides: Vec<isize>,
    offset: usize,
    queue: Option<HostQueue>,
    context: HostContext,
    events: Arc<[Event]>,
}

impl HostBuffer {
    pub fn builder(shape: impl Into<Vec<usize>>, dtype: DType) -> HostBufferBuilder {
        HostBufferBuilder {
            shape: shape.into(),
            dtype,
            order: Order::default(),
            strides: None,
            offset: 0,
            storage: None,
            queue: None,
            context: HostContext::default(),
        }
    }

    /// A contiguous, zero filled buffer in C order.
    pub fn zeros(shape: impl Into<Vec<usize>>, dtype: DType) -> Result<Self, HostBufferError> {
        Self::builder(shape, dtype).build()
    }

    /// The whole storage allocation, including bytes before `offset`.
    pub fn storage_bytes(&self) -> &[u8] {
        &self.storage.bytes
    }

    pub fn context(&self) -> HostContext {
        self.context
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn nbytes(&self) -> usize {
        self.size() * self.dtype.itemsize()
    }
}

impl Buffer for HostBuffer {
    type Queue = HostQueue;
    type Error = HostBufferError;

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn dtype(&self) -> DType {
        self.dtype
    }

    fn order(&self) -> Order {
        self.order
    }

    fn strides(&self) -> &[isize] {
        &self.strides
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn size(&self) -> usize {
        self.shape.iter().product()
    }

    fn storage_id(&self) -> StorageId {
        self.storage.id
    }

    fn queue(&self) -> Option<&HostQueue> {
        self.queue.as_ref()
    }

    fn alias(&self) -> Self {
        self.clone()
    }

    /// Copies the whole allocation, so offset and strides stay valid for the new storage. The
    /// copy carries a single event recording the transfer.
    fn copy(&self, queue: CopyQueue<HostQueue>) -> Result<Self, HostBufferError> {
        let len = self.storage.bytes.len();
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| HostBufferError::Allocation(len))?;
        bytes.extend_from_slice(&self.storage.bytes);
        let storage = Storage::new(bytes);

        let queue = queue.resolve(self.queue.as_ref());
        trace!(
            "copied {} bytes from storage {} into storage {} on queue {:?}",
            len,
            self.storage_id(),
            storage.id,
            queue
        );

        Ok(Self {
            storage,
            queue,
            events: Arc::new([Event::next()]),
            ..self.clone()
        })
    }
}

pub struct HostBufferBuilder {
    shape: Vec<usize>,
    dtype: DType,
    order: Order,
    strides: Option<Vec<isize>>,
    offset: usize,
    storage: Option<Vec<u8>>,
    queue: Option<HostQueue>,
    context: HostContext,
}

impl HostBufferBuilder {
    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Byte strides. Negative strides are not supported by the bounds check.
    pub fn strides(mut self, strides: impl Into<Vec<isize>>) -> Self {
        self.strides = Some(strides.into());
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Use the given bytes as storage instead of allocating zeroed memory.
    pub fn storage(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.storage = Some(bytes.into());
        self
    }

    pub fn queue(mut self, queue: HostQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn context(mut self, context: HostContext) -> Self {
        self.context = context;
        self
    }

    /// Fails with [`HostBufferError::Overflow`] if the element count, the byte size or the byte
    /// span of the buffer does not fit into `usize`, or a stride does not fit into `isize`.
    pub fn build(self) -> Result<HostBuffer, HostBufferError> {
        let itemsize = self.dtype.itemsize();
        self.shape
            .iter()
            .try_fold(itemsize, |bytes, &len| bytes.checked_mul(len))
            .ok_or(HostBufferError::Overflow)?;

        let strides = match self.strides {
            Some(strides) => strides,
            None => self
                .order
                .contiguous_strides(&self.shape, itemsize)
                .ok_or(HostBufferError::Overflow)?,
        };

        if strides.len() != self.shape.len() {
            return Err(HostBufferError::StridesMismatch {
                shape: self.shape.len(),
                strides: strides.len(),
            });
        }

        let required = required_bytes(&self.shape, &strides, itemsize)
            .and_then(|bytes| bytes.checked_add(self.offset))
            .ok_or(HostBufferError::Overflow)?;
        let bytes = match self.storage {
            Some(bytes) => bytes,
            None => {
                let mut bytes = Vec::new();
                bytes
                    .try_reserve_exact(required)
                    .map_err(|_| HostBufferError::Allocation(required))?;
                bytes.resize(required, 0);
                bytes
            }
        };

        if bytes.len() < required {
            return Err(HostBufferError::OutOfBounds {
                required,
                available: bytes.len(),
            });
        }

        Ok(HostBuffer {
            storage: Storage::new(bytes),
            shape: self.shape,
            dtype: self.dtype,
            order: self.order,
            strides,
            offset: self.offset,
            queue: self.queue,
            context: self.context,
            events: Arc::new([]),
        })
    }
}

/// Bytes spanned by the last element reachable through `strides`, or zero for empty shapes.
/// `None` if the span does not fit into `usize`.
fn required_bytes(shape: &[usize], strides: &[isize], itemsize: usize) -> Option<usize> {
    if shape.contains(&0) {
        return Some(0);
    }

    shape
        .iter()
        .zip(strides)
        .try_fold(itemsize, |bytes, (&len, &stride)| {
            (len - 1).checked_mul(stride.unsigned_abs())?.checked_add(bytes)
        })
}
