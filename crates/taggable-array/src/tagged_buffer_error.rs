use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TaggedBufferError {
    #[error("buffer has {ndim} dimensions but {axes} axes were given")]
    ShapeAxisMismatch { ndim: usize, axes: usize },

    #[error("cannot change both 'tags'/'axes' and 'queue' at once")]
    IncompatibleCopyArguments,

    #[error("axis {axis} is out of range for a buffer with {ndim} dimensions")]
    AxisOutOfRange { axis: usize, ndim: usize },

    #[error("buffer copy failed: {0}")]
    Buffer(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PartialEq for TaggedBufferError {
    /// Buffer errors are compared by their message.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::ShapeAxisMismatch { ndim, axes },
                Self::ShapeAxisMismatch {
                    ndim: other_ndim,
                    axes: other_axes,
                },
            ) => ndim == other_ndim && axes == other_axes,
            (Self::IncompatibleCopyArguments, Self::IncompatibleCopyArguments) => true,
            (
                Self::AxisOutOfRange { axis, ndim },
                Self::AxisOutOfRange {
                    axis: other_axis,
                    ndim: other_ndim,
                },
            ) => axis == other_axis && ndim == other_ndim,
            (Self::Buffer(err), Self::Buffer(other_err)) => {
                err.to_string() == other_err.to_string()
            }
            _ => false,
        }
    }
}
