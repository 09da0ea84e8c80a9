use std::path::PathBuf;

use taggable_array::{HostBufferError, TaggedBufferError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("could not create buffer: {0}")]
    HostBuffer(#[from] HostBufferError),

    #[error(transparent)]
    TaggedBuffer(#[from] TaggedBufferError),

    #[error("step {step} of the script failed: {source}")]
    Step {
        step: usize,
        #[source]
        source: TaggedBufferError,
    },

    #[error("could not read script {}: {source}", .path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("could not set up logging: {0}")]
    Logging(String),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::HostBuffer(_) | Self::TaggedBuffer(_) => 2,
            Self::Step { .. } => 3,
            Self::Script { .. } => 4,
            _ => 1,
        }
    }
}
