//! Decode failures shared by the bitmap and mesh decoders.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{} could not be opened", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("truncated data: needed {needed} bytes, found {found}")]
    Truncated { needed: usize, found: usize },

    #[error("invalid signature {found:?}, expected \"BM\"")]
    InvalidMagic { found: [u8; 2] },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed face on line {line}: '{text}'")]
    MalformedFace { line: usize, text: String },

    #[error("malformed vertex attribute on line {line}: '{text}'")]
    MalformedVertex { line: usize, text: String },

    #[error("I/O error while decoding")]
    Io(#[from] io::Error),
}

pub type DecodeResult<T> = Result<T, DecodeError>;
