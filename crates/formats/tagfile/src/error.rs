use std::fmt;

use thiserror::Error;

use crate::tag::Tag;

/// The value a header declared that this codec cannot handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    /// Engine tag outside the closed set in [`crate::Engine`].
    Engine(Tag),
    /// Group version outside the range the schema accepts.
    Version { group: Tag, found: i16, min: i16, max: i16 },
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine(tag) => write!(f, "engine tag {tag}"),
            Self::Version { group, found, min, max } => {
                write!(f, "{group} version {found} (supported {min}..={max})")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported {0}")]
    UnsupportedVersion(Unsupported),

    #[error("truncated stream at offset {offset:#x} (need {need} bytes, have {have})")]
    TruncatedStream {
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("{bytes_left} bytes left after the asset was fully parsed")]
    StructuralCorruption { bytes_left: usize },

    #[error("tag reference index {index} is outside a table of {len} entries")]
    UnresolvedReferenceIndex { index: i32, len: usize },

    #[error("group mismatch: expected {expected}, found {found}")]
    GroupMismatch { expected: Tag, found: Tag },

    #[error("invalid block header at offset {offset:#x}: {found}")]
    InvalidBlockHeader { offset: usize, found: Tag },

    #[error("block {block}: header declares {header} elements, field declares {field}")]
    BlockCountMismatch {
        block: String,
        header: i32,
        field: i32,
    },

    #[error("block {block}: stride {found} does not match element size {expected}")]
    StrideMismatch {
        block: String,
        expected: usize,
        found: i32,
    },

    #[error("block {block}: {count} elements declared for a zero-size element")]
    ZeroStride { block: String, count: i32 },

    #[error("negative count {count} at offset {offset:#x}")]
    NegativeCount { offset: usize, count: i32 },

    #[error("field {field}: expected {expected}")]
    ValueMismatch { field: String, expected: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
