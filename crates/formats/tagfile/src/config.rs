/// What to do with bytes left over once the root block and its payloads have
/// been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingBytes {
    /// Return the asset with a `StructuralCorruption` warning.
    #[default]
    Warn,
    /// Fail with `StructuralCorruption`.
    Reject,
}

/// Options for [`crate::read_asset`].
///
/// The default is lenient: a file whose body parses cleanly is returned even
/// if garbage follows it.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub trailing_bytes: TrailingBytes,
}

impl ReadOptions {
    /// Every structural irregularity is an error.
    pub fn strict() -> Self {
        Self {
            trailing_bytes: TrailingBytes::Reject,
        }
    }

    /// Build options from command-line style switches.
    pub fn from_flags(strict: bool) -> Self {
        if strict {
            Self::strict()
        } else {
            Self::default()
        }
    }
}
