//! Error types for docfix-edit.
//!
//! All of these are per-file: the pipeline records them against the file and
//! carries on with its siblings.

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    /// The file exceeds the configured read ceiling.
    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    TooLarge {
        path: Utf8PathBuf,
        size: u64,
        limit: u64,
    },

    /// Neither UTF-8 nor the Latin-1 fallback produced text.
    #[error("{path} does not look like a text document")]
    Decode { path: Utf8PathBuf },

    /// Edited content cannot be written back in the file's original encoding.
    #[error("{path} cannot be re-encoded as {encoding}")]
    Encode {
        path: Utf8PathBuf,
        encoding: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EditError {
    /// True for errors caused by the file's content rather than the filesystem.
    pub fn is_content_error(&self) -> bool {
        !matches!(self, EditError::Io(_))
    }
}

/// Result type alias using EditError.
pub type EditResult<T> = Result<T, EditError>;
