//! Edit engine for docfix fix plans.
//!
//! Responsibilities:
//! - Apply a file's planned fixes to an in-memory line buffer, bottom-up.
//! - Read documents through a size-bounded, append-only cache.
//! - Mirror originals into a per-run backup area before they are overwritten.

mod apply;
mod backup;
mod cache;
mod error;

pub use apply::{ApplyOutcome, apply_fixes, order_fixes};
pub use backup::BackupArea;
pub use cache::{CachedFile, DEFAULT_MAX_FILE_BYTES, FileCache, TextEncoding};
pub use error::{EditError, EditResult};
