use crate::error::{EditError, EditResult};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

impl TextEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    /// Decode as UTF-8, falling back to Latin-1. Content with NUL bytes is
    /// treated as binary and rejected.
    pub fn decode(bytes: Vec<u8>) -> Option<(String, Self)> {
        if bytes.contains(&0) {
            return None;
        }
        match String::from_utf8(bytes) {
            Ok(text) => Some((text, TextEncoding::Utf8)),
            Err(err) => {
                let text = err.into_bytes().into_iter().map(char::from).collect();
                Some((text, TextEncoding::Latin1))
            }
        }
    }

    pub fn encode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            TextEncoding::Utf8 => Some(text.as_bytes().to_vec()),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub text: Arc<str>,
    pub encoding: TextEncoding,
}

/// Per-run document cache.
///
/// Entries are never invalidated: a file read once is served from memory for
/// the rest of the run, even after it has been rewritten.
#[derive(Debug)]
pub struct FileCache {
    max_bytes: u64,
    entries: RwLock<HashMap<Utf8PathBuf, CachedFile>>,
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_BYTES)
    }
}

impl FileCache {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn read(&self, path: &Utf8Path) -> EditResult<CachedFile> {
        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(hit.clone());
        }

        let size = fs::metadata(path)?.len();
        if size > self.max_bytes {
            return Err(EditError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_bytes,
            });
        }

        let bytes = fs::read(path)?;
        let (text, encoding) = TextEncoding::decode(bytes).ok_or_else(|| EditError::Decode {
            path: path.to_path_buf(),
        })?;
        if encoding != TextEncoding::Utf8 {
            debug!(path = %path, encoding = %encoding, "decoded with fallback encoding");
        }

        let file = CachedFile {
            text: Arc::from(text),
            encoding,
        };
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.entry(path.to_path_buf()).or_insert(file).clone())
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
