//! Navigation state: the browsing set plus a cursor.
//!
//! Append-only for the life of a session. Holds no display resources; the
//! shells borrow the current entry when they draw.

use std::fmt;
use std::path::{Path, PathBuf};

/// Absolute path of one browsable image. Never mutated once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageRef(PathBuf);

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ImageRef(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name for titles and prompts; falls back to the full path.
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for ImageRef {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Invariant: when `items` is non-empty, `index < items.len()`.
#[derive(Debug, Default)]
pub struct NavState {
    items: Vec<ImageRef>,
    index: usize,
}

impl NavState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_refs(items: Vec<ImageRef>) -> Self {
        NavState { items, index: 0 }
    }

    /// Adds to the end. The cursor does not move.
    pub fn append(&mut self, item: ImageRef) {
        self.items.push(item);
    }

    pub fn next(&mut self) -> Option<&ImageRef> {
        if !self.items.is_empty() {
            self.index = (self.index + 1) % self.items.len();
        }
        self.current()
    }

    pub fn previous(&mut self) -> Option<&ImageRef> {
        let len = self.items.len();
        if len > 0 {
            self.index = (self.index + len - 1) % len;
        }
        self.current()
    }

    pub fn current(&self) -> Option<&ImageRef> {
        self.items.get(self.index)
    }

    pub fn set_current_to_last(&mut self) {
        self.index = self.items.len().saturating_sub(1);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ImageRef] {
        &self.items
    }
}
