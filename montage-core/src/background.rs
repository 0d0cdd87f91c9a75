//! Background image selection.

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};

/// Direction to cycle through the background list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Step back one background.
    Prev,
    /// Step forward one background.
    Next,
}

/// Cycles through an ordered, non-empty list of background references.
///
/// The selector only tracks which background is current; the scene reset a
/// background switch implies is the editor's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundSelector {
    images: Vec<String>,
    index: usize,
}

impl BackgroundSelector {
    /// Create a selector over the provider-supplied list, starting at
    /// index 0.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::EmptyBackgroundList`] if the list is empty.
    pub fn new(images: Vec<String>) -> EditorResult<Self> {
        if images.is_empty() {
            return Err(EditorError::EmptyBackgroundList);
        }
        Ok(Self { images, index: 0 })
    }

    /// The current background reference.
    #[must_use]
    pub fn current(&self) -> &str {
        // index is always < len; new() rejects empty lists.
        &self.images[self.index]
    }

    /// The current index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of backgrounds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Always `false`; the constructor rejects empty lists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Step to the next or previous background, wrapping circularly.
    /// Returns the new index.
    pub fn cycle(&mut self, direction: Direction) -> usize {
        let n = self.images.len();
        self.index = match direction {
            Direction::Prev => (self.index + n - 1) % n,
            Direction::Next => (self.index + 1) % n,
        };
        self.index
    }

    /// Return to the first background.
    pub fn reset_index(&mut self) {
        self.index = 0;
    }
}
