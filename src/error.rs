//! Typed failures raised by the catalog layer. The UI and the binary wrap
//! these in `anyhow` and turn them into status messages, so every variant
//! carries enough context to read well on its own.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the inventory layer.
pub type Result<T> = std::result::Result<T, InventoryError>;

#[derive(Debug, Error)]
pub enum InventoryError {
    /// The year field was not a non-negative integer that fits in a `u32`.
    #[error("Year must be a whole number from 0 to {} (got {value:?}).", u32::MAX)]
    InvalidYear { value: String },

    /// Another book already uses this ISBN.
    #[error("A book with ISBN {isbn} already exists.")]
    DuplicateIsbn { isbn: String },

    /// No book matched the ISBN or title used for the lookup.
    #[error("No book matching {key:?} is in the inventory.")]
    NotFound { key: String },

    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read or write CSV data in {}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A stored row could not be turned back into a book.
    #[error("row {row} of {} is malformed: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        row: usize,
        reason: String,
    },
}

impl InventoryError {
    /// True for failures caused by what the user asked for, as opposed to
    /// storage problems.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            InventoryError::InvalidYear { .. }
                | InventoryError::DuplicateIsbn { .. }
                | InventoryError::NotFound { .. }
        )
    }

    pub(crate) fn not_found(key: impl Into<String>) -> Self {
        InventoryError::NotFound { key: key.into() }
    }
}
