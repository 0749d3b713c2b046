use std::path::PathBuf;

use crate::layout::category::Category;

/// Convenience result type used across the compositor.
pub type CompositorResult<T> = Result<T, CompositorError>;

/// Top-level error taxonomy used by compositor APIs.
#[derive(thiserror::Error, Debug)]
pub enum CompositorError {
    /// The request did not name a single item.
    #[error("no items provided: select at least one clothing item")]
    NoItemsProvided,

    /// A source image path does not resolve to a readable file.
    #[error("image not found: '{}'", path.display())]
    NotFound {
        /// Path that failed to resolve.
        path: PathBuf,
    },

    /// Pixel data could not be produced from the source bytes.
    #[error("decode failure for '{}': {reason}", path.display())]
    DecodeFailure {
        /// Source path (or a synthetic label for in-memory sources).
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// One item failed to load or process; the batch continues without it.
    #[error("item load failure ({category}): {source}")]
    ItemLoadFailure {
        /// Category of the failed item.
        category: Category,
        /// Underlying cause.
        #[source]
        source: Box<CompositorError>,
    },

    /// Every requested item failed, so there is nothing to draw.
    #[error("all {attempted} item(s) failed to load")]
    AllItemsFailed {
        /// Number of items attempted.
        attempted: usize,
    },

    /// A pixel buffer allocation could not be satisfied.
    #[error("out of memory allocating {bytes} bytes for {what}")]
    OutOfMemory {
        /// Buffer being allocated.
        what: &'static str,
        /// Requested size in bytes.
        bytes: usize,
    },

    /// The encoded composite could not be written to the cache directory.
    #[error("failed to save composite to '{}': {source}", path.display())]
    SaveFailure {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying IO or encoder error.
        #[source]
        source: anyhow::Error,
    },

    /// Invalid configuration or request data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of fatal errors, one per corrective action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Nothing was selected: the user should pick items.
    NothingToComposite,
    /// Processing failed: the user may retry, possibly with fewer or smaller images.
    ProcessingFailed,
    /// The result could not be stored: the user should check device storage.
    SaveFailed,
}

impl CompositorError {
    /// Build a [`CompositorError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CompositorError::OutOfMemory`] value.
    pub fn out_of_memory(what: &'static str, bytes: usize) -> Self {
        Self::OutOfMemory { what, bytes }
    }

    /// Build a [`CompositorError::DecodeFailure`] value.
    pub fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DecodeFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether a per-item pipeline may skip this error and continue with the next item.
    ///
    /// Allocation failures are never skipped: the next item would most likely fail the same way.
    pub fn is_item_recoverable(&self) -> bool {
        match self {
            Self::OutOfMemory { .. } => false,
            Self::ItemLoadFailure { source, .. } => source.is_item_recoverable(),
            _ => true,
        }
    }

    /// Classify this error for user-facing reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NoItemsProvided => FailureKind::NothingToComposite,
            Self::SaveFailure { .. } => FailureKind::SaveFailed,
            _ => FailureKind::ProcessingFailed,
        }
    }

    /// One human-readable sentence describing what went wrong and what to do next.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            FailureKind::NothingToComposite => {
                "Nothing to composite: select at least one clothing item."
            }
            FailureKind::ProcessingFailed => {
                "Processing the outfit images failed: try again with fewer or smaller images."
            }
            FailureKind::SaveFailed => {
                "Could not save the outfit image: check available storage and try again."
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
