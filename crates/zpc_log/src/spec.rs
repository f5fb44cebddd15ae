//! Log buffer outcome models and error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Historical capacity of the audit buffer, in bytes.
pub const N_CAPACITY_DEFAULT: usize = 1024;

/// Logical state of a [`crate::LogBuffer`]. There is no way back to `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumLogState {
    Empty,
    NonEmpty,
}

/// Why an append was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRejectReason {
    /// `len_current + len_requested` would reach or pass `capacity`.
    CapacityExceeded {
        len_current: usize,
        len_requested: usize,
        capacity: usize,
    },
}

/// Result of [`crate::LogBuffer::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum EnumAppendOutcome {
    /// Text was added in full.
    Appended,
    /// Nothing was added.
    Rejected { reason: EnumRejectReason },
}

impl EnumAppendOutcome {
    pub fn is_appended(&self) -> bool {
        matches!(self, Self::Appended)
    }
}

/// Result of [`crate::LogBuffer::load_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumLoadOutcome {
    /// File was read. `cnt_rejected` counts lines left out once capacity
    /// was reached (loading stops at the first rejected line).
    Loaded { cnt_lines: usize, cnt_rejected: usize },
    /// File does not exist; the buffer is unchanged.
    Missing,
}

#[derive(Debug, Error)]
pub enum LogBufferError {
    /// Log file exists but could not be read.
    #[error("failed to load log from {}", path.display())]
    Load { path: PathBuf, source: io::Error },
    /// Log file could not be opened for append or written.
    #[error("failed to persist log to {}", path.display())]
    Persistence { path: PathBuf, source: io::Error },
}
