//! Copy specification models and top-level error types.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Existing destination file conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyFileConflictStrategy {
    /// Truncate the destination file and write source bytes into it.
    Overwrite,
    /// Keep destination file and skip current source file.
    Skip,
    /// Fail the copy with [`CopyTreeError::CreationFailure`].
    Error,
}

/// Existing destination directory conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyDirectoryConflictStrategy {
    /// Directory creation must succeed; an existing directory is a failure.
    Error,
    /// Reuse destination directory and continue copying children into it.
    Merge,
}

/// Pattern matching mode for exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Default byte-stream chunk size used for regular files.
pub const N_SIZE_CHUNK_DEFAULT: usize = 1024;

/// Input options for `copy_tree`.
///
/// `SpecCopyOptions::default()` is the plain recursive copy: fail on an
/// existing destination directory, truncate existing destination files,
/// copy every child, serial depth-first order, no rollback.
#[derive(Debug, Clone)]
pub struct SpecCopyOptions {
    /// Exclude patterns applied to child basenames (files and directories).
    pub patterns_exclude: Option<Vec<String>>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumCopyPatternMode,
    /// Conflict behavior for destination files.
    pub rule_conflict_file: EnumCopyFileConflictStrategy,
    /// Conflict behavior for destination directories.
    pub rule_conflict_dir: EnumCopyDirectoryConflictStrategy,
    /// Chunk size for streaming regular files.
    pub size_chunk: usize,
    /// Copy permissions, timestamps and extended attributes of files.
    pub if_preserve_metadata: bool,
    /// Remove the destination root again when the copy fails.
    pub if_rollback_on_failure: bool,
    /// Maximum worker threads used per directory level.
    pub num_workers_max: Option<usize>,
}

impl Default for SpecCopyOptions {
    fn default() -> Self {
        Self {
            patterns_exclude: None,
            rule_pattern: EnumCopyPatternMode::Glob,
            rule_conflict_file: EnumCopyFileConflictStrategy::Overwrite,
            rule_conflict_dir: EnumCopyDirectoryConflictStrategy::Error,
            size_chunk: N_SIZE_CHUNK_DEFAULT,
            if_preserve_metadata: false,
            if_rollback_on_failure: false,
            num_workers_max: Some(1),
        }
    }
}

/// Failure of one `copy_tree` call.
///
/// Every variant names the path it happened on. Failures inside a directory
/// are wrapped in [`CopyTreeError::PropagatedChildFailure`] once per level,
/// so the chain mirrors the path from the copy root to the failing entry.
#[derive(Debug, Error)]
pub enum CopyTreeError {
    /// Source or destination argument was empty.
    #[error("path argument `{0}` must not be empty")]
    InvalidPath(&'static str),
    /// Source metadata query failed.
    #[error("source not found: {}", path.display())]
    NotFound {
        /// Missing source path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Source and destination overlap (`src` contains `dst` or vice versa).
    #[error(
        "source and destination overlap: {} <-> {}",
        source_path.display(),
        destination_path.display()
    )]
    SourceDestinationOverlap {
        /// Source root.
        source_path: PathBuf,
        /// Destination root.
        destination_path: PathBuf,
    },
    /// Destination directory or file could not be created/opened.
    #[error("failed to create {}", path.display())]
    CreationFailure {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Source directory could not be listed.
    #[error("failed to enumerate {}", path.display())]
    EnumerationFailure {
        /// Source directory path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Source file could not be opened or read.
    #[error("failed to read {}", path.display())]
    ReadFailure {
        /// Source file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Writing destination bytes failed mid-stream.
    #[error("failed to write {}", path.display())]
    WriteFailure {
        /// Destination file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Source is neither a directory nor a regular file.
    #[error("unsupported entry type: {}", path.display())]
    UnsupportedEntry {
        /// Source path.
        path: PathBuf,
    },
    /// Invalid exclude pattern.
    #[error("invalid exclude pattern: {0}")]
    InvalidPattern(String),
    /// A child of the directory at `path` failed to copy.
    #[error("failed to copy children of {}", path.display())]
    PropagatedChildFailure {
        /// Source directory whose child failed.
        path: PathBuf,
        /// Child failure.
        source: Box<CopyTreeError>,
    },
}

impl CopyTreeError {
    /// Innermost error of a propagation chain.
    pub fn root_cause(&self) -> &CopyTreeError {
        let mut err_cursor = self;
        while let Self::PropagatedChildFailure { source, .. } = err_cursor {
            err_cursor = source.as_ref();
        }
        err_cursor
    }

    /// Path the innermost error happened on, if any.
    pub fn path(&self) -> Option<&Path> {
        match self.root_cause() {
            Self::InvalidPath(_) | Self::InvalidPattern(_) => None,
            Self::NotFound { path, .. }
            | Self::CreationFailure { path, .. }
            | Self::EnumerationFailure { path, .. }
            | Self::ReadFailure { path, .. }
            | Self::WriteFailure { path, .. }
            | Self::UnsupportedEntry { path }
            | Self::PropagatedChildFailure { path, .. } => Some(path.as_path()),
            Self::SourceDestinationOverlap { source_path, .. } => Some(source_path.as_path()),
        }
    }

    /// Human-readable chain, outermost first, including the io cause.
    pub fn describe(&self) -> String {
        let mut l_parts = vec![self.to_string()];
        let mut err_source: Option<&dyn std::error::Error> = std::error::Error::source(self);
        while let Some(err) = err_source {
            l_parts.push(err.to_string());
            err_source = std::error::Error::source(err);
        }
        l_parts.join(": ")
    }

    pub(crate) fn wrap_child(self, path_dir_src: &Path) -> Self {
        Self::PropagatedChildFailure {
            path: path_dir_src.to_path_buf(),
            source: Box::new(self),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::{Path, PathBuf};

    use super::{CopyTreeError, SpecCopyOptions};

    #[test]
    fn root_cause_unwraps_propagation_chain() {
        let err_leaf = CopyTreeError::ReadFailure {
            path: PathBuf::from("/a/sub/f.txt"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let err = err_leaf
            .wrap_child(Path::new("/a/sub"))
            .wrap_child(Path::new("/a"));

        assert!(matches!(err, CopyTreeError::PropagatedChildFailure { .. }));
        assert!(matches!(err.root_cause(), CopyTreeError::ReadFailure { .. }));
        assert_eq!(err.path(), Some(Path::new("/a/sub/f.txt")));

        let txt = err.describe();
        assert!(txt.starts_with("failed to copy children of /a"));
        assert!(txt.contains("failed to read /a/sub/f.txt"));
    }

    #[test]
    fn default_options_are_plain_recursive_copy() {
        let spec_cp_options = SpecCopyOptions::default();
        assert!(spec_cp_options.patterns_exclude.is_none());
        assert_eq!(spec_cp_options.num_workers_max, Some(1));
        assert!(!spec_cp_options.if_rollback_on_failure);
        assert!(!spec_cp_options.if_preserve_metadata);
    }
}
