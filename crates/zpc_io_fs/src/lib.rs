//! `zpc_io_fs`:
//! recursive copy engine of the zpc shell.
//!
//! - `copy`   : tree copy orchestration
//! - `dir`    : directory capability interface and local implementation
//! - `spec`   : enums/options/errors
//! - `report` : run-time report model
//! - `util`   : shared helper functions

pub mod copy;
pub mod dir;
pub mod report;
pub mod spec;
mod util;

pub use copy::copy_tree;
pub use dir::{DirectoryOps, EnumEntryKind, LocalDirectory, LocalListing, SpecEntryMeta};
pub use report::{ReportCopy, ReportCopyBuilder};
pub use spec::{
    CopyTreeError, EnumCopyDirectoryConflictStrategy, EnumCopyFileConflictStrategy,
    EnumCopyPatternMode, N_SIZE_CHUNK_DEFAULT, SpecCopyOptions,
};
