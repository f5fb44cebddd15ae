//! Directory capability interface consumed by the copy engine and shell.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Coarse entry classification used by copy logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumEntryKind {
    /// Directory (symlinks are followed).
    Directory,
    /// Regular file (symlinks are followed).
    File,
    /// Anything else: fifo, socket, device.
    Other,
}

/// Result of a metadata query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecEntryMeta {
    /// Entry classification.
    pub kind: EnumEntryKind,
    /// Length in bytes as reported by the filesystem.
    pub len: u64,
}

impl SpecEntryMeta {
    /// Whether the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EnumEntryKind::Directory
    }

    /// Whether the entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == EnumEntryKind::File
    }
}

impl From<&fs::Metadata> for SpecEntryMeta {
    fn from(meta: &fs::Metadata) -> Self {
        let kind = if meta.is_dir() {
            EnumEntryKind::Directory
        } else if meta.is_file() {
            EnumEntryKind::File
        } else {
            EnumEntryKind::Other
        };
        Self {
            kind,
            len: meta.len(),
        }
    }
}

/// Directory-level operations provided by the host filesystem layer.
///
/// File contents are streamed with `std::fs` directly; only the
/// directory-shaped operations go through this trait.
pub trait DirectoryOps {
    /// Child-name iterator of an opened directory. Dropping it closes the handle.
    type Listing: Iterator<Item = io::Result<OsString>>;

    /// Stat `path`, following symlinks.
    fn query_metadata(&self, path: &Path) -> io::Result<SpecEntryMeta>;

    /// Create one directory level; fails if `path` exists.
    fn create_directory(&self, path: &Path) -> io::Result<()>;

    /// Open `path` for enumeration.
    fn open_listing(&self, path: &Path) -> io::Result<Self::Listing>;

    /// Remove a file, or a directory together with its contents.
    fn remove_entry(&self, path: &Path) -> io::Result<()>;

    /// Run the binary at `path` with `args` (`args[0]` is the program name)
    /// and wait for it to exit.
    fn execute_binary(&self, path: &Path, args: &[String]) -> io::Result<ExitStatus>;
}

/// [`DirectoryOps`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDirectory;

/// Listing handle of [`LocalDirectory`].
#[derive(Debug)]
pub struct LocalListing {
    iter_entries: fs::ReadDir,
}

impl Iterator for LocalListing {
    type Item = io::Result<OsString>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter_entries
            .next()
            .map(|entry_res| entry_res.map(|entry| entry.file_name()))
    }
}

impl DirectoryOps for LocalDirectory {
    type Listing = LocalListing;

    fn query_metadata(&self, path: &Path) -> io::Result<SpecEntryMeta> {
        fs::metadata(path).map(|meta| SpecEntryMeta::from(&meta))
    }

    fn create_directory(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn open_listing(&self, path: &Path) -> io::Result<Self::Listing> {
        Ok(LocalListing {
            iter_entries: fs::read_dir(path)?,
        })
    }

    fn remove_entry(&self, path: &Path) -> io::Result<()> {
        let meta = fs::symlink_metadata(path)?;
        if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn execute_binary(&self, path: &Path, args: &[String]) -> io::Result<ExitStatus> {
        let mut cmd = Command::new(path);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            if let Some(c_argv0) = args.first() {
                cmd.arg0(c_argv0);
            }
        }
        cmd.args(args.iter().skip(1)).status()
    }
}
