use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::spec::{CopyTreeError, EnumCopyPatternMode};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypeCopyPatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypeCopyPatternSeq {
    pub(crate) fn compile(
        patterns: Option<&[String]>,
        rule_pattern: EnumCopyPatternMode,
    ) -> Result<Option<Self>, CopyTreeError> {
        let Some(patterns) = patterns else {
            return Ok(None);
        };
        if patterns.is_empty() {
            return Ok(None);
        }

        match rule_pattern {
            EnumCopyPatternMode::Literal => Ok(Some(Self::Literal(patterns.to_vec()))),
            EnumCopyPatternMode::Glob => {
                let mut l_glob = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let matcher = Glob::new(pattern)
                        .map_err(|e| CopyTreeError::InvalidPattern(format!("{pattern}: {e}")))?
                        .compile_matcher();
                    l_glob.push(matcher);
                }
                Ok(Some(Self::Glob(l_glob)))
            }
            EnumCopyPatternMode::Regex => {
                let mut l_regex = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let regex = Regex::new(pattern)
                        .map_err(|e| CopyTreeError::InvalidPattern(format!("{pattern}: {e}")))?;
                    l_regex.push(regex);
                }
                Ok(Some(Self::Regex(l_regex)))
            }
        }
    }

    pub(crate) fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
            Self::Glob(v) => v.iter().any(|p| p.is_match(value)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(value)),
        }
    }
}

pub(crate) fn should_exclude_by_patterns(
    value: &str,
    patterns_exclude: Option<&TypeCopyPatternSeq>,
) -> bool {
    patterns_exclude.is_some_and(|patterns| patterns.is_match(value))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Resolve symlinks where the path exists. A missing leaf is resolved
/// through its parent so not-yet-created destinations compare correctly.
fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    let path_abs = _absolutize_path(path);
    match (path_abs.parent(), path_abs.file_name()) {
        (Some(path_parent), Some(name)) => match fs::canonicalize(path_parent) {
            Ok(parent_resolved) => parent_resolved.join(name),
            Err(_) => path_abs,
        },
        _ => path_abs,
    }
}

pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = _normalize_path(src);
    let dst_resolved = _normalize_path(dst);
    dst_resolved.starts_with(&src_resolved) || src_resolved.starts_with(&dst_resolved)
}

pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ByteStream

/// Stream `path_file_src` into `path_file_dst` in `size_chunk` pieces.
///
/// `if_create_new` refuses an existing destination; otherwise the
/// destination is truncated or created. Both handles are dropped on every
/// return path. Returns the number of bytes written.
pub(crate) fn stream_file(
    path_file_src: &Path,
    path_file_dst: &Path,
    size_chunk: usize,
    if_create_new: bool,
) -> Result<u64, CopyTreeError> {
    let mut file_src = File::open(path_file_src).map_err(|e| CopyTreeError::ReadFailure {
        path: path_file_src.to_path_buf(),
        source: e,
    })?;

    let mut opts_dst = OpenOptions::new();
    opts_dst.write(true);
    if if_create_new {
        opts_dst.create_new(true);
    } else {
        opts_dst.create(true).truncate(true);
    }
    let mut file_dst = opts_dst
        .open(path_file_dst)
        .map_err(|e| CopyTreeError::CreationFailure {
            path: path_file_dst.to_path_buf(),
            source: e,
        })?;

    let mut buf = vec![0_u8; size_chunk.max(1)];
    let mut n_bytes_total: u64 = 0;
    loop {
        let n_read = match file_src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(CopyTreeError::ReadFailure {
                    path: path_file_src.to_path_buf(),
                    source: e,
                });
            }
        };
        file_dst
            .write_all(&buf[..n_read])
            .map_err(|e| CopyTreeError::WriteFailure {
                path: path_file_dst.to_path_buf(),
                source: e,
            })?;
        n_bytes_total += n_read as u64;
    }
    file_dst.flush().map_err(|e| CopyTreeError::WriteFailure {
        path: path_file_dst.to_path_buf(),
        source: e,
    })?;

    Ok(n_bytes_total)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Metadata

/// Copy permissions, access/modify times and (Linux) extended attributes.
pub(crate) fn apply_file_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    {
        copy_xattrs_linux(path_file_src, path_file_dst);
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            tracing::debug!(
                path = %path_file_dst.display(),
                error = %e,
                "extended attribute not copied"
            );
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
