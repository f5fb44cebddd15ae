//! Recursive tree copy orchestration.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::dir::{DirectoryOps, EnumEntryKind};
use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{
    CopyTreeError, EnumCopyDirectoryConflictStrategy, EnumCopyFileConflictStrategy,
    SpecCopyOptions,
};
use crate::util::{
    TypeCopyPatternSeq, apply_file_metadata, calculate_worker_limit, is_overlap,
    should_exclude_by_patterns, stream_file,
};

struct SpecCopyContext<'a, D> {
    dir: &'a D,
    spec_cp_options: SpecCopyOptions,
    patterns_exclude: Option<TypeCopyPatternSeq>,
    thread_pool: Option<ThreadPool>,
}

/// Copy the file or directory tree at `source` to `destination`.
///
/// Directories are created through `dir`, enumerated through `dir`, and
/// their children copied depth-first in name order; regular files are
/// streamed in [`SpecCopyOptions::size_chunk`] pieces. The first failure
/// aborts the whole run and is returned with the path it happened on,
/// wrapped once per enclosing directory.
///
/// Without [`SpecCopyOptions::if_rollback_on_failure`], entries copied
/// before the failure stay on disk. With it, a destination root created by
/// this call is removed again.
///
/// File permissions and timestamps are only carried over with
/// [`SpecCopyOptions::if_preserve_metadata`].
pub fn copy_tree<D, P, Q>(
    dir: &D,
    source: P,
    destination: Q,
    spec_cp_options: SpecCopyOptions,
) -> Result<ReportCopy, CopyTreeError>
where
    D: DirectoryOps + Sync,
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_src = source.as_ref();
    let path_dst = destination.as_ref();
    if path_src.as_os_str().is_empty() {
        return Err(CopyTreeError::InvalidPath("source"));
    }
    if path_dst.as_os_str().is_empty() {
        return Err(CopyTreeError::InvalidPath("destination"));
    }

    dir.query_metadata(path_src)
        .map_err(|e| CopyTreeError::NotFound {
            path: path_src.to_path_buf(),
            source: e,
        })?;
    if is_overlap(path_src, path_dst) {
        return Err(CopyTreeError::SourceDestinationOverlap {
            source_path: path_src.to_path_buf(),
            destination_path: path_dst.to_path_buf(),
        });
    }

    let patterns_exclude = TypeCopyPatternSeq::compile(
        spec_cp_options.patterns_exclude.as_deref(),
        spec_cp_options.rule_pattern,
    )?;
    let n_workers_max = calculate_worker_limit(spec_cp_options.num_workers_max);
    let thread_pool = if n_workers_max > 1 {
        match ThreadPoolBuilder::new().num_threads(n_workers_max).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                tracing::warn!(
                    workers = n_workers_max,
                    error = %e,
                    "thread pool unavailable; copying serially"
                );
                None
            }
        }
    } else {
        None
    };

    let b_dst_preexisting = dir.query_metadata(path_dst).is_ok();
    let if_rollback_on_failure = spec_cp_options.if_rollback_on_failure;
    let spec_cp_ctx = SpecCopyContext {
        dir,
        spec_cp_options,
        patterns_exclude,
        thread_pool,
    };

    let mut builder_cp_report = ReportCopyBuilder::default();
    match copy_entry(path_src, path_dst, &spec_cp_ctx, &mut builder_cp_report) {
        Ok(()) => {
            let report = builder_cp_report.build();
            tracing::info!(
                source = %path_src.display(),
                destination = %path_dst.display(),
                "{report}"
            );
            Ok(report)
        }
        Err(err) => {
            if if_rollback_on_failure && !b_dst_preexisting {
                rollback_destination(dir, path_dst);
            }
            Err(err)
        }
    }
}

fn rollback_destination<D: DirectoryOps>(dir: &D, path_dst: &Path) {
    match dir.remove_entry(path_dst) {
        Ok(()) => tracing::info!(destination = %path_dst.display(), "partial copy rolled back"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            destination = %path_dst.display(),
            error = %e,
            "failed to roll back partial copy"
        ),
    }
}

fn copy_entry<D>(
    path_src: &Path,
    path_dst: &Path,
    spec_cp_ctx: &SpecCopyContext<'_, D>,
    builder_cp_report: &mut ReportCopyBuilder,
) -> Result<(), CopyTreeError>
where
    D: DirectoryOps + Sync,
{
    let meta_src = spec_cp_ctx
        .dir
        .query_metadata(path_src)
        .map_err(|e| CopyTreeError::NotFound {
            path: path_src.to_path_buf(),
            source: e,
        })?;

    match meta_src.kind {
        EnumEntryKind::Directory => {
            copy_directory(path_src, path_dst, spec_cp_ctx, builder_cp_report)
        }
        EnumEntryKind::File => copy_file(path_src, path_dst, spec_cp_ctx, builder_cp_report),
        EnumEntryKind::Other => Err(CopyTreeError::UnsupportedEntry {
            path: path_src.to_path_buf(),
        }),
    }
}

fn create_destination_dir<D: DirectoryOps>(
    path_dst: &Path,
    spec_cp_ctx: &SpecCopyContext<'_, D>,
    builder_cp_report: &mut ReportCopyBuilder,
) -> Result<(), CopyTreeError> {
    match spec_cp_ctx.dir.create_directory(path_dst) {
        Ok(()) => {
            builder_cp_report.add_dir_created();
            Ok(())
        }
        Err(e)
            if e.kind() == io::ErrorKind::AlreadyExists
                && spec_cp_ctx.spec_cp_options.rule_conflict_dir
                    == EnumCopyDirectoryConflictStrategy::Merge
                && spec_cp_ctx
                    .dir
                    .query_metadata(path_dst)
                    .is_ok_and(|meta| meta.is_dir()) =>
        {
            tracing::debug!(destination = %path_dst.display(), "merging into existing directory");
            Ok(())
        }
        Err(e) => Err(CopyTreeError::CreationFailure {
            path: path_dst.to_path_buf(),
            source: e,
        }),
    }
}

/// Read every child name of `path_dir_src`, minus `.`/`..`, then release
/// the listing handle.
fn list_children<D: DirectoryOps>(
    path_dir_src: &Path,
    dir: &D,
) -> Result<Vec<OsString>, CopyTreeError> {
    let map_err = |e: io::Error| CopyTreeError::EnumerationFailure {
        path: path_dir_src.to_path_buf(),
        source: e,
    };

    let iter_listing = dir.open_listing(path_dir_src).map_err(map_err)?;
    let mut l_names = Vec::new();
    for name_res in iter_listing {
        let name = name_res.map_err(map_err)?;
        if name == "." || name == ".." {
            continue;
        }
        l_names.push(name);
    }
    l_names.sort();
    Ok(l_names)
}

fn copy_directory<D>(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    spec_cp_ctx: &SpecCopyContext<'_, D>,
    builder_cp_report: &mut ReportCopyBuilder,
) -> Result<(), CopyTreeError>
where
    D: DirectoryOps + Sync,
{
    create_destination_dir(path_dir_dst, spec_cp_ctx, builder_cp_report)?;
    let l_names = list_children(path_dir_src, spec_cp_ctx.dir)?;

    let mut l_children: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(l_names.len());
    for name in l_names {
        if should_exclude_by_patterns(
            &name.to_string_lossy(),
            spec_cp_ctx.patterns_exclude.as_ref(),
        ) {
            tracing::debug!(
                source = %path_dir_src.join(&name).display(),
                "excluded by pattern"
            );
            builder_cp_report.add_skipped();
            continue;
        }
        l_children.push((path_dir_src.join(&name), path_dir_dst.join(&name)));
    }

    match &spec_cp_ctx.thread_pool {
        Some(thread_pool) if l_children.len() > 1 => {
            let l_builders = thread_pool.install(|| {
                l_children
                    .par_iter()
                    .map(|(path_child_src, path_child_dst)| {
                        let mut builder_child = ReportCopyBuilder::default();
                        copy_entry(path_child_src, path_child_dst, spec_cp_ctx, &mut builder_child)
                            .map(|_| builder_child)
                    })
                    .collect::<Result<Vec<_>, _>>()
            });
            let l_builders = l_builders.map_err(|e| e.wrap_child(path_dir_src))?;
            for builder_child in l_builders {
                builder_cp_report.merge(builder_child);
            }
        }
        _ => {
            for (path_child_src, path_child_dst) in &l_children {
                copy_entry(path_child_src, path_child_dst, spec_cp_ctx, builder_cp_report)
                    .map_err(|e| e.wrap_child(path_dir_src))?;
            }
        }
    }

    Ok(())
}

fn copy_file<D: DirectoryOps>(
    path_file_src: &Path,
    path_file_dst: &Path,
    spec_cp_ctx: &SpecCopyContext<'_, D>,
    builder_cp_report: &mut ReportCopyBuilder,
) -> Result<(), CopyTreeError> {
    let enum_rule_conflict_file = spec_cp_ctx.spec_cp_options.rule_conflict_file;
    if enum_rule_conflict_file == EnumCopyFileConflictStrategy::Skip
        && spec_cp_ctx.dir.query_metadata(path_file_dst).is_ok()
    {
        tracing::debug!(destination = %path_file_dst.display(), "destination exists; skipped");
        builder_cp_report.add_skipped();
        return Ok(());
    }

    let n_bytes = stream_file(
        path_file_src,
        path_file_dst,
        spec_cp_ctx.spec_cp_options.size_chunk,
        enum_rule_conflict_file == EnumCopyFileConflictStrategy::Error,
    )?;
    builder_cp_report.add_file_copied(n_bytes);
    tracing::debug!(
        source = %path_file_src.display(),
        destination = %path_file_dst.display(),
        bytes = n_bytes,
        "file copied"
    );

    if spec_cp_ctx.spec_cp_options.if_preserve_metadata
        && let Err(e) = apply_file_metadata(path_file_src, path_file_dst)
    {
        tracing::warn!(
            destination = %path_file_dst.display(),
            error = %e,
            "metadata not preserved"
        );
        builder_cp_report.add_warning(format!(
            "Metadata not preserved for {} ({e})",
            path_file_dst.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::ffi::OsString;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::process::ExitStatus;
    use std::sync::Mutex;

    use super::copy_tree;
    use crate::dir::{DirectoryOps, LocalDirectory, SpecEntryMeta};
    use crate::spec::{
        CopyTreeError, EnumCopyDirectoryConflictStrategy, EnumCopyFileConflictStrategy,
        EnumCopyPatternMode, SpecCopyOptions,
    };

    /// Local filesystem with listing of selected directories failing.
    struct FailingListing {
        set_unlistable: HashSet<PathBuf>,
    }

    impl DirectoryOps for FailingListing {
        type Listing = std::vec::IntoIter<io::Result<OsString>>;

        fn query_metadata(&self, path: &Path) -> io::Result<SpecEntryMeta> {
            LocalDirectory.query_metadata(path)
        }

        fn create_directory(&self, path: &Path) -> io::Result<()> {
            LocalDirectory.create_directory(path)
        }

        fn open_listing(&self, path: &Path) -> io::Result<Self::Listing> {
            if self.set_unlistable.contains(path) {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            let mut l_names = vec![Ok(OsString::from(".")), Ok(OsString::from(".."))];
            l_names.extend(LocalDirectory.open_listing(path)?);
            Ok(l_names.into_iter())
        }

        fn remove_entry(&self, path: &Path) -> io::Result<()> {
            LocalDirectory.remove_entry(path)
        }

        fn execute_binary(&self, path: &Path, args: &[String]) -> io::Result<ExitStatus> {
            LocalDirectory.execute_binary(path, args)
        }
    }

    /// Local filesystem that records every metadata query.
    #[derive(Default)]
    struct RecordingQueries {
        l_queried: Mutex<Vec<PathBuf>>,
    }

    impl DirectoryOps for RecordingQueries {
        type Listing = <LocalDirectory as DirectoryOps>::Listing;

        fn query_metadata(&self, path: &Path) -> io::Result<SpecEntryMeta> {
            self.l_queried
                .lock()
                .expect("lock")
                .push(path.to_path_buf());
            LocalDirectory.query_metadata(path)
        }

        fn create_directory(&self, path: &Path) -> io::Result<()> {
            LocalDirectory.create_directory(path)
        }

        fn open_listing(&self, path: &Path) -> io::Result<Self::Listing> {
            LocalDirectory.open_listing(path)
        }

        fn remove_entry(&self, path: &Path) -> io::Result<()> {
            LocalDirectory.remove_entry(path)
        }

        fn execute_binary(&self, path: &Path, args: &[String]) -> io::Result<ExitStatus> {
            LocalDirectory.execute_binary(path, args)
        }
    }

    fn write_bytes(path: &Path, raw: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, raw).expect("write bytes");
    }

    fn snapshot(path_root: &Path) -> Vec<(PathBuf, Option<Vec<u8>>)> {
        let mut l_items = Vec::new();
        let mut l_stack = vec![path_root.to_path_buf()];
        while let Some(path_dir) = l_stack.pop() {
            for entry in fs::read_dir(&path_dir).expect("read dir") {
                let path_entry = entry.expect("entry").path();
                let path_rel = path_entry.strip_prefix(path_root).expect("rel").to_path_buf();
                if path_entry.is_dir() {
                    l_items.push((path_rel, None));
                    l_stack.push(path_entry);
                } else {
                    l_items.push((path_rel, Some(fs::read(&path_entry).expect("read"))));
                }
            }
        }
        l_items.sort();
        l_items
    }

    #[test]
    fn copy_tree_file_and_empty_subdir() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("a");
        let dst = tmp.path().join("b");
        write_bytes(&src.join("f.txt"), b"abc");
        fs::create_dir_all(src.join("sub")).expect("mkdir sub");

        let report =
            copy_tree(&LocalDirectory, &src, &dst, SpecCopyOptions::default()).expect("copy tree");

        assert_eq!(fs::read(dst.join("f.txt")).expect("read"), b"abc");
        assert!(dst.join("sub").is_dir());
        assert_eq!(fs::read_dir(dst.join("sub")).expect("read sub").count(), 0);
        assert_eq!(report.cnt_dirs_created, 2);
        assert_eq!(report.cnt_files_copied, 1);
        assert_eq!(report.cnt_bytes, 3);
    }

    #[test]
    fn copy_tree_mirrors_nested_structure() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_bytes(&src.join("root.txt"), b"root");
        write_bytes(&src.join("a/file1.txt"), b"a");
        write_bytes(&src.join("b/sub/file2.bin"), &[0, 1, 2, 255]);
        write_bytes(&src.join("b/sub/deeper/empty.txt"), b"");
        fs::create_dir_all(src.join("c/d")).expect("mkdir");

        copy_tree(&LocalDirectory, &src, &dst, SpecCopyOptions::default()).expect("copy tree");
        assert_eq!(snapshot(&src), snapshot(&dst));
    }

    #[test]
    fn copy_tree_single_file_is_byte_identical() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("in.bin");
        let dst = tmp.path().join("out.bin");
        let raw: Vec<u8> = (0..10_000_u32).map(|n| (n * 31 % 251) as u8).collect();
        write_bytes(&src, &raw);

        let report =
            copy_tree(&LocalDirectory, &src, &dst, SpecCopyOptions::default()).expect("copy tree");
        assert_eq!(fs::read(&dst).expect("read"), raw);
        assert_eq!(report.cnt_bytes, raw.len() as u64);
        assert_eq!(report.cnt_dirs_created, 0);
    }

    #[test]
    fn copy_tree_missing_source_creates_nothing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dst = tmp.path().join("dst");

        let err = copy_tree(
            &LocalDirectory,
            tmp.path().join("missing"),
            &dst,
            SpecCopyOptions::default(),
        )
        .expect_err("missing source must fail");
        assert!(matches!(err, CopyTreeError::NotFound { .. }));
        assert!(!dst.exists());
    }

    #[test]
    fn copy_tree_empty_paths_rejected() {
        let err = copy_tree(&LocalDirectory, "", "x", SpecCopyOptions::default())
            .expect_err("empty source");
        assert!(matches!(err, CopyTreeError::InvalidPath("source")));
        let err = copy_tree(&LocalDirectory, "x", "", SpecCopyOptions::default())
            .expect_err("empty destination");
        assert!(matches!(err, CopyTreeError::InvalidPath("destination")));
    }

    #[test]
    fn copy_tree_existing_destination_dir_fails_by_default() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_bytes(&src.join("a.txt"), b"a");
        fs::create_dir_all(&dst).expect("mkdir dst");

        let err = copy_tree(&LocalDirectory, &src, &dst, SpecCopyOptions::default())
            .expect_err("existing destination");
        assert!(matches!(err, CopyTreeError::CreationFailure { .. }));
        assert!(!dst.join("a.txt").exists());
    }

    #[test]
    fn copy_tree_merge_into_existing_destination() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_bytes(&src.join("a.txt"), b"new");
        write_bytes(&dst.join("keep.txt"), b"keep");
        write_bytes(&dst.join("a.txt"), b"old-and-longer");

        let spec_cp_options = SpecCopyOptions {
            rule_conflict_dir: EnumCopyDirectoryConflictStrategy::Merge,
            ..SpecCopyOptions::default()
        };
        copy_tree(&LocalDirectory, &src, &dst, spec_cp_options).expect("merge copy");
        assert_eq!(fs::read(dst.join("a.txt")).expect("read"), b"new");
        assert_eq!(fs::read(dst.join("keep.txt")).expect("read"), b"keep");
    }

    #[test]
    fn copy_tree_file_conflict_skip_and_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src.txt");
        let dst = tmp.path().join("dst.txt");
        write_bytes(&src, b"src");
        write_bytes(&dst, b"dst");

        let spec_cp_options = SpecCopyOptions {
            rule_conflict_file: EnumCopyFileConflictStrategy::Skip,
            ..SpecCopyOptions::default()
        };
        let report = copy_tree(&LocalDirectory, &src, &dst, spec_cp_options).expect("skip");
        assert_eq!(report.cnt_skipped, 1);
        assert_eq!(fs::read(&dst).expect("read"), b"dst");

        let spec_cp_options = SpecCopyOptions {
            rule_conflict_file: EnumCopyFileConflictStrategy::Error,
            ..SpecCopyOptions::default()
        };
        let err = copy_tree(&LocalDirectory, &src, &dst, spec_cp_options).expect_err("error rule");
        assert!(matches!(err, CopyTreeError::CreationFailure { .. }));
        assert_eq!(fs::read(&dst).expect("read"), b"dst");
    }

    #[test]
    fn copy_tree_skip_rule_queries_destination_through_backend() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_bytes(&src.join("same.txt"), b"new");
        write_bytes(&src.join("fresh.txt"), b"fresh");
        write_bytes(&dst.join("same.txt"), b"old");

        let dir = RecordingQueries::default();
        let spec_cp_options = SpecCopyOptions {
            rule_conflict_dir: EnumCopyDirectoryConflictStrategy::Merge,
            rule_conflict_file: EnumCopyFileConflictStrategy::Skip,
            ..SpecCopyOptions::default()
        };
        let report = copy_tree(&dir, &src, &dst, spec_cp_options).expect("copy tree");

        assert_eq!(report.cnt_skipped, 1);
        assert_eq!(report.cnt_files_copied, 1);
        assert_eq!(fs::read(dst.join("same.txt")).expect("read"), b"old");
        assert_eq!(fs::read(dst.join("fresh.txt")).expect("read"), b"fresh");

        let l_queried = dir.l_queried.lock().expect("lock");
        assert!(l_queried.contains(&dst.join("same.txt")));
        assert!(l_queried.contains(&dst.join("fresh.txt")));
    }

    #[test]
    fn copy_tree_overlap_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).expect("mkdir src");

        let err = copy_tree(
            &LocalDirectory,
            &src,
            src.join("nested"),
            SpecCopyOptions::default(),
        )
        .expect_err("must fail");
        assert!(matches!(err, CopyTreeError::SourceDestinationOverlap { .. }));
        assert!(!src.join("nested").exists());
    }

    #[test]
    fn copy_tree_unlistable_descendant_leaves_partial_result() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_bytes(&src.join("a/one.txt"), b"1");
        write_bytes(&src.join("b/locked/two.txt"), b"2");
        write_bytes(&src.join("c/three.txt"), b"3");

        let dir = FailingListing {
            set_unlistable: HashSet::from([src.join("b/locked")]),
        };
        let err =
            copy_tree(&dir, &src, &dst, SpecCopyOptions::default()).expect_err("listing fails");

        assert!(matches!(err, CopyTreeError::PropagatedChildFailure { .. }));
        assert!(matches!(
            err.root_cause(),
            CopyTreeError::EnumerationFailure { .. }
        ));
        assert_eq!(err.path(), Some(src.join("b/locked").as_path()));

        assert_eq!(fs::read(dst.join("a/one.txt")).expect("read"), b"1");
        assert!(dst.join("b/locked").is_dir());
        assert!(!dst.join("b/locked/two.txt").exists());
        assert!(!dst.join("c").exists());
    }

    #[test]
    fn copy_tree_rollback_removes_created_destination() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_bytes(&src.join("a/one.txt"), b"1");
        write_bytes(&src.join("b/two.txt"), b"2");

        let dir = FailingListing {
            set_unlistable: HashSet::from([src.join("b")]),
        };
        let spec_cp_options = SpecCopyOptions {
            if_rollback_on_failure: true,
            ..SpecCopyOptions::default()
        };
        copy_tree(&dir, &src, &dst, spec_cp_options).expect_err("listing fails");
        assert!(!dst.exists());
    }

    #[test]
    fn copy_tree_exclude_patterns_skip_children() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_bytes(&src.join("keep.txt"), b"k");
        write_bytes(&src.join("drop.tmp"), b"d");
        write_bytes(&src.join("cache/x.txt"), b"x");

        let spec_cp_options = SpecCopyOptions {
            patterns_exclude: Some(vec!["*.tmp".to_string(), "cache".to_string()]),
            rule_pattern: EnumCopyPatternMode::Glob,
            ..SpecCopyOptions::default()
        };
        let report = copy_tree(&LocalDirectory, &src, &dst, spec_cp_options).expect("copy tree");
        assert!(dst.join("keep.txt").exists());
        assert!(!dst.join("drop.tmp").exists());
        assert!(!dst.join("cache").exists());
        assert_eq!(report.cnt_skipped, 2);
    }

    #[test]
    fn copy_tree_invalid_pattern_rejected_before_mutation() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_bytes(&src.join("a.txt"), b"a");

        let spec_cp_options = SpecCopyOptions {
            patterns_exclude: Some(vec!["(".to_string()]),
            rule_pattern: EnumCopyPatternMode::Regex,
            ..SpecCopyOptions::default()
        };
        let err = copy_tree(&LocalDirectory, &src, &dst, spec_cp_options).expect_err("invalid");
        assert!(matches!(err, CopyTreeError::InvalidPattern(_)));
        assert!(!dst.exists());
    }

    #[test]
    fn copy_tree_parallel_workers_match_serial_result() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        for n_idx in 0..24 {
            write_bytes(
                &src.join(format!("d{}", n_idx % 4)).join(format!("f{n_idx}.txt")),
                format!("payload-{n_idx}").as_bytes(),
            );
        }

        let spec_cp_options = SpecCopyOptions {
            num_workers_max: Some(4),
            ..SpecCopyOptions::default()
        };
        let report = copy_tree(&LocalDirectory, &src, &dst, spec_cp_options).expect("copy tree");
        assert_eq!(report.cnt_files_copied, 24);
        assert_eq!(report.cnt_dirs_created, 5);
        assert_eq!(snapshot(&src), snapshot(&dst));
    }

    #[test]
    fn copy_tree_parallel_failure_keeps_partial_result() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_bytes(&src.join("a/one.txt"), b"1");
        write_bytes(&src.join("b/locked/two.txt"), b"2");
        write_bytes(&src.join("b/ok.txt"), b"ok");
        write_bytes(&src.join("c/three.txt"), b"3");

        let dir = FailingListing {
            set_unlistable: HashSet::from([src.join("b/locked")]),
        };
        let spec_cp_options = SpecCopyOptions {
            num_workers_max: Some(4),
            ..SpecCopyOptions::default()
        };
        let err = copy_tree(&dir, &src, &dst, spec_cp_options).expect_err("listing fails");

        assert!(matches!(err, CopyTreeError::PropagatedChildFailure { .. }));
        assert!(matches!(
            err.root_cause(),
            CopyTreeError::EnumerationFailure { .. }
        ));
        assert_eq!(err.path(), Some(src.join("b/locked").as_path()));

        assert!(dst.is_dir());
        assert!(dst.join("b/locked").is_dir());
        assert!(!dst.join("b/locked/two.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_preserves_metadata_when_requested() {
        use filetime::{FileTime, set_file_times};
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        let path_file_src = src.join("meta.txt");
        write_bytes(&path_file_src, b"meta");
        fs::set_permissions(&path_file_src, fs::Permissions::from_mode(0o640))
            .expect("set permissions");
        set_file_times(
            &path_file_src,
            FileTime::from_unix_time(1_700_000_010, 0),
            FileTime::from_unix_time(1_700_000_020, 0),
        )
        .expect("set times");

        let spec_cp_options = SpecCopyOptions {
            if_preserve_metadata: true,
            ..SpecCopyOptions::default()
        };
        let report = copy_tree(&LocalDirectory, &src, &dst, spec_cp_options).expect("copy tree");
        assert_eq!(report.warning_count(), 0);

        let stat_src = fs::metadata(&path_file_src).expect("src metadata");
        let stat_dst = fs::metadata(dst.join("meta.txt")).expect("dst metadata");
        assert_eq!(
            stat_src.permissions().mode() & 0o777,
            stat_dst.permissions().mode() & 0o777
        );
        assert_eq!(
            FileTime::from_last_modification_time(&stat_src),
            FileTime::from_last_modification_time(&stat_dst)
        );
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_rejects_special_files() {
        let dir = LocalDirectory;
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = copy_tree(
            &dir,
            "/dev/null",
            tmp.path().join("null_copy"),
            SpecCopyOptions::default(),
        )
        .expect_err("char device");
        assert!(matches!(err, CopyTreeError::UnsupportedEntry { .. }));
    }
}
