//! Copy report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Aggregate counters and diagnostics for one successful `copy_tree` run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportCopy {
    /// Number of destination directories created (or merged into).
    pub cnt_dirs_created: u64,
    /// Number of regular files written.
    pub cnt_files_copied: u64,
    /// Total bytes written.
    pub cnt_bytes: u64,
    /// Entries skipped by exclude patterns or conflict rules.
    pub cnt_skipped: u64,
    /// Non-fatal warnings (metadata that could not be preserved, etc).
    pub warnings: Vec<String>,
}

impl ReportCopy {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_files_copied".to_string(), self.cnt_files_copied);
        dict_counts.insert("cnt_bytes".to_string(), self.cnt_bytes);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} dirs={} files={} bytes={} skipped={} warnings={}",
            self.cnt_dirs_created,
            self.cnt_files_copied,
            self.cnt_bytes,
            self.cnt_skipped,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator for copy statistics.
///
/// Worker threads each fill their own builder; results are combined with
/// [`ReportCopyBuilder::merge`].
#[derive(Debug, Default, Clone)]
pub struct ReportCopyBuilder {
    cnt_dirs_created: u64,
    cnt_files_copied: u64,
    cnt_bytes: u64,
    cnt_skipped: u64,
    warnings: Vec<String>,
}

impl ReportCopyBuilder {
    pub fn add_dir_created(&mut self) {
        self.cnt_dirs_created += 1;
    }

    pub fn add_file_copied(&mut self, n_bytes: u64) {
        self.cnt_files_copied += 1;
        self.cnt_bytes += n_bytes;
    }

    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Fold another builder's counters and warnings into this one.
    pub fn merge(&mut self, other: ReportCopyBuilder) {
        self.cnt_dirs_created += other.cnt_dirs_created;
        self.cnt_files_copied += other.cnt_files_copied;
        self.cnt_bytes += other.cnt_bytes;
        self.cnt_skipped += other.cnt_skipped;
        self.warnings.extend(other.warnings);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportCopy {
        ReportCopy {
            cnt_dirs_created: self.cnt_dirs_created,
            cnt_files_copied: self.cnt_files_copied,
            cnt_bytes: self.cnt_bytes,
            cnt_skipped: self.cnt_skipped,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ReportCopy, ReportCopyBuilder};

    #[test]
    fn report_copy_to_dict_and_format() {
        let report = ReportCopy {
            cnt_dirs_created: 2,
            cnt_files_copied: 3,
            cnt_bytes: 42,
            cnt_skipped: 1,
            warnings: vec!["w".to_string()],
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_dirs_created"], 2);
        assert_eq!(dict_counts["cnt_files_copied"], 3);
        assert_eq!(dict_counts["cnt_bytes"], 42);
        assert_eq!(dict_counts["cnt_skipped"], 1);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[COPY]");
        assert_eq!(txt, "[COPY] dirs=2 files=3 bytes=42 skipped=1 warnings=1");
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn builder_merge_sums_counters() {
        let mut builder_left = ReportCopyBuilder::default();
        builder_left.add_dir_created();
        builder_left.add_file_copied(10);

        let mut builder_right = ReportCopyBuilder::default();
        builder_right.add_file_copied(5);
        builder_right.add_skipped();
        builder_right.add_warning("metadata".to_string());

        builder_left.merge(builder_right);
        let report = builder_left.build();
        assert_eq!(report.cnt_dirs_created, 1);
        assert_eq!(report.cnt_files_copied, 2);
        assert_eq!(report.cnt_bytes, 15);
        assert_eq!(report.cnt_skipped, 1);
        assert_eq!(report.warnings, vec!["metadata".to_string()]);
    }
}
