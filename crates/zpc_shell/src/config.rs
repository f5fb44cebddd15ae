//! Startup configuration of the `zpc` binary.

use std::path::PathBuf;

use clap::Parser;
use zpc_io_fs::{LocalDirectory, SpecCopyOptions};
use zpc_log::{EnumLoadOutcome, LogBuffer, N_CAPACITY_DEFAULT};

use crate::error::ShellError;
use crate::shell::Shell;

#[derive(Debug, Clone, Parser)]
#[command(name = "zpc")]
#[command(about = "Interactive file shell with an in-memory audit log")]
pub struct SpecShellConfig {
    /// Audit log loaded at startup
    #[arg(long, env = "ZPC_LOG_FILE", default_value = "log.txt")]
    pub log_file: PathBuf,

    /// Audit buffer capacity in bytes
    #[arg(long, env = "ZPC_LOG_CAPACITY", default_value_t = N_CAPACITY_DEFAULT)]
    pub log_capacity: usize,

    /// Initial current directory (process directory by default)
    #[arg(long, env = "ZPC_CWD")]
    pub cwd: Option<PathBuf>,

    /// Copy worker threads per directory level
    #[arg(long, env = "ZPC_WORKERS", default_value_t = 1)]
    pub workers: usize,

    /// Keep permissions, timestamps and extended attributes of copied files
    #[arg(long)]
    pub preserve_metadata: bool,

    /// Remove a partially copied destination after a failed copy
    #[arg(long)]
    pub rollback: bool,

    /// Glob patterns of entry names never copied (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,
}

impl SpecShellConfig {
    pub fn copy_options(&self) -> SpecCopyOptions {
        SpecCopyOptions {
            patterns_exclude: (!self.exclude.is_empty()).then(|| self.exclude.clone()),
            if_preserve_metadata: self.preserve_metadata,
            if_rollback_on_failure: self.rollback,
            num_workers_max: Some(self.workers),
            ..SpecCopyOptions::default()
        }
    }

    /// Shell over the local filesystem with the audit log pre-loaded.
    pub fn build_shell(&self) -> Result<Shell<LocalDirectory>, ShellError> {
        let mut log = LogBuffer::new(self.log_capacity);
        match log.load_from(&self.log_file)? {
            EnumLoadOutcome::Loaded {
                cnt_lines,
                cnt_rejected,
            } if cnt_rejected > 0 => tracing::warn!(
                path = %self.log_file.display(),
                cnt_lines,
                cnt_rejected,
                "log file larger than buffer capacity; tail not loaded"
            ),
            EnumLoadOutcome::Loaded { cnt_lines, .. } => {
                tracing::info!(path = %self.log_file.display(), cnt_lines, "log loaded")
            }
            EnumLoadOutcome::Missing => {}
        }

        let path_cwd = match &self.cwd {
            Some(v) => v.clone(),
            None => std::env::current_dir()?,
        };
        Ok(Shell::new(
            LocalDirectory,
            log,
            path_cwd,
            self.copy_options(),
        ))
    }
}
