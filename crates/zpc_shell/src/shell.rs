//! Command dispatcher: runs typed commands and records audit notes.

use std::path::{Path, PathBuf};

use zpc_io_fs::{CopyTreeError, DirectoryOps, SpecCopyOptions, copy_tree};
use zpc_log::{EnumAppendOutcome, EnumRejectReason, LogBuffer};

use crate::command::{C_HELP_TEXT, EnumShellCommand};

/// What one command did, for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub if_success: bool,
    pub message: String,
    /// Set when the command wrote an audit note.
    pub log_outcome: Option<EnumAppendOutcome>,
    pub if_exit: bool,
}

impl CommandOutcome {
    /// Operator warning for a dropped audit note.
    pub fn warning(&self) -> Option<String> {
        match self.log_outcome {
            Some(EnumAppendOutcome::Rejected {
                reason:
                    EnumRejectReason::CapacityExceeded {
                        len_current,
                        len_requested,
                        capacity,
                    },
            }) => Some(format!(
                "audit log full ({len_current}/{capacity} bytes); \
                 note of {len_requested} bytes dropped"
            )),
            _ => None,
        }
    }
}

/// Handler result before the audit note is written.
struct SpecHandled {
    if_success: bool,
    message: String,
    note: Option<String>,
}

impl SpecHandled {
    fn silent(if_success: bool, message: String) -> Self {
        Self {
            if_success,
            message,
            note: None,
        }
    }

    fn logged(name: &str, if_success: bool, detail: &str, message: String) -> Self {
        let c_status = if if_success { "succeeded" } else { "failed" };
        Self {
            if_success,
            message,
            note: Some(format!("{name} {c_status}: {detail}\n")),
        }
    }
}

/// Interactive shell state: current directory, audit log, filesystem layer.
pub struct Shell<D> {
    dir: D,
    log: LogBuffer,
    path_cwd: PathBuf,
    spec_cp_options: SpecCopyOptions,
}

impl<D> Shell<D>
where
    D: DirectoryOps + Sync,
{
    pub fn new(
        dir: D,
        log: LogBuffer,
        path_cwd: PathBuf,
        spec_cp_options: SpecCopyOptions,
    ) -> Self {
        Self {
            dir,
            log,
            path_cwd,
            spec_cp_options,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.path_cwd
    }

    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Relative paths are joined onto the tracked current directory.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.path_cwd.join(path)
        }
    }

    /// Run `command`, then append its audit note, if it has one.
    pub fn execute(&mut self, command: EnumShellCommand) -> CommandOutcome {
        let c_name = command.name();
        let if_exit = command == EnumShellCommand::Exit;
        let handled = match command {
            EnumShellCommand::Copy {
                source,
                destination,
            } => self.handle_copy(&source, &destination),
            EnumShellCommand::Paste {
                source,
                destination,
            } => self.handle_paste(&source, &destination),
            EnumShellCommand::Cut {
                source,
                destination,
            } => self.handle_cut(&source, &destination),
            EnumShellCommand::Delete { target } => self.handle_delete(&target),
            EnumShellCommand::RunBin { name, args } => self.handle_run_bin(&name, args),
            EnumShellCommand::Save { file } => self.handle_save(&file),
            EnumShellCommand::List { dir } => self.handle_list(dir.as_deref().unwrap_or(".")),
            EnumShellCommand::Cd { dir } => self.handle_cd(&dir),
            EnumShellCommand::Help => SpecHandled::silent(true, C_HELP_TEXT.to_string()),
            EnumShellCommand::Exit => SpecHandled::silent(true, String::new()),
        };

        tracing::info!(
            command = c_name,
            success = handled.if_success,
            "command executed"
        );
        let log_outcome = handled.note.map(|note| self.log.append(&note));
        CommandOutcome {
            if_success: handled.if_success,
            message: handled.message,
            log_outcome,
            if_exit,
        }
    }

    fn copy(&self, path_src: &Path, path_dst: &Path) -> Result<String, CopyTreeError> {
        copy_tree(&self.dir, path_src, path_dst, self.spec_cp_options.clone())
            .map(|report| report.format("copied:"))
    }

    fn handle_copy(&self, source: &str, destination: &str) -> SpecHandled {
        let path_src = self.resolve(source);
        let path_dst = self.resolve(destination);
        let detail = format!("{} -> {}", path_src.display(), path_dst.display());
        match self.copy(&path_src, &path_dst) {
            Ok(message) => SpecHandled::logged("copy", true, &detail, message),
            Err(e) => SpecHandled::logged(
                "copy",
                false,
                &detail,
                format!("copy failed: {}", e.describe()),
            ),
        }
    }

    fn handle_paste(&self, source: &str, destination: &str) -> SpecHandled {
        let path_src = self.resolve(source);
        let path_dir_dst = self.resolve(destination);
        let detail = format!("{} -> {}", path_src.display(), path_dir_dst.display());

        if !self
            .dir
            .query_metadata(&path_dir_dst)
            .is_ok_and(|meta| meta.is_dir())
        {
            return SpecHandled::logged(
                "paste",
                false,
                &detail,
                format!("paste failed: {} is not a directory", path_dir_dst.display()),
            );
        }
        let Some(name) = path_src.file_name() else {
            return SpecHandled::logged(
                "paste",
                false,
                &detail,
                format!("paste failed: {} has no entry name", path_src.display()),
            );
        };

        match self.copy(&path_src, &path_dir_dst.join(name)) {
            Ok(message) => SpecHandled::logged("paste", true, &detail, message),
            Err(e) => SpecHandled::logged(
                "paste",
                false,
                &detail,
                format!("paste failed: {}", e.describe()),
            ),
        }
    }

    fn handle_cut(&self, source: &str, destination: &str) -> SpecHandled {
        let path_src = self.resolve(source);
        let path_dst = self.resolve(destination);
        let detail = format!("{} -> {}", path_src.display(), path_dst.display());

        let message = match self.copy(&path_src, &path_dst) {
            Ok(v) => v,
            Err(e) => {
                return SpecHandled::logged(
                    "cut",
                    false,
                    &detail,
                    format!("cut failed: {}", e.describe()),
                );
            }
        };
        match self.dir.remove_entry(&path_src) {
            Ok(()) => SpecHandled::logged("cut", true, &detail, format!("moved, {message}")),
            Err(e) => SpecHandled::logged(
                "cut",
                false,
                &detail,
                format!(
                    "cut failed: copied but could not remove {}: {e}",
                    path_src.display()
                ),
            ),
        }
    }

    fn handle_delete(&self, target: &str) -> SpecHandled {
        let path_target = self.resolve(target);
        let detail = path_target.display().to_string();
        match self.dir.remove_entry(&path_target) {
            Ok(()) => SpecHandled::logged("delete", true, &detail, "deleted".to_string()),
            Err(e) => SpecHandled::logged(
                "delete",
                false,
                &detail,
                format!("delete failed: {detail}: {e}"),
            ),
        }
    }

    fn handle_run_bin(&self, name: &str, args: Vec<String>) -> SpecHandled {
        let path_bin = self.path_cwd.join(name);
        let detail = path_bin.display().to_string();
        let mut l_argv = Vec::with_capacity(args.len() + 1);
        l_argv.push(name.to_string());
        l_argv.extend(args);

        match self.dir.execute_binary(&path_bin, &l_argv) {
            Ok(status) if status.success() => {
                SpecHandled::logged("run_bin", true, &detail, "binary finished".to_string())
            }
            Ok(status) => SpecHandled::logged(
                "run_bin",
                false,
                &detail,
                format!("binary failed: {status}"),
            ),
            Err(e) => SpecHandled::logged(
                "run_bin",
                false,
                &detail,
                format!("binary failed to start: {e}"),
            ),
        }
    }

    fn handle_save(&self, file: &str) -> SpecHandled {
        let path_log = self.resolve(file);
        match self.log.flush_to(&path_log) {
            Ok(()) => SpecHandled::silent(true, format!("log saved to {}", path_log.display())),
            Err(e) => {
                let c_cause = std::error::Error::source(&e)
                    .map(|err| format!(": {err}"))
                    .unwrap_or_default();
                SpecHandled::silent(false, format!("log save failed: {e}{c_cause}"))
            }
        }
    }

    fn handle_list(&self, dir: &str) -> SpecHandled {
        let path_dir = self.resolve(dir);
        let iter_listing = match self.dir.open_listing(&path_dir) {
            Ok(v) => v,
            Err(e) => {
                return SpecHandled::silent(
                    false,
                    format!("list failed: {}: {e}", path_dir.display()),
                );
            }
        };

        let mut l_lines = Vec::new();
        for name_res in iter_listing {
            let name = match name_res {
                Ok(v) => v,
                Err(e) => {
                    return SpecHandled::silent(
                        false,
                        format!("list failed: {}: {e}", path_dir.display()),
                    );
                }
            };
            if name == "." || name == ".." {
                continue;
            }
            let b_is_dir = self
                .dir
                .query_metadata(&path_dir.join(&name))
                .is_ok_and(|meta| meta.is_dir());
            let c_suffix = if b_is_dir { "/" } else { "" };
            l_lines.push(format!("{}{c_suffix}", name.to_string_lossy()));
        }
        l_lines.sort();
        SpecHandled::silent(true, l_lines.join("\n"))
    }

    fn handle_cd(&mut self, dir: &str) -> SpecHandled {
        let path_next = self.resolve(dir);
        if self
            .dir
            .query_metadata(&path_next)
            .is_ok_and(|meta| meta.is_dir())
        {
            self.path_cwd = path_next;
            SpecHandled::silent(true, String::new())
        } else {
            SpecHandled::silent(
                false,
                format!("cd failed: {} is not a directory", path_next.display()),
            )
        }
    }
}
