//! Read-eval-print loop over any line source.

use std::io::{BufRead, Write};

use zpc_io_fs::DirectoryOps;

use crate::command::parse_line;
use crate::error::ShellError;
use crate::shell::Shell;

/// Prompt, read, execute until `exit` or end of input.
///
/// Command failures and undecodable lines are printed and the loop
/// continues; only terminal I/O errors end it early.
pub fn run_repl<D, R, W>(
    shell: &mut Shell<D>,
    mut reader: R,
    mut writer: W,
) -> Result<(), ShellError>
where
    D: DirectoryOps + Sync,
    R: BufRead,
    W: Write,
{
    let mut raw_line = Vec::new();
    loop {
        write!(writer, "ZpC{}> ", shell.cwd().display())?;
        writer.flush()?;

        raw_line.clear();
        if reader.read_until(b'\n', &mut raw_line)? == 0 {
            writeln!(writer)?;
            return Ok(());
        }
        let line = match std::str::from_utf8(&raw_line) {
            Ok(v) => v.trim_end_matches(['\n', '\r']),
            Err(e) => {
                tracing::warn!(error = %e, "input line skipped: invalid UTF-8");
                writeln!(writer, "error: input line is not valid UTF-8")?;
                continue;
            }
        };

        let command = match parse_line(line) {
            Ok(Some(v)) => v,
            Ok(None) => continue,
            Err(e) => {
                writeln!(writer, "{}", e.to_string().trim_end())?;
                continue;
            }
        };

        let outcome = shell.execute(command);
        if !outcome.message.is_empty() {
            writeln!(writer, "{}", outcome.message)?;
        }
        if let Some(warning) = outcome.warning() {
            writeln!(writer, "warning: {warning}")?;
        }
        if outcome.if_exit {
            return Ok(());
        }
    }
}
