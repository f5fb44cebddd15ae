//! Typed shell commands and line parsing.

use clap::{Parser, Subcommand};

/// One parsed command line.
#[derive(Debug, Parser)]
#[command(
    name = "zpc",
    no_binary_name = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
struct ShellLine {
    #[command(subcommand)]
    command: EnumShellCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum EnumShellCommand {
    /// Copy a file or directory tree
    Copy { source: String, destination: String },
    /// Copy a file or directory into an existing directory
    Paste { source: String, destination: String },
    /// Move a file or directory tree
    Cut { source: String, destination: String },
    /// Delete a file or directory tree
    Delete { target: String },
    /// Run a binary from the current directory
    #[command(name = "run_bin")]
    RunBin {
        name: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Append the audit log to a file
    Save { file: String },
    /// List a directory (current directory by default)
    List { dir: Option<String> },
    /// Change the current directory
    Cd { dir: String },
    /// Show available commands
    Help,
    /// Leave the shell
    Exit,
}

impl EnumShellCommand {
    /// Name used in audit notes.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Copy { .. } => "copy",
            Self::Paste { .. } => "paste",
            Self::Cut { .. } => "cut",
            Self::Delete { .. } => "delete",
            Self::RunBin { .. } => "run_bin",
            Self::Save { .. } => "save",
            Self::List { .. } => "list",
            Self::Cd { .. } => "cd",
            Self::Help => "help",
            Self::Exit => "exit",
        }
    }
}

pub const C_HELP_TEXT: &str = "\
available commands:
  copy <source> <destination>     copy a file or directory tree
  paste <source> <directory>      copy into an existing directory
  cut <source> <destination>      move a file or directory tree
  delete <path>                   delete a file or directory tree
  run_bin <name> [args..]         run a binary from the current directory
  save <file>                     append the audit log to a file
  list [directory]                list directory entries
  cd <directory>                  change the current directory
  help                            show this help
  exit                            leave the shell";

/// Parse one operator line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<EnumShellCommand>, clap::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let shell_line = ShellLine::try_parse_from(line.split_whitespace())?;
    Ok(Some(shell_line.command))
}

#[cfg(test)]
mod tests {
    use super::{EnumShellCommand, parse_line};

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            parse_line("copy /a /b").expect("copy"),
            Some(EnumShellCommand::Copy {
                source: "/a".to_string(),
                destination: "/b".to_string(),
            })
        );
        assert_eq!(
            parse_line("  run_bin tool x -v --fast ").expect("run_bin"),
            Some(EnumShellCommand::RunBin {
                name: "tool".to_string(),
                args: vec!["x".to_string(), "-v".to_string(), "--fast".to_string()],
            })
        );
        assert_eq!(
            parse_line("list").expect("list"),
            Some(EnumShellCommand::List { dir: None })
        );
        assert_eq!(parse_line("help").expect("help"), Some(EnumShellCommand::Help));
    }

    #[test]
    fn blank_line_is_no_command() {
        assert_eq!(parse_line("   ").expect("blank"), None);
    }

    #[test]
    fn unknown_or_incomplete_commands_fail() {
        assert!(parse_line("format c:").is_err());
        assert!(parse_line("copy /only-source").is_err());
        assert!(parse_line("delete").is_err());
    }
}
