//! `zpc_shell`:
//! interactive file shell around the copy engine and the audit log.
//!
//! - `command` : typed commands, line parsing
//! - `shell`   : dispatcher and audit notes
//! - `repl`    : prompt loop
//! - `config`  : binary startup options

pub mod command;
pub mod config;
pub mod error;
pub mod repl;
pub mod shell;

pub use command::{EnumShellCommand, parse_line};
pub use config::SpecShellConfig;
pub use error::ShellError;
pub use repl::run_repl;
pub use shell::{CommandOutcome, Shell};
