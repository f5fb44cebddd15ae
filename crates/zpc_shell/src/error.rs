//! Shell-level error type.

use std::io;

use thiserror::Error;
use zpc_log::LogBufferError;

#[derive(Debug, Error)]
pub enum ShellError {
    /// Command line did not match any command or its arguments.
    #[error(transparent)]
    Parse(#[from] clap::Error),
    /// Operator terminal could not be read or written.
    #[error("terminal io failure")]
    Io(#[from] io::Error),
    /// Startup log could not be loaded.
    #[error(transparent)]
    Log(#[from] LogBufferError),
}
