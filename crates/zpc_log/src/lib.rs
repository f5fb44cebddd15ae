//! `zpc_log`:
//! bounded, append-only audit log of shell actions.
//!
//! - `buffer` : the in-memory accumulator and its file persistence
//! - `spec`   : outcomes and errors

pub mod buffer;
pub mod spec;

pub use buffer::LogBuffer;
pub use spec::{
    EnumAppendOutcome, EnumLoadOutcome, EnumLogState, EnumRejectReason, LogBufferError,
    N_CAPACITY_DEFAULT,
};
