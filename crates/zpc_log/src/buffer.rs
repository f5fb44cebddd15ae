//! Capacity-bounded audit buffer.

use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::spec::{
    EnumAppendOutcome, EnumLoadOutcome, EnumLogState, EnumRejectReason, LogBufferError,
    N_CAPACITY_DEFAULT,
};

/// Append-only text accumulator with a fixed byte capacity.
///
/// Content is kept as raw bytes, so lines loaded from disk are flushed back
/// unchanged whatever their encoding.
///
/// The length always stays strictly below `capacity`: an append that would
/// reach it is dropped whole and reported as
/// [`EnumAppendOutcome::Rejected`]. Nothing is ever truncated or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBuffer {
    content: Vec<u8>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(N_CAPACITY_DEFAULT)
    }
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            content: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Bytes that can still be appended in total.
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.content.len() + 1)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// Display view; invalid UTF-8 sequences are replaced.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    pub fn state(&self) -> EnumLogState {
        if self.content.is_empty() {
            EnumLogState::Empty
        } else {
            EnumLogState::NonEmpty
        }
    }

    /// Add `text` if the result stays below capacity; otherwise leave the
    /// buffer untouched.
    pub fn append(&mut self, text: &str) -> EnumAppendOutcome {
        self.append_bytes(text.as_bytes())
    }

    /// Byte-level [`LogBuffer::append`]; `raw` is stored verbatim.
    pub fn append_bytes(&mut self, raw: &[u8]) -> EnumAppendOutcome {
        let len_current = self.content.len();
        if len_current + raw.len() < self.capacity {
            self.content.extend_from_slice(raw);
            return EnumAppendOutcome::Appended;
        }
        tracing::warn!(
            len_current,
            len_requested = raw.len(),
            capacity = self.capacity,
            "log append rejected: capacity exceeded"
        );
        EnumAppendOutcome::Rejected {
            reason: EnumRejectReason::CapacityExceeded {
                len_current,
                len_requested: raw.len(),
                capacity: self.capacity,
            },
        }
    }

    /// Append the lines of `path` byte for byte, terminators included.
    ///
    /// Every line goes through [`LogBuffer::append`]; the first line that
    /// does not fit ends the load, so the buffer receives an exact prefix of
    /// the file. A missing file is not an error.
    pub fn load_from<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<EnumLoadOutcome, LogBufferError> {
        let path = path.as_ref();
        let map_err = |e: io::Error| LogBufferError::Load {
            path: path.to_path_buf(),
            source: e,
        };

        let file = match File::open(path) {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "log file not found; starting empty");
                return Ok(EnumLoadOutcome::Missing);
            }
            Err(e) => return Err(map_err(e)),
        };

        let mut reader = BufReader::new(file);
        let mut raw_line = Vec::new();
        let mut cnt_lines = 0_usize;
        let mut cnt_rejected = 0_usize;
        loop {
            raw_line.clear();
            if reader.read_until(b'\n', &mut raw_line).map_err(map_err)? == 0 {
                break;
            }
            if cnt_rejected > 0 {
                cnt_rejected += 1;
                continue;
            }
            match self.append_bytes(&raw_line) {
                EnumAppendOutcome::Appended => cnt_lines += 1,
                EnumAppendOutcome::Rejected { .. } => cnt_rejected += 1,
            }
        }

        tracing::debug!(path = %path.display(), cnt_lines, cnt_rejected, "log loaded");
        Ok(EnumLoadOutcome::Loaded {
            cnt_lines,
            cnt_rejected,
        })
    }

    /// Append the whole buffer plus one `\n` to `path`, creating it if needed.
    ///
    /// The buffer is not cleared, so each flush writes everything again.
    pub fn flush_to<P: AsRef<Path>>(&self, path: P) -> Result<(), LogBufferError> {
        let path = path.as_ref();
        let map_err = |e: io::Error| LogBufferError::Persistence {
            path: path.to_path_buf(),
            source: e,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(map_err)?;
        file.write_all(&self.content).map_err(map_err)?;
        file.write_all(b"\n").map_err(map_err)?;
        file.flush().map_err(map_err)?;

        tracing::debug!(path = %path.display(), bytes = self.content.len() + 1, "log flushed");
        Ok(())
    }
}
