//! Request framing for the companion storage module.
//!
//! Wire format of a request:
//! ```text
//! [command:1][payload_len:2][payload:N]
//! ```
//! `payload_len` is little-endian.  The module answers every request with a
//! single status byte, interpreted as a signed value: non-negative values are
//! results (e.g. a descriptor number), negative values are error codes.

use thiserror::Error;

/// Largest payload the 16-bit length prefix can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Errors raised while framing a request.
#[derive(Debug, Error, PartialEq)]
pub enum StorageFrameError {
    #[error("payload of {0} bytes exceeds the 65535-byte frame limit")]
    PayloadTooLarge(usize),

    #[error("path contains an interior NUL byte")]
    InteriorNul,
}

/// Command codes this client sends to the storage module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StorageCommand {
    OpenDir = 0x16,
}

/// One framed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRequest {
    pub command: StorageCommand,
    pub payload: Vec<u8>,
}

impl StorageRequest {
    /// Builds an `OpenDir` request; the path travels NUL-terminated.
    ///
    /// # Errors
    ///
    /// Returns [`StorageFrameError::InteriorNul`] if `path` contains a NUL
    /// byte and [`StorageFrameError::PayloadTooLarge`] if it does not fit in
    /// one frame.
    pub fn open_dir(path: &str) -> Result<Self, StorageFrameError> {
        Ok(Self {
            command: StorageCommand::OpenDir,
            payload: nul_terminated(path)?,
        })
    }

    /// Serializes the request into wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageFrameError::PayloadTooLarge`] if the payload exceeds
    /// [`MAX_PAYLOAD`].
    pub fn encode(&self) -> Result<Vec<u8>, StorageFrameError> {
        let len = u16::try_from(self.payload.len())
            .map_err(|_| StorageFrameError::PayloadTooLarge(self.payload.len()))?;
        let mut buf = Vec::with_capacity(3 + self.payload.len());
        buf.push(self.command as u8);
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }
}

/// Error codes returned by the storage module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StorageErrorCode {
    #[error("not found")]
    NotFound,
    #[error("too many open files")]
    TooManyOpen,
    #[error("invalid parameter")]
    Param,
    #[error("end of file")]
    Eof,
    #[error("already exists")]
    Exists,
    #[error("other error")]
    Other,
    #[error("no disk")]
    NoDisk,
    #[error("directory not empty")]
    NotEmpty,
    #[error("unrecognised error code {0}")]
    Unrecognised(i8),
}

/// Decoded status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStatus {
    Ok(u8),
    Failed(StorageErrorCode),
}

impl StorageStatus {
    pub fn decode(byte: u8) -> Self {
        let value = byte as i8;
        if value >= 0 {
            return StorageStatus::Ok(value as u8);
        }
        let code = match value {
            -1 => StorageErrorCode::NotFound,
            -2 => StorageErrorCode::TooManyOpen,
            -3 => StorageErrorCode::Param,
            -4 => StorageErrorCode::Eof,
            -5 => StorageErrorCode::Exists,
            -6 => StorageErrorCode::Other,
            -7 => StorageErrorCode::NoDisk,
            -8 => StorageErrorCode::NotEmpty,
            other => StorageErrorCode::Unrecognised(other),
        };
        StorageStatus::Failed(code)
    }
}

fn nul_terminated(path: &str) -> Result<Vec<u8>, StorageFrameError> {
    if path.as_bytes().contains(&0) {
        return Err(StorageFrameError::InteriorNul);
    }
    let mut payload = Vec::with_capacity(path.len() + 1);
    payload.extend_from_slice(path.as_bytes());
    payload.push(0);
    if payload.len() > MAX_PAYLOAD {
        return Err(StorageFrameError::PayloadTooLarge(payload.len()));
    }
    Ok(payload)
}
