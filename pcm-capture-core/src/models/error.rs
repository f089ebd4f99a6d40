use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal capture faults reported to listeners.
///
/// Each variant carries a stable numeric code (see [`RecordError::code`]).
/// The enum is non-exhaustive so new categories can be added without
/// breaking hosts that match on it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RecordError {
    /// Unexpected device or runtime fault while starting or recording.
    #[error("an exception occurred while starting or recording")]
    ExceptionOccurred,

    /// The device returned fewer samples than one full frame.
    #[error("an error occurred while reading from the input device")]
    ReadError,

    /// No record permission, device unavailable, or the device never
    /// entered the recording state.
    #[error("no record permission or the input device is busy")]
    PermissionError,
}

/// Message used for codes with no known category.
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

impl RecordError {
    const ALL: [RecordError; 3] = [Self::ExceptionOccurred, Self::ReadError, Self::PermissionError];

    /// Stable wire code for this category.
    pub const fn code(self) -> i32 {
        match self {
            Self::ExceptionOccurred => 0,
            Self::ReadError => 1,
            Self::PermissionError => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }

    /// Human-readable message for any code, falling back to
    /// [`UNKNOWN_ERROR_MESSAGE`] for unmapped ones.
    pub fn message_for_code(code: i32) -> String {
        match Self::from_code(code) {
            Some(err) => err.to_string(),
            None => UNKNOWN_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Failures reported by an [`AudioInput`](crate::traits::audio_input::AudioInput)
/// implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("record permission denied")]
    PermissionDenied,

    #[error("input device is busy")]
    Busy,

    #[error("input device not available: {0}")]
    Unavailable(String),

    #[error("input device fault: {0}")]
    Fault(String),
}

impl From<DeviceError> for RecordError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::PermissionDenied | DeviceError::Busy | DeviceError::Unavailable(_) => {
                RecordError::PermissionError
            }
            DeviceError::Fault(_) => RecordError::ExceptionOccurred,
        }
    }
}

/// Persistence failures. These never stop a running capture.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("write failed: {0}")]
    WriteError(String),

    #[error("close failed: {0}")]
    CloseError(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("byte length {len} is invalid for {width}-byte words")]
    InvalidLength { len: usize, width: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid record configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(RecordError::ExceptionOccurred.code(), 0);
        assert_eq!(RecordError::ReadError.code(), 1);
        assert_eq!(RecordError::PermissionError.code(), 3);
    }

    #[test]
    fn from_code_maps_known_codes() {
        assert_eq!(RecordError::from_code(0), Some(RecordError::ExceptionOccurred));
        assert_eq!(RecordError::from_code(1), Some(RecordError::ReadError));
        assert_eq!(RecordError::from_code(3), Some(RecordError::PermissionError));
        assert_eq!(RecordError::from_code(2), None);
    }

    #[test]
    fn unmapped_code_gets_generic_message() {
        assert_eq!(RecordError::message_for_code(42), UNKNOWN_ERROR_MESSAGE);
        assert_eq!(
            RecordError::message_for_code(1),
            RecordError::ReadError.to_string()
        );
    }

    #[test]
    fn device_errors_map_into_taxonomy() {
        assert_eq!(RecordError::from(DeviceError::Busy), RecordError::PermissionError);
        assert_eq!(
            RecordError::from(DeviceError::Unavailable("gone".into())),
            RecordError::PermissionError
        );
        assert_eq!(
            RecordError::from(DeviceError::Fault("boom".into())),
            RecordError::ExceptionOccurred
        );
    }
}
