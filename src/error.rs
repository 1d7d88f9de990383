//! Top-level error type surfaced by [crate::machine::Machine].
use core::fmt;
use std::error::Error;

use zxcore_core::audio::AudioBackendError;
use zxcore_core::memory::ZxMemoryError;

/// Errors a [crate::machine::Machine] can report. The CPU itself never
/// produces one: unknown opcodes decode as documented no-ops and unmapped
/// memory/IO reads return `0xFF`.
#[derive(Debug)]
pub enum EmulatorError {
    /// A snapshot or tape loader refused to accept a blob (bad signature,
    /// unsupported version field, or a hardware mode this build doesn't model).
    UnsupportedFormat(&'static str),
    /// A blob ended before the format's own header said it would.
    TruncatedImage,
    /// A ROM blob did not match the model's expected aggregate ROM size.
    BadRomSize { expected: usize, got: usize },
    /// The audio sink rejected a frame.
    AudioBackendError(AudioBackendError),
    /// The video backend failed while ending a field.
    VideoBackendError(&'static str),
}

impl fmt::Display for EmulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmulatorError::UnsupportedFormat(msg) => write!(f, "unsupported format: {}", msg),
            EmulatorError::TruncatedImage => write!(f, "image is truncated"),
            EmulatorError::BadRomSize { expected, got } => {
                write!(f, "ROM image size mismatch: expected {} bytes, got {}", expected, got)
            }
            EmulatorError::AudioBackendError(e) => write!(f, "audio backend error: {}", e),
            EmulatorError::VideoBackendError(msg) => write!(f, "video backend error: {}", msg),
        }
    }
}

impl Error for EmulatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EmulatorError::AudioBackendError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AudioBackendError> for EmulatorError {
    fn from(e: AudioBackendError) -> Self {
        EmulatorError::AudioBackendError(e)
    }
}

impl From<ZxMemoryError> for EmulatorError {
    fn from(e: ZxMemoryError) -> Self {
        match e {
            ZxMemoryError::BadRomSize { expected, got } => EmulatorError::BadRomSize { expected, got },
            ZxMemoryError::Io(_) => EmulatorError::TruncatedImage,
            _ => EmulatorError::UnsupportedFormat("invalid memory bank reference"),
        }
    }
}

#[cfg(feature = "formats")]
impl From<zxcore_formats::FormatError> for EmulatorError {
    fn from(e: zxcore_formats::FormatError) -> Self {
        use zxcore_formats::FormatError::*;
        match e {
            Io(_) | Truncated => EmulatorError::TruncatedImage,
            BadSignature | UnsupportedVersion(_) | Corrupt(_) => {
                EmulatorError::UnsupportedFormat("snapshot does not match any supported format")
            }
        }
    }
}
