/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! The error type shared by every format decoder in this crate.
use core::fmt;
use std::error::Error;
use std::io;

/// Errors returned while decoding a snapshot or tape file.
#[derive(Debug)]
pub enum FormatError {
    /// Underlying I/O error while reading the source.
    Io(io::Error),
    /// The buffer ended before a complete record could be read.
    Truncated,
    /// Neither a 48k nor a 128k **SNA** size, nor a recognized **Z80** header.
    BadSignature,
    /// A **Z80** extended header length other than 23, 54 or 55.
    UnsupportedVersion(u16),
    /// A field held a value outside of what the format allows.
    Corrupt(&'static str),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Io(e) => write!(f, "I/O error: {}", e),
            FormatError::Truncated => write!(f, "file is truncated"),
            FormatError::BadSignature => write!(f, "not a recognized file"),
            FormatError::UnsupportedVersion(v) => write!(f, "unsupported format version field: {}", v),
            FormatError::Corrupt(msg) => write!(f, "corrupt file: {}", msg),
        }
    }
}

impl Error for FormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FormatError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FormatError {
    fn from(e: io::Error) -> Self {
        FormatError::Io(e)
    }
}

pub type Result<T> = core::result::Result<T, FormatError>;
