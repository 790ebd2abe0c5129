//! Unified error type for the mdioctl-lib crate.
//!
//! [`MdioctlError`] wraps [`DeviceError`] and the argument-level error kinds
//! (`Parse`, `UnknownCommand`, `OutOfRange`, `Config`). `From` impls allow `?`
//! to propagate across module boundaries.

use std::fmt;

use crate::device::DeviceError;

/// Unified error type for mdioctl-lib operations.
#[derive(Debug)]
pub enum MdioctlError {
    /// Device communication error (open, claim, transfer).
    Device(DeviceError),
    /// Malformed argument; the payload names what was being parsed.
    Parse(String),
    /// Command code missing from the class-command table.
    UnknownCommand(char),
    /// Numeric argument outside its valid range.
    OutOfRange { field: &'static str, value: i64 },
    /// Configuration validation error.
    Config(String),
    /// Standard I/O error (writing results).
    Io(std::io::Error),
}

impl fmt::Display for MdioctlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MdioctlError::Device(e) => write!(f, "{e}"),
            MdioctlError::Parse(e) => write!(f, "Parse error: {e}"),
            MdioctlError::UnknownCommand(c) => write!(f, "Unknown command '{c}'"),
            MdioctlError::OutOfRange { field, value } => {
                write!(f, "Invalid {field}: {value} is out of range")
            }
            MdioctlError::Config(e) => write!(f, "Config error: {e}"),
            MdioctlError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for MdioctlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MdioctlError::Device(e) => Some(e),
            MdioctlError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DeviceError> for MdioctlError {
    fn from(e: DeviceError) -> Self {
        MdioctlError::Device(e)
    }
}

impl From<std::io::Error> for MdioctlError {
    fn from(e: std::io::Error) -> Self {
        MdioctlError::Io(e)
    }
}

/// Crate-level Result alias using [`MdioctlError`].
pub type Result<T> = std::result::Result<T, MdioctlError>;
