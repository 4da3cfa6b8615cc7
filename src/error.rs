use std::{io, num::ParseIntError};

use nix::errno::Errno;

use crate::command::EcStatus;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors reported by the driver to the host subsystems.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported system (vendor {vendor:?}, product {product:?})")]
    UnsupportedPlatform {
        vendor: Option<String>,
        product: Option<String>,
    },

    #[error("EC device '{0}' not found")]
    DeviceNotFound(String),

    /// An EC command was issued without a resolved EC handle (before attach or after detach).
    #[error("EC device not present")]
    DeviceNotPresent,

    #[error("EC transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    #[error("invalid value {0} (valid range: 0-100)")]
    InvalidArgument(u32),

    #[error("invalid number: {0}")]
    Parse(#[from] ParseIntError),

    #[error("battery '{0}' is not managed by the EC")]
    UnsupportedBattery(String),

    #[error("registration failed: {0}")]
    Registration(String),
}

impl Error {
    /// The errno a host subsystem reports for this error.
    ///
    /// A missing EC is ENODEV for every feature, including a keyboard backlight write.
    pub fn errno(&self) -> Errno {
        match self {
            Error::UnsupportedPlatform { .. }
            | Error::DeviceNotPresent
            | Error::UnsupportedBattery(_)
            | Error::Registration(_) => Errno::ENODEV,
            Error::DeviceNotFound(_) | Error::InvalidArgument(_) | Error::Parse(_) => Errno::EINVAL,
            Error::TransferFailed(_) => Errno::EIO,
        }
    }
}

/// Why a single EC transfer did not produce a usable response.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("EC returned status {0}")]
    Status(EcStatus),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("short response: expected {expected} bytes, received {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}
