//! Our error types for the PS 2000 B.

use strum_macros::EnumIter;
use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for PS 2000 B communications.
///
/// Nothing here is retried by the driver. Every failure is handed back to the
/// caller, who decides whether to abort or try again.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    #[error("Checksum mismatch: calculated {expected:#06x}, received {received:#06x}")]
    ChecksumMismatch { expected: u16, received: u16 },
    #[error("Short response ({received} bytes received)")]
    ShortResponse { received: usize },
    #[error("Device rejected request: {kind} (code {raw_code:#04x})")]
    DeviceError { kind: DeviceErrorKind, raw_code: u8 },
    #[error("Malformed payload: expected {expected} bytes, received {received}")]
    MalformedPayload { expected: usize, received: usize },
    #[error("String object is not ASCII")]
    EncodingError,
    #[error("Write to object {object} was not acknowledged")]
    NotAcknowledged { object: u8 },
    #[error("Invalid range")]
    InvalidRange,
    #[error("Nominal value must be finite and positive")]
    InvalidNominal,
}

/// Shape errors raised while decoding an object payload.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} bytes, received {received}")]
    Length { expected: usize, received: usize },
    #[error("not ASCII")]
    NotAscii,
}

impl<I: embedded_io::Error> From<DecodeError> for Error<I> {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Length { expected, received } => {
                Error::MalformedPayload { expected, received }
            }
            DecodeError::NotAscii => Error::EncodingError,
        }
    }
}

/// Error codes the device returns in a `0xFF` telegram.
///
/// Code `0x00` in the same position is an acknowledge and never becomes one of these.
#[derive(Error, Debug, EnumIter, PartialEq, Eq, Clone, Copy)]
pub enum DeviceErrorKind {
    /// 0x03
    #[error("checksum incorrect")]
    ChecksumIncorrect,
    /// 0x04
    #[error("start delimiter incorrect")]
    StartDelimiterIncorrect,
    /// 0x05
    #[error("wrong address for output")]
    WrongOutputAddress,
    /// 0x07
    #[error("object not defined")]
    UndefinedObject,
    /// 0x08
    #[error("object length incorrect")]
    ObjectLengthIncorrect,
    /// 0x09
    #[error("access denied")]
    AccessDenied,
    /// 0x0F, the panel is locked or the device is not in remote control.
    #[error("device is locked")]
    DeviceLocked,
    /// 0x30, typically a setpoint above the OVP level or the nominal rating.
    #[error("upper limit exceeded")]
    UpperLimitExceeded,
    /// 0x31, typically a setpoint below the allowed minimum or OCP level.
    #[error("lower limit exceeded")]
    LowerLimitExceeded,
    /// Any code not listed in the manual.
    #[error("unknown error")]
    Unknown,
}

impl DeviceErrorKind {
    /// Wire code for this kind. [`DeviceErrorKind::Unknown`] has none and reports `0xFF`.
    pub const fn code(&self) -> u8 {
        match self {
            Self::ChecksumIncorrect => 0x03,
            Self::StartDelimiterIncorrect => 0x04,
            Self::WrongOutputAddress => 0x05,
            Self::UndefinedObject => 0x07,
            Self::ObjectLengthIncorrect => 0x08,
            Self::AccessDenied => 0x09,
            Self::DeviceLocked => 0x0F,
            Self::UpperLimitExceeded => 0x30,
            Self::LowerLimitExceeded => 0x31,
            Self::Unknown => 0xFF,
        }
    }
}

impl From<u8> for DeviceErrorKind {
    fn from(value: u8) -> Self {
        use DeviceErrorKind as DE;
        match value {
            0x03 => DE::ChecksumIncorrect,
            0x04 => DE::StartDelimiterIncorrect,
            0x05 => DE::WrongOutputAddress,
            0x07 => DE::UndefinedObject,
            0x08 => DE::ObjectLengthIncorrect,
            0x09 => DE::AccessDenied,
            0x0F => DE::DeviceLocked,
            0x30 => DE::UpperLimitExceeded,
            0x31 => DE::LowerLimitExceeded,
            _ => DE::Unknown,
        }
    }
}
