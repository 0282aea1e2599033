//! One request, one reply.
//!
//! [`ObjectLink`] writes a telegram, collects the reply until the interface
//! times out, and checks it. The free functions decode the payload of a reply
//! and never touch the interface.

use embedded_io::Error as _;
use log::{trace, warn};

use crate::{
    error::{DecodeError, Error, Result},
    telegram::{self, DeviceOutcome, MAX_RESPONSE_LEN, MIN_RESPONSE_LEN, TelegramType},
};

/// Maximum string length that can be contained in one reply.
pub const MAX_STRING_LEN: usize = MAX_RESPONSE_LEN - MIN_RESPONSE_LEN;

/// ASCII text object, e.g. the device type.
pub type DeviceString = heapless::String<MAX_STRING_LEN>;

/// A checksum-valid reply frame carrying object data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    frame: heapless::Vec<u8, MAX_RESPONSE_LEN>,
}

impl Payload {
    /// The data block, without header and checksum.
    pub fn as_bytes(&self) -> &[u8] {
        telegram::payload(&self.frame)
    }

    /// The complete frame as received.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }
}

/// A reply that passed checksum and error checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Object data.
    Data(Payload),
    /// Write acknowledged with error code `0x00`.
    Acknowledged,
}

/// Owns the interface and performs object transfers on it.
///
/// The protocol is half duplex with one request in flight, so every method takes `&mut self`.
pub struct ObjectLink<S: embedded_io::Read + embedded_io::Write> {
    interface: S,
    /// Always 0 for a single output device.
    node: u8,
}

impl<S: embedded_io::Read + embedded_io::Write> ObjectLink<S> {
    pub fn new(interface: S) -> Self {
        Self { interface, node: 0 }
    }

    /// Give the interface back.
    pub fn release(self) -> S {
        self.interface
    }

    #[cfg(test)]
    pub(crate) fn interface(&self) -> &S {
        &self.interface
    }

    /// Send one telegram and check the reply.
    ///
    /// The reply is read until the interface reports a timeout or [`MAX_RESPONSE_LEN`]
    /// bytes have arrived. The interface's read timeout therefore bounds the
    /// latency of every transfer, see [`crate::link::LinkSettings`].
    pub fn transfer(
        &mut self,
        kind: TelegramType,
        object: impl Into<u8>,
        data: &[u8],
    ) -> Result<Reply, S::Error> {
        let object = object.into();
        let request = telegram::encode(kind, self.node, object, data);
        trace!("telegram: {:02x?}", request.as_bytes());

        self.interface
            .write_all(&request)
            .map_err(Error::SerialError)?;
        self.interface.flush().map_err(Error::SerialError)?;

        let mut frame = [0u8; MAX_RESPONSE_LEN];
        let mut received = 0;
        while received < MAX_RESPONSE_LEN {
            match self.interface.read(&mut frame[received..]) {
                Ok(0) => break,
                Ok(bytes_read) => received += bytes_read,
                // The device doesn't announce the reply length, a timeout ends every reply.
                Err(e) if matches!(e.kind(), embedded_io::ErrorKind::TimedOut) => break,
                Err(e) => return Err(Error::SerialError(e)),
            }
        }
        let frame = &frame[..received];
        trace!("answer: {:02x?}", frame);

        if received < MIN_RESPONSE_LEN {
            return Err(Error::ShortResponse { received });
        }

        if let Some((expected, received)) = telegram::checksums(frame) {
            if expected != received {
                return Err(Error::ChecksumMismatch { expected, received });
            }
        }

        match telegram::classify(frame) {
            DeviceOutcome::Data => Ok(Reply::Data(Payload {
                frame: heapless::Vec::from_slice(frame).map_err(|_| {
                    Error::MalformedPayload {
                        expected: MAX_RESPONSE_LEN,
                        received,
                    }
                })?,
            })),
            DeviceOutcome::Acknowledged => Ok(Reply::Acknowledged),
            DeviceOutcome::Rejected { kind, raw_code } => {
                warn!("object {object}: device rejected request: {kind} ({raw_code:#04x})");
                Err(Error::DeviceError { kind, raw_code })
            }
        }
    }

    /// Read an object. Its data block is returned unchanged.
    pub fn query(&mut self, object: impl Into<u8>) -> Result<Payload, S::Error> {
        let object = object.into();
        match self.transfer(TelegramType::Query, object, &[])? {
            Reply::Data(payload) => Ok(payload),
            // An acknowledge carries no data at all.
            Reply::Acknowledged => Err(Error::MalformedPayload {
                expected: 1,
                received: 0,
            }),
        }
    }

    /// Write an object. Succeeds only if the device acknowledges the write.
    pub fn send(&mut self, object: impl Into<u8>, data: &[u8]) -> Result<(), S::Error> {
        let object = object.into();
        match self.transfer(TelegramType::Send, object, data)? {
            Reply::Acknowledged => Ok(()),
            Reply::Data(_) => Err(Error::NotAcknowledged { object }),
        }
    }
}

/// Returns the payload bytes unchanged.
pub fn as_binary(payload: &[u8]) -> &[u8] {
    payload
}

/// Decode a string object. The last byte of the payload is the terminator and is dropped.
pub fn as_string(payload: &[u8]) -> core::result::Result<DeviceString, DecodeError> {
    let (_terminator, text) = payload.split_last().ok_or(DecodeError::Length {
        expected: 1,
        received: 0,
    })?;

    let mut string = DeviceString::new();
    for &byte in text {
        if !byte.is_ascii() {
            return Err(DecodeError::NotAscii);
        }
        string.push(byte as char).map_err(|_| DecodeError::Length {
            expected: MAX_STRING_LEN,
            received: text.len(),
        })?;
    }
    Ok(string)
}

/// Decode a big endian IEEE-754 single precision float.
pub fn as_float(payload: &[u8]) -> core::result::Result<f32, DecodeError> {
    Ok(f32::from_be_bytes(exact_bytes(payload)?))
}

/// Decode a big endian unsigned 16 bit integer.
pub fn as_integer(payload: &[u8]) -> core::result::Result<u16, DecodeError> {
    Ok(u16::from_be_bytes(exact_bytes(payload)?))
}

/// Data block for writing an integer object.
pub fn encode_integer(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Data block for writing a bit field object. Only bits set in `mask` are applied by the device.
pub fn encode_binary(mask: u8, data: u8) -> [u8; 2] {
    [mask, data]
}

fn exact_bytes<const N: usize>(payload: &[u8]) -> core::result::Result<[u8; N], DecodeError> {
    payload.try_into().map_err(|_| DecodeError::Length {
        expected: N,
        received: payload.len(),
    })
}
