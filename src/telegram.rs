//! Framing of PS 2000 B telegrams.
//!
//! Every telegram, in either direction, has the layout
//!
//! ```text
//! [SD, DN, OBJ, DATA..., CS0, CS1]
//! ```
//!
//! * `SD` - start delimiter. High nibble carries the telegram type, low nibble the data length minus one.
//! * `DN` - device node. Always `0` on a single output device.
//! * `OBJ` - object number.
//! * `CS0`/`CS1` - 16 bit sum of all preceding bytes, big endian.
//!
//! Replies with `OBJ == 0xFF` are error telegrams. Their single data byte is
//! the error code, where `0x00` doubles as the acknowledge for a write.

use core::ops::Deref;

use crate::error::DeviceErrorKind;

/// Base value of every start delimiter.
const START_DELIMITER: u8 = 0x30;

/// Longest data block the length nibble of the start delimiter can describe.
pub const MAX_DATA_LEN: usize = 16;

/// Header (SD, DN, OBJ) plus checksum.
const FRAME_OVERHEAD: usize = 5;

/// Longest telegram we can send.
pub const MAX_TELEGRAM_LEN: usize = MAX_DATA_LEN + FRAME_OVERHEAD;

/// Shortest reply that still carries a header and a checksum.
pub const MIN_RESPONSE_LEN: usize = 5;

/// Longest reply the device will ever produce, we always ask for this much.
pub const MAX_RESPONSE_LEN: usize = 100;

/// Object number used by error/acknowledge telegrams.
pub const ERROR_MARKER: u8 = 0xFF;

/// Error code which signals a successful write.
pub const ACK_CODE: u8 = 0x00;

/// Direction of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TelegramType {
    /// Read an object.
    Query = 0x40,
    /// Write an object.
    Send = 0xC0,
}

impl From<TelegramType> for u8 {
    fn from(value: TelegramType) -> Self {
        value as u8
    }
}

/// An encoded request, ready to be written to the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Telegram {
    bytes: [u8; MAX_TELEGRAM_LEN],
    len: usize,
}

impl Telegram {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl Deref for Telegram {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

/// Build a request telegram.
///
/// # Panics
///
/// If `data` is longer than [`MAX_DATA_LEN`], which the start delimiter cannot express.
pub fn encode(kind: TelegramType, node: u8, object: u8, data: &[u8]) -> Telegram {
    assert!(data.len() <= MAX_DATA_LEN);

    let mut bytes = [0u8; MAX_TELEGRAM_LEN];
    bytes[0] = START_DELIMITER | u8::from(kind);
    if !data.is_empty() {
        bytes[0] += (data.len() - 1) as u8;
    }
    bytes[1] = node;
    bytes[2] = object;

    let body_len = 3 + data.len();
    bytes[3..body_len].copy_from_slice(data);

    let checksum = checksum(&bytes[..body_len]);
    bytes[body_len..body_len + 2].copy_from_slice(&checksum.to_be_bytes());

    Telegram {
        bytes,
        len: body_len + 2,
    }
}

/// Sum of all bytes, modulo 65536.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(byte as u16))
}

/// Return `(calculated, received)` checksums of a frame, or `None` if the frame has no room for one.
pub fn checksums(frame: &[u8]) -> Option<(u16, u16)> {
    let split = frame.len().checked_sub(2)?;
    let (body, trailer) = frame.split_at(split);
    Some((checksum(body), u16::from_be_bytes([trailer[0], trailer[1]])))
}

/// Check the trailing checksum of a received frame.
pub fn validate_checksum(frame: &[u8]) -> bool {
    matches!(checksums(frame), Some((calculated, received)) if calculated == received)
}

/// What a checksum-valid reply means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOutcome {
    /// Normal reply, the payload carries object data.
    Data,
    /// Error telegram with code `0x00`: a write was accepted.
    Acknowledged,
    /// Error telegram with any other code.
    Rejected { kind: DeviceErrorKind, raw_code: u8 },
}

/// Sort a validated frame into data, acknowledge or device error.
pub fn classify(frame: &[u8]) -> DeviceOutcome {
    match (frame.get(2), frame.get(3)) {
        (Some(&ERROR_MARKER), Some(&ACK_CODE)) => DeviceOutcome::Acknowledged,
        (Some(&ERROR_MARKER), Some(&code)) => DeviceOutcome::Rejected {
            kind: DeviceErrorKind::from(code),
            raw_code: code,
        },
        _ => DeviceOutcome::Data,
    }
}

/// The data block of a frame, without header and checksum.
pub fn payload(frame: &[u8]) -> &[u8] {
    if frame.len() < MIN_RESPONSE_LEN {
        return &[];
    }
    &frame[3..frame.len() - 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_query() {
        // Query object 0 (device type).
        let telegram = encode(TelegramType::Query, 0, 0, &[]);
        assert_eq!(telegram.as_bytes(), [0x70, 0x00, 0x00, 0x00, 0x70]);
    }

    #[test]
    fn encode_query_nominal_voltage() {
        let telegram = encode(TelegramType::Query, 0, 2, &[]);
        assert_eq!(telegram.as_bytes(), [0x70, 0x00, 0x02, 0x00, 0x72]);
    }

    #[test]
    fn encode_send_with_data() {
        // Switch to remote: object 54, mask 0x10, value 0x10.
        let telegram = encode(TelegramType::Send, 0, 54, &[0x10, 0x10]);
        assert_eq!(telegram.as_bytes(), [0xF1, 0x00, 0x36, 0x10, 0x10, 0x01, 0x47]);
    }

    #[test]
    fn encode_length_nibble() {
        for len in 1..=MAX_DATA_LEN {
            let data = [0xAAu8; MAX_DATA_LEN];
            let telegram = encode(TelegramType::Send, 0, 50, &data[..len]);
            assert_eq!(telegram[0] & 0x0F, (len - 1) as u8);
            assert_eq!(telegram[0] & 0xF0, 0xF0);
            assert_eq!(telegram.len(), len + 5);
        }
    }

    #[test]
    #[should_panic]
    fn encode_rejects_oversized_data() {
        encode(TelegramType::Send, 0, 50, &[0u8; MAX_DATA_LEN + 1]);
    }

    #[test]
    fn encoded_telegrams_always_validate() {
        let data = [0xFFu8; MAX_DATA_LEN];
        for kind in [TelegramType::Query, TelegramType::Send] {
            for object in 0..=255u8 {
                for len in 0..=MAX_DATA_LEN {
                    let telegram = encode(kind, 0, object, &data[..len]);
                    assert!(validate_checksum(&telegram));
                }
            }
        }
    }

    #[test]
    fn checksum_wraps_at_16_bits() {
        let bytes = [0xFFu8; 300];
        assert_eq!(checksum(&bytes), ((300 * 0xFF) % 65536) as u16);
    }

    #[test]
    fn any_single_byte_change_is_detected() {
        let telegram = encode(TelegramType::Send, 0, 51, &[0x12, 0x34]);
        for index in 0..telegram.len() {
            for delta in [0x01u8, 0x80, 0xFF] {
                let mut corrupted = [0u8; MAX_TELEGRAM_LEN];
                corrupted[..telegram.len()].copy_from_slice(&telegram);
                corrupted[index] = corrupted[index].wrapping_add(delta);
                assert!(!validate_checksum(&corrupted[..telegram.len()]));
            }
        }
    }

    #[test]
    fn checksums_reports_both_values() {
        let frame = [0x71, 0x00, 0x36, 0x01, 0x01, 0x00, 0x00];
        assert_eq!(checksums(&frame), Some((0xA9, 0x0000)));
        assert_eq!(checksums(&[0x01]), None);
        assert!(!validate_checksum(&[]));
    }

    #[test]
    fn classify_data() {
        let frame = [0x71, 0x00, 0x36, 0x01, 0x01, 0x00, 0xA9];
        assert_eq!(classify(&frame), DeviceOutcome::Data);
    }

    #[test]
    fn classify_acknowledge() {
        let frame = [0xB0, 0x00, 0xFF, 0x00, 0x01, 0xAF];
        assert_eq!(classify(&frame), DeviceOutcome::Acknowledged);
    }

    #[test]
    fn classify_device_errors() {
        let frame = [0xB0, 0x00, 0xFF, 0x30, 0x01, 0xDF];
        assert_eq!(
            classify(&frame),
            DeviceOutcome::Rejected {
                kind: DeviceErrorKind::UpperLimitExceeded,
                raw_code: 0x30
            }
        );

        let frame = [0xB0, 0x00, 0xFF, 0x0F, 0x01, 0xBE];
        assert_eq!(
            classify(&frame),
            DeviceOutcome::Rejected {
                kind: DeviceErrorKind::DeviceLocked,
                raw_code: 0x0F
            }
        );

        let frame = [0xB0, 0x00, 0xFF, 0x42, 0x01, 0xF1];
        assert_eq!(
            classify(&frame),
            DeviceOutcome::Rejected {
                kind: DeviceErrorKind::Unknown,
                raw_code: 0x42
            }
        );
    }

    #[test]
    fn payload_strips_header_and_checksum() {
        let frame = [0x73, 0x00, 0x02, 0x42, 0x28, 0x00, 0x00, 0x00, 0xDF];
        assert_eq!(payload(&frame), [0x42, 0x28, 0x00, 0x00]);
        assert_eq!(payload(&frame[..4]), [] as [u8; 0]);
    }
}
