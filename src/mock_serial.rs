//! We use this mocking module in unit tests to emulate the serial port of a PS 2000 B.
//!
//! Replies are queued up front. Every write hands the next queued reply to the
//! read side, and once a reply has been read completely the port reports a
//! timeout, like a real serial port does after the device stops talking.

use std::collections::VecDeque;
use std::vec::Vec;

use thiserror::Error;

/// Our mock type used to emulate a serial port.
pub struct MockSerial {
    /// Every write call, one entry per telegram.
    telegrams: Vec<Vec<u8>>,
    /// Replies handed out one per write.
    replies: VecDeque<Vec<u8>>,
    /// Reply currently being read.
    read_buffer: Vec<u8>,
    /// Current position in the read buffer
    read_position: usize,
    /// Largest number of bytes returned by a single read.
    read_chunk: usize,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

#[derive(Error, Debug)]
pub enum MockSerialError {
    /// Simulated timeout, returned once the current reply is exhausted.
    #[error("timeout")]
    Timeout,
    /// Generic simulated error for testing
    #[error("simulated error")]
    SimulatedError,
}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.telegrams.push(buf.to_vec());
        self.read_buffer = self.replies.pop_front().unwrap_or_default();
        self.read_position = 0;

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        if self.read_position >= self.read_buffer.len() {
            return Err(MockSerialError::Timeout);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        let bytes_to_read = buf.len().min(available_bytes).min(self.read_chunk);

        buf[..bytes_to_read].copy_from_slice(
            &self.read_buffer[self.read_position..self.read_position + bytes_to_read],
        );

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with no replies queued.
    pub fn new() -> Self {
        Self {
            telegrams: Vec::new(),
            replies: VecDeque::new(),
            read_buffer: Vec::new(),
            read_position: 0,
            read_chunk: usize::MAX,
            should_error_on_write: false,
            should_error_on_read: false,
        }
    }

    /// Queue the raw bytes the device answers the next unanswered telegram with.
    pub fn queue_reply(&mut self, data: &[u8]) {
        self.replies.push_back(data.to_vec());
    }

    /// Every telegram written so far.
    pub fn telegrams(&self) -> &[Vec<u8>] {
        &self.telegrams
    }

    /// Number of queued replies not yet handed out.
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    /// Limit how many bytes a single read returns.
    pub fn set_read_chunk(&mut self, chunk: usize) {
        self.read_chunk = chunk.max(1);
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }
}

/// Build a checksum-valid device reply for `object` carrying `data`.
pub fn reply(object: u8, data: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(data.len() + 5);
    frame.push(0x30 | (data.len().saturating_sub(1) as u8 & 0x0F));
    frame.push(0x00);
    frame.push(object);
    frame.extend_from_slice(data);
    let checksum = crate::telegram::checksum(&frame);
    frame.extend_from_slice(&checksum.to_be_bytes());
    frame
}

/// Build the device's acknowledge telegram.
pub fn ack() -> Vec<u8> {
    reply(0xFF, &[0x00])
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error as _, Read, Write};

    #[test]
    fn test_new_mock_serial() {
        let mock = MockSerial::new();
        assert!(mock.telegrams().is_empty());
        assert_eq!(mock.pending_replies(), 0);
        assert_eq!(mock.read_position, 0);
        assert!(!mock.should_error_on_write);
        assert!(!mock.should_error_on_read);
    }

    #[test]
    fn test_write_hands_out_next_reply() {
        let mut mock = MockSerial::new();
        mock.queue_reply(b"first");
        mock.queue_reply(b"second");

        mock.write(b"one").unwrap();
        let mut buffer = [0u8; 10];
        assert_eq!(mock.read(&mut buffer).unwrap(), 5);
        assert_eq!(&buffer[..5], b"first");

        mock.write(b"two").unwrap();
        assert_eq!(mock.read(&mut buffer).unwrap(), 6);
        assert_eq!(&buffer[..6], b"second");

        assert_eq!(mock.telegrams(), [b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(mock.pending_replies(), 0);
    }

    #[test]
    fn test_read_timeout_after_reply_exhausted() {
        let mut mock = MockSerial::new();
        mock.queue_reply(b"Hi");
        mock.write(b"?").unwrap();

        let mut buffer = [0u8; 10];
        assert!(mock.read(&mut buffer).is_ok());

        let result = mock.read(&mut buffer);
        assert!(matches!(result, Err(MockSerialError::Timeout)));
    }

    #[test]
    fn test_read_timeout_without_reply() {
        let mut mock = MockSerial::new();
        mock.write(b"?").unwrap();

        let mut buffer = [0u8; 10];
        assert!(matches!(mock.read(&mut buffer), Err(MockSerialError::Timeout)));
    }

    #[test]
    fn test_read_chunk() {
        let mut mock = MockSerial::new();
        mock.queue_reply(b"Hello World");
        mock.set_read_chunk(4);
        mock.write(b"?").unwrap();

        let mut buffer = [0u8; 20];
        assert_eq!(mock.read(&mut buffer).unwrap(), 4);
        assert_eq!(&buffer[..4], b"Hell");
    }

    #[test]
    fn test_write_error_simulation() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);

        let result = mock.write(b"test");
        assert!(matches!(result, Err(MockSerialError::SimulatedError)));
        assert!(matches!(mock.flush(), Err(MockSerialError::SimulatedError)));
        assert!(mock.telegrams().is_empty());
    }

    #[test]
    fn test_read_error_simulation() {
        let mut mock = MockSerial::new();
        mock.queue_reply(b"test data");
        mock.write(b"?").unwrap();
        mock.set_read_error(true);

        let mut buffer = [0u8; 10];
        assert!(matches!(
            mock.read(&mut buffer),
            Err(MockSerialError::SimulatedError)
        ));
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            MockSerialError::Timeout.kind(),
            embedded_io::ErrorKind::TimedOut
        ));
        assert!(matches!(
            MockSerialError::SimulatedError.kind(),
            embedded_io::ErrorKind::Other
        ));
    }

    #[test]
    fn test_reply_frames() {
        assert_eq!(ack(), [0x30, 0x00, 0xFF, 0x00, 0x01, 0x2F]);
        assert_eq!(
            reply(19, &[0x00, 0x10]),
            [0x31, 0x00, 0x13, 0x00, 0x10, 0x00, 0x54]
        );
    }
}
