//! Serial link parameters of the PS 2000 B.
//!
//! The driver itself never opens a port. These values are what the caller
//! should configure the interface with before handing it to
//! [`Ps2000::open`](crate::psu::Ps2000::open).

use fugit::MillisDurationU32;

/// Parity setting of the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// The device needs at least this long between a reply and the next request.
pub const MIN_COMMAND_INTERVAL: MillisDurationU32 = MillisDurationU32::millis(50);

/// Read timeout that ends every reply.
///
/// Slightly longer than [`MIN_COMMAND_INTERVAL`], so waiting for a reply to
/// finish also spaces out consecutive requests.
pub const READ_TIMEOUT: MillisDurationU32 = MillisDurationU32::millis(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSettings {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    /// Timeout for a single read, see [`READ_TIMEOUT`].
    pub read_timeout: MillisDurationU32,
    /// See [`MIN_COMMAND_INTERVAL`].
    pub command_interval: MillisDurationU32,
}

/// Fixed vendor settings: 115200 baud, 8 data bits, odd parity, 1 stop bit.
impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: 8,
            parity: Parity::Odd,
            stop_bits: 1,
            read_timeout: READ_TIMEOUT,
            command_interval: MIN_COMMAND_INTERVAL,
        }
    }
}

impl LinkSettings {
    /// Use a different read timeout.
    ///
    /// Values below the command interval are raised to it, shorter timeouts would let requests run into the device's dead time.
    pub fn with_read_timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.read_timeout = if timeout < self.command_interval {
            self.command_interval
        } else {
            timeout
        };
        self
    }

    /// Read timeout in milliseconds, for serial libraries that take plain integers.
    pub fn read_timeout_ms(&self) -> u32 {
        self.read_timeout.to_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = LinkSettings::default();
        assert_eq!(settings.baud_rate, 115_200);
        assert_eq!(settings.parity, Parity::Odd);
        assert_eq!(settings.data_bits, 8);
        assert_eq!(settings.stop_bits, 1);
        assert_eq!(settings.read_timeout_ms(), 60);
    }

    #[test]
    fn read_timeout_covers_command_interval() {
        let settings = LinkSettings::default();
        assert!(settings.read_timeout >= settings.command_interval);

        let settings = settings.with_read_timeout(MillisDurationU32::millis(10));
        assert_eq!(settings.read_timeout_ms(), 50);

        let settings = settings.with_read_timeout(MillisDurationU32::millis(100));
        assert_eq!(settings.read_timeout_ms(), 100);
    }
}
