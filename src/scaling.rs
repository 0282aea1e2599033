//! Scaling between raw 16 bit object values and physical units.
//!
//! The PS 2000 B reports every voltage and current as a fraction of its nominal
//! rating: `physical = nominal * raw / 25600`. A raw value of `25600` is 100% of
//! nominal, anything up to `0xFFFF` is accepted by the protocol.

/// Raw value corresponding to 100% of a nominal rating.
pub const NOMINAL_SCALE: f32 = 25600.0;

/// Nominal ratings of a power supply, read once when a session is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nominal {
    /// Nominal voltage in volts.
    voltage: f32,
    /// Nominal current in amps.
    current: f32,
}

impl Nominal {
    /// Create a new set of nominal ratings.
    ///
    /// Returns `None` unless both values are finite and positive.
    pub fn new(voltage: f32, current: f32) -> Option<Self> {
        let valid = |value: f32| value.is_finite() && value > 0.0;
        if valid(voltage) && valid(current) {
            Some(Self { voltage, current })
        } else {
            None
        }
    }

    /// Nominal voltage in volts.
    pub fn voltage(&self) -> f32 {
        self.voltage
    }

    /// Nominal current in amps.
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Convert a raw voltage object value to volts.
    #[inline]
    pub fn raw_to_voltage(&self, raw: u16) -> f32 {
        raw_to_physical(self.voltage, raw)
    }

    /// Convert volts to a raw voltage object value.
    #[inline]
    pub fn voltage_to_raw(&self, volts: f32) -> Option<u16> {
        physical_to_raw(self.voltage, volts)
    }

    /// Convert a raw current object value to amps.
    #[inline]
    pub fn raw_to_current(&self, raw: u16) -> f32 {
        raw_to_physical(self.current, raw)
    }

    /// Convert amps to a raw current object value.
    #[inline]
    pub fn current_to_raw(&self, amps: f32) -> Option<u16> {
        physical_to_raw(self.current, amps)
    }
}

fn raw_to_physical(nominal: f32, raw: u16) -> f32 {
    nominal * raw as f32 / NOMINAL_SCALE
}

/// Inverse of [`raw_to_physical`], rounded to the nearest raw step.
///
/// `None` if the result does not fit into 16 bits.
fn physical_to_raw(nominal: f32, value: f32) -> Option<u16> {
    // Round half up. `f32::round` needs std, and negative inputs are rejected anyway.
    let rounded = value * NOMINAL_SCALE / nominal + 0.5;
    if (0.0..u16::MAX as f32 + 1.0).contains(&rounded) {
        Some(rounded as u16)
    } else {
        None
    }
}
