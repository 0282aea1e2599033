//! This module is used to define the objects of the PS 2000 B that this crate uses.
//!
//! Object numbers and encodings follow the vendor's object list for the PS 2000 B series.
//! Objects not listed here (e.g. 5, 7, 40-49) exist on the device but are not used.

use strum_macros::EnumIter;

/// Encoding of an object's data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// NUL terminated ASCII.
    String,
    /// IEEE-754 single precision, big endian.
    Float,
    /// Unsigned 16 bit integer, big endian.
    Integer,
    /// Bit field or a mix of bit field and integers.
    Binary,
}

/// Whether the device accepts writes to an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    ReadWrite,
}

#[derive(Debug, Copy, Clone, EnumIter, PartialEq, Eq)]
#[repr(u8)]
pub enum PsObject {
    /// __R__ - Device type, e.g. `"PS 2042-10B"`.
    DeviceType = 0,
    /// __R__ - Serial number.
    SerialNumber = 1,
    /// __R__ - Nominal (rated) voltage in volts.
    NominalVoltage = 2,
    /// __R__ - Nominal (rated) current in amps.
    NominalCurrent = 3,
    /// __R__ - Nominal (rated) power in watts.
    NominalPower = 4,
    /// __R__ - Article number.
    ArticleNumber = 6,
    /// __R__ - Manufacturer.
    Manufacturer = 8,
    /// __R__ - Software version.
    SoftwareVersion = 9,
    /// __R__ - Device class. `0x0010` for single output PS 2000 B models.
    DeviceClass = 19,
    /// __R/W__ - Over-voltage protection threshold.
    ///
    /// Percent of nominal voltage * 256. See [`crate::scaling`].
    OvpThreshold = 38,
    /// __R/W__ - Over-current protection threshold.
    ///
    /// Percent of nominal current * 256.
    OcpThreshold = 39,
    /// __R/W__ - Voltage setpoint.
    ///
    /// Percent of nominal voltage * 256.
    VoltageSetpoint = 50,
    /// __R/W__ - Current setpoint.
    ///
    /// Percent of nominal current * 256.
    CurrentSetpoint = 51,
    /// __R/W__ - Power supply control.
    ///
    /// Written as `[mask, value]`:
    /// * `0x01` - Output on/off.
    /// * `0x0A` - Acknowledge alarms.
    /// * `0x10` - Remote control on/off.
    /// * `0x20` - Tracking (multi output models).
    ControlObject = 54,
    /// __R__ - Device state plus actual voltage and current.
    StatusActual = 71,
    /// __R__ - Device state plus voltage and current setpoints.
    StatusSetValues = 72,
}

impl PsObject {
    pub const fn encoding(&self) -> Encoding {
        use PsObject as O;
        match self {
            O::DeviceType
            | O::SerialNumber
            | O::ArticleNumber
            | O::Manufacturer
            | O::SoftwareVersion => Encoding::String,
            O::NominalVoltage | O::NominalCurrent | O::NominalPower => Encoding::Float,
            O::DeviceClass
            | O::OvpThreshold
            | O::OcpThreshold
            | O::VoltageSetpoint
            | O::CurrentSetpoint => Encoding::Integer,
            O::ControlObject | O::StatusActual | O::StatusSetValues => Encoding::Binary,
        }
    }

    pub const fn access(&self) -> Access {
        use PsObject as O;
        match self {
            O::OvpThreshold
            | O::OcpThreshold
            | O::VoltageSetpoint
            | O::CurrentSetpoint
            | O::ControlObject => Access::ReadWrite,
            _ => Access::Read,
        }
    }
}

impl From<PsObject> for u8 {
    fn from(value: PsObject) -> Self {
        value as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn object_numbers() {
        let numbers: heapless::Vec<u8, 32> = PsObject::iter().map(u8::from).collect();
        assert_eq!(
            numbers.as_slice(),
            [0, 1, 2, 3, 4, 6, 8, 9, 19, 38, 39, 50, 51, 54, 71, 72]
        );
    }

    #[test]
    fn writable_objects() {
        for object in PsObject::iter() {
            let writable = matches!(object.access(), Access::ReadWrite);
            assert_eq!(writable, matches!(u8::from(object), 38 | 39 | 50 | 51 | 54));
        }
    }

    #[test]
    fn writable_objects_are_integers_or_binary() {
        for object in PsObject::iter().filter(|o| o.access() == Access::ReadWrite) {
            assert!(matches!(
                object.encoding(),
                Encoding::Integer | Encoding::Binary
            ));
        }
    }
}
