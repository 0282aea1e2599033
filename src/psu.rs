use core::ops::{Deref, DerefMut};

use log::{debug, warn};

use crate::{
    error::{Error, Result},
    object::{Access, Encoding, PsObject},
    scaling::Nominal,
    transfer::{
        self, DeviceString, ObjectLink, Payload, as_float, as_integer, as_string, encode_binary,
        encode_integer,
    },
    types::{Control, OutputStatus, State},
};

/// Mask/value bits of the control object (54).
mod control_bits {
    pub const OUTPUT_ON: u8 = 0x01;
    pub const REMOTE: u8 = 0x10;
}

/// Device type reported by the PS 2042-10B.
pub const DEFAULT_DEVICE_TYPE: &str = "PS 2042";

/// Decoded value of any object, see [`Ps2000::get_object`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectValue {
    String(DeviceString),
    Float(f32),
    Integer(u16),
    Binary(Payload),
}

impl ObjectValue {
    /// Raw bytes of a bit field object, `None` for the other encodings.
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            ObjectValue::Binary(payload) => Some(transfer::as_binary(payload.as_bytes())),
            _ => None,
        }
    }
}

/// You can open a Ps2000 using any interface which implements [embedded_io::Read] & [embedded_io::Write].
///
/// The interface must be configured as described in [`crate::link::LinkSettings`], in particular its
/// reads must time out, as the end of every reply is detected by a read timeout.
///
/// For it's methods, we generally use the nomenclature that "set" meant to write a configuration and "get" means to read
/// back a configuration value. Where as "read" means to get a measured value.
pub struct Ps2000<S: embedded_io::Read + embedded_io::Write> {
    link: ObjectLink<S>,
    /// Read once in [`Self::open`], every voltage and current is scaled by these.
    nominal: Nominal,
}

impl<S: embedded_io::Read + embedded_io::Write> Ps2000<S> {
    /// Open a session on the given interface.
    ///
    /// Nominal voltage and current are queried straight away. If either query
    /// fails, so does opening the session.
    pub fn open(interface: S) -> Result<Self, S::Error> {
        let mut link = ObjectLink::new(interface);

        let voltage = as_float(link.query(PsObject::NominalVoltage)?.as_bytes())?;
        let current = as_float(link.query(PsObject::NominalCurrent)?.as_bytes())?;
        let nominal = Nominal::new(voltage, current).ok_or(Error::InvalidNominal)?;
        debug!("session opened, nominal {voltage} V / {current} A");

        Ok(Self { link, nominal })
    }

    /// Close the session and return the interface.
    ///
    /// Remote control is left as it is, see [`Self::remote_session`] for a session that hands control back.
    pub fn close(self) -> S {
        self.link.release()
    }

    /// Nominal ratings cached when the session was opened.
    pub fn nominal(&self) -> Nominal {
        self.nominal
    }

    /// Switch to remote control and return a guard which switches back to local control when dropped.
    ///
    /// Use [`RemoteSession::finish`] to find out whether handing back control worked, dropping the guard
    /// can only log a failure.
    pub fn remote_session(&mut self) -> Result<RemoteSession<'_, S>, S::Error> {
        self.set_remote(true)?;
        Ok(RemoteSession {
            psu: self,
            finished: false,
        })
    }

    /// Return the device type, e.g. `PS 2042-10B`.
    pub fn get_device_type(&mut self) -> Result<DeviceString, S::Error> {
        self.get_string(PsObject::DeviceType)
    }

    /// Return the serial number.
    pub fn get_serial_number(&mut self) -> Result<DeviceString, S::Error> {
        self.get_string(PsObject::SerialNumber)
    }

    /// Return the nominal voltage in volts, as reported by the device now.
    ///
    /// [`Self::nominal`] returns the value cached at session start without a transfer.
    pub fn get_nominal_voltage(&mut self) -> Result<f32, S::Error> {
        self.get_float(PsObject::NominalVoltage)
    }

    /// Return the nominal current in amps.
    pub fn get_nominal_current(&mut self) -> Result<f32, S::Error> {
        self.get_float(PsObject::NominalCurrent)
    }

    /// Return the nominal power in watts.
    pub fn get_nominal_power(&mut self) -> Result<f32, S::Error> {
        self.get_float(PsObject::NominalPower)
    }

    /// Return the article number.
    pub fn get_article_number(&mut self) -> Result<DeviceString, S::Error> {
        self.get_string(PsObject::ArticleNumber)
    }

    /// Return the manufacturer.
    pub fn get_manufacturer(&mut self) -> Result<DeviceString, S::Error> {
        self.get_string(PsObject::Manufacturer)
    }

    /// Return the software version.
    pub fn get_software_version(&mut self) -> Result<DeviceString, S::Error> {
        self.get_string(PsObject::SoftwareVersion)
    }

    /// Return the device class.
    pub fn get_device_class(&mut self) -> Result<u16, S::Error> {
        self.get_integer(PsObject::DeviceClass)
    }

    /// Get the over-voltage protection threshold in volts.
    pub fn get_ovp_threshold(&mut self) -> Result<f32, S::Error> {
        let raw = self.get_integer(PsObject::OvpThreshold)?;
        Ok(self.nominal.raw_to_voltage(raw))
    }

    /// Set the over-voltage protection threshold in volts.
    pub fn set_ovp_threshold(&mut self, volts: f32) -> Result<(), S::Error> {
        let raw = self.nominal.voltage_to_raw(volts).ok_or(Error::InvalidRange)?;
        self.set_integer(PsObject::OvpThreshold, raw)
    }

    /// Get the over-current protection threshold in amps.
    pub fn get_ocp_threshold(&mut self) -> Result<f32, S::Error> {
        let raw = self.get_integer(PsObject::OcpThreshold)?;
        Ok(self.nominal.raw_to_current(raw))
    }

    /// Set the over-current protection threshold in amps.
    pub fn set_ocp_threshold(&mut self, amps: f32) -> Result<(), S::Error> {
        let raw = self.nominal.current_to_raw(amps).ok_or(Error::InvalidRange)?;
        self.set_integer(PsObject::OcpThreshold, raw)
    }

    /// Get the output target voltage in volts.
    pub fn get_voltage_setpoint(&mut self) -> Result<f32, S::Error> {
        let raw = self.get_integer(PsObject::VoltageSetpoint)?;
        Ok(self.nominal.raw_to_voltage(raw))
    }

    /// Set the output target voltage in volts.
    ///
    /// Needs remote control. The device rejects values above the OVP threshold.
    pub fn set_voltage(&mut self, volts: f32) -> Result<(), S::Error> {
        let raw = self.nominal.voltage_to_raw(volts).ok_or(Error::InvalidRange)?;
        self.set_integer(PsObject::VoltageSetpoint, raw)
    }

    /// Get the output current limit in amps.
    pub fn get_current_setpoint(&mut self) -> Result<f32, S::Error> {
        let raw = self.get_integer(PsObject::CurrentSetpoint)?;
        Ok(self.nominal.raw_to_current(raw))
    }

    /// Set the output current limit in amps.
    pub fn set_current(&mut self, amps: f32) -> Result<(), S::Error> {
        let raw = self.nominal.current_to_raw(amps).ok_or(Error::InvalidRange)?;
        self.set_integer(PsObject::CurrentSetpoint, raw)
    }

    /// Read the power supply control object.
    pub fn get_control(&mut self) -> Result<Control, S::Error> {
        let payload = self.link.query(PsObject::ControlObject)?;
        Ok(Control::decode(payload.as_bytes())?)
    }

    /// Return whether the device is under remote control.
    pub fn get_remote(&mut self) -> Result<bool, S::Error> {
        Ok(self.get_control()?.remote)
    }

    /// Enter or leave remote control.
    ///
    /// Writes to setpoints and the output are only accepted under remote control.
    pub fn set_remote(&mut self, remote: impl Into<State>) -> Result<(), S::Error> {
        let remote = bool::from(remote.into());
        self.set_control(control_bits::REMOTE, remote)?;
        debug!("remote control {}", if remote { "on" } else { "off" });
        Ok(())
    }

    /// Enter or leave local control. The inverse of [`Self::set_remote`].
    pub fn set_local(&mut self, local: impl Into<State>) -> Result<(), S::Error> {
        self.set_remote(!bool::from(local.into()))
    }

    /// Read whether the output is enabled or disabled.
    pub fn get_output_on(&mut self) -> Result<bool, S::Error> {
        Ok(self.get_control()?.output_on)
    }

    /// Enable/disable the output.
    pub fn set_output_on(&mut self, on: impl Into<State>) -> Result<(), S::Error> {
        self.set_control(control_bits::OUTPUT_ON, bool::from(on.into()))
    }

    /// Disable/enable the output. The inverse of [`Self::set_output_on`].
    pub fn set_output_off(&mut self, off: impl Into<State>) -> Result<(), S::Error> {
        self.set_output_on(!bool::from(off.into()))
    }

    /// Return device state plus measured output voltage and current.
    pub fn read_actual(&mut self) -> Result<OutputStatus, S::Error> {
        let payload = self.link.query(PsObject::StatusActual)?;
        Ok(OutputStatus::decode(payload.as_bytes(), &self.nominal)?)
    }

    /// Return device state plus voltage and current setpoints.
    pub fn get_setpoints(&mut self) -> Result<OutputStatus, S::Error> {
        let payload = self.link.query(PsObject::StatusSetValues)?;
        Ok(OutputStatus::decode(payload.as_bytes(), &self.nominal)?)
    }

    /// Return whether the device type contains `target`, e.g. [`DEFAULT_DEVICE_TYPE`].
    pub fn check_available(&mut self, target: &str) -> Result<bool, S::Error> {
        Ok(self.get_device_type()?.contains(target))
    }

    /// Read any object and decode it according to its encoding.
    ///
    /// Integers are returned raw, without nominal scaling.
    pub fn get_object(&mut self, object: PsObject) -> Result<ObjectValue, S::Error> {
        let payload = self.link.query(object)?;
        let value = match object.encoding() {
            Encoding::String => ObjectValue::String(as_string(payload.as_bytes())?),
            Encoding::Float => ObjectValue::Float(as_float(payload.as_bytes())?),
            Encoding::Integer => ObjectValue::Integer(as_integer(payload.as_bytes())?),
            Encoding::Binary => ObjectValue::Binary(payload),
        };
        Ok(value)
    }

    /// Read the raw data block of an object.
    pub fn get_binary(&mut self, object: PsObject) -> Result<Payload, S::Error> {
        self.link.query(object)
    }

    /// Write a raw `[mask, value]` data block to a bit field object.
    pub fn set_binary(&mut self, object: PsObject, mask: u8, data: u8) -> Result<(), S::Error> {
        debug_assert!(object.access() == Access::ReadWrite);
        self.link.send(object, &encode_binary(mask, data))
    }

    fn set_control(&mut self, mask: u8, enable: bool) -> Result<(), S::Error> {
        let data = if enable { mask } else { 0x00 };
        self.set_binary(PsObject::ControlObject, mask, data)
    }

    fn get_string(&mut self, object: PsObject) -> Result<DeviceString, S::Error> {
        let payload = self.link.query(object)?;
        Ok(as_string(payload.as_bytes())?)
    }

    fn get_float(&mut self, object: PsObject) -> Result<f32, S::Error> {
        let payload = self.link.query(object)?;
        Ok(as_float(payload.as_bytes())?)
    }

    fn get_integer(&mut self, object: PsObject) -> Result<u16, S::Error> {
        let payload = self.link.query(object)?;
        Ok(as_integer(payload.as_bytes())?)
    }

    fn set_integer(&mut self, object: PsObject, value: u16) -> Result<(), S::Error> {
        debug_assert!(object.access() == Access::ReadWrite);
        self.link.send(object, &encode_integer(value))
    }

    #[cfg(test)]
    fn interface(&self) -> &S {
        self.link.interface()
    }
}

/// A [`Ps2000`] under remote control. Local control is restored when this is dropped.
pub struct RemoteSession<'a, S: embedded_io::Read + embedded_io::Write> {
    psu: &'a mut Ps2000<S>,
    finished: bool,
}

impl<S: embedded_io::Read + embedded_io::Write> RemoteSession<'_, S> {
    /// Hand control back to the front panel and report whether that worked.
    pub fn finish(mut self) -> Result<(), S::Error> {
        self.finished = true;
        self.psu.set_remote(false)
    }
}

impl<S: embedded_io::Read + embedded_io::Write> Deref for RemoteSession<'_, S> {
    type Target = Ps2000<S>;

    fn deref(&self) -> &Self::Target {
        self.psu
    }
}

impl<S: embedded_io::Read + embedded_io::Write> DerefMut for RemoteSession<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.psu
    }
}

impl<S: embedded_io::Read + embedded_io::Write> Drop for RemoteSession<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.psu.set_remote(false) {
                warn!("failed to restore local control: {e}");
            }
        }
    }
}
