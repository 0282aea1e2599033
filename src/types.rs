//! This module contains the decoded forms of the PS 2000 B status objects.

use modular_bitfield::prelude::*;

use crate::{error::DecodeError, scaling::Nominal};

/// Represents the two possible power supply regulation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Constant voltage regulation mode.
    Cv,
    /// Constant current regulation mode.
    Cc,
}

/// Used to be less ambiguous and whether something is on or off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    /// Disabled.
    #[default]
    Off,
    /// Enabled.
    On,
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

/// Raw layout of the power supply control object (54).
#[bitfield(bytes = 2)]
#[derive(Debug, Clone, Copy, PartialEq)]
struct ControlBits {
    remote: bool,
    #[skip]
    __: B7,
    output_on: bool,
    #[skip]
    __: B7,
}

/// Raw layout of the first two bytes of the status objects (71 and 72).
#[bitfield(bytes = 2)]
#[derive(Debug, Clone, Copy, PartialEq)]
struct StatusBits {
    /// `0b00` is local operation, any other value is a remote mode.
    remote: B2,
    #[skip]
    __: B6,
    output_on: bool,
    /// `0b00` is CV, any other value is CC.
    regulation: B2,
    tracking: bool,
    ovp: bool,
    ocp: bool,
    opp: bool,
    otp: bool,
}

/// Decoded power supply control object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    /// Device is under remote control.
    pub remote: bool,
    /// Output is switched on.
    pub output_on: bool,
}

impl Control {
    pub(crate) fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let bytes = leading_bytes::<2>(payload)?;
        let bits = ControlBits::from_bytes(bytes);
        Ok(Self {
            remote: bits.remote(),
            output_on: bits.output_on(),
        })
    }
}

/// Decoded device state object, either actual values (71) or set values (72).
///
/// `voltage` and `current` are measured values for [`Ps2000::read_actual`](crate::psu::Ps2000::read_actual)
/// and setpoints for [`Ps2000::get_setpoints`](crate::psu::Ps2000::get_setpoints).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputStatus {
    /// Device is under remote control.
    pub remote: bool,
    /// Output is switched on.
    pub output_on: bool,
    /// Active regulation mode.
    pub control_mode: ControlMode,
    /// Tracking is active. Only meaningful on multi output models.
    pub tracking: bool,
    /// Over-voltage protection has tripped.
    pub ovp: bool,
    /// Over-current protection has tripped.
    pub ocp: bool,
    /// Over-power protection has tripped.
    pub opp: bool,
    /// Over-temperature protection has tripped.
    pub otp: bool,
    /// Voltage in volts.
    pub voltage: f32,
    /// Current in amps.
    pub current: f32,
}

impl OutputStatus {
    pub(crate) fn decode(payload: &[u8], nominal: &Nominal) -> Result<Self, DecodeError> {
        let bytes = leading_bytes::<6>(payload)?;
        let bits = StatusBits::from_bytes([bytes[0], bytes[1]]);
        let control_mode = if bits.regulation() != 0 {
            ControlMode::Cc
        } else {
            ControlMode::Cv
        };

        Ok(Self {
            remote: bits.remote() != 0,
            output_on: bits.output_on(),
            control_mode,
            tracking: bits.tracking(),
            ovp: bits.ovp(),
            ocp: bits.ocp(),
            opp: bits.opp(),
            otp: bits.otp(),
            voltage: nominal.raw_to_voltage(u16::from_be_bytes([bytes[2], bytes[3]])),
            current: nominal.raw_to_current(u16::from_be_bytes([bytes[4], bytes[5]])),
        })
    }

    /// Device is under local (front panel) control.
    pub fn local(&self) -> bool {
        !self.remote
    }

    /// Any protection has tripped.
    pub fn protection_tripped(&self) -> bool {
        self.ovp || self.ocp || self.opp || self.otp
    }
}

/// First `N` bytes of a payload, which must be at least that long.
fn leading_bytes<const N: usize>(payload: &[u8]) -> Result<[u8; N], DecodeError> {
    payload
        .get(..N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(DecodeError::Length {
            expected: N,
            received: payload.len(),
        })
}
