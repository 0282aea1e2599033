//! This crate provides an interface for communicating with and controlling the Elektro-Automatik PS 2000 B series of
//! programmable power supplies.
//!
//! It supports `no-std` environments by use of the `no_std` feature flag.
//!
//! Models which this should work with:
//! * PS 2042-06B
//! * PS 2042-10B
//! * PS 2042-20B
//! * PS 2084-03B
//! * PS 2084-05B
//!
//! Only single output models are supported. Triple output models use the same protocol with node numbers per output.
//!
//! It uses the vendor's binary telegram protocol over the USB virtual COM port. The serial port used for PSU comms should
//! be configured like so (see [`link::LinkSettings`]):
//! * Baud rate: 115200
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: Odd
//! * Read timeout: 60 ms
//!
//! The layers, from the wire up:
//! * [`telegram`] - framing, checksums and device error codes.
//! * [`transfer`] - one request/reply exchange and payload decoding.
//! * [`psu`] - the [`psu::Ps2000`] session with typed accessors for every supported object.

#![cfg_attr(feature = "no_std", no_std)]

#[cfg(all(test, feature = "no_std"))]
extern crate std;

pub mod error;
pub mod link;
pub mod object;
pub mod psu;
pub mod scaling;
pub mod telegram;
pub mod transfer;
pub mod types;

#[cfg(test)]
mod mock_serial;
