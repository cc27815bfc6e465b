#![doc = include_str!("../README.md")]
//!
//! ## Transport API
//!
//! - [`RadioTransmitter::new()`](fn@crate::transmitter::RadioTransmitter::new)
//! - [`RadioTransmitter::init()`](fn@crate::transmitter::RadioTransmitter::init)
//! - [`RadioTransmitter::send()`](fn@crate::transmitter::RadioTransmitter::send)
//! - [`RadioTransmitter::read()`](fn@crate::transmitter::RadioTransmitter::read)
//! - [`RadioTransmitter::has_input_data()`](fn@crate::transmitter::RadioTransmitter::has_input_data)
//! - [`RadioTransmitter::power_up()`](fn@crate::transmitter::RadioTransmitter::power_up)
//! - [`RadioTransmitter::power_down()`](fn@crate::transmitter::RadioTransmitter::power_down)
//! - [`RadioTransmitter::ping()`](fn@crate::transmitter::RadioTransmitter::ping)
//! - [`RadioTransmitter::read_raw()`](fn@crate::transmitter::RadioTransmitter::read_raw)
//!
//! ## Documents
//!
//! - [`JsonDocument::from_value()`](fn@crate::document::JsonDocument::from_value)
//! - [`JsonDocument::serialize()`](fn@crate::document::JsonDocument::serialize)
//! - [`JsonDocument::deserialize()`](fn@crate::document::JsonDocument::deserialize)
//! - [`JsonDocument::set_bytes()`](fn@crate::document::JsonDocument::set_bytes)
//!
//! ## Radio
//!
//! The transport drives any [`PacketRadio`](trait@crate::radio::PacketRadio).
//! That trait is implemented for the [`rf24`] driver's
//! [`RF24`](struct@crate::radio::RF24), and for any other radio implementing
//! the `rf24::radio::prelude` traits.
//!
#![no_std]

mod fmt;

mod config;
pub use config::TransmitterConfig;
pub mod document;
pub mod frame;
pub mod radio;
pub mod transmitter;

pub use rf24::{CrcLength, DataRate, PaLevel};

/// The largest payload (in bytes) of a single radio packet.
pub const MAX_PACKET_SIZE: usize = 32;
