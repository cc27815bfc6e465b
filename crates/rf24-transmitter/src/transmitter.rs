//! Framed transfer of [`JsonDocument`]s over an injected radio.
//!
//! ```no_run
//! # fn demo<SPI, CE, DELAY>(spi: SPI, ce: CE, delay: DELAY, radio_delay: DELAY)
//! # where
//! #     SPI: embedded_hal::spi::SpiDevice,
//! #     CE: embedded_hal::digital::OutputPin,
//! #     DELAY: embedded_hal::delay::DelayNs,
//! # {
//! use rf24_transmitter::{
//!     document::JsonDocument, radio::RF24, transmitter::RadioTransmitter, TransmitterConfig,
//! };
//!
//! let mut radio = RF24::new(ce, spi, radio_delay);
//! let mut link = RadioTransmitter::new(&mut radio, delay, TransmitterConfig::default());
//! link.init().unwrap();
//!
//! let doc: JsonDocument = JsonDocument::from_value(&[1, 2, 3]).unwrap();
//! let acked = link.send(&doc).unwrap();
//!
//! let mut incoming: JsonDocument = JsonDocument::new();
//! if link.read(&mut incoming).unwrap() {
//!     let values: [u8; 3] = incoming.deserialize().unwrap();
//! }
//! # }
//! ```

use embedded_hal::delay::DelayNs;

use crate::{
    document::{DocumentError, JsonDocument, MSG_SIZE},
    fmt::{debug, info, trace, warning},
    frame::{contains_marker, DecodeStatus, FrameDecoder, FrameEncoder, PING_PACKET},
    radio::PacketRadio,
    TransmitterConfig, MAX_PACKET_SIZE,
};

/// Errors returned by [`RadioTransmitter`] operations that take a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<E> {
    /// The radio reported an error.
    Radio(E),
    /// The received frame could not be stored in the output document.
    Document(DocumentError),
    /// Refused to send an empty document.
    EmptyPayload,
    /// Refused to send a document that would form a frame marker on air.
    /// See [`contains_marker()`].
    MarkerInPayload,
    /// Refused to send a document containing a `0x00` byte, which a
    /// receiver could take for packet padding.
    NulInPayload,
}

impl<E> From<DocumentError> for TransportError<E> {
    fn from(value: DocumentError) -> Self {
        TransportError::Document(value)
    }
}

/// A framed transport borrowing an externally owned radio.
///
/// The radio is borrowed exclusively for the lifetime `'r`; use
/// [`RadioTransmitter::release()`] to end the borrow. `N` is the largest
/// document (in bytes) this transport sends or accepts.
pub struct RadioTransmitter<'r, R, D, const N: usize = MSG_SIZE> {
    radio: &'r mut R,
    delay: D,
    config: TransmitterConfig,
    decoder: FrameDecoder<N>,
    listening: bool,
}

impl<'r, R, D, const N: usize> RadioTransmitter<'r, R, D, N> {
    /// Create a transport. This does not talk to the radio; call
    /// [`RadioTransmitter::init()`] before anything else.
    ///
    /// The `delay` paces [`RadioTransmitter::read()`] while it waits for the
    /// rest of a frame, and each transmission while it waits for an ACK.
    pub fn new(radio: &'r mut R, delay: D, config: TransmitterConfig) -> Self {
        Self {
            radio,
            delay,
            config,
            decoder: FrameDecoder::new(),
            listening: false,
        }
    }

    /// Is the transport (meant to be) in RX mode?
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn config(&self) -> &TransmitterConfig {
        &self.config
    }

    /// Give back the delay implementation and end the borrow of the radio.
    pub fn release(self) -> D {
        self.delay
    }
}

impl<'r, R, D, const N: usize> RadioTransmitter<'r, R, D, N>
where
    R: PacketRadio,
    D: DelayNs,
{
    /// Initialize the radio, apply [`TransmitterConfig::radio()`], and start listening.
    pub fn init(&mut self) -> Result<(), R::Error> {
        self.radio.begin(self.config.radio())?;
        self.decoder.reset();
        self.listen()?;
        info!("transmitter ready on channel {=u8}", self.config.radio().channel());
        Ok(())
    }

    fn listen(&mut self) -> Result<(), R::Error> {
        self.radio.listen()?;
        self.listening = true;
        Ok(())
    }

    fn after_send(&mut self) -> Result<(), R::Error> {
        if self.config.listen_after_send() {
            self.listen()
        } else {
            Ok(())
        }
    }

    /// Transmit `doc` as one frame.
    ///
    /// Returns `true` only if every packet of the frame was acknowledged.
    /// Transmission stops at the first packet that is not.
    pub fn send(&mut self, doc: &JsonDocument<N>) -> Result<bool, TransportError<R::Error>> {
        let payload = doc.as_bytes();
        if payload.is_empty() {
            return Err(TransportError::EmptyPayload);
        }
        if payload.contains(&0) {
            return Err(TransportError::NulInPayload);
        }
        if contains_marker(payload) {
            return Err(TransportError::MarkerInPayload);
        }
        self.radio.stop_listening().map_err(TransportError::Radio)?;
        self.listening = false;

        let packets = FrameEncoder::new(payload);
        trace!("sending frame of {=usize} packets", packets.packet_count());
        let mut acked = true;
        for (index, packet) in packets.enumerate() {
            if !self
                .radio
                .transmit(packet, &mut self.delay)
                .map_err(TransportError::Radio)?
            {
                warning!("packet {=usize} of frame not acknowledged", index);
                acked = false;
                break;
            }
        }
        if acked {
            debug!("sent frame with {=usize} byte payload", payload.len());
        }
        self.after_send().map_err(TransportError::Radio)?;
        Ok(acked)
    }

    /// Receive one frame into `doc`.
    ///
    /// Returns `false` without waiting if no packet is pending. Once a frame
    /// has started, waits up to [`TransmitterConfig::read_timeout()`] for each
    /// of its following packets. `doc` is only modified when `true` is returned.
    ///
    /// Bytes that followed the end marker in the frame's last packet are kept
    /// and read first by the next call.
    pub fn read(&mut self, doc: &mut JsonDocument<N>) -> Result<bool, TransportError<R::Error>> {
        if !self.listening {
            self.listen().map_err(TransportError::Radio)?;
        }
        if !self.has_input_data().map_err(TransportError::Radio)? {
            return Ok(false);
        }

        let mut packet = [0u8; MAX_PACKET_SIZE];
        let mut waited = 0u32;
        loop {
            let status = if self.decoder.has_pending() {
                self.decoder.resume()
            } else if self.radio.has_packet().map_err(TransportError::Radio)? {
                waited = 0;
                let len = self
                    .radio
                    .receive(&mut packet)
                    .map_err(TransportError::Radio)?;
                trace!("received {=u8} byte packet", len);
                self.decoder.push(&packet[..len as usize])
            } else if !self.decoder.is_collecting() {
                // only stray packets were pending
                return Ok(false);
            } else if waited >= self.config.read_timeout() {
                warning!("timed out waiting for end of frame");
                self.decoder.reset();
                return Ok(false);
            } else {
                let interval = self.config.poll_interval();
                self.delay.delay_us(interval);
                waited = waited.saturating_add(interval);
                continue;
            };
            match status {
                DecodeStatus::Pending => (),
                DecodeStatus::Restarted => {
                    debug!("frame restarted, partial frame dropped");
                }
                DecodeStatus::Overflow => {
                    warning!("frame exceeds {=usize} bytes, dropped", N);
                    return Ok(false);
                }
                DecodeStatus::Complete => {
                    let payload = self.decoder.payload();
                    if payload.is_empty() {
                        warning!("empty frame dropped");
                        return Ok(false);
                    }
                    doc.set_bytes(payload)?;
                    debug!("received frame with {=usize} byte payload", doc.len());
                    return Ok(true);
                }
            }
        }
    }

    /// Is a packet waiting to be read? This never blocks.
    ///
    /// This includes bytes left over from the packet that ended the last frame.
    pub fn has_input_data(&mut self) -> Result<bool, R::Error> {
        if self.decoder.has_pending() {
            return Ok(true);
        }
        self.radio.has_packet()
    }

    /// Put the radio to sleep. Configuration is retained.
    pub fn power_down(&mut self) -> Result<(), R::Error> {
        self.radio.sleep()?;
        debug!("radio powered down");
        Ok(())
    }

    /// Wake the radio and, if the transport was listening, resume RX mode.
    pub fn power_up(&mut self) -> Result<(), R::Error> {
        self.radio.wake()?;
        if self.listening {
            self.radio.listen()?;
        }
        debug!("radio powered up");
        Ok(())
    }

    /// Send a single ping packet and report whether the peer acknowledged it.
    ///
    /// The ping lies outside any frame, so a peer's
    /// [`RadioTransmitter::read()`] discards it.
    pub fn ping(&mut self) -> Result<bool, R::Error> {
        self.radio.stop_listening()?;
        self.listening = false;
        let acked = self.radio.transmit(PING_PACKET, &mut self.delay)?;
        debug!("ping acknowledged: {=bool}", acked);
        self.after_send()?;
        Ok(acked)
    }

    /// Pop one packet into `buf` without any framing.
    ///
    /// Returns `None` if no packet is pending, otherwise the number of bytes
    /// written to `buf`.
    pub fn read_raw(&mut self, buf: &mut [u8]) -> Result<Option<usize>, R::Error> {
        if !self.radio.has_packet()? {
            return Ok(None);
        }
        let len = self.radio.receive(buf)?;
        info!("raw packet of {=u8} bytes", len);
        Ok(Some(len as usize))
    }
}
