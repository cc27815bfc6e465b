//! The packet-level radio operations the transport is built on.
//!
//! [`PacketRadio`] is implemented for any driver that implements the
//! [`rf24::radio::prelude`] traits with one error type, [`RF24`] included.

use embedded_hal::delay::DelayNs;
use rf24::{
    radio::prelude::{EsbFifo, EsbInit, EsbPower, EsbRadio, EsbStatus, RadioErrorType},
    StatusFlags,
};

use crate::fmt::warning;

pub use rf24::radio::{Nrf24Error, RadioConfig, RF24};

/// Microseconds between STATUS polls while a packet is in flight.
const TX_POLL_INTERVAL_US: u32 = 100;
/// STATUS polls before an in-flight packet is abandoned (100 ms).
const TX_POLL_LIMIT: u32 = 1_000;

/// A transceiver that moves single packets of at most
/// [`MAX_PACKET_SIZE`](crate::MAX_PACKET_SIZE) bytes.
pub trait PacketRadio {
    type Error;

    /// Initialize the radio and apply `config`.
    fn begin(&mut self, config: &RadioConfig) -> Result<(), Self::Error>;

    /// Enter RX mode.
    fn listen(&mut self) -> Result<(), Self::Error>;

    /// Leave RX mode so packets can be transmitted.
    fn stop_listening(&mut self) -> Result<(), Self::Error>;

    /// Transmit one packet and wait for the transmission to conclude.
    ///
    /// Returns `true` if the receiver acknowledged the packet.
    ///
    /// Unlike [`EsbRadio::send()`], this does not wait forever on a radio that
    /// never reports the outcome: after 100 ms the packet is flushed from the
    /// TX FIFO, CE is driven low, and `false` is returned.
    fn transmit<D: DelayNs>(
        &mut self,
        packet: &[u8],
        delay: &mut D,
    ) -> Result<bool, Self::Error>;

    /// Is a packet waiting in the RX FIFO?
    fn has_packet(&mut self) -> Result<bool, Self::Error>;

    /// Pop one packet into `buf` and return its length.
    fn receive(&mut self, buf: &mut [u8]) -> Result<u8, Self::Error>;

    fn sleep(&mut self) -> Result<(), Self::Error>;

    fn wake(&mut self) -> Result<(), Self::Error>;
}

impl<R, E> PacketRadio for R
where
    R: RadioErrorType<Error = E> + EsbInit + EsbRadio + EsbFifo + EsbPower + EsbStatus,
{
    type Error = E;

    fn begin(&mut self, config: &RadioConfig) -> Result<(), E> {
        self.init()?;
        self.with_config(config)
    }

    fn listen(&mut self) -> Result<(), E> {
        self.as_rx()
    }

    fn stop_listening(&mut self) -> Result<(), E> {
        self.as_tx(None)
    }

    fn transmit<D: DelayNs>(&mut self, packet: &[u8], delay: &mut D) -> Result<bool, E> {
        self.flush_tx()?;
        if !self.write(packet, false, true)? {
            return Ok(false);
        }
        let mut flags = StatusFlags::default();
        for _ in 0..TX_POLL_LIMIT {
            delay.delay_us(TX_POLL_INTERVAL_US);
            self.update()?;
            self.get_status_flags(&mut flags);
            if flags.tx_ds() || flags.tx_df() {
                return Ok(flags.tx_ds());
            }
        }
        warning!("transmission never concluded, packet dropped");
        // CE low ends active TX mode
        self.as_tx(None)?;
        self.flush_tx()?;
        Ok(false)
    }

    fn has_packet(&mut self) -> Result<bool, E> {
        self.available()
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<u8, E> {
        self.read(buf, None)
    }

    fn sleep(&mut self) -> Result<(), E> {
        self.power_down()
    }

    fn wake(&mut self) -> Result<(), E> {
        self.power_up(None)
    }
}
