use crate::radio::RadioConfig;

/// An object to configure the [`RadioTransmitter`](crate::transmitter::RadioTransmitter).
///
/// Like [`RadioConfig`], this follows a builder pattern:
/// ```
/// use rf24_transmitter::{radio::RadioConfig, TransmitterConfig};
///
/// let config = TransmitterConfig::default()
///     .with_radio(RadioConfig::default().with_channel(90))
///     .with_read_timeout(100_000);
/// assert_eq!(config.radio().channel(), 90);
/// assert_eq!(config.read_timeout(), 100_000);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TransmitterConfig {
    radio: RadioConfig,
    read_timeout_us: u32,
    poll_interval_us: u32,
    listen_after_send: bool,
}

impl Default for TransmitterConfig {
    /// | feature | default value |
    /// |--------:|:--------------|
    /// | [`TransmitterConfig::radio()`] | [`RadioConfig::default()`] with dynamic payloads, TX address `b"1Node"` and pipe 1 address `b"2Node"` |
    /// | [`TransmitterConfig::read_timeout()`] | `50000` (50 ms) |
    /// | [`TransmitterConfig::poll_interval()`] | `1000` (1 ms) |
    /// | [`TransmitterConfig::listen_after_send()`] | `true` |
    fn default() -> Self {
        Self {
            radio: RadioConfig::default()
                .with_dynamic_payloads(true)
                .with_tx_address(b"1Node")
                .with_rx_address(1, b"2Node"),
            read_timeout_us: 50_000,
            poll_interval_us: 1_000,
            listen_after_send: true,
        }
    }
}

impl TransmitterConfig {
    /// The radio configuration applied by
    /// [`RadioTransmitter::init()`](fn@crate::transmitter::RadioTransmitter::init).
    pub const fn radio(&self) -> &RadioConfig {
        &self.radio
    }

    pub fn with_radio(self, radio: RadioConfig) -> Self {
        Self { radio, ..self }
    }

    /// Returns the value set by [`TransmitterConfig::with_read_timeout()`].
    pub const fn read_timeout(&self) -> u32 {
        self.read_timeout_us
    }

    /// How long (in microseconds) a read waits for the rest of a frame once
    /// its first packet has arrived.
    ///
    /// A read never waits when no packet is pending.
    pub fn with_read_timeout(self, timeout_us: u32) -> Self {
        Self {
            read_timeout_us: timeout_us,
            ..self
        }
    }

    /// Returns the value set by [`TransmitterConfig::with_poll_interval()`].
    pub const fn poll_interval(&self) -> u32 {
        self.poll_interval_us
    }

    /// The time (in microseconds) between RX FIFO polls while waiting for
    /// the rest of a frame.
    ///
    /// This value is clamped to a minimum of 1.
    pub fn with_poll_interval(self, interval_us: u32) -> Self {
        Self {
            poll_interval_us: interval_us.max(1),
            ..self
        }
    }

    /// Returns the value set by [`TransmitterConfig::with_listen_after_send()`].
    pub const fn listen_after_send(&self) -> bool {
        self.listen_after_send
    }

    /// Return to RX mode after every transmission.
    ///
    /// When disabled the radio stays in TX mode until the next
    /// [`RadioTransmitter::power_up()`](fn@crate::transmitter::RadioTransmitter::power_up)
    /// or read.
    pub fn with_listen_after_send(self, enable: bool) -> Self {
        Self {
            listen_after_send: enable,
            ..self
        }
    }
}
