//! Marker-delimited framing of a payload over 32-byte radio packets.
//!
//! A frame on air is the start marker packet, the payload split into packets of
//! at most [`MAX_PACKET_SIZE`] bytes, and the end marker packet:
//!
//! ```text
//! [#~~~START~~~#\0] [payload 0..32] [payload 32..64] ... [#~~~END~~~#\0]
//! ```
//!
//! The markers keep their C string terminator so deployed firmware, which
//! transmits `sizeof(marker)` bytes, interoperates with this crate. There is
//! no length prefix: a payload must never contain either marker, nor end in
//! `#~~~END~~~` (see [`contains_marker()`]). Trailing
//! `0x00` bytes of every packet are dropped as padding, so a payload must not
//! contain `0x00` either. Serialized JSON never does.
//!
//! A packet may carry the end of one frame and the start of the next: the
//! bytes after an end marker are kept for the next frame.

use heapless::Vec;

use crate::MAX_PACKET_SIZE;

/// The marker opening every frame.
pub const START_MARKER: &[u8] = b"#~~~START~~~#";
/// The marker closing every frame.
pub const END_MARKER: &[u8] = b"#~~~END~~~#";
/// The packet sent by [`RadioTransmitter::ping()`](fn@crate::transmitter::RadioTransmitter::ping).
///
/// It never appears inside a frame, so receivers discard it.
pub const PING_MARKER: &[u8] = b"#~~~PING~~~#";

pub(crate) const PING_PACKET: &[u8] = b"#~~~PING~~~#\0";
const START_PACKET: &[u8] = b"#~~~START~~~#\0";
const END_PACKET: &[u8] = b"#~~~END~~~#\0";

/// Would a receiver find a marker inside the frame carrying `payload`?
///
/// Besides whole markers, this catches a payload that runs into the end
/// marker packet to form a marker, such as one ending in `#~~~END~~~`.
/// ```
/// use rf24_transmitter::frame::contains_marker;
///
/// assert!(contains_marker(b"x#~~~END~~~#y"));
/// assert!(contains_marker(b"x#~~~END~~~"));
/// assert!(!contains_marker(b"x#~~~END~~"));
/// assert!(!contains_marker(br##"{"tag":"#1"}"##));
/// ```
pub fn contains_marker(payload: &[u8]) -> bool {
    (0..payload.len()).any(|at| {
        [START_MARKER, END_MARKER].iter().any(|marker| {
            payload[at..]
                .iter()
                .chain(END_MARKER)
                .take(marker.len())
                .eq(marker.iter())
        })
    })
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Stage {
    Start,
    Body(usize),
    End,
    Done,
}

/// An iterator over the packets of one frame.
///
/// ```
/// use rf24_transmitter::frame::FrameEncoder;
///
/// let packets: Vec<&[u8]> = FrameEncoder::new(b"{}").collect();
/// let expected: [&[u8]; 3] = [b"#~~~START~~~#\0", b"{}", b"#~~~END~~~#\0"];
/// assert_eq!(packets, expected);
/// ```
#[derive(Clone, Debug)]
pub struct FrameEncoder<'a> {
    payload: &'a [u8],
    stage: Stage,
}

impl<'a> FrameEncoder<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            stage: Stage::Start,
        }
    }

    /// The number of packets this frame occupies on air.
    pub fn packet_count(&self) -> usize {
        (self.payload.len() + MAX_PACKET_SIZE - 1) / MAX_PACKET_SIZE + 2
    }
}

impl<'a> Iterator for FrameEncoder<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        match self.stage {
            Stage::Start => {
                self.stage = if self.payload.is_empty() {
                    Stage::End
                } else {
                    Stage::Body(0)
                };
                Some(START_PACKET)
            }
            Stage::Body(offset) => {
                let end = (offset + MAX_PACKET_SIZE).min(self.payload.len());
                self.stage = if end == self.payload.len() {
                    Stage::End
                } else {
                    Stage::Body(end)
                };
                Some(&self.payload[offset..end])
            }
            Stage::End => {
                self.stage = Stage::Done;
                Some(END_PACKET)
            }
            Stage::Done => None,
        }
    }
}

/// The outcome of feeding a packet to a [`FrameDecoder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeStatus {
    /// No complete frame yet.
    Pending,
    /// A frame was closed; its payload is available from [`FrameDecoder::payload()`].
    Complete,
    /// The frame's payload exceeded the decoder's capacity and was dropped.
    Overflow,
    /// A start marker arrived inside an unfinished frame. The partial frame was
    /// dropped and the new frame is being collected.
    Restarted,
}

/// Reassembles frames from a stream of packets.
///
/// Markers are matched across packet boundaries, and trailing `0x00` bytes
/// (C string terminators or static payload padding) are stripped from every
/// packet before scanning. Bytes outside a frame are discarded.
#[derive(Clone, Debug, Default)]
pub struct FrameDecoder<const N: usize> {
    payload: Vec<u8, N>,
    /// Bytes that followed the last end marker, not scanned yet.
    carry: Vec<u8, MAX_PACKET_SIZE>,
    /// Bytes that may still turn out to be the end marker.
    held: Vec<u8, 11>,
    /// The latest bytes seen, compared against the start marker.
    window: Vec<u8, 13>,
    collecting: bool,
    complete: bool,
}

impl<const N: usize> FrameDecoder<N> {
    pub const fn new() -> Self {
        Self {
            payload: Vec::new(),
            carry: Vec::new(),
            held: Vec::new(),
            window: Vec::new(),
            collecting: false,
            complete: false,
        }
    }

    /// Is a frame currently open (start marker seen, end marker not yet)?
    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// The payload of the last completed frame.
    ///
    /// This is empty unless the last [`FrameDecoder::push()`] or
    /// [`FrameDecoder::resume()`] returned [`DecodeStatus::Complete`].
    pub fn payload(&self) -> &[u8] {
        if self.complete {
            &self.payload
        } else {
            &[]
        }
    }

    /// Are there bytes left over from the packet that completed the last
    /// frame? Scan them with [`FrameDecoder::resume()`].
    pub fn has_pending(&self) -> bool {
        !self.carry.is_empty()
    }

    /// Forget any partial or completed frame and any left over bytes.
    pub fn reset(&mut self) {
        self.payload.clear();
        self.carry.clear();
        self.held.clear();
        self.window.clear();
        self.collecting = false;
        self.complete = false;
    }

    /// Feed one received packet.
    ///
    /// Bytes left over from the previous packet (see
    /// [`FrameDecoder::has_pending()`]) are scanned first.
    pub fn push(&mut self, packet: &[u8]) -> DecodeStatus {
        let len = packet.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        let carry = core::mem::take(&mut self.carry);
        self.scan(carry.iter().chain(&packet[..len]).copied())
    }

    /// Scan the bytes that followed the last end marker, as if they were
    /// a packet of their own.
    pub fn resume(&mut self) -> DecodeStatus {
        let carry = core::mem::take(&mut self.carry);
        self.scan(carry.iter().copied())
    }

    fn scan(&mut self, mut bytes: impl Iterator<Item = u8>) -> DecodeStatus {
        if self.complete {
            self.payload.clear();
            self.complete = false;
        }
        let mut status = DecodeStatus::Pending;
        while let Some(byte) = bytes.next() {
            if self.slide_window(byte) {
                if self.collecting {
                    status = DecodeStatus::Restarted;
                }
                self.payload.clear();
                self.held.clear();
                self.collecting = true;
                continue;
            }
            if !self.collecting {
                continue;
            }
            if self.held.is_full() {
                let oldest = self.held.remove(0);
                if self.payload.push(oldest).is_err() {
                    self.reset();
                    return DecodeStatus::Overflow;
                }
            }
            // cannot fail: a slot was freed above
            let _ = self.held.push(byte);
            if self.held.as_slice() == END_MARKER {
                self.held.clear();
                self.window.clear();
                self.collecting = false;
                self.complete = true;
                for rest in bytes {
                    if self.carry.push(rest).is_err() {
                        break;
                    }
                }
                return DecodeStatus::Complete;
            }
        }
        status
    }

    /// Append `byte` to the window and report whether it now holds the start marker.
    fn slide_window(&mut self, byte: u8) -> bool {
        if self.window.is_full() {
            self.window.remove(0);
        }
        let _ = self.window.push(byte);
        if self.window.as_slice() == START_MARKER {
            self.window.clear();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::{
        contains_marker, DecodeStatus, FrameDecoder, FrameEncoder, END_MARKER, PING_MARKER,
        START_MARKER,
    };
    use std::vec::Vec;

    fn sample_payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| b'a' + (i % 26) as u8).collect()
    }

    #[test]
    fn encoder_splits_payload() {
        let payload = sample_payload(70);
        let encoder = FrameEncoder::new(&payload);
        assert_eq!(encoder.packet_count(), 5);
        let packets: Vec<&[u8]> = encoder.collect();
        assert_eq!(packets.len(), 5);
        assert_eq!(&packets[0][..13], START_MARKER);
        assert_eq!(packets[0].len(), 14);
        assert_eq!(packets[1].len(), 32);
        assert_eq!(packets[2].len(), 32);
        assert_eq!(packets[3], &payload[64..]);
        assert_eq!(&packets[4][..11], END_MARKER);
        assert_eq!(packets[4].len(), 12);
    }

    #[test]
    fn encoder_empty_payload() {
        let encoder = FrameEncoder::new(&[]);
        assert_eq!(encoder.packet_count(), 2);
        assert_eq!(encoder.count(), 2);
    }

    #[test]
    fn decode_encoded_frame() {
        let payload = sample_payload(100);
        let mut decoder: FrameDecoder<128> = FrameDecoder::new();
        let mut statuses = Vec::new();
        for packet in FrameEncoder::new(&payload) {
            statuses.push(decoder.push(packet));
        }
        assert_eq!(statuses.pop(), Some(DecodeStatus::Complete));
        assert!(statuses.iter().all(|s| *s == DecodeStatus::Pending));
        assert_eq!(decoder.payload(), payload.as_slice());
        assert!(!decoder.is_collecting());
    }

    #[test]
    fn decode_stream_split_anywhere() {
        // markers without terminators, split at odd packet boundaries
        let mut stream = Vec::new();
        stream.extend_from_slice(b"noise");
        stream.extend_from_slice(START_MARKER);
        stream.extend_from_slice(br#"{"data_delay":5}"#);
        stream.extend_from_slice(END_MARKER);
        let mut decoder: FrameDecoder<32> = FrameDecoder::new();
        let mut last = DecodeStatus::Pending;
        for chunk in stream.chunks(3) {
            last = decoder.push(chunk);
        }
        assert_eq!(last, DecodeStatus::Complete);
        assert_eq!(decoder.payload(), br#"{"data_delay":5}"#);
    }

    #[test]
    fn zero_padding_is_ignored() {
        let mut decoder: FrameDecoder<32> = FrameDecoder::new();
        let mut padded = [0u8; 32];
        padded[..2].copy_from_slice(b"{}");
        assert_eq!(decoder.push(b"#~~~START~~~#\0"), DecodeStatus::Pending);
        assert_eq!(decoder.push(&padded), DecodeStatus::Pending);
        assert_eq!(decoder.push(&[0u8; 32]), DecodeStatus::Pending);
        assert_eq!(decoder.push(b"#~~~END~~~#\0"), DecodeStatus::Complete);
        assert_eq!(decoder.payload(), b"{}");
    }

    #[test]
    fn corrupted_end_marker_never_completes() {
        let mut decoder: FrameDecoder<64> = FrameDecoder::new();
        assert_eq!(decoder.push(START_MARKER), DecodeStatus::Pending);
        assert_eq!(decoder.push(b"{}"), DecodeStatus::Pending);
        assert_eq!(decoder.push(b"#~~~EMD~~~#"), DecodeStatus::Pending);
        assert!(decoder.is_collecting());
        assert!(decoder.payload().is_empty());
    }

    #[test]
    fn restart_drops_partial_frame() {
        let mut decoder: FrameDecoder<64> = FrameDecoder::new();
        decoder.push(START_MARKER);
        decoder.push(b"{\"lost\":");
        assert_eq!(decoder.push(START_MARKER), DecodeStatus::Restarted);
        decoder.push(b"[1]");
        assert_eq!(decoder.push(END_MARKER), DecodeStatus::Complete);
        assert_eq!(decoder.payload(), b"[1]");
    }

    #[test]
    fn overflow_resets() {
        let mut decoder: FrameDecoder<16> = FrameDecoder::new();
        decoder.push(START_MARKER);
        // 16 payload bytes fit, the 17th does not
        assert_eq!(decoder.push(&sample_payload(27)), DecodeStatus::Pending);
        assert_eq!(decoder.push(b"z"), DecodeStatus::Overflow);
        assert!(!decoder.is_collecting());
        // the tail of the oversized frame is ignored
        assert_eq!(decoder.push(END_MARKER), DecodeStatus::Pending);
    }

    #[test]
    fn payload_at_capacity() {
        let payload = sample_payload(16);
        let mut decoder: FrameDecoder<16> = FrameDecoder::new();
        let mut last = DecodeStatus::Pending;
        for packet in FrameEncoder::new(&payload) {
            last = decoder.push(packet);
        }
        assert_eq!(last, DecodeStatus::Complete);
        assert_eq!(decoder.payload(), payload.as_slice());
    }

    #[test]
    fn ping_and_stray_markers_are_ignored() {
        let mut decoder: FrameDecoder<16> = FrameDecoder::new();
        assert_eq!(decoder.push(PING_MARKER), DecodeStatus::Pending);
        assert_eq!(decoder.push(END_MARKER), DecodeStatus::Pending);
        assert!(!decoder.is_collecting());
    }

    #[test]
    fn marker_detection() {
        assert!(contains_marker(b"x#~~~START~~~#y"));
        assert!(contains_marker(b"#~~~END~~~#"));
        assert!(!contains_marker(b"#~~~PING~~~#"));
        assert!(!contains_marker(b"{}"));
    }

    #[test]
    fn marker_completed_by_end_packet() {
        // the end marker packet supplies the missing `#`
        assert!(contains_marker(b"[1]#~~~END~~~"));
        assert!(contains_marker(b"x#~~~START~~~"));
        assert!(!contains_marker(b"[1]#~~~END~~"));
        assert!(!contains_marker(b"[1]#"));
        assert!(!contains_marker(b"#~~~END~~~x"));
        assert!(!contains_marker(b""));
    }

    #[test]
    fn trailing_end_prefix_would_close_early() {
        // what a receiver does with such a frame
        let mut decoder: FrameDecoder<32> = FrameDecoder::new();
        let mut last = DecodeStatus::Pending;
        for packet in FrameEncoder::new(b"x#~~~END~~~") {
            last = decoder.push(packet);
            if last == DecodeStatus::Complete {
                break;
            }
        }
        assert_eq!(last, DecodeStatus::Complete);
        assert_eq!(decoder.payload(), b"x");
    }

    #[test]
    fn next_frame_in_same_packet() {
        let mut decoder: FrameDecoder<32> = FrameDecoder::new();
        assert_eq!(decoder.push(b"#~~~START~~~#[1]"), DecodeStatus::Pending);
        assert_eq!(
            decoder.push(b"#~~~END~~~##~~~START~~~#[2"),
            DecodeStatus::Complete
        );
        assert_eq!(decoder.payload(), b"[1]");
        assert!(decoder.has_pending());
        assert_eq!(decoder.resume(), DecodeStatus::Pending);
        assert!(!decoder.has_pending());
        assert!(decoder.is_collecting());
        assert_eq!(decoder.push(b"]#~~~END~~~#\0"), DecodeStatus::Complete);
        assert_eq!(decoder.payload(), b"[2]");
    }

    #[test]
    fn whole_frame_left_over() {
        let mut decoder: FrameDecoder<32> = FrameDecoder::new();
        decoder.push(START_MARKER);
        assert_eq!(
            decoder.push(b"[1]#~~~END~~~##~~~START~~~#7#~~~END~~~#"),
            DecodeStatus::Complete
        );
        assert_eq!(decoder.payload(), b"[1]");
        assert_eq!(decoder.resume(), DecodeStatus::Complete);
        assert_eq!(decoder.payload(), b"7");
        // pushing a packet also scans left over bytes first
        decoder.push(b"#~~~START~~~#[3]#~~~END~~~#x");
        assert_eq!(decoder.push(b"#~~~START~~~#"), DecodeStatus::Pending);
        assert!(decoder.is_collecting());
        decoder.reset();
        assert!(!decoder.has_pending());
    }
}
