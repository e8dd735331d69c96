//! Byte-stream link state machine for the inbound command channel.
//!
//! The drive board talks to the camera over a raw UART: there is no length
//! prefix, no acknowledgment, and nothing stopping a frame from being torn
//! in half by noise or a late listener joining mid-stream. This module
//! reassembles [`CommandFrame`]s from that stream one byte at a time,
//! validating the framing and checksum as it goes and resynchronizing on
//! any failure.
//!
//! ## Resynchronization model
//!
//! Alignment depends on byte *position*, never on byte *value*: once a start
//! marker opens a frame, the next six bytes are body no matter what they
//! contain — a `0xAA` or `0xA8` in the middle of a parameter is perfectly
//! legal. Only the designated final position must hold the end marker. A
//! wrong byte there, or a checksum mismatch, drops the whole frame and
//! returns the machine to its hunt for the next start marker.
//!
//! Dropped frames are invisible to the sender; they only show up in the
//! [`good_frames`](LinkParser::good_frames),
//! [`framing_errors`](LinkParser::framing_errors) and
//! [`checksum_errors`](LinkParser::checksum_errors) counters.

use crate::checksum::accumulate;
use crate::consts::{COMMAND_CHECKSUM_SPAN, COMMAND_FRAME_LEN, FRAME_END, FRAME_START};
use crate::frame::CommandFrame;

#[cfg(not(feature = "std"))]
use heapless::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekStart,
    Collect,
    ExpectEnd,
}

/// Incremental parser turning a serial byte stream into command frames.
///
/// Feed it every received byte via [`push()`](LinkParser::push); a complete,
/// checksum-valid frame is handed back the moment its end marker arrives.
/// The parser owns the per-connection session state: the parse position,
/// the running checksum, the partially filled buffer, and the parameters of
/// the most recently accepted frame.
#[derive(Debug)]
pub struct LinkParser {
    state: State,
    checksum: u8,

    /// Partially reassembled frame, start marker included.
    #[cfg(not(feature = "std"))]
    buf: Vec<u8, COMMAND_FRAME_LEN>,
    /// Partially reassembled frame, start marker included.
    #[cfg(feature = "std")]
    buf: Vec<u8>,

    last_accepted: Option<CommandFrame>,

    /// Count of frames accepted with a valid end marker and checksum.
    pub good_frames: u32,
    /// Count of frames dropped because the end-marker position held
    /// something else.
    pub framing_errors: u32,
    /// Count of frames dropped on a checksum mismatch.
    pub checksum_errors: u32,
}

impl LinkParser {
    /// Creates a parser hunting for its first start marker, with all
    /// counters at zero.
    pub fn new() -> Self {
        Self {
            state: State::SeekStart,
            checksum: 0,
            buf: Vec::new(),
            last_accepted: None,
            good_frames: 0,
            framing_errors: 0,
            checksum_errors: 0,
        }
    }

    /// Reinitializes the session: parse state, buffer, and counters.
    ///
    /// Counters survive individual frame failures by design; this is the
    /// only way to zero them short of dropping the parser.
    pub fn reset(&mut self) {
        self.state = State::SeekStart;
        self.checksum = 0;
        self.buf.clear();
        self.last_accepted = None;
        self.good_frames = 0;
        self.framing_errors = 0;
        self.checksum_errors = 0;
    }

    /// The most recently accepted frame, if any.
    ///
    /// Overwritten on every accepted frame; dispatch should consume the
    /// value returned by [`push()`](LinkParser::push) instead of polling
    /// this, which exists for late inspection and debugging.
    pub fn last_accepted(&self) -> Option<&CommandFrame> {
        self.last_accepted.as_ref()
    }

    fn store(&mut self, byte: u8) {
        #[cfg(not(feature = "std"))]
        {
            let _ = self.buf.push(byte);
        }
        #[cfg(feature = "std")]
        self.buf.push(byte);
    }

    /// Processes a single received byte.
    ///
    /// Returns `Some(frame)` exactly when this byte completed a valid
    /// frame. Malformed input never returns an error — the frame is
    /// silently discarded, the matching counter is bumped, and the machine
    /// goes back to seeking a start marker.
    pub fn push(&mut self, byte: u8) -> Option<CommandFrame> {
        match self.state {
            State::SeekStart => {
                if byte == FRAME_START {
                    self.buf.clear();
                    self.store(byte);
                    self.checksum = 0;
                    self.state = State::Collect;
                }
            }
            State::Collect => {
                // Marker values are NOT special here; only position counts.
                // The checksum covers the opcode and parameter bytes but not
                // the checksum slot itself.
                let position = self.buf.len();
                self.store(byte);
                if position <= COMMAND_CHECKSUM_SPAN {
                    self.checksum = accumulate(self.checksum, byte);
                }
                if self.buf.len() >= COMMAND_FRAME_LEN - 1 {
                    self.state = State::ExpectEnd;
                }
            }
            State::ExpectEnd => {
                self.state = State::SeekStart;
                if byte == FRAME_END {
                    let computed = self.checksum;
                    let received = self.buf[COMMAND_FRAME_LEN - 2];
                    if computed == received {
                        let frame = CommandFrame {
                            opcode: self.buf[1],
                            params: [self.buf[2], self.buf[3], self.buf[4], self.buf[5]],
                        };
                        self.good_frames += 1;
                        self.last_accepted = Some(frame);
                        return Some(frame);
                    }
                    self.checksum_errors += 1;
                    #[cfg(feature = "log")]
                    log::warn!(
                        "command frame checksum failed: computed {computed:#04x}, received {received:#04x}"
                    );
                    #[cfg(feature = "defmt-0-3")]
                    defmt::warn!(
                        "command frame checksum failed: computed {}, received {}",
                        computed,
                        received
                    );
                } else {
                    self.framing_errors += 1;
                    #[cfg(feature = "log")]
                    log::warn!("command frame framing error: expected end marker, got {byte:#04x}");
                    #[cfg(feature = "defmt-0-3")]
                    defmt::warn!("command frame framing error: got {} for end marker", byte);
                }
            }
        }
        None
    }
}

impl Default for LinkParser {
    fn default() -> Self {
        Self::new()
    }
}
