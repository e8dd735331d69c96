//! Wire codec for the serial protocol between the camera board and the
//! drive board.
//!
//! Both directions are fixed-length frames delimited by [`FRAME_START`] and
//! [`FRAME_END`] and protected by an additive mod-256 checksum over the
//! interior bytes, but the two shapes are not identical:
//!
//! - **Inbound command frame, 8 bytes**:
//!   `[start, opcode, p0, p1, p2, p3, checksum, end]`.
//!   The checksum covers the opcode and the four parameter bytes.
//! - **Outbound telemetry frame, 10 bytes**:
//!   `[start, 0x01, steer_lo, steer_hi, err_lo, err_hi, tgt_lo, tgt_hi,
//!   checksum, end]`. The checksum covers the opcode and the six value
//!   bytes.
//!
//! The four command parameter bytes are deliberately untyped on the wire:
//! depending on the opcode they carry two little-endian signed 16-bit
//! integers or one little-endian 32-bit float. [`CommandFrame`] keeps the
//! raw bytes and lets the caller pick the reinterpretation via
//! [`int1()`](CommandFrame::int1), [`int2()`](CommandFrame::int2) and
//! [`float()`](CommandFrame::float).
//!
//! This module never sees partial frames; reassembly and resynchronization
//! over a byte stream belong to [`crate::link`].

use crate::checksum::additive_sum;
use crate::consts::{
    COMMAND_CHECKSUM_SPAN, COMMAND_FRAME_LEN, FRAME_END, FRAME_START, TELEMETRY_FRAME_LEN,
    TELEMETRY_OPCODE,
};
use thiserror::Error;

/// Ways a byte slice can fail to be a valid frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The slice length does not match the expected frame layout.
    #[error("frame length {0} does not match the expected layout")]
    Length(usize),
    /// The first byte is not the start marker.
    #[error("expected start marker, found {0:#04x}")]
    BadStart(u8),
    /// The last byte is not the end marker.
    #[error("expected end marker, found {0:#04x}")]
    BadEnd(u8),
    /// The interior bytes do not sum to the received checksum.
    #[error("checksum mismatch: computed {computed:#04x}, received {received:#04x}")]
    Checksum {
        /// Sum of the covered bytes, mod 256.
        computed: u8,
        /// Checksum byte carried by the frame.
        received: u8,
    },
    /// A telemetry frame carried an opcode other than [`TELEMETRY_OPCODE`].
    #[error("unexpected opcode {0:#04x} in telemetry frame")]
    UnexpectedOpcode(u8),
}

/// A decoded inbound command frame: an opcode plus its raw parameter bytes.
///
/// The parameter field is shared between two wire-level encodings. Commands
/// that tune a float quantity (gains, thresholds, weights) send one `f32`;
/// commands that address pixels or indexes send one or two `i16`s. The
/// accessors reinterpret the same four bytes either way, so callers select
/// the view that matches the opcode — decoding never guesses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandFrame {
    /// Command identifier byte (see [`crate::command`] for the known ids).
    pub opcode: u8,
    /// The four parameter bytes exactly as received, little-endian.
    pub params: [u8; 4],
}

impl CommandFrame {
    /// Builds a frame carrying two little-endian signed integers.
    pub fn from_ints(opcode: u8, int1: i16, int2: i16) -> Self {
        let a = int1.to_le_bytes();
        let b = int2.to_le_bytes();
        Self {
            opcode,
            params: [a[0], a[1], b[0], b[1]],
        }
    }

    /// Builds a frame carrying one little-endian float.
    pub fn from_float(opcode: u8, value: f32) -> Self {
        Self {
            opcode,
            params: value.to_le_bytes(),
        }
    }

    /// First parameter as a signed 16-bit integer.
    pub fn int1(&self) -> i16 {
        i16::from_le_bytes([self.params[0], self.params[1]])
    }

    /// Second parameter as a signed 16-bit integer.
    pub fn int2(&self) -> i16 {
        i16::from_le_bytes([self.params[2], self.params[3]])
    }

    /// All four parameter bytes as a 32-bit float.
    pub fn float(&self) -> f32 {
        f32::from_le_bytes(self.params)
    }

    /// Serializes the frame, computing the checksum over the opcode and
    /// parameter bytes.
    pub fn encode(&self) -> [u8; COMMAND_FRAME_LEN] {
        let mut out = [0u8; COMMAND_FRAME_LEN];
        out[0] = FRAME_START;
        out[1] = self.opcode;
        out[2..6].copy_from_slice(&self.params);
        out[6] = additive_sum(&out[1..1 + COMMAND_CHECKSUM_SPAN]);
        out[7] = FRAME_END;
        out
    }

    /// Parses and validates a complete command frame.
    ///
    /// Intended for host-side tooling and tests; the on-target receive path
    /// goes through [`crate::link::LinkParser`], which performs the same
    /// validation incrementally.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() != COMMAND_FRAME_LEN {
            return Err(FrameError::Length(bytes.len()));
        }
        if bytes[0] != FRAME_START {
            return Err(FrameError::BadStart(bytes[0]));
        }
        if bytes[COMMAND_FRAME_LEN - 1] != FRAME_END {
            return Err(FrameError::BadEnd(bytes[COMMAND_FRAME_LEN - 1]));
        }
        let computed = additive_sum(&bytes[1..1 + COMMAND_CHECKSUM_SPAN]);
        let received = bytes[COMMAND_FRAME_LEN - 2];
        if computed != received {
            return Err(FrameError::Checksum { computed, received });
        }
        Ok(Self {
            opcode: bytes[1],
            params: [bytes[2], bytes[3], bytes[4], bytes[5]],
        })
    }
}

/// One outbound telemetry report: what the controller is doing right now.
///
/// Values are quantized to `i16` before encoding; the drive board consumes
/// the steering command directly and the other two fields exist for
/// monitoring and tuning UIs on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Telemetry {
    /// Composed drive command, clamped to ±255.
    pub steering_command: i16,
    /// Angle error from the last PID update, degrees.
    pub angle_error: i16,
    /// Target angle the vision layer asked for, degrees.
    pub target_angle: i16,
}

impl Telemetry {
    /// Serializes the report into a telemetry frame.
    pub fn encode(&self) -> [u8; TELEMETRY_FRAME_LEN] {
        let mut out = [0u8; TELEMETRY_FRAME_LEN];
        out[0] = FRAME_START;
        out[1] = TELEMETRY_OPCODE;
        out[2..4].copy_from_slice(&self.steering_command.to_le_bytes());
        out[4..6].copy_from_slice(&self.angle_error.to_le_bytes());
        out[6..8].copy_from_slice(&self.target_angle.to_le_bytes());
        out[8] = additive_sum(&out[1..TELEMETRY_FRAME_LEN - 2]);
        out[9] = FRAME_END;
        out
    }

    /// Parses and validates a complete telemetry frame.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() != TELEMETRY_FRAME_LEN {
            return Err(FrameError::Length(bytes.len()));
        }
        if bytes[0] != FRAME_START {
            return Err(FrameError::BadStart(bytes[0]));
        }
        if bytes[TELEMETRY_FRAME_LEN - 1] != FRAME_END {
            return Err(FrameError::BadEnd(bytes[TELEMETRY_FRAME_LEN - 1]));
        }
        let computed = additive_sum(&bytes[1..TELEMETRY_FRAME_LEN - 2]);
        let received = bytes[TELEMETRY_FRAME_LEN - 2];
        if computed != received {
            return Err(FrameError::Checksum { computed, received });
        }
        if bytes[1] != TELEMETRY_OPCODE {
            return Err(FrameError::UnexpectedOpcode(bytes[1]));
        }
        Ok(Self {
            steering_command: i16::from_le_bytes([bytes[2], bytes[3]]),
            angle_error: i16::from_le_bytes([bytes[4], bytes[5]]),
            target_angle: i16::from_le_bytes([bytes[6], bytes[7]]),
        })
    }
}
