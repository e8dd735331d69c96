//! Command set spoken over the inbound serial link.
//!
//! Each accepted [`CommandFrame`] carries an opcode plus four raw parameter
//! bytes; this module is the single place that knows which opcode wants
//! which parameter interpretation. Decoding produces a [`Command`] — one
//! variant per opcode, so the dispatcher's `match` is exhaustive and a new
//! command cannot be added without the compiler pointing at every place
//! that must handle it.
//!
//! Unknown opcodes decode to `None` and are dropped without touching any
//! counter; a stale host build sending tomorrow's commands should not spook
//! a car that is mid-corner.

use crate::frame::CommandFrame;
use crate::mode::ControlMode;
use crate::roi::RoiSlot;

/// Select Idle mode.
pub const CMD_MODE_IDLE: u8 = 1;
/// Select BlobTracking mode.
pub const CMD_MODE_BLOBS: u8 = 2;
/// Select RegressionLine mode.
pub const CMD_MODE_REGRESSION_LINE: u8 = 3;
/// Transmit a snapshot of the current frame.
pub const CMD_SEND_PIC: u8 = 4;
/// Select Grayscale mode.
pub const CMD_MODE_GRAYSCALE: u8 = 5;
/// Enable the periodic telemetry stream.
pub const CMD_DRIVE_ON: u8 = 6;
/// Disable the periodic telemetry stream.
pub const CMD_DRIVE_OFF: u8 = 7;
/// Move the flood-fill seed row (int1 = y).
pub const CMD_BLOB_SET_SEED_LOC: u8 = 8;
/// Replace the floating threshold (float).
pub const CMD_BLOB_SET_FLOATING_THRESH: u8 = 9;
/// Replace the seed threshold (float).
pub const CMD_BLOB_SET_SEED_THRESH: u8 = 10;
/// Replace the top band's weight (float).
pub const CMD_BLOB_ROI_WEIGHT_T: u8 = 11;
/// Replace the middle band's weight (float).
pub const CMD_BLOB_ROI_WEIGHT_M: u8 = 12;
/// Replace the bottom band's weight (float).
pub const CMD_BLOB_ROI_WEIGHT_B: u8 = 13;
/// Move the top band (int1 = y, int2 = height).
pub const CMD_BLOB_ROI_POSITION_T: u8 = 14;
/// Move the middle band (int1 = y, int2 = height).
pub const CMD_BLOB_ROI_POSITION_M: u8 = 15;
/// Move the bottom band (int1 = y, int2 = height).
pub const CMD_BLOB_ROI_POSITION_B: u8 = 16;
/// Replace the proportional gain (float).
pub const CMD_PID_SET_KP: u8 = 17;
/// Replace the integral gain (float).
pub const CMD_PID_SET_KI: u8 = 18;
/// Replace the derivative gain (float).
pub const CMD_PID_SET_KD: u8 = 19;
/// Replace the steering gain (float).
pub const CMD_PID_SET_STEERING_GAIN: u8 = 20;
/// Set the steering direction (int1: 0 normal, 1 reverse).
pub const CMD_PID_SET_STEERING_DIRECTION: u8 = 21;
/// Replace the perspective-correction factor (float).
pub const CMD_CAM_SET_PERSPECTIVE: u8 = 22;
/// Enable perspective correction.
pub const CMD_CAM_PERSPECTIVE_ON: u8 = 23;
/// Disable perspective correction.
pub const CMD_CAM_PERSPECTIVE_OFF: u8 = 24;
/// Select LaneLines mode.
pub const CMD_MODE_LANE_LINES: u8 = 25;

/// A fully decoded command, parameters already picked out of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Switch the active control mode.
    SetMode(ControlMode),
    /// Transmit a snapshot of the current frame, immediately.
    SendSnapshot,
    /// Enable or disable the periodic telemetry stream.
    SetDriveTelemetry(bool),
    /// Move the flood-fill seed row.
    SetSeedLocation {
        /// Requested seed row, pixels.
        y: i16,
    },
    /// Replace the floating threshold.
    SetFloatingThreshold(f32),
    /// Replace the seed threshold.
    SetSeedThreshold(f32),
    /// Replace one band's averaging weight.
    SetRoiWeight {
        /// Which band.
        slot: RoiSlot,
        /// Requested weight.
        weight: f32,
    },
    /// Move one band vertically.
    SetRoiPosition {
        /// Which band.
        slot: RoiSlot,
        /// Requested top edge, pixels.
        y: i16,
        /// Requested height, pixels.
        height: i16,
    },
    /// Replace the proportional gain.
    SetKp(f32),
    /// Replace the integral gain.
    SetKi(f32),
    /// Replace the derivative gain.
    SetKd(f32),
    /// Replace the steering gain.
    SetSteeringGain(f32),
    /// Set the steering direction from its wire index.
    SetSteeringDirection {
        /// Wire index: 0 normal, 1 reverse, anything else invalid.
        index: i16,
    },
    /// Replace the perspective-correction factor.
    SetPerspectiveFactor(f32),
    /// Enable or disable perspective correction.
    SetPerspectiveCorrection(bool),
}

impl Command {
    /// Decodes an accepted frame into a command, selecting the parameter
    /// interpretation the opcode calls for. Unknown opcodes yield `None`.
    pub fn from_frame(frame: &CommandFrame) -> Option<Self> {
        let command = match frame.opcode {
            CMD_MODE_IDLE => Command::SetMode(ControlMode::Idle),
            CMD_MODE_BLOBS => Command::SetMode(ControlMode::BlobTracking),
            CMD_MODE_REGRESSION_LINE => Command::SetMode(ControlMode::RegressionLine),
            CMD_MODE_LANE_LINES => Command::SetMode(ControlMode::LaneLines),
            CMD_MODE_GRAYSCALE => Command::SetMode(ControlMode::Grayscale),
            CMD_SEND_PIC => Command::SendSnapshot,
            CMD_DRIVE_ON => Command::SetDriveTelemetry(true),
            CMD_DRIVE_OFF => Command::SetDriveTelemetry(false),
            CMD_BLOB_SET_SEED_LOC => Command::SetSeedLocation { y: frame.int1() },
            CMD_BLOB_SET_FLOATING_THRESH => Command::SetFloatingThreshold(frame.float()),
            CMD_BLOB_SET_SEED_THRESH => Command::SetSeedThreshold(frame.float()),
            CMD_BLOB_ROI_WEIGHT_T => Command::SetRoiWeight {
                slot: RoiSlot::Top,
                weight: frame.float(),
            },
            CMD_BLOB_ROI_WEIGHT_M => Command::SetRoiWeight {
                slot: RoiSlot::Mid,
                weight: frame.float(),
            },
            CMD_BLOB_ROI_WEIGHT_B => Command::SetRoiWeight {
                slot: RoiSlot::Bottom,
                weight: frame.float(),
            },
            CMD_BLOB_ROI_POSITION_T => Command::SetRoiPosition {
                slot: RoiSlot::Top,
                y: frame.int1(),
                height: frame.int2(),
            },
            CMD_BLOB_ROI_POSITION_M => Command::SetRoiPosition {
                slot: RoiSlot::Mid,
                y: frame.int1(),
                height: frame.int2(),
            },
            CMD_BLOB_ROI_POSITION_B => Command::SetRoiPosition {
                slot: RoiSlot::Bottom,
                y: frame.int1(),
                height: frame.int2(),
            },
            CMD_PID_SET_KP => Command::SetKp(frame.float()),
            CMD_PID_SET_KI => Command::SetKi(frame.float()),
            CMD_PID_SET_KD => Command::SetKd(frame.float()),
            CMD_PID_SET_STEERING_GAIN => Command::SetSteeringGain(frame.float()),
            CMD_PID_SET_STEERING_DIRECTION => Command::SetSteeringDirection {
                index: frame.int1(),
            },
            CMD_CAM_SET_PERSPECTIVE => Command::SetPerspectiveFactor(frame.float()),
            CMD_CAM_PERSPECTIVE_ON => Command::SetPerspectiveCorrection(true),
            CMD_CAM_PERSPECTIVE_OFF => Command::SetPerspectiveCorrection(false),
            _ => return None,
        };
        Some(command)
    }
}

/// What applying a command did.
///
/// The wire protocol never answers the sender, but the no-op-on-bad-input
/// contract still needs to be visible to the caller — and to tests — so
/// dispatch reports its outcome instead of failing silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// State was mutated as requested.
    Applied,
    /// A parameter was out of range; nothing changed.
    Ignored,
    /// The command requests an immediate snapshot transmission.
    Snapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_opcodes_decode() {
        let cases = [
            (CMD_MODE_IDLE, ControlMode::Idle),
            (CMD_MODE_BLOBS, ControlMode::BlobTracking),
            (CMD_MODE_REGRESSION_LINE, ControlMode::RegressionLine),
            (CMD_MODE_LANE_LINES, ControlMode::LaneLines),
            (CMD_MODE_GRAYSCALE, ControlMode::Grayscale),
        ];
        for (opcode, mode) in cases {
            let frame = CommandFrame::from_ints(opcode, 0, 0);
            assert_eq!(Command::from_frame(&frame), Some(Command::SetMode(mode)));
        }
    }

    #[test]
    fn test_float_opcodes_take_the_float_view() {
        let frame = CommandFrame::from_float(CMD_PID_SET_KP, 1.25);
        assert_eq!(Command::from_frame(&frame), Some(Command::SetKp(1.25)));

        let frame = CommandFrame::from_float(CMD_BLOB_ROI_WEIGHT_M, 0.6);
        assert_eq!(
            Command::from_frame(&frame),
            Some(Command::SetRoiWeight {
                slot: RoiSlot::Mid,
                weight: 0.6
            })
        );
    }

    #[test]
    fn test_int_opcodes_take_the_int_view() {
        let frame = CommandFrame::from_ints(CMD_BLOB_ROI_POSITION_B, 95, 24);
        assert_eq!(
            Command::from_frame(&frame),
            Some(Command::SetRoiPosition {
                slot: RoiSlot::Bottom,
                y: 95,
                height: 24
            })
        );

        let frame = CommandFrame::from_ints(CMD_PID_SET_STEERING_DIRECTION, 1, 0);
        assert_eq!(
            Command::from_frame(&frame),
            Some(Command::SetSteeringDirection { index: 1 })
        );
    }

    #[test]
    fn test_unknown_opcodes_decode_to_none() {
        for opcode in [0u8, 26, 0x7F, 0xFF] {
            let frame = CommandFrame::from_ints(opcode, 0, 0);
            assert_eq!(Command::from_frame(&frame), None);
        }
    }
}
