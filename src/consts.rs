//! Constants used across the lane-following control stack.
//!
//! This module defines the protocol-wide constants for frame markers and
//! lengths, the control loop's cadences, the dispatcher's validation bounds,
//! and the power-on defaults for the PID controller and vision tuning.
//!
//! ## Key Concepts
//!
//! - **Markers**: a start and end byte delimit every frame in both
//!   directions; they carry no meaning at interior positions.
//! - **Frame lengths**: inbound command frames and outbound telemetry frames
//!   have different fixed sizes and must not be conflated.
//! - **Cadences**: the loop runs three independent deadlines (PID, telemetry,
//!   debug) against a millisecond clock; each has a startup offset so the
//!   camera has settled before the first tick fires.
//! - **Bounds**: dispatcher inputs outside these ranges are ignored without
//!   mutating anything.

/// Start-of-frame marker, shared by both directions.
pub const FRAME_START: u8 = 0xAA;

/// End-of-frame marker, shared by both directions.
pub const FRAME_END: u8 = 0xA8;

/// Total length (in bytes) of an inbound command frame:
/// start, opcode, four parameter bytes, checksum, end.
pub const COMMAND_FRAME_LEN: usize = 8;

/// Number of command-frame body bytes between the start marker and the end
/// marker (opcode + parameters + checksum).
pub const COMMAND_BODY_LEN: usize = COMMAND_FRAME_LEN - 2;

/// Number of leading body bytes covered by the command-frame checksum
/// (the opcode and the four parameter bytes; the checksum slot itself is
/// excluded).
pub const COMMAND_CHECKSUM_SPAN: usize = COMMAND_BODY_LEN - 1;

/// Total length (in bytes) of an outbound telemetry frame:
/// start, opcode, three little-endian `i16` values, checksum, end.
pub const TELEMETRY_FRAME_LEN: usize = 10;

/// Fixed opcode carried by every outbound telemetry frame.
pub const TELEMETRY_OPCODE: u8 = 0x01;

/// Magnitude bound on the PID servo output, in degrees.
/// 0 is straight ahead; full lock is ±50.
pub const SERVO_ANGLE_LIMIT: f32 = 50.0;

/// Magnitude bound on the composed drive command sent in telemetry.
pub const DRIVE_COMMAND_LIMIT: f32 = 255.0;

/// Highest valid pixel row for ROI y-coordinates and heights
/// (the capture profiles are 120 rows tall).
pub const ROI_COORD_MAX: i16 = 119;

/// Number of weighted bands in the ROI table.
pub const ROI_BAND_COUNT: usize = 3;

/// PID update period, milliseconds (~50 Hz).
pub const PID_PERIOD_MS: u32 = 20;

/// Telemetry transmit period, milliseconds (~10 Hz).
pub const TELEMETRY_PERIOD_MS: u32 = 100;

/// Debug report period, milliseconds (~4 Hz).
pub const DEBUG_PERIOD_MS: u32 = 250;

/// Delay from controller construction to the first PID update.
pub const PID_STARTUP_DELAY_MS: u32 = 75;

/// Delay from controller construction to the first telemetry frame.
pub const TELEMETRY_STARTUP_DELAY_MS: u32 = 100;

/// Delay from controller construction to the first debug report.
pub const DEBUG_STARTUP_DELAY_MS: u32 = 225;

/// Default proportional gain.
pub const DEFAULT_KP: f32 = 0.8;

/// Default integral gain.
pub const DEFAULT_KI: f32 = 0.0;

/// Default derivative gain.
pub const DEFAULT_KD: f32 = 0.4;

/// Default magnitude clamp on the accumulated integral term.
pub const DEFAULT_MAX_I_TERM: f32 = 3.0;

/// Default scale from servo angle (±50) to drive command (±255).
pub const DEFAULT_STEERING_GAIN: f32 = 5.0;

/// Default flood-fill seed row.
pub const DEFAULT_SEED_LOCATION_Y: i16 = 100;

/// Default flood-fill seed threshold.
pub const DEFAULT_SEED_THRESHOLD: f32 = 0.2;

/// Default flood-fill floating threshold.
pub const DEFAULT_FLOATING_THRESHOLD: f32 = 0.4;

/// Default first image row considered by the vision layer.
pub const DEFAULT_SCAN_TOP: i16 = 30;

/// Default perspective-correction strength (typical range 0.10–0.20 for a
/// stock lens; wide-angle builds run higher).
pub const DEFAULT_PERSPECTIVE_FACTOR: f32 = 0.35;
