//! PID steering controller.
//!
//! The controller's set point is permanently "straight ahead": the vision
//! layer reports the angle the car *should* steer to re-center itself, so
//! a perfectly positioned car reports 0 and the error is simply the
//! negated target. Each update produces a servo angle bounded to ±50
//! degrees; the conversion to a drive-board command value (±255) happens
//! separately in [`drive_command()`](SteeringPid::drive_command), because
//! the steering gain and direction are calibration for a particular car,
//! not part of the control law.
//!
//! Works in `no_std` and does not allocate.

use crate::consts::{
    DEFAULT_KD, DEFAULT_KI, DEFAULT_KP, DEFAULT_MAX_I_TERM, DEFAULT_STEERING_GAIN,
    DRIVE_COMMAND_LIMIT, SERVO_ANGLE_LIMIT,
};

/// Which way a positive servo angle moves the car.
///
/// Set over the command link with index values: 0 selects `Normal`,
/// 1 selects `Reverse`. Cars wired with mirrored steering linkages flip
/// this instead of rewiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringDirection {
    /// Positive command steers the way the geometry says.
    Normal,
    /// Positive command steers the opposite way.
    Reverse,
}

impl SteeringDirection {
    /// The multiplier this direction applies: +1 or −1.
    pub fn sign(self) -> f32 {
        match self {
            SteeringDirection::Normal => 1.0,
            SteeringDirection::Reverse => -1.0,
        }
    }

    /// Maps a command-link index to a direction. Anything other than 0 or 1
    /// is not a direction and yields `None`.
    pub fn from_index(index: i16) -> Option<Self> {
        match index {
            0 => Some(SteeringDirection::Normal),
            1 => Some(SteeringDirection::Reverse),
            _ => None,
        }
    }
}

/// PID state persisted across control ticks.
///
/// Gains and calibration fields are public: the command dispatcher pokes
/// them directly while the car is driving, and there is nothing to
/// validate — any float is a legal gain.
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringPid {
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain.
    pub ki: f32,
    /// Derivative gain.
    pub kd: f32,
    /// Magnitude clamp on the accumulated integral term.
    pub max_i_term: f32,
    /// Scale from servo angle (±50) to drive command (±255).
    pub steering_gain: f32,
    /// Steering direction calibration.
    pub direction: SteeringDirection,

    i_term: f32,
    last_error: f32,
    last_time_ms: u32,
}

impl SteeringPid {
    /// Creates a controller with the stock tune (kp 0.8, ki 0, kd 0.4,
    /// integral clamp ±3, gain 5, reversed direction), zeroed state, and
    /// `now_ms` as the time baseline.
    pub fn new(now_ms: u32) -> Self {
        Self {
            kp: DEFAULT_KP,
            ki: DEFAULT_KI,
            kd: DEFAULT_KD,
            max_i_term: DEFAULT_MAX_I_TERM,
            steering_gain: DEFAULT_STEERING_GAIN,
            direction: SteeringDirection::Reverse,
            i_term: 0.0,
            last_error: 0.0,
            last_time_ms: now_ms,
        }
    }

    /// Zeroes the integral and error history and re-baselines time.
    /// Gains and calibration survive a reset.
    pub fn reset(&mut self, now_ms: u32) {
        self.i_term = 0.0;
        self.last_error = 0.0;
        self.last_time_ms = now_ms;
    }

    /// One PID step.
    ///
    /// `target_angle` is the deflection the vision layer wants, degrees;
    /// `now_ms` a monotonic millisecond timestamp (wrapping is handled).
    /// Returns `(angle_error, servo_angle)` with the servo angle clamped
    /// to ±50 degrees.
    ///
    /// Two ticks in the same millisecond would divide the derivative by
    /// zero; that tick runs with the derivative term suppressed instead.
    /// Error and time history advance unconditionally on every call.
    pub fn update(&mut self, target_angle: f32, now_ms: u32) -> (f32, f32) {
        let dt = now_ms.wrapping_sub(self.last_time_ms);
        let angle_error = 0.0 - target_angle;
        let d_error = angle_error - self.last_error;

        let p_term = self.kp * angle_error;
        self.i_term += self.ki * angle_error;
        self.i_term = self.i_term.clamp(-self.max_i_term, self.max_i_term);
        let d_term = if dt == 0 {
            0.0
        } else {
            self.kd * d_error / dt as f32
        };

        self.last_error = angle_error;
        self.last_time_ms = now_ms;

        let servo_angle = (self.direction.sign() * (p_term + self.i_term + d_term))
            .clamp(-SERVO_ANGLE_LIMIT, SERVO_ANGLE_LIMIT);
        (angle_error, servo_angle)
    }

    /// Composes the drive-board command for a servo angle: direction and
    /// gain applied, result clamped to ±255. This is calibration scaling
    /// for the telemetry stream, not part of the PID update.
    pub fn drive_command(&self, servo_angle: f32) -> f32 {
        (self.steering_gain * self.direction.sign() * servo_angle)
            .clamp(-DRIVE_COMMAND_LIMIT, DRIVE_COMMAND_LIMIT)
    }
}
