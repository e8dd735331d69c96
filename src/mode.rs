//! Operating modes of the lane-following controller.
//!
//! Exactly one mode is active at a time. The mode selects which vision
//! strategy produces the target angle, which capture profile the camera
//! runs (delegated to the [`crate::vision::VisionSource`] collaborator),
//! and which status color the indicator LEDs show. Only the three vision
//! modes actually steer; [`Idle`](ControlMode::Idle) and
//! [`Grayscale`](ControlMode::Grayscale) pin the steering outputs to zero
//! while leaving the PID state untouched.

/// High-level operating mode, as selected over the command link.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub enum ControlMode {
    ///   Resting state. The camera still streams frames and the command
    ///   link stays live, but no steering is computed or transmitted.
    #[default]
    Idle,
    ///   Steer by tracking the lane blob across three weighted image bands.
    BlobTracking,
    ///   Steer by fitting a single regression line through the lane marking.
    RegressionLine,
    ///   Steer by detecting the left/right lane boundary pair.
    LaneLines,
    ///   Diagnostic pass-through: grayscale capture for host-side viewing,
    ///   no steering.
    Grayscale,
}

impl ControlMode {
    /// Whether this mode drives the PID controller and telemetry stream.
    pub fn is_steering(self) -> bool {
        matches!(
            self,
            ControlMode::BlobTracking | ControlMode::RegressionLine | ControlMode::LaneLines
        )
    }

    /// The indicator color shown while this mode is active.
    pub fn status_color(self) -> StatusColor {
        match self {
            ControlMode::Idle => StatusColor::Blue,
            ControlMode::BlobTracking => StatusColor::Yellow,
            ControlMode::RegressionLine => StatusColor::Green,
            ControlMode::LaneLines => StatusColor::Red,
            ControlMode::Grayscale => StatusColor::White,
        }
    }
}

/// One of the five fixed indicator colors, mixed from the red/green/blue
/// status LEDs. Purely observational — nothing reads the LEDs back.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum StatusColor {
    /// Idle.
    Blue,
    /// Blob tracking.
    Yellow,
    /// Regression line.
    Green,
    /// Lane lines.
    Red,
    /// Grayscale.
    White,
}

impl StatusColor {
    /// The (red, green, blue) LED states that mix this color.
    pub fn rgb(self) -> (bool, bool, bool) {
        match self {
            StatusColor::Blue => (false, false, true),
            StatusColor::Yellow => (true, true, false),
            StatusColor::Green => (false, true, false),
            StatusColor::Red => (true, false, false),
            StatusColor::White => (true, true, true),
        }
    }
}
