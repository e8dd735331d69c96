//! Status indicator driver: three LEDs, five colors.
//!
//! The indicator is the only feedback channel the protocol offers — a
//! command frame that got lost and a command frame that was applied look
//! identical to the sender, except that a mode change moves the light.

use crate::mode::StatusColor;
use embedded_hal::digital::OutputPin;

/// Owns the red, green, and blue status LED pins.
///
/// Pin errors are ignored; an indicator that fails to light must never
/// take the control loop down with it.
#[derive(Debug)]
pub struct StatusLeds<R, G, B>
where
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
{
    red: R,
    green: G,
    blue: B,
}

impl<R, G, B> StatusLeds<R, G, B>
where
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
{
    /// Wraps the three pins. No pin is driven until the first
    /// [`show()`](StatusLeds::show) or [`off()`](StatusLeds::off).
    pub fn new(red: R, green: G, blue: B) -> Self {
        Self { red, green, blue }
    }

    /// Lights the combination for `color`, turning the other LEDs off.
    pub fn show(&mut self, color: StatusColor) {
        let (r, g, b) = color.rgb();
        self.set(r, g, b);
    }

    /// All three LEDs off.
    pub fn off(&mut self) {
        self.set(false, false, false);
    }

    fn set(&mut self, r: bool, g: bool, b: bool) {
        let _ = if r {
            self.red.set_high()
        } else {
            self.red.set_low()
        };
        let _ = if g {
            self.green.set_high()
        } else {
            self.green.set_low()
        };
        let _ = if b {
            self.blue.set_high()
        } else {
            self.blue.set_low()
        };
    }

    /// Releases the pins.
    pub fn release(self) -> (R, G, B) {
        (self.red, self.green, self.blue)
    }
}
