//! Cadence and run-loop utilities for the lane controller.
//!
//! The control loop keeps three independent deadlines (PID, telemetry,
//! debug) against a monotonic millisecond clock. Deadlines advance
//! additively — `next = now + period` when one expires — and are compared
//! with [`deadline_passed`], which stays correct across the u32 wrap a
//! 49.7-day runtime will eventually hit.
//!
//! Three ways to drive the loop, from least to most infrastructure:
//! - [`run_control_loop`]: poll `tick()` with a clock closure and a stop
//!   predicate; the camera capture paces the loop.
//! - `run_control_loop_with_delay` (feature `delay-loop`): pace the loop
//!   with an `embedded_hal::delay::DelayNs` provider instead, for vision
//!   sources that return without blocking.
//! - `global_controller_*` (feature `timer-isr`): park the controller in a
//!   `critical_section` global cell and tick it from a timer interrupt.

use crate::controller::LaneController;
use crate::vision::VisionSource;
use embedded_hal::digital::OutputPin;
use embedded_hal_nb::serial::{Read, Write};

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg_attr(feature = "timer-isr", allow(unused_imports))]
#[cfg(feature = "timer-isr")]
pub use isr::*;

/// Whether `now_ms` has reached or passed `deadline_ms`.
///
/// Wrap-safe for deadlines within ±24.8 days of `now_ms`, which the
/// controller's sub-second periods never approach. A plain `>=` would
/// freeze every cadence for seven weeks after the clock wraps.
pub fn deadline_passed(now_ms: u32, deadline_ms: u32) -> bool {
    (now_ms.wrapping_sub(deadline_ms) as i32) >= 0
}

/// Polls the controller until `stop` says otherwise.
///
/// `now_ms` supplies the monotonic millisecond clock (e.g. a HAL `millis()`
/// wrapper); `stop` is checked after every iteration so tests and
/// supervised deployments can wind the loop down — on a bare-metal target
/// `|| false` runs forever, matching the original fit-and-forget firmware.
pub fn run_control_loop<V, S, R, G, B, C, P>(
    controller: &mut LaneController<V, S, R, G, B>,
    mut now_ms: C,
    mut stop: P,
) where
    V: VisionSource,
    S: Read<u8> + Write<u8>,
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
    C: FnMut() -> u32,
    P: FnMut() -> bool,
{
    loop {
        controller.tick(now_ms());
        if stop() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::ControlMode;
    use crate::vision::VisionTuning;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::serial::{Mock, Transaction as SerialTransaction};

    pub(super) type SerialMock = Mock<u8>;

    #[derive(Debug)]
    pub(super) struct CountingVision {
        pub captures: u32,
    }

    impl VisionSource for CountingVision {
        type Image = ();

        fn capture(&mut self) {
            self.captures += 1;
        }

        fn target_angle(&mut self, _image: &(), _mode: ControlMode, _tuning: &VisionTuning) -> f32 {
            0.0
        }

        fn apply_capture_profile(&mut self, _mode: ControlMode) {}

        fn snapshot(&mut self, _image: &(), _emit: &mut dyn FnMut(u8)) {}
    }

    pub(super) fn idle_controller(
        drain_ticks: usize,
    ) -> LaneController<CountingVision, SerialMock, PinMock, PinMock, PinMock> {
        let transactions: Vec<SerialTransaction<u8>> = (0..drain_ticks)
            .map(|_| SerialTransaction::read_error(nb::Error::WouldBlock))
            .collect();
        LaneController::new(
            CountingVision { captures: 0 },
            SerialMock::new(&transactions),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[PinTransaction::set(PinState::High)]),
            0,
        )
    }

    #[test]
    fn test_deadline_comparison_is_wrap_safe() {
        assert!(deadline_passed(100, 100));
        assert!(deadline_passed(101, 100));
        assert!(!deadline_passed(99, 100));

        // Deadline armed just before the wrap, checked just after it.
        assert!(deadline_passed(5, u32::MAX - 10));
        assert!(!deadline_passed(u32::MAX - 10, 5));
    }

    #[test]
    fn test_run_loop_ticks_until_stopped() {
        let mut controller = idle_controller(5);
        let mut now = 0u32;
        let mut iterations = 0u32;
        run_control_loop(
            &mut controller,
            || {
                now += 20;
                now
            },
            || {
                iterations += 1;
                iterations >= 5
            },
        );
        assert_eq!(controller.vision.captures, 5);
        verify_mocks(controller);
    }

    pub(super) fn verify_mocks(
        mut controller: LaneController<CountingVision, SerialMock, PinMock, PinMock, PinMock>,
    ) {
        controller.serial.done();
        let (mut red, mut green, mut blue) = controller.leds.release();
        red.done();
        green.done();
        blue.done();
    }
}
