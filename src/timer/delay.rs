use crate::controller::LaneController;
use crate::vision::VisionSource;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal_nb::serial::{Read, Write};

/// Runs the control loop on a blocking delay instead of a live clock.
///
/// Each iteration ticks the controller, sleeps `tick_ms`, and advances the
/// synthesized clock by the same amount. Useful where no free-running
/// millisecond counter exists and the vision source returns without
/// blocking; the synthesized clock drifts from wall time by whatever the
/// delay provider's overshoot is, which the control cadences tolerate.
///
/// # Arguments
/// - `controller`: the assembled [`LaneController`]
/// - `delay`: a delay provider, typically from the HAL
/// - `tick_ms`: loop iteration period, milliseconds (e.g. 5 for ~200 Hz
///   polling, comfortably above the 50 Hz PID cadence)
/// - `start_ms`: initial clock value; pass the same value the controller
///   was constructed with
/// - `stop`: checked after every iteration; return `true` to wind down
///
/// # Example
/// ```ignore
/// use lanepilot::timer::run_control_loop_with_delay;
/// run_control_loop_with_delay(&mut controller, &mut delay, 5, 0, || false);
/// ```
pub fn run_control_loop_with_delay<D, V, S, R, G, B, P>(
    controller: &mut LaneController<V, S, R, G, B>,
    delay: &mut D,
    tick_ms: u32,
    start_ms: u32,
    mut stop: P,
) where
    D: DelayNs,
    V: VisionSource,
    S: Read<u8> + Write<u8>,
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
    P: FnMut() -> bool,
{
    let mut now_ms = start_ms;
    loop {
        controller.tick(now_ms);
        if stop() {
            return;
        }
        delay.delay_ms(tick_ms);
        now_ms = now_ms.wrapping_add(tick_ms);
    }
}
