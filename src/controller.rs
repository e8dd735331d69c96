//! The lane-following control loop.
//!
//! [`LaneController`] owns every piece of shared control state — the active
//! mode, the PID controller, the vision tuning, the link parser, and the
//! serial port — and advances all of it from a single entry point:
//! [`tick()`](LaneController::tick), one call per loop iteration.
//!
//! ## One iteration
//!
//! 1. Capture a frame (always; the camera paces the loop).
//! 2. Steering modes reduce the frame to a target angle; non-steering modes
//!    force target, servo, and error to zero without touching PID state.
//! 3. If the PID cadence elapsed and the mode steers, run one PID step.
//! 4. If the telemetry cadence elapsed, the mode steers, and telemetry is
//!    enabled, transmit a telemetry frame.
//! 5. Drain every byte the UART has buffered through the link parser and
//!    dispatch each accepted command. Snapshot requests stream out
//!    immediately, using this iteration's frame.
//! 6. If the debug cadence elapsed and debugging is wanted, report state.
//!
//! The three cadences run on independent additive deadlines
//! (`next = now + period` on expiry) compared wrap-safely against the
//! caller's monotonic millisecond clock; the loop itself never blocks and
//! never terminates on its own. Everything runs on one thread of control —
//! an interrupt-driven integration must serialize `tick()` against any
//! other access, which is what [`crate::timer`]'s global cell is for.

use crate::command::{Command, CommandOutcome};
use crate::consts::{
    DEBUG_PERIOD_MS, DEBUG_STARTUP_DELAY_MS, PID_PERIOD_MS, PID_STARTUP_DELAY_MS,
    TELEMETRY_PERIOD_MS, TELEMETRY_STARTUP_DELAY_MS,
};
use crate::frame::Telemetry;
use crate::link::LinkParser;
use crate::mode::ControlMode;
use crate::pid::{SteeringDirection, SteeringPid};
use crate::status::StatusLeds;
use crate::timer::deadline_passed;
use crate::vision::{VisionSource, VisionTuning};
use embedded_hal::digital::OutputPin;
use embedded_hal_nb::serial::{Read, Write};
use libm::roundf;
use nb::block;

/// The camera board's control stack, wired to its collaborators.
///
/// ## Type parameters
///
/// - `V`: the vision collaborator producing target angles and snapshots
/// - `S`: the UART to the drive board ([`embedded_hal_nb::serial`] read + write)
/// - `R`, `G`, `B`: the status LED pins
///
/// Shared state the command dispatcher mutates is public on purpose: the
/// host pokes gains and tuning mid-run over the wire, and integrations or
/// tests may do the same directly.
#[derive(Debug)]
pub struct LaneController<V, S, R, G, B>
where
    V: VisionSource,
    S: Read<u8> + Write<u8>,
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
{
    /// Active control mode.
    pub mode: ControlMode,
    /// The steering PID and its calibration.
    pub pid: SteeringPid,
    /// Host-tunable vision parameters.
    pub tuning: VisionTuning,
    /// Inbound link state machine and its counters.
    pub link: LinkParser,
    /// Whether the periodic telemetry stream is on.
    pub telemetry_enabled: bool,
    /// Whether the debug cadence reports anything.
    pub debug_wanted: bool,
    /// The vision collaborator.
    pub vision: V,
    /// The UART to the drive board.
    pub serial: S,
    /// The status indicator.
    pub leds: StatusLeds<R, G, B>,

    next_pid_ms: u32,
    next_telemetry_ms: u32,
    next_debug_ms: u32,

    target_angle: f32,
    servo_angle: f32,
    angle_error: f32,
}

impl<V, S, R, G, B> LaneController<V, S, R, G, B>
where
    V: VisionSource,
    S: Read<u8> + Write<u8>,
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
{
    /// Assembles the controller and brings it up in Idle mode (blue
    /// indicator, idle capture profile, telemetry off).
    ///
    /// `now_ms` baselines the PID and starts the cadence deadlines; the
    /// first PID step runs 75 ms later, the first possible telemetry frame
    /// 100 ms later, so the camera pipeline has settled before either
    /// fires.
    pub fn new(vision: V, serial: S, red: R, green: G, blue: B, now_ms: u32) -> Self {
        let mut controller = Self {
            mode: ControlMode::Idle,
            pid: SteeringPid::new(now_ms),
            tuning: VisionTuning::new(),
            link: LinkParser::new(),
            telemetry_enabled: false,
            debug_wanted: false,
            vision,
            serial,
            leds: StatusLeds::new(red, green, blue),
            next_pid_ms: now_ms.wrapping_add(PID_STARTUP_DELAY_MS),
            next_telemetry_ms: now_ms.wrapping_add(TELEMETRY_STARTUP_DELAY_MS),
            next_debug_ms: now_ms.wrapping_add(DEBUG_STARTUP_DELAY_MS),
            target_angle: 0.0,
            servo_angle: 0.0,
            angle_error: 0.0,
        };
        controller.set_mode(ControlMode::Idle);
        controller
    }

    /// Target angle from the current iteration, degrees.
    pub fn target_angle(&self) -> f32 {
        self.target_angle
    }

    /// Servo angle from the most recent PID step, degrees, ±50.
    pub fn servo_angle(&self) -> f32 {
        self.servo_angle
    }

    /// Angle error from the most recent PID step, degrees.
    pub fn angle_error(&self) -> f32 {
        self.angle_error
    }

    /// Switches the active mode: status indicator and capture profile
    /// follow immediately. PID state is deliberately left alone — dropping
    /// out of a steering mode and back in resumes where the car left off.
    pub fn set_mode(&mut self, mode: ControlMode) {
        self.mode = mode;
        self.leds.show(mode.status_color());
        self.vision.apply_capture_profile(mode);
        #[cfg(feature = "log")]
        log::info!("control mode -> {mode:?}");
        #[cfg(feature = "defmt-0-3")]
        defmt::info!("control mode -> {}", defmt::Debug2Format(&mode));
    }

    /// Applies one decoded command to the shared state.
    ///
    /// Out-of-range parameters change nothing and report
    /// [`CommandOutcome::Ignored`]; the sender is never told either way.
    /// [`CommandOutcome::Snapshot`] asks the caller to transmit a snapshot
    /// — [`tick()`](LaneController::tick) handles that itself.
    pub fn apply_command(&mut self, command: Command) -> CommandOutcome {
        match command {
            Command::SetMode(mode) => {
                self.set_mode(mode);
                CommandOutcome::Applied
            }
            Command::SendSnapshot => CommandOutcome::Snapshot,
            Command::SetDriveTelemetry(enabled) => {
                self.telemetry_enabled = enabled;
                CommandOutcome::Applied
            }
            Command::SetSeedLocation { y } => outcome(self.tuning.set_seed_location_y(y)),
            Command::SetFloatingThreshold(value) => {
                self.tuning.floating_threshold = value;
                CommandOutcome::Applied
            }
            Command::SetSeedThreshold(value) => {
                self.tuning.seed_threshold = value;
                CommandOutcome::Applied
            }
            Command::SetRoiWeight { slot, weight } => {
                outcome(self.tuning.set_roi_weight(slot, weight))
            }
            Command::SetRoiPosition { slot, y, height } => {
                outcome(self.tuning.set_roi_position(slot, y, height))
            }
            Command::SetKp(value) => {
                self.pid.kp = value;
                CommandOutcome::Applied
            }
            Command::SetKi(value) => {
                self.pid.ki = value;
                CommandOutcome::Applied
            }
            Command::SetKd(value) => {
                self.pid.kd = value;
                CommandOutcome::Applied
            }
            Command::SetSteeringGain(value) => {
                self.pid.steering_gain = value;
                CommandOutcome::Applied
            }
            Command::SetSteeringDirection { index } => {
                match SteeringDirection::from_index(index) {
                    Some(direction) => {
                        self.pid.direction = direction;
                        CommandOutcome::Applied
                    }
                    None => CommandOutcome::Ignored,
                }
            }
            Command::SetPerspectiveFactor(value) => {
                self.tuning.perspective_factor = value;
                CommandOutcome::Applied
            }
            Command::SetPerspectiveCorrection(enabled) => {
                self.tuning.perspective_correction = enabled;
                CommandOutcome::Applied
            }
        }
    }

    /// Runs one control-loop iteration against the given monotonic
    /// millisecond timestamp.
    ///
    /// Safe to call as fast as frames arrive; the PID, telemetry, and debug
    /// cadences gate themselves internally. Never blocks waiting for
    /// inbound bytes — the drain consumes only what the UART already
    /// buffered.
    pub fn tick(&mut self, now_ms: u32) {
        let image = self.vision.capture();

        if self.mode.is_steering() {
            self.target_angle = self.vision.target_angle(&image, self.mode, &self.tuning);
        } else {
            self.target_angle = 0.0;
            self.servo_angle = 0.0;
            self.angle_error = 0.0;
        }

        if deadline_passed(now_ms, self.next_pid_ms) {
            self.next_pid_ms = now_ms.wrapping_add(PID_PERIOD_MS);
            if self.mode.is_steering() {
                let (angle_error, servo_angle) = self.pid.update(self.target_angle, now_ms);
                self.angle_error = angle_error;
                self.servo_angle = servo_angle;
            }
        }

        if deadline_passed(now_ms, self.next_telemetry_ms)
            && self.mode.is_steering()
            && self.telemetry_enabled
        {
            self.next_telemetry_ms = now_ms.wrapping_add(TELEMETRY_PERIOD_MS);
            self.send_telemetry();
        }

        self.drain_commands(&image);

        if deadline_passed(now_ms, self.next_debug_ms) && self.debug_wanted {
            self.next_debug_ms = now_ms.wrapping_add(DEBUG_PERIOD_MS);
            #[cfg(feature = "log")]
            log::debug!(
                "target {:.1} servo {:.1} error {:.1} | frames {} framing {} checksum {}",
                self.target_angle,
                self.servo_angle,
                self.angle_error,
                self.link.good_frames,
                self.link.framing_errors,
                self.link.checksum_errors
            );
            #[cfg(feature = "defmt-0-3")]
            defmt::debug!(
                "target {} servo {} error {} | frames {} framing {} checksum {}",
                self.target_angle,
                self.servo_angle,
                self.angle_error,
                self.link.good_frames,
                self.link.framing_errors,
                self.link.checksum_errors
            );
        }
    }

    fn send_telemetry(&mut self) {
        let report = Telemetry {
            steering_command: roundf(self.pid.drive_command(self.servo_angle)) as i16,
            angle_error: roundf(self.angle_error) as i16,
            target_angle: roundf(self.target_angle) as i16,
        };
        for byte in report.encode() {
            let _ = block!(self.serial.write(byte));
        }
    }

    fn drain_commands(&mut self, image: &V::Image) {
        while let Ok(byte) = self.serial.read() {
            let Some(frame) = self.link.push(byte) else {
                continue;
            };
            let Some(command) = Command::from_frame(&frame) else {
                continue;
            };
            if self.apply_command(command) == CommandOutcome::Snapshot {
                let vision = &mut self.vision;
                let serial = &mut self.serial;
                vision.snapshot(image, &mut |byte| {
                    let _ = block!(serial.write(byte));
                });
            }
        }
    }
}

fn outcome(applied: bool) -> CommandOutcome {
    if applied {
        CommandOutcome::Applied
    } else {
        CommandOutcome::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CMD_PID_SET_KP, CMD_SEND_PIC};
    use crate::frame::CommandFrame;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::serial::{Mock, Transaction as SerialTransaction};

    type SerialMock = Mock<u8>;

    /// Vision stand-in that always reports the same target angle and
    /// records what the controller asked of it.
    #[derive(Debug)]
    struct ScriptedVision {
        angle: f32,
        captures: u32,
        target_calls: u32,
        profiles: Vec<ControlMode>,
        snapshot_payload: &'static [u8],
    }

    impl ScriptedVision {
        fn new(angle: f32) -> Self {
            Self {
                angle,
                captures: 0,
                target_calls: 0,
                profiles: Vec::new(),
                snapshot_payload: &[],
            }
        }
    }

    impl VisionSource for ScriptedVision {
        type Image = u32;

        fn capture(&mut self) -> u32 {
            self.captures += 1;
            self.captures
        }

        fn target_angle(&mut self, _image: &u32, _mode: ControlMode, _tuning: &VisionTuning) -> f32 {
            self.target_calls += 1;
            self.angle
        }

        fn apply_capture_profile(&mut self, mode: ControlMode) {
            self.profiles.push(mode);
        }

        fn snapshot(&mut self, _image: &u32, emit: &mut dyn FnMut(u8)) {
            for &byte in self.snapshot_payload {
                emit(byte);
            }
        }
    }

    fn idle_led_mocks() -> (PinMock, PinMock, PinMock) {
        // `new()` selects Idle: blue on, red and green off.
        (
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[PinTransaction::set(PinState::High)]),
        )
    }

    /// Consumes the controller and verifies every mock saw exactly its
    /// expected transactions.
    fn shutdown(controller: LaneController<ScriptedVision, SerialMock, PinMock, PinMock, PinMock>) {
        let LaneController {
            mut serial, leds, ..
        } = controller;
        serial.done();
        let (mut red, mut green, mut blue) = leds.release();
        red.done();
        green.done();
        blue.done();
    }

    #[test]
    fn test_startup_is_idle_with_blue_indicator() {
        let (red, green, blue) = idle_led_mocks();
        let serial = SerialMock::new(&[]);
        let controller = LaneController::new(ScriptedVision::new(0.0), serial, red, green, blue, 0);

        assert_eq!(controller.mode, ControlMode::Idle);
        assert!(!controller.telemetry_enabled);
        assert_eq!(controller.vision.profiles, vec![ControlMode::Idle]);
        shutdown(controller);
    }

    #[test]
    fn test_non_steering_modes_zero_outputs_without_pid() {
        let (red, green, blue) = idle_led_mocks();
        let serial = SerialMock::new(&[SerialTransaction::read_error(nb::Error::WouldBlock)]);
        let mut controller =
            LaneController::new(ScriptedVision::new(17.0), serial, red, green, blue, 0);

        controller.tick(200); // PID deadline long past, but mode is Idle
        assert_eq!(controller.target_angle(), 0.0);
        assert_eq!(controller.servo_angle(), 0.0);
        assert_eq!(controller.angle_error(), 0.0);
        assert_eq!(controller.vision.captures, 1);
        assert_eq!(controller.vision.target_calls, 0);
        shutdown(controller);
    }

    #[test]
    fn test_steering_tick_runs_pid_and_sends_telemetry() {
        let (red, green, blue) = idle_led_mocks();

        // One 100 ms tick in BlobTracking with telemetry on: first PID step
        // sees dt=100, error=-10, P=-8, D=0.4*(-10)/100=-0.04, I=0, so
        // servo = 8.04 and the drive command rounds to -40.
        let expected = Telemetry {
            steering_command: -40,
            angle_error: -10,
            target_angle: 10,
        }
        .encode();
        let serial = SerialMock::new(&[
            SerialTransaction::write_many(expected),
            SerialTransaction::read_error(nb::Error::WouldBlock),
        ]);

        let mut controller =
            LaneController::new(ScriptedVision::new(10.0), serial, red, green, blue, 0);
        controller.leds = relabel_for_blob(controller.leds);
        assert_eq!(
            controller.apply_command(Command::SetMode(ControlMode::BlobTracking)),
            CommandOutcome::Applied
        );
        assert_eq!(
            controller.apply_command(Command::SetDriveTelemetry(true)),
            CommandOutcome::Applied
        );

        controller.tick(100);

        assert_eq!(controller.target_angle(), 10.0);
        assert_eq!(controller.angle_error(), -10.0);
        assert!((controller.servo_angle() - 8.04).abs() < 1e-5);
        assert_eq!(
            controller.vision.profiles,
            vec![ControlMode::Idle, ControlMode::BlobTracking]
        );
        shutdown(controller);
    }

    #[test]
    fn test_telemetry_suppressed_when_disabled() {
        let (red, green, blue) = idle_led_mocks();
        let serial = SerialMock::new(&[SerialTransaction::read_error(nb::Error::WouldBlock)]);
        let mut controller =
            LaneController::new(ScriptedVision::new(10.0), serial, red, green, blue, 0);
        controller.leds = relabel_for_blob(controller.leds);
        let _ = controller.apply_command(Command::SetMode(ControlMode::BlobTracking));

        // Telemetry deadline is long past, but the stream was never enabled:
        // the only serial traffic is the (empty) inbound drain.
        controller.tick(500);
        shutdown(controller);
    }

    #[test]
    fn test_drain_dispatches_buffered_command() {
        let (red, green, blue) = idle_led_mocks();
        let frame = CommandFrame::from_float(CMD_PID_SET_KP, 1.25).encode();
        let serial = SerialMock::new(&[
            SerialTransaction::read_many(frame),
            SerialTransaction::read_error(nb::Error::WouldBlock),
        ]);
        let mut controller =
            LaneController::new(ScriptedVision::new(0.0), serial, red, green, blue, 0);

        controller.tick(1);

        assert_eq!(controller.pid.kp, 1.25);
        assert_eq!(controller.link.good_frames, 1);
        shutdown(controller);
    }

    #[test]
    fn test_snapshot_command_streams_current_frame() {
        let (red, green, blue) = idle_led_mocks();
        let frame = CommandFrame::from_ints(CMD_SEND_PIC, 0, 0).encode();
        let serial = SerialMock::new(&[
            SerialTransaction::read_many(frame),
            SerialTransaction::write_many([0x4A, 0x46, 0x49, 0x46]),
            SerialTransaction::read_error(nb::Error::WouldBlock),
        ]);
        let mut vision = ScriptedVision::new(0.0);
        vision.snapshot_payload = &[0x4A, 0x46, 0x49, 0x46];
        let mut controller = LaneController::new(vision, serial, red, green, blue, 0);

        controller.tick(1);
        shutdown(controller);
    }

    #[test]
    fn test_out_of_range_parameters_are_ignored() {
        let (red, green, blue) = idle_led_mocks();
        let serial = SerialMock::new(&[]);
        let mut controller =
            LaneController::new(ScriptedVision::new(0.0), serial, red, green, blue, 0);

        let tuning_before = controller.tuning.clone();
        assert_eq!(
            controller.apply_command(Command::SetSeedLocation { y: 300 }),
            CommandOutcome::Ignored
        );
        assert_eq!(
            controller.apply_command(Command::SetRoiWeight {
                slot: crate::roi::RoiSlot::Top,
                weight: -1.0
            }),
            CommandOutcome::Ignored
        );
        assert_eq!(controller.tuning, tuning_before);

        let direction_before = controller.pid.direction;
        assert_eq!(
            controller.apply_command(Command::SetSteeringDirection { index: 7 }),
            CommandOutcome::Ignored
        );
        assert_eq!(controller.pid.direction, direction_before);
        shutdown(controller);
    }

    #[test]
    fn test_pid_cadence_gates_updates() {
        let (red, green, blue) = idle_led_mocks();
        let serial = SerialMock::new(&[
            SerialTransaction::read_error(nb::Error::WouldBlock),
            SerialTransaction::read_error(nb::Error::WouldBlock),
            SerialTransaction::read_error(nb::Error::WouldBlock),
        ]);
        let mut controller =
            LaneController::new(ScriptedVision::new(10.0), serial, red, green, blue, 0);
        controller.leds = relabel_for_blob(controller.leds);
        let _ = controller.apply_command(Command::SetMode(ControlMode::BlobTracking));

        controller.tick(10); // before the 75 ms startup delay
        assert_eq!(controller.servo_angle(), 0.0);

        controller.tick(80); // first PID step
        let servo_after_first = controller.servo_angle();
        assert!(servo_after_first != 0.0);

        controller.tick(85); // within the 20 ms period: no new step
        assert_eq!(controller.servo_angle(), servo_after_first);
        shutdown(controller);
    }

    fn relabel_for_blob(
        leds: StatusLeds<PinMock, PinMock, PinMock>,
    ) -> StatusLeds<PinMock, PinMock, PinMock> {
        // Swap in fresh pin expectations for the yellow (blob) transition.
        let (mut red, mut green, mut blue) = leds.release();
        red.done();
        green.done();
        blue.done();
        StatusLeds::new(
            PinMock::new(&[PinTransaction::set(PinState::High)]),
            PinMock::new(&[PinTransaction::set(PinState::High)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
        )
    }
}
