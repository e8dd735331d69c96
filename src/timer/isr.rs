use crate::controller::LaneController;
use crate::vision::VisionSource;
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::digital::OutputPin;
use embedded_hal_nb::serial::{Read, Write};

/// Initializes the global static cell for an interrupt-ticked
/// [`LaneController`].
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```ignore
/// use lanepilot::controller::LaneController;
/// use lanepilot::timer::global_controller_init;
///
/// static CONTROLLER: Mutex<RefCell<Option<LaneController<Cam, Uart, PD1, PD2, PD3>>>> =
///     global_controller_init::<Cam, Uart, PD1, PD2, PD3>();
/// ```
pub const fn global_controller_init<V, S, R, G, B>()
-> Mutex<RefCell<Option<LaneController<V, S, R, G, B>>>>
where
    V: VisionSource,
    S: Read<u8> + Write<u8>,
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
{
    Mutex::new(RefCell::new(None))
}

/// Parks an assembled controller in the global cell.
///
/// Call once from `main` after constructing the controller, before
/// enabling the timer interrupt that ticks it.
pub fn global_controller_setup<V, S, R, G, B>(
    global_controller: &'static Mutex<RefCell<Option<LaneController<V, S, R, G, B>>>>,
    controller: LaneController<V, S, R, G, B>,
) where
    V: VisionSource,
    S: Read<u8> + Write<u8>,
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
{
    critical_section::with(|cs| {
        let _ = global_controller.borrow(cs).replace(Some(controller));
    });
}

/// Runs one control-loop iteration from an interrupt context.
///
/// The critical section serializes the tick against any main-thread access
/// to the cell; dispatcher mutations and PID updates therefore never
/// interleave. A not-yet-installed controller makes this a no-op, so the
/// interrupt may be enabled early.
///
/// # Example
/// ```ignore
/// #[interrupt]
/// fn TIM2() {
///     global_controller_tick(&CONTROLLER, millis());
/// }
/// ```
pub fn global_controller_tick<V, S, R, G, B>(
    global_controller: &'static Mutex<RefCell<Option<LaneController<V, S, R, G, B>>>>,
    now_ms: u32,
) where
    V: VisionSource,
    S: Read<u8> + Write<u8>,
    R: OutputPin,
    G: OutputPin,
    B: OutputPin,
{
    critical_section::with(|cs| {
        if let Some(controller) = global_controller.borrow(cs).borrow_mut().as_mut() {
            controller.tick(now_ms);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::super::tests::{CountingVision, SerialMock};
    use super::*;
    use crate::mode::ControlMode;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::serial::Transaction as SerialTransaction;

    type CellController = LaneController<CountingVision, SerialMock, PinMock, PinMock, PinMock>;

    static CONTROLLER: Mutex<RefCell<Option<CellController>>> = global_controller_init();

    #[test]
    fn test_global_cell_install_and_tick() {
        // Ticking an empty cell is a no-op.
        global_controller_tick(&CONTROLLER, 0);

        let controller = LaneController::new(
            CountingVision { captures: 0 },
            SerialMock::new(&[SerialTransaction::read_error(nb::Error::WouldBlock)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[PinTransaction::set(PinState::Low)]),
            PinMock::new(&[PinTransaction::set(PinState::High)]),
            0,
        );
        global_controller_setup(&CONTROLLER, controller);
        global_controller_tick(&CONTROLLER, 10);

        critical_section::with(|cs| {
            let cell = CONTROLLER.borrow(cs).borrow();
            let controller = cell.as_ref().unwrap();
            assert_eq!(controller.mode, ControlMode::Idle);
            assert_eq!(controller.vision.captures, 1);
        });
    }
}
