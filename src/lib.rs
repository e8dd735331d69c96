//! # lanepilot
//!
//! A portable, no_std lane-following steering controller for small
//! camera-guided racers (DonKCar-style builds, where an OpenMV-class camera
//! board steers and a separate drive board runs the motors).
//!
//! This crate implements the camera board's control stack:
//! - a framed, checksummed serial protocol to the drive board
//! - a byte-at-a-time link state machine that survives noise and resyncs
//! - a command dispatcher for remote tuning (modes, PID gains, ROI weights)
//! - a PID steering controller with bounded output and integral clamping
//! - a fixed-cadence control loop driven by a millisecond clock
//!
//! The camera and image processing themselves stay outside this crate: the
//! vision side is a collaborator behind the [`vision::VisionSource`] trait
//! and only ever hands the loop a single scalar — the target steering angle,
//! in degrees, 0 = straight ahead.
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` support and replaces `heapless::Vec`s with `std::vec::Vec`s |
//! | `delay-loop`          | Blocking run loop over `embedded_hal::delay::DelayNs` |
//! | `timer-isr` (default) | `critical_section`-guarded global controller for ISR-driven ticking |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Usage
//!
//! ```ignore
//! use lanepilot::controller::LaneController;
//!
//! let mut controller = LaneController::new(vision, uart, red, green, blue, millis());
//! loop {
//!     controller.tick(millis()); // one control-loop iteration
//! }
//! ```
//!
//! Or, use `run_control_loop()` with a clock closure and a stop predicate:
//!
//! ```ignore
//! lanepilot::timer::run_control_loop(&mut controller, || millis(), || false);
//! ```
//!
//! ## Wire protocol
//!
//! Both directions share the same markers (start `0xAA`, end `0xA8`) and an
//! additive mod-256 checksum over the interior bytes. Inbound command frames
//! are 8 bytes; outbound telemetry frames are 10 bytes carrying the steering
//! command, the angle error, and the target angle as little-endian `i16`s.
//! See [`frame`] for the exact layouts.
//!
//! ## Integration notes
//!
//! - `tick()` expects a monotonic millisecond timestamp; cadences are gated
//!   internally (PID 50 Hz, telemetry 10 Hz, debug 4 Hz) so the loop may be
//!   driven as fast as the camera delivers frames.
//! - Inbound bytes are drained from whatever the UART has buffered and never
//!   block the loop.
//! - Malformed or corrupted frames are dropped silently and show up only in
//!   the link counters; there is no acknowledgment channel.
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "timer-isr")]
pub use critical_section;

#[cfg(not(feature = "std"))]
pub use heapless;

pub(crate) mod checksum;
pub mod command;
pub mod consts;
pub mod controller;
pub mod frame;
pub mod link;
pub mod mode;
pub mod pid;
pub mod roi;
pub mod status;
pub mod timer;
pub mod vision;
