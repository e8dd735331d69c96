//! Seam between the control stack and the image-processing side.
//!
//! Everything that touches pixels — capture, blob finding, line fitting,
//! perspective math, JPEG compression — lives behind [`VisionSource`].
//! The control loop only ever asks for three things: a fresh image, the
//! target steering angle that image implies, and (on request) an encoded
//! snapshot to stream to the host.
//!
//! The collaborator is not a black box in the other direction, though: the
//! host tunes the vision pipeline over the command link, so the dispatcher
//! needs a concrete place to put those knobs. [`VisionTuning`] is that
//! place — owned by the controller, mutated only through bounds-checked
//! setters, and handed to the collaborator by reference on every call.

use crate::consts::{
    DEFAULT_FLOATING_THRESHOLD, DEFAULT_PERSPECTIVE_FACTOR, DEFAULT_SCAN_TOP,
    DEFAULT_SEED_LOCATION_Y, DEFAULT_SEED_THRESHOLD, ROI_COORD_MAX,
};
use crate::mode::ControlMode;
use crate::roi::{RoiSlot, RoiTable};

/// A camera-plus-vision collaborator the control loop can drive.
///
/// Implementations run whichever detection strategy the active
/// [`ControlMode`] calls for and reduce a whole image to one scalar: the
/// desired steering deflection in degrees, 0 = straight ahead, roughly
/// ±45 at full lock.
pub trait VisionSource {
    /// Whatever the collaborator captures per iteration.
    type Image;

    /// Grabs the next frame. Called once per loop iteration, in every mode;
    /// this is the natural pacing element of the control loop.
    fn capture(&mut self) -> Self::Image;

    /// Reduces `image` to a target steering angle for the active mode,
    /// reading band weights, thresholds, and perspective settings from
    /// `tuning`.
    fn target_angle(&mut self, image: &Self::Image, mode: ControlMode, tuning: &VisionTuning)
    -> f32;

    /// Reconfigures the capture pipeline (pixel format, resolution, ...)
    /// for a newly selected mode.
    fn apply_capture_profile(&mut self, mode: ControlMode);

    /// Streams an encoded snapshot of `image`, byte by byte, into `emit`.
    /// The controller wires `emit` to the serial link when the host asks
    /// for a picture.
    fn snapshot(&mut self, image: &Self::Image, emit: &mut dyn FnMut(u8));
}

/// Host-tunable parameters the vision layer reads on every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionTuning {
    /// The three weighted scan bands.
    pub rois: RoiTable,
    /// Image row where the flood-fill seed is planted.
    pub seed_location_y: i16,
    /// Maximum difference between the seed pixel and any filled pixel.
    pub seed_threshold: f32,
    /// Maximum difference between any two adjacent filled pixels.
    pub floating_threshold: f32,
    /// First image row worth scanning; rows above it are sky and wall.
    pub scan_top: i16,
    /// Perspective-correction strength.
    pub perspective_factor: f32,
    /// Whether perspective correction is applied at all.
    pub perspective_correction: bool,
}

impl VisionTuning {
    /// Stock tuning for a 160x120 capture.
    pub fn new() -> Self {
        Self {
            rois: RoiTable::new(),
            seed_location_y: DEFAULT_SEED_LOCATION_Y,
            seed_threshold: DEFAULT_SEED_THRESHOLD,
            floating_threshold: DEFAULT_FLOATING_THRESHOLD,
            scan_top: DEFAULT_SCAN_TOP,
            perspective_factor: DEFAULT_PERSPECTIVE_FACTOR,
            perspective_correction: false,
        }
    }

    /// Moves the flood-fill seed row. Rejected (and nothing changes) unless
    /// the row lies within the 120-row capture.
    pub fn set_seed_location_y(&mut self, y: i16) -> bool {
        if y < 0 || y > ROI_COORD_MAX {
            return false;
        }
        self.seed_location_y = y;
        true
    }

    /// Replaces one band's weight; see [`RoiTable::set_weight`].
    pub fn set_roi_weight(&mut self, slot: RoiSlot, weight: f32) -> bool {
        self.rois.set_weight(slot, weight)
    }

    /// Moves one band; see [`RoiTable::set_position`]. Moving the top band
    /// also pulls [`scan_top`](VisionTuning::scan_top) down to just below
    /// its new top edge, so the scan window tracks the tuned geometry.
    pub fn set_roi_position(&mut self, slot: RoiSlot, y: i16, height: i16) -> bool {
        if !self.rois.set_position(slot, y, height) {
            return false;
        }
        if slot == RoiSlot::Top {
            self.scan_top = y + 1;
        }
        true
    }
}

impl Default for VisionTuning {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_location_bounds() {
        let mut tuning = VisionTuning::new();
        assert!(tuning.set_seed_location_y(0));
        assert!(tuning.set_seed_location_y(119));
        assert_eq!(tuning.seed_location_y, 119);

        assert!(!tuning.set_seed_location_y(120));
        assert!(!tuning.set_seed_location_y(-1));
        assert_eq!(tuning.seed_location_y, 119);
    }

    #[test]
    fn test_moving_top_band_tracks_scan_top() {
        let mut tuning = VisionTuning::new();
        assert_eq!(tuning.scan_top, 30);

        assert!(tuning.set_roi_position(RoiSlot::Top, 40, 19));
        assert_eq!(tuning.scan_top, 41);

        // Other bands don't touch the scan window.
        assert!(tuning.set_roi_position(RoiSlot::Bottom, 95, 20));
        assert_eq!(tuning.scan_top, 41);

        // A rejected move leaves the scan window alone too.
        assert!(!tuning.set_roi_position(RoiSlot::Top, 200, 19));
        assert_eq!(tuning.scan_top, 41);
    }
}
