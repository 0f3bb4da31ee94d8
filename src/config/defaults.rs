pub(super) const MIN_STEPS_PER_FRAME_FLOOR: u32 = 1;
pub(super) const MAX_STEPS_PER_FRAME_CEILING: u32 = 64;
pub(super) const MAX_LEARNING_RATE: f64 = 10.0;
pub(super) const MIN_LEARNING_RATE: f64 = 1e-4;
pub(super) const MAX_OVERLAY_OPACITY: f32 = 0.6;
pub(super) const MIN_RASTER_SIZE: u32 = 4;
pub(super) const MAX_RASTER_SIZE: u32 = 128;

pub(super) fn default_learning_rate() -> f64 {
    0.3
}

pub(super) fn default_min_steps_per_frame() -> u32 {
    3
}

pub(super) fn default_max_steps_per_frame() -> u32 {
    12
}

pub(super) fn default_frame_point_budget() -> u32 {
    1_200
}

pub(super) fn default_frame_interval_ms() -> u64 {
    16
}

pub(super) fn default_false() -> bool {
    false
}

pub(super) fn default_min_k() -> usize {
    3
}

pub(super) fn default_max_k() -> usize {
    7
}

pub(super) fn default_distance_epsilon() -> f32 {
    1e-6
}

pub(super) fn default_min_labeled_for_accuracy() -> usize {
    4
}

pub(super) fn default_holdout_fraction() -> f32 {
    0.2
}

pub(super) fn default_raster_size() -> u32 {
    32
}

pub(super) fn default_histogram_bins() -> u32 {
    6
}

pub(super) fn default_canvas_size() -> u32 {
    480
}

pub(super) fn default_grid_resolution() -> u32 {
    30
}

pub(super) fn default_overlay_opacity() -> f32 {
    0.35
}

pub(super) fn default_point_radius() -> f32 {
    5.0
}

pub(super) fn clamp_learning_rate(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_LEARNING_RATE, MAX_LEARNING_RATE)
    } else {
        default_learning_rate()
    }
}

pub(super) fn clamp_overlay_opacity(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, MAX_OVERLAY_OPACITY)
    } else {
        default_overlay_opacity()
    }
}
