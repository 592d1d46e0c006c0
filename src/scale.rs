/// the display scale factors offered in the menu
pub const SCALE_PRESETS: [f32; 5] = [0.5, 0.75, 1.0, 1.25, 1.5];

/// how close a scale has to be to a preset to count as that preset
pub const SCALE_EPSILON: f32 = 0.0001;

/// Window size at scale 1.0, in points. Points already include the zoom
/// factor, so these are sent unchanged whatever the scale is.
pub const BASE_SIZE: [f32; 2] = [300.0, 340.0];
pub const BASE_MIN_SIZE: [f32; 2] = [150.0, 170.0];

#[must_use]
pub fn is_current(preset: f32, scale: f32) -> bool {
    (preset - scale).abs() < SCALE_EPSILON
}

/// the preset closest to `scale`
#[must_use]
pub fn nearest_preset(scale: f32) -> f32 {
    SCALE_PRESETS
        .into_iter()
        .min_by(|a, b| (a - scale).abs().total_cmp(&(b - scale).abs()))
        .unwrap_or(1.0)
}
