//! Colour mapping for the water surface.

use glam::Vec4;

/// Momentum magnitude that saturates the heat ramp.
pub const MOMENTUM_SATURATION: f32 = 2.0;

/// Colour of water with no momentum information: plain white.
pub const PLAIN_WATER: [f32; 3] = [1.0, 1.0, 1.0];

/// Map a normalized intensity (0.0 to 1.0) to a red → green → blue ramp.
pub fn heat_ramp(intensity: f32, alpha: f32) -> Vec4 {
    let t = intensity.clamp(0.0, 1.0);
    Vec4::new(1.0 - t, (0.5 - (t - 0.5).abs()) * 2.0, t, alpha)
}

/// Momentum magnitude `sqrt(xmom² + ymom²)`.
pub fn momentum_magnitude(xmom: f32, ymom: f32) -> f32 {
    (xmom * xmom + ymom * ymom).sqrt()
}

/// Colour of a water vertex driven by its momentum.
pub fn momentum_color(xmom: f32, ymom: f32, alpha: f32) -> Vec4 {
    let intensity = (momentum_magnitude(xmom, ymom) / MOMENTUM_SATURATION).min(1.0);
    heat_ramp(intensity, alpha)
}

/// Colour of a water vertex when the file has no momentum.
pub fn plain_color(alpha: f32) -> Vec4 {
    Vec4::new(PLAIN_WATER[0], PLAIN_WATER[1], PLAIN_WATER[2], alpha)
}
