//! CPU reference for the two fragment-shader compositing paths.
//!
//! `shaders.rs` carries the WGSL that actually runs; these functions define
//! the same arithmetic over `glam` types so the blending rules are pinned
//! down by unit tests instead of only by eyeballing rendered output.

use glam::{Vec2, Vec3};

use crate::noise::{fbm, hash, value_noise};

/// Palette endpoints of the noise/feedback variant.
const PALETTE_BASE: Vec3 = Vec3::new(0.1, 0.6, 0.667);
const PALETTE_WARM: Vec3 = Vec3::new(0.667, 0.667, 0.5);
const PALETTE_DEEP: Vec3 = Vec3::new(0.0, 0.0, 0.16);
const PALETTE_GLOW: Vec3 = Vec3::new(0.667, 1.0, 1.0);

/// Share of the live video sample in the trail channel; the remainder comes
/// from the previous frame.
const FEEDBACK_VIDEO_WEIGHT: f32 = 0.05;

/// Noise floor subtracted from the large-wave term before the one-sided
/// clamp.
const LARGE_WAVE_FLOOR: f32 = 0.3;

fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// The two domain-warped vector fields `q` and `r` and the final scalar `f`
/// the feedback variant mixes its palette with.
pub fn warped_fields(p: Vec2, frame: f32) -> (Vec2, Vec2, f32) {
    let q = Vec2::new(fbm(p), fbm(p + Vec2::ONE));
    let r = Vec2::new(
        fbm(p + q + Vec2::new(1.7, 9.2) + 0.15 * frame),
        fbm(p + q + Vec2::new(8.3, 2.8) + 0.125 * frame),
    );
    let f = fbm(p + r);
    (q, r, f)
}

/// Maps the warped fields onto the procedural color.
pub fn palette(q: Vec2, r: Vec2, f: f32) -> Vec3 {
    let mut color = mix(PALETTE_BASE, PALETTE_WARM, (f * f * 4.0).clamp(0.0, 1.0));
    color = mix(color, PALETTE_DEEP, q.length().clamp(0.0, 1.0));
    color = mix(color, PALETTE_GLOW, r.x.abs().clamp(0.0, 1.0));
    color * (f * f * f + 0.6 * f * f + 0.5 * f)
}

/// Single-channel temporal feedback: R becomes a slow-decaying blend of the
/// video feed and the previous frame, G and B stay procedural.
pub fn feedback_mix(procedural: Vec3, previous_r: f32, video_r: f32) -> Vec3 {
    Vec3::new(
        video_r * FEEDBACK_VIDEO_WEIGHT + previous_r * (1.0 - FEEDBACK_VIDEO_WEIGHT),
        procedural.y,
        procedural.z,
    )
}

/// Large-wave warp term: one-sided, so noise at or below the floor produces
/// zero warp rather than reverse warp.
pub fn large_wave(raw_noise: f32, strength: f32) -> f32 {
    (raw_noise - LARGE_WAVE_FLOOR).max(0.0) * strength
}

/// Small-wave warp term, centered so it pushes both directions.
pub fn small_wave(raw_noise: f32, strength: f32) -> f32 {
    (raw_noise - 0.5) * strength
}

/// Combined warp magnitude for a row at scaled time `s`.
pub fn warp_magnitude(s: f32, p_y: f32, large_strength: f32, small_strength: f32) -> f32 {
    let n_large = large_wave(value_noise(Vec2::new(s, p_y * 0.3)), large_strength);
    let n_small = small_wave(value_noise(Vec2::new(s * 10.0, p_y * 2.4)), small_strength);
    n_large + n_small
}

/// Horizontal sampling coordinate after the warp. The caller clamps to the
/// video edge when sampling.
pub fn warp_x(p_x: f32, n: f32) -> f32 {
    p_x - n * n * 0.25
}

/// Fully random gray the interference overlay pulls toward.
pub fn interference_grain(p_y: f32, frame: f32) -> f32 {
    hash(Vec2::splat(p_y * frame))
}

/// Mixes the warped video sample toward the grain value.
pub fn interference_mix(video: Vec3, grain: f32, n: f32, strength: f32) -> Vec3 {
    mix(video, Vec3::splat(grain), n * strength)
}
