//! Deterministic value noise and the five-octave fractal sum.
//!
//! These are the CPU reference for the noise bodies embedded in the WGSL
//! sources (`shaders.rs`); the two must stay line-for-line equivalent.
//! Everything here is a pure function of its inputs — no seed state, no
//! caching — so a coordinate always hashes to the same value on every call
//! and on every run.

use glam::{Mat2, Vec2};

/// Hash constants shared with the shaders. `K` is dotted against the input,
/// `C` scales the sine before the fractional part is taken.
const HASH_K: Vec2 = Vec2::new(12.9898, 78.233);
const HASH_C: f32 = 43758.5453123;

/// Octave count of [`fbm`]. Fixed; the amplitude schedule and the tests
/// assume exactly five.
pub const OCTAVES: usize = 5;

/// Rotation angle applied to the fbm sampling domain, in radians.
const DOMAIN_ANGLE: f32 = 0.5;

/// Per-octave domain shift.
const DOMAIN_SHIFT: Vec2 = Vec2::splat(100.0);

/// Maps a coordinate to a pseudo-random scalar in `[0, 1)`.
pub fn hash(p: Vec2) -> f32 {
    fract(p.dot(HASH_K).sin() * HASH_C)
}

/// GLSL-style fract: the distance down to the floor, never negative. Rust's
/// `f32::fract` truncates toward zero instead, which would flip every hash in
/// negative quadrants.
#[inline]
fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Smoothly interpolated value noise over the integer lattice.
///
/// Hashes the four corners around `p`, weighs the fractional offset with the
/// smoothstep polynomial `f*f*(3-2f)`, and blends bilinearly. At integer
/// coordinates this collapses to the corner hash itself.
pub fn value_noise(p: Vec2) -> f32 {
    let i = p.floor();
    let f = p - i;

    let a = hash(i);
    let b = hash(i + Vec2::new(1.0, 0.0));
    let c = hash(i + Vec2::new(0.0, 1.0));
    let d = hash(i + Vec2::new(1.0, 1.0));

    let u = f * f * (Vec2::splat(3.0) - 2.0 * f);

    // mix(a, b, u.x) + (c - a)*u.y*(1 - u.x) + (d - b)*u.x*u.y
    a + (b - a) * u.x + (c - a) * u.y * (1.0 - u.x) + (d - b) * u.x * u.y
}

/// Five-octave fractal sum over [`value_noise`].
///
/// The recurrence is deliberately non-compounding: every octave after the
/// first samples `rot * p * 2 + shift` derived from the ORIGINAL input, not
/// from the running position. The rendered look depends on this exact
/// recurrence; do not "fix" it into a compounding rotation.
pub fn fbm(p: Vec2) -> f32 {
    let rot = Mat2::from_cols(
        Vec2::new(DOMAIN_ANGLE.cos(), DOMAIN_ANGLE.sin()),
        Vec2::new(-DOMAIN_ANGLE.sin(), DOMAIN_ANGLE.cos()),
    );

    let mut position = p;
    let mut amplitude = 0.5;
    let mut total = 0.0;
    for _ in 0..OCTAVES {
        total += amplitude * value_noise(position);
        position = rot * p * 2.0 + DOMAIN_SHIFT;
        amplitude *= 0.5;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn hash_is_deterministic() {
        let p = Vec2::new(0.37, 12.91);
        let first = hash(p);
        for _ in 0..16 {
            assert_eq!(hash(p), first);
        }
    }

    #[test]
    fn hash_of_origin_is_zero() {
        // fract(sin(0) * C) == 0 exactly.
        assert_eq!(hash(Vec2::ZERO), 0.0);
    }

    #[test]
    fn hash_stays_in_unit_interval() {
        for i in -40..40 {
            for j in -40..40 {
                let v = hash(Vec2::new(i as f32 * 0.73, j as f32 * 1.19));
                assert!((0.0..1.0).contains(&v), "hash out of range: {v}");
            }
        }
    }

    #[test]
    fn value_noise_matches_hash_at_lattice_points() {
        // Zero fractional part means zero smoothstep weight, so the blend
        // collapses to the corner hash.
        for i in -5..6 {
            for j in -5..6 {
                let p = Vec2::new(i as f32, j as f32);
                assert!((value_noise(p) - hash(p)).abs() < EPS);
            }
        }
    }

    #[test]
    fn value_noise_is_bounded_by_its_corners() {
        for i in 0..64 {
            let p = Vec2::new(i as f32 * 0.173 - 5.0, i as f32 * 0.311 - 5.0);
            let v = value_noise(p);
            assert!((0.0..1.0).contains(&v), "noise out of range: {v}");
        }
    }

    #[test]
    fn fbm_never_exceeds_the_amplitude_sum() {
        // 0.5 + 0.25 + 0.125 + 0.0625 + 0.03125, with every octave at its
        // sub-1.0 maximum.
        let ceiling = 0.96875;
        for i in 0..256 {
            let p = Vec2::new(i as f32 * 0.29 - 37.0, i as f32 * 0.41 + 11.0);
            let v = fbm(p);
            assert!(v < ceiling, "fbm({p:?}) = {v} exceeds {ceiling}");
            assert!(v >= 0.0);
        }
    }

    #[test]
    fn fbm_decomposes_into_two_sample_points() {
        // Octaves 1..=4 all sample the same transformed point because the
        // recurrence restarts from the original coordinate, so fbm must equal
        // 0.5 * vn(p) + (0.25 + 0.125 + 0.0625 + 0.03125) * vn(rot*p*2+shift).
        let rot = Mat2::from_cols(
            Vec2::new(0.5_f32.cos(), 0.5_f32.sin()),
            Vec2::new(-0.5_f32.sin(), 0.5_f32.cos()),
        );
        for i in 0..32 {
            let p = Vec2::new(i as f32 * 0.61 - 9.0, i as f32 * 0.17 + 3.0);
            let warped = rot * p * 2.0 + Vec2::splat(100.0);
            let expected = 0.5 * value_noise(p) + 0.46875 * value_noise(warped);
            assert!((fbm(p) - expected).abs() < 1e-5);
        }
    }
}
