//! Embedded WGSL sources.
//!
//! Each scene shader is assembled from three pieces: the variant's binding
//! declarations (which must match the variant's `RenderDescriptor` — binding
//! index = position in the declared uniform list), the shared noise library,
//! and the variant's fragment stage. The noise bodies mirror
//! `crate::noise`/`crate::compositor` exactly; change one and you must change
//! the other.

use scheduler::ShaderVariant;

/// `random`, `noise`, and `fbm` as used by both variants. `fbm` restarts the
/// domain transform from the original coordinate every octave; see
/// `crate::noise::fbm` for why that recurrence is load-bearing.
const NOISE_FUNCTIONS: &str = r"
fn random(v: vec2f) -> f32 {
    return fract(sin(dot(v, vec2f(12.9898, 78.233))) * 43758.5453123);
}

fn noise(v: vec2f) -> f32 {
    let i = floor(v);
    let f = fract(v);

    let a = random(i);
    let b = random(i + vec2f(1.0, 0.0));
    let c = random(i + vec2f(0.0, 1.0));
    let d = random(i + vec2f(1.0, 1.0));

    let u = f * f * (3.0 - 2.0 * f);
    return mix(a, b, u.x) + (c - a) * u.y * (1.0 - u.x) + (d - b) * u.x * u.y;
}

fn fbm(v: vec2f) -> f32 {
    var vp = v;
    var vf = 0.0;
    var a = 0.5;
    let shift = vec2f(100.0);
    let rot = mat2x2<f32>(cos(0.5), sin(0.5), -sin(0.5), cos(0.5));
    for (var i = 0; i < 5; i++) {
        vf += a * noise(vp);
        vp = rot * v * 2.0 + shift;
        a *= 0.5;
    }
    return vf;
}
";

/// Fullscreen triangle; no vertex buffer.
const FULLSCREEN_VERTEX: &str = r"
@vertex
fn vs(@builtin(vertex_index) index: u32) -> @builtin(position) vec4f {
    var positions = array<vec2f, 3>(
        vec2f(-1.0, -3.0),
        vec2f(3.0, 1.0),
        vec2f(-1.0, 1.0),
    );
    return vec4f(positions[index], 0.0, 1.0);
}
";

const FEEDBACK_BINDINGS: &str = r"
@group(0) @binding(0) var<uniform> frame: f32;
@group(0) @binding(1) var<uniform> res: vec2f;
@group(0) @binding(2) var<uniform> audio: vec3f;
@group(0) @binding(3) var<uniform> mouse: vec3f;
@group(0) @binding(4) var backSampler: sampler;
@group(0) @binding(5) var backBuffer: texture_2d<f32>;
@group(0) @binding(6) var videoSampler: sampler;
@group(1) @binding(0) var videoBuffer: texture_2d<f32>;
";

/// Variant a: fbm-driven palette with a single-channel feedback trail. The
/// red channel is rebuilt from 5% live video and 95% of the previous frame;
/// green and blue are purely procedural every frame.
const FEEDBACK_FRAGMENT: &str = r"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let p = pos.xy / res;
    let vid = textureSample(videoBuffer, videoSampler, p);
    let fb = textureSample(backBuffer, backSampler, p);
    var color = vec3f(0.0);

    let q = vec2f(fbm(p), fbm(p + vec2f(1.0)));
    let r = vec2f(
        fbm(p + q + vec2f(1.7, 9.2) + 0.15 * frame),
        fbm(p + q + vec2f(8.3, 2.8) + 0.125 * frame),
    );
    let f = fbm(p + r);

    color = mix(vec3f(0.1, 0.6, 0.667), vec3f(0.667, 0.667, 0.5), clamp(f * f * 4.0, 0.0, 1.0));
    color = mix(color, vec3f(0.0, 0.0, 0.16), clamp(length(q), 0.0, 1.0));
    color = mix(color, vec3f(0.667, 1.0, 1.0), clamp(length(r.x), 0.0, 1.0));
    color *= f * f * f + 0.6 * f * f + 0.5 * f;

    color.x = (vid * 0.05 + fb * 0.95).x;
    return vec4f(color, 1.0);
}
";

const WARP_BINDINGS: &str = r"
@group(0) @binding(0) var<uniform> frame: f32;
@group(0) @binding(1) var<uniform> res: vec2f;
@group(0) @binding(2) var<uniform> speed: f32;
@group(0) @binding(3) var<uniform> largeWaveStrength: f32;
@group(0) @binding(4) var<uniform> smallWaveStrength: f32;
@group(0) @binding(5) var<uniform> interferenceStrength: f32;
@group(0) @binding(6) var videoSampler: sampler;
@group(1) @binding(0) var videoBuffer: texture_2d<f32>;
";

/// Variant b: noise-driven horizontal warp of the video sampling coordinate
/// plus an interference pull toward per-row random gray. The large wave is
/// floored at zero so negative noise produces no warp, never reverse warp.
const WARP_FRAGMENT: &str = r"
@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let p = pos.xy / res;
    let s = frame / 20.0 * speed;

    let nLarge = max(0.0, noise(vec2f(s, p.y * 0.3)) - 0.3) * largeWaveStrength;
    let nSmall = (noise(vec2f(s * 10.0, p.y * 2.4)) - 0.5) * smallWaveStrength;
    let n = nLarge + nSmall;

    let warped = clamp(vec2f(p.x - n * n * 0.25, p.y), vec2f(0.0), vec2f(1.0));
    var color = textureSample(videoBuffer, videoSampler, warped).rgb;

    let grain = random(vec2f(p.y * frame));
    color = mix(color, vec3f(grain), n * interferenceStrength);
    return vec4f(color, 1.0);
}
";

/// Resolves the feedback write target onto the swapchain.
pub(crate) const BLIT_SOURCE: &str = r"
@group(0) @binding(0) var blitSampler: sampler;
@group(0) @binding(1) var blitSource: texture_2d<f32>;

@vertex
fn vs(@builtin(vertex_index) index: u32) -> @builtin(position) vec4f {
    var positions = array<vec2f, 3>(
        vec2f(-1.0, -3.0),
        vec2f(3.0, 1.0),
        vec2f(-1.0, 1.0),
    );
    return vec4f(positions[index], 0.0, 1.0);
}

@fragment
fn fs(@builtin(position) pos: vec4f) -> @location(0) vec4f {
    let dims = vec2f(textureDimensions(blitSource));
    return textureSample(blitSource, blitSampler, pos.xy / dims);
}
";

/// Complete WGSL for a variant's scene pipeline.
pub(crate) fn scene_source(variant: ShaderVariant) -> String {
    let (bindings, fragment) = match variant {
        ShaderVariant::NoiseFeedback => (FEEDBACK_BINDINGS, FEEDBACK_FRAGMENT),
        ShaderVariant::VideoWarp => (WARP_BINDINGS, WARP_FRAGMENT),
    };
    format!("{bindings}\n{NOISE_FUNCTIONS}\n{FULLSCREEN_VERTEX}\n{fragment}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler::UniformKind;

    fn wgsl_type(kind: UniformKind) -> &'static str {
        match kind {
            UniformKind::Scalar => "f32",
            UniformKind::Vec2 => "vec2f",
            UniformKind::Vec3 => "vec3f",
        }
    }

    /// Every declared uniform must appear in its variant's WGSL at the
    /// binding index given by its position in the descriptor.
    #[test]
    fn declared_uniforms_match_shader_bindings() {
        for variant in [ShaderVariant::NoiseFeedback, ShaderVariant::VideoWarp] {
            let source = scene_source(variant);
            for (index, decl) in variant.descriptor().uniforms.iter().enumerate() {
                let declaration = format!(
                    "@group(0) @binding({index}) var<uniform> {name}: {ty};",
                    name = decl.name,
                    ty = wgsl_type(decl.kind),
                );
                assert!(
                    source.contains(&declaration),
                    "{variant}: missing `{declaration}`"
                );
            }
        }
    }

    #[test]
    fn video_texture_lives_in_its_own_group() {
        for variant in [ShaderVariant::NoiseFeedback, ShaderVariant::VideoWarp] {
            let source = scene_source(variant);
            assert!(source.contains("@group(1) @binding(0) var videoBuffer: texture_2d<f32>;"));
        }
    }

    #[test]
    fn feedback_variant_binds_the_back_buffer_after_the_uniforms() {
        let source = scene_source(ShaderVariant::NoiseFeedback);
        assert!(source.contains("@group(0) @binding(4) var backSampler: sampler;"));
        assert!(source.contains("@group(0) @binding(5) var backBuffer: texture_2d<f32>;"));
        assert!(source.contains("@group(0) @binding(6) var videoSampler: sampler;"));
    }

    #[test]
    fn scene_sources_carry_the_shared_noise_library() {
        for variant in [ShaderVariant::NoiseFeedback, ShaderVariant::VideoWarp] {
            let source = scene_source(variant);
            assert!(source.contains("fn random(v: vec2f) -> f32"));
            assert!(source.contains("fn noise(v: vec2f) -> f32"));
            assert!(source.contains("fn fbm(v: vec2f) -> f32"));
            // The non-compounding recurrence, verbatim.
            assert!(source.contains("vp = rot * v * 2.0 + shift;"));
        }
    }
}
