//! Renderer crate for noisefeed.
//!
//! Glues the preview window, the `wgpu` pipelines for the two shader
//! variants, and the host-side scheduler together. The overall flow is:
//!
//! ```text
//!   CLI / noisefeed
//!          │ RendererConfig + signal sources
//!          ▼
//!   Renderer::run ──▶ window event loop ──▶ scheduler.tick()
//!          ▲                                      │ FrameUpdate
//!          │                                      └─▶ GpuState::render_tick()
//!          │                                               │
//!          │            variant a: scene ▶ feedback[write] ▶ blit ▶ swapchain ▶ swap
//!          │            variant b: scene ▶ swapchain
//! ```
//!
//! `GpuState` owns all GPU resources (surface, device, pipelines, the
//! feedback pair, the video texture); `Renderer` is the thin entry point
//! that validates the setup and hands control to the loop. The noise and
//! compositing math the shaders run is mirrored in `noise`/`compositor` so
//! its invariants are pinned by CPU tests.

mod compositor;
mod gpu;
mod noise;
mod shaders;
mod video;
mod window;

pub use compositor::{
    feedback_mix, interference_grain, interference_mix, large_wave, palette, small_wave,
    warp_magnitude, warp_x, warped_fields,
};
pub use noise::{fbm, hash, value_noise, OCTAVES};
pub use video::{ImageSequenceVideo, TestPatternVideo, VideoFrame, VideoSource};

use anyhow::Result;
use scheduler::{AudioSource, ControlPanel, FixedControls, ShaderVariant, SilentAudio};

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Which of the two fragment shaders to drive.
    pub variant: ShaderVariant,
    /// Optional FPS cap; `None` renders every vblank.
    pub target_fps: Option<f32>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            variant: ShaderVariant::NoiseFeedback,
            target_fps: None,
        }
    }
}

/// High-level entry point that owns the configuration and the external
/// signal sources.
///
/// Sources default to self-contained stand-ins (procedural test-pattern
/// video, silent audio, fixed controls) so a bare `Renderer::new(config)`
/// always runs; callers swap in live collaborators via the `with_*` methods.
pub struct Renderer {
    config: RendererConfig,
    video: Box<dyn VideoSource>,
    audio: Box<dyn AudioSource>,
    controls: Box<dyn ControlPanel>,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            video: Box::new(TestPatternVideo::default()),
            audio: Box::new(SilentAudio),
            controls: Box::new(FixedControls(Default::default())),
        }
    }

    pub fn with_video(mut self, video: Box<dyn VideoSource>) -> Self {
        self.video = video;
        self
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioSource>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_controls(mut self, controls: Box<dyn ControlPanel>) -> Self {
        self.controls = controls;
        self
    }

    /// Opens the window and runs until the user closes it.
    ///
    /// Initialization failures (device, surface, video source, uniform
    /// contract) surface here, before the first tick; once the loop is
    /// running, only cooperative shutdown ends it.
    pub fn run(self) -> Result<()> {
        window::run(self.config, self.video, self.audio, self.controls)
    }
}
