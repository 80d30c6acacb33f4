//! Preview window and the tick loop.
//!
//! The winit event loop owns the cadence: every redraw runs at most one
//! scheduler tick, and `AboutToWait` immediately requests the next redraw so
//! the Fifo swapchain paces us to the display refresh. Everything the tick
//! consumes — audio levels, control snapshot, mouse — is read exactly once
//! per tick, right before the uniforms are derived.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use scheduler::{AudioSource, ControlPanel, FrameScheduler, SignalSnapshot};

use crate::gpu::{GpuState, TickError};
use crate::video::VideoSource;
use crate::RendererConfig;

pub(crate) fn run(
    config: RendererConfig,
    mut video: Box<dyn VideoSource>,
    audio: Box<dyn AudioSource>,
    controls: Box<dyn ControlPanel>,
) -> Result<()> {
    // The video source must be live before the first tick; its failure is a
    // fatal initialization error, not something the loop retries.
    video.init().context("video source failed to initialise")?;

    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(format!("noisefeed ({})", config.variant))
        .with_inner_size(window_size)
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    let mut gpu = GpuState::new(
        window.as_ref(),
        window.inner_size(),
        config.variant,
        video.dimensions(),
    )?;

    let mut scheduler = FrameScheduler::new(config.variant);
    let size = gpu.size();
    scheduler.prepare([size.width as f32, size.height as f32])?;
    scheduler.begin()?;

    let mut mouse = MouseState::default();
    let mut pacer = FramePacer::new(config.target_fps);
    window.request_redraw();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Wait);

            match event {
                Event::WindowEvent { window_id, event } if window_id == window.id() => {
                    match event {
                        WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                            scheduler.stop();
                            elwt.exit();
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            mouse.handle_cursor_moved(position);
                        }
                        WindowEvent::MouseInput {
                            state: button_state,
                            button,
                            ..
                        } => {
                            if button == MouseButton::Left {
                                mouse.handle_button(button_state);
                            }
                        }
                        WindowEvent::Resized(new_size) => {
                            gpu.resize(new_size);
                        }
                        WindowEvent::RedrawRequested => {
                            if !pacer.should_render() {
                                return;
                            }
                            let snapshot = SignalSnapshot {
                                audio: audio.levels(),
                                controls: controls.snapshot(),
                                mouse: mouse.uniform(),
                            };
                            let size = gpu.size();
                            let resolution = [size.width as f32, size.height as f32];
                            let Some(update) = scheduler.tick(&snapshot, resolution) else {
                                return;
                            };
                            let frame = video.poll_frame();
                            match gpu.render_tick(&update, frame) {
                                Ok(()) => {}
                                Err(TickError::Surface(
                                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                                )) => {
                                    let size = gpu.size();
                                    gpu.resize(size);
                                }
                                Err(TickError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                                    tracing::error!("surface out of memory; exiting");
                                    scheduler.stop();
                                    elwt.exit();
                                }
                                Err(TickError::Surface(other)) => {
                                    tracing::warn!("surface error: {other:?}; retrying next frame");
                                }
                                Err(TickError::Contract(error)) => {
                                    tracing::error!(%error, "uniform contract violated; stopping");
                                    scheduler.stop();
                                    elwt.exit();
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => {
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .context("event loop terminated abnormally")
}

#[derive(Default)]
struct MouseState {
    position: PhysicalPosition<f64>,
    pressed: bool,
}

impl MouseState {
    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.position = position;
    }

    fn handle_button(&mut self, state: ElementState) {
        self.pressed = state == ElementState::Pressed;
    }

    /// `[x, y, pressed]`, matching the shader's mouse uniform.
    fn uniform(&self) -> [f32; 3] {
        [
            self.position.x as f32,
            self.position.y as f32,
            if self.pressed { 1.0 } else { 0.0 },
        ]
    }
}

/// Skips redraws that arrive faster than the requested FPS cap.
struct FramePacer {
    target_interval: Option<Duration>,
    accumulator: Duration,
    last_tick: Option<Instant>,
}

impl FramePacer {
    fn new(target_fps: Option<f32>) -> Self {
        let target_interval = target_fps.and_then(|fps| {
            if fps > 0.0 {
                Some(Duration::from_secs_f32(1.0 / fps))
            } else {
                None
            }
        });
        Self {
            target_interval,
            accumulator: Duration::ZERO,
            last_tick: None,
        }
    }

    fn should_render(&mut self) -> bool {
        let now = Instant::now();
        match (self.target_interval, self.last_tick) {
            (Some(interval), Some(last)) => {
                let delta = now.saturating_duration_since(last);
                self.last_tick = Some(now);
                self.accumulator = self.accumulator.saturating_add(delta);
                if self.accumulator + Duration::from_micros(250) < interval {
                    false
                } else {
                    self.accumulator = self.accumulator.saturating_sub(interval);
                    true
                }
            }
            (Some(_), None) => {
                self.last_tick = Some(now);
                true
            }
            (None, _) => {
                self.last_tick = Some(now);
                true
            }
        }
    }
}
