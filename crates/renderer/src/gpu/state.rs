//! Per-run GPU state and the tick submission path.

use anyhow::Result;
use tracing::warn;
use winit::dpi::PhysicalSize;

use scheduler::{ContractError, FrameUpdate, ShaderVariant};

use crate::video::VideoFrame;

use super::context::GpuContext;
use super::feedback::{FeedbackSurface, FEEDBACK_FORMAT};
use super::pipeline::{create_samplers, BlitPipeline, ScenePipeline};
use super::uniforms::UniformBindings;

/// Everything that can interrupt one tick's submission.
#[derive(Debug)]
pub(crate) enum TickError {
    Surface(wgpu::SurfaceError),
    Contract(ContractError),
}

impl From<wgpu::SurfaceError> for TickError {
    fn from(value: wgpu::SurfaceError) -> Self {
        TickError::Surface(value)
    }
}

impl From<ContractError> for TickError {
    fn from(value: ContractError) -> Self {
        TickError::Contract(value)
    }
}

impl std::fmt::Display for TickError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TickError::Surface(err) => write!(f, "surface error: {err:?}"),
            TickError::Contract(err) => write!(f, "uniform contract violated: {err}"),
        }
    }
}

impl std::error::Error for TickError {}

/// GPU-resident texture the video frames are uploaded into.
struct VideoTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl VideoTexture {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("video texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        // Seed black so a source that is slow to produce its first frame
        // still samples defined content.
        let zeros = vec![0u8; (width * height * 4) as usize];
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &zeros,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    fn upload(&self, queue: &wgpu::Queue, frame: &VideoFrame) {
        if frame.width != self.width || frame.height != self.height {
            warn!(
                frame_width = frame.width,
                frame_height = frame.height,
                texture_width = self.width,
                texture_height = self.height,
                "video frame upload ignored due to mismatched dimensions"
            );
            return;
        }
        let expected_len = (self.width * self.height * 4) as usize;
        if frame.rgba.len() != expected_len {
            warn!(
                expected_len,
                actual_len = frame.rgba.len(),
                "video frame upload ignored due to mismatched payload size"
            );
            return;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * 4),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

/// Scene bind groups for group 0. The feedback variant needs one per parity
/// because each references a different feedback texture as `backBuffer`.
enum SceneGroups {
    /// Indexed by the feedback pair's read index.
    Feedback([wgpu::BindGroup; 2]),
    Direct(wgpu::BindGroup),
}

pub(crate) struct GpuState {
    context: GpuContext,
    variant: ShaderVariant,
    uniforms: UniformBindings,
    scene: ScenePipeline,
    blit: Option<BlitPipeline>,
    back_sampler: wgpu::Sampler,
    video_sampler: wgpu::Sampler,
    video: VideoTexture,
    video_group: wgpu::BindGroup,
    feedback: Option<FeedbackSurface>,
    scene_groups: SceneGroups,
    /// Indexed by the feedback pair's write index; present for the feedback
    /// variant only.
    blit_groups: Option<[wgpu::BindGroup; 2]>,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        variant: ShaderVariant,
        video_dimensions: (u32, u32),
    ) -> Result<Self>
    where
        T: raw_window_handle::HasDisplayHandle + raw_window_handle::HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size)?;
        let uniforms = UniformBindings::new(&context.device, variant.descriptor());
        let (back_sampler, video_sampler) = create_samplers(&context.device);

        // The feedback variant renders into the trail buffer and resolves it
        // to the swapchain afterwards; the warp variant draws straight to the
        // swapchain.
        let scene_target_format = match variant {
            ShaderVariant::NoiseFeedback => FEEDBACK_FORMAT,
            ShaderVariant::VideoWarp => context.surface_format,
        };
        let scene = ScenePipeline::new(&context.device, variant, scene_target_format);
        let blit = matches!(variant, ShaderVariant::NoiseFeedback)
            .then(|| BlitPipeline::new(&context.device, context.surface_format));

        let video = VideoTexture::new(
            &context.device,
            &context.queue,
            video_dimensions.0,
            video_dimensions.1,
        );
        let video_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("video bind group"),
            layout: &scene.video_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&video.view),
            }],
        });

        let feedback = matches!(variant, ShaderVariant::NoiseFeedback).then(|| {
            FeedbackSurface::new(
                &context.device,
                &context.queue,
                context.size.width,
                context.size.height,
            )
        });

        let scene_groups = build_scene_groups(
            &context.device,
            variant,
            &scene,
            &uniforms,
            &back_sampler,
            &video_sampler,
            feedback.as_ref(),
        );
        let blit_groups = match (&blit, &feedback) {
            (Some(blit), Some(feedback)) => Some(build_blit_groups(
                &context.device,
                blit,
                &back_sampler,
                feedback,
            )),
            _ => None,
        };

        Ok(Self {
            context,
            variant,
            uniforms,
            scene,
            blit,
            back_sampler,
            video_sampler,
            video,
            video_group,
            feedback,
            scene_groups,
            blit_groups,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);

        // The trail buffers track the surface size; a resize restarts the
        // trail from black with fresh parity.
        if self.feedback.is_some() {
            let feedback = FeedbackSurface::new(
                &self.context.device,
                &self.context.queue,
                new_size.width,
                new_size.height,
            );
            self.scene_groups = build_scene_groups(
                &self.context.device,
                self.variant,
                &self.scene,
                &self.uniforms,
                &self.back_sampler,
                &self.video_sampler,
                Some(&feedback),
            );
            if let Some(blit) = &self.blit {
                self.blit_groups = Some(build_blit_groups(
                    &self.context.device,
                    blit,
                    &self.back_sampler,
                    &feedback,
                ));
            }
            self.feedback = Some(feedback);
        }
    }

    /// Submits one frame: uploads the uniform snapshot and any new video
    /// frame, encodes the scene (and blit) passes, presents, and swaps the
    /// feedback parity.
    pub(crate) fn render_tick(
        &mut self,
        update: &FrameUpdate,
        video_frame: Option<&VideoFrame>,
    ) -> Result<(), TickError> {
        self.uniforms.write(&self.context.queue, &update.uniforms)?;
        if let Some(frame) = video_frame {
            self.video.upload(&self.context.queue, frame);
        }

        let frame = self.context.surface.get_current_texture()?;
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("tick encoder"),
                });

        match &self.scene_groups {
            SceneGroups::Feedback(groups) => {
                let feedback = self
                    .feedback
                    .as_ref()
                    .expect("feedback variant carries the trail surface");
                let group0 = &groups[feedback.read_index()];
                encode_scene_pass(
                    &mut encoder,
                    feedback.write_view(),
                    &self.scene.pipeline,
                    group0,
                    &self.video_group,
                );
                let blit = self.blit.as_ref().expect("feedback variant carries blit");
                let blit_groups = self
                    .blit_groups
                    .as_ref()
                    .expect("feedback variant carries blit groups");
                encode_blit_pass(
                    &mut encoder,
                    &surface_view,
                    &blit.pipeline,
                    &blit_groups[feedback.write_index()],
                );
            }
            SceneGroups::Direct(group0) => {
                encode_scene_pass(
                    &mut encoder,
                    &surface_view,
                    &self.scene.pipeline,
                    group0,
                    &self.video_group,
                );
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        if let Some(feedback) = &mut self.feedback {
            feedback.swap();
        }
        Ok(())
    }
}

fn encode_scene_pass(
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    group0: &wgpu::BindGroup,
    video_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("scene pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, group0, &[]);
    pass.set_bind_group(1, video_group, &[]);
    pass.draw(0..3, 0..1);
}

fn encode_blit_pass(
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("blit pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, group, &[]);
    pass.draw(0..3, 0..1);
}

fn uniform_bind_entries(uniforms: &UniformBindings) -> Vec<wgpu::BindGroupEntry<'_>> {
    (0..uniforms.len())
        .map(|index| wgpu::BindGroupEntry {
            binding: index as u32,
            resource: uniforms.buffer(index).as_entire_binding(),
        })
        .collect()
}

fn build_scene_groups(
    device: &wgpu::Device,
    variant: ShaderVariant,
    scene: &ScenePipeline,
    uniforms: &UniformBindings,
    back_sampler: &wgpu::Sampler,
    video_sampler: &wgpu::Sampler,
    feedback: Option<&FeedbackSurface>,
) -> SceneGroups {
    match variant {
        ShaderVariant::NoiseFeedback => {
            let feedback = feedback.expect("feedback variant requires the trail surface");
            let next = uniforms.len() as u32;
            let groups = std::array::from_fn(|read_index| {
                let mut entries = uniform_bind_entries(uniforms);
                entries.push(wgpu::BindGroupEntry {
                    binding: next,
                    resource: wgpu::BindingResource::Sampler(back_sampler),
                });
                entries.push(wgpu::BindGroupEntry {
                    binding: next + 1,
                    resource: wgpu::BindingResource::TextureView(feedback.view(read_index)),
                });
                entries.push(wgpu::BindGroupEntry {
                    binding: next + 2,
                    resource: wgpu::BindingResource::Sampler(video_sampler),
                });
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("scene group0 (read #{read_index})")),
                    layout: &scene.group0_layout,
                    entries: &entries,
                })
            });
            SceneGroups::Feedback(groups)
        }
        ShaderVariant::VideoWarp => {
            let mut entries = uniform_bind_entries(uniforms);
            entries.push(wgpu::BindGroupEntry {
                binding: uniforms.len() as u32,
                resource: wgpu::BindingResource::Sampler(video_sampler),
            });
            let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("scene group0"),
                layout: &scene.group0_layout,
                entries: &entries,
            });
            SceneGroups::Direct(group)
        }
    }
}

fn build_blit_groups(
    device: &wgpu::Device,
    blit: &BlitPipeline,
    sampler: &wgpu::Sampler,
    feedback: &FeedbackSurface,
) -> [wgpu::BindGroup; 2] {
    std::array::from_fn(|index| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("blit group (source #{index})")),
            layout: &blit.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(feedback.view(index)),
                },
            ],
        })
    })
}
