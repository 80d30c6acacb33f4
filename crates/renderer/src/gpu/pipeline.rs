//! Pipeline and bind-group layout construction.
//!
//! Group 0 carries the declared uniforms followed by the variant's samplers
//! and the feedback read texture; group 1 carries the video texture alone,
//! mirroring the external-texture group split of the shader sources. Binding
//! indices are derived from the render descriptor so the layouts cannot
//! drift from the contract.

use std::borrow::Cow;

use scheduler::ShaderVariant;

use crate::shaders;

use super::uniforms::uniform_layout_entries;

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Group 0 layout entries for a variant: the uniform table, then
/// `backSampler`/`backBuffer` (feedback only), then `videoSampler`.
pub(crate) fn scene_group0_entries(variant: ShaderVariant) -> Vec<wgpu::BindGroupLayoutEntry> {
    let descriptor = variant.descriptor();
    let mut entries = uniform_layout_entries(&descriptor);
    let next = descriptor.uniforms.len() as u32;
    match variant {
        ShaderVariant::NoiseFeedback => {
            entries.push(sampler_entry(next));
            entries.push(texture_entry(next + 1));
            entries.push(sampler_entry(next + 2));
        }
        ShaderVariant::VideoWarp => {
            entries.push(sampler_entry(next));
        }
    }
    entries
}

/// Group 1 layout: the video texture.
pub(crate) fn video_group_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    vec![texture_entry(0)]
}

fn clamping_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Sampler used for both the feedback read texture and the video texture;
/// sampling never wraps past the source's edge.
pub(crate) fn create_samplers(device: &wgpu::Device) -> (wgpu::Sampler, wgpu::Sampler) {
    (
        clamping_sampler(device, "back sampler"),
        clamping_sampler(device, "video sampler"),
    )
}

pub(crate) struct ScenePipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub group0_layout: wgpu::BindGroupLayout,
    pub video_layout: wgpu::BindGroupLayout,
}

impl ScenePipeline {
    pub(crate) fn new(
        device: &wgpu::Device,
        variant: ShaderVariant,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{variant} scene shader")),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(shaders::scene_source(variant))),
        });

        let group0_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene group0 layout"),
            entries: &scene_group0_entries(variant),
        });
        let video_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("video group layout"),
            entries: &video_group_entries(),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene pipeline layout"),
            bind_group_layouts: &[&group0_layout, &video_layout],
            push_constant_ranges: &[],
        });

        let pipeline = create_fullscreen_pipeline(
            device,
            &format!("{variant} scene pipeline"),
            &layout,
            &module,
            target_format,
        );

        Self {
            pipeline,
            group0_layout,
            video_layout,
        }
    }
}

pub(crate) struct BlitPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub layout: wgpu::BindGroupLayout,
}

impl BlitPipeline {
    pub(crate) fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(shaders::BLIT_SOURCE)),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit layout"),
            entries: &[sampler_entry(0), texture_entry(1)],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit pipeline layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = create_fullscreen_pipeline(
            device,
            "blit pipeline",
            &pipeline_layout,
            &module,
            target_format,
        );

        Self { pipeline, layout }
    }
}

fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    target_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs"),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding_kinds(entries: &[wgpu::BindGroupLayoutEntry]) -> Vec<(u32, &'static str)> {
        entries
            .iter()
            .map(|entry| {
                let kind = match entry.ty {
                    wgpu::BindingType::Buffer { .. } => "buffer",
                    wgpu::BindingType::Sampler(_) => "sampler",
                    wgpu::BindingType::Texture { .. } => "texture",
                    _ => "other",
                };
                (entry.binding, kind)
            })
            .collect()
    }

    #[test]
    fn feedback_group0_matches_the_binding_table() {
        let entries = scene_group0_entries(ShaderVariant::NoiseFeedback);
        assert_eq!(
            binding_kinds(&entries),
            [
                (0, "buffer"),
                (1, "buffer"),
                (2, "buffer"),
                (3, "buffer"),
                (4, "sampler"),
                (5, "texture"),
                (6, "sampler"),
            ]
        );
    }

    #[test]
    fn warp_group0_matches_the_binding_table() {
        let entries = scene_group0_entries(ShaderVariant::VideoWarp);
        assert_eq!(
            binding_kinds(&entries),
            [
                (0, "buffer"),
                (1, "buffer"),
                (2, "buffer"),
                (3, "buffer"),
                (4, "buffer"),
                (5, "buffer"),
                (6, "sampler"),
            ]
        );
    }

    #[test]
    fn video_texture_is_group1_binding0() {
        let entries = video_group_entries();
        assert_eq!(binding_kinds(&entries), [(0, "texture")]);
    }
}
