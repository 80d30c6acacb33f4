//! GPU backing for the uniform contract.
//!
//! Every declared uniform owns one small buffer at the binding index given
//! by its position in the render descriptor, mirroring the shader's
//! one-binding-per-name layout. The whole table is rewritten from the tick's
//! `UniformSet` before the submission is encoded, so a draw can never
//! observe a half-updated snapshot.

use scheduler::{ContractError, RenderDescriptor};

/// Allocation size per uniform buffer. Covers the largest declared kind
/// (vec3, 12 bytes) with room for alignment.
const UNIFORM_BUFFER_SIZE: u64 = 16;

pub(crate) struct UniformBindings {
    descriptor: RenderDescriptor,
    buffers: Vec<wgpu::Buffer>,
}

impl UniformBindings {
    pub(crate) fn new(device: &wgpu::Device, descriptor: RenderDescriptor) -> Self {
        let buffers = descriptor
            .uniforms
            .iter()
            .map(|decl| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("uniform '{}'", decl.name)),
                    size: UNIFORM_BUFFER_SIZE,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();
        Self {
            descriptor,
            buffers,
        }
    }

    pub(crate) fn buffer(&self, index: usize) -> &wgpu::Buffer {
        &self.buffers[index]
    }

    pub(crate) fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Uploads the tick's values, one buffer per declared name.
    ///
    /// The set was validated against the descriptor at setup; a hole here
    /// means the host broke the contract afterwards, which is still a
    /// configuration error, not something to paper over.
    pub(crate) fn write(
        &self,
        queue: &wgpu::Queue,
        set: &scheduler::UniformSet,
    ) -> Result<(), ContractError> {
        for (decl, buffer) in self.descriptor.uniforms.iter().zip(&self.buffers) {
            let value = set
                .get(decl.name)
                .ok_or(ContractError::MissingUniform(decl.name))?;
            if value.kind() != decl.kind {
                return Err(ContractError::KindMismatch {
                    name: decl.name,
                    expected: decl.kind,
                    found: value.kind(),
                });
            }
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(value.components()));
        }
        Ok(())
    }
}

/// Bind group layout entries for the declared uniforms: binding index `i`
/// for declaration `i`, all plain uniform buffers.
pub(crate) fn uniform_layout_entries(
    descriptor: &RenderDescriptor,
) -> Vec<wgpu::BindGroupLayoutEntry> {
    descriptor
        .uniforms
        .iter()
        .enumerate()
        .map(|(index, decl)| wgpu::BindGroupLayoutEntry {
            binding: index as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(decl.kind.byte_len() as u64),
            },
            count: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheduler::{ShaderVariant, UniformKind};

    #[test]
    fn layout_entries_follow_declaration_order() {
        let descriptor = ShaderVariant::NoiseFeedback.descriptor();
        let entries = uniform_layout_entries(&descriptor);
        assert_eq!(entries.len(), 4);
        for (index, entry) in entries.iter().enumerate() {
            assert_eq!(entry.binding, index as u32);
            assert!(matches!(
                entry.ty,
                wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    ..
                }
            ));
        }
    }

    #[test]
    fn min_binding_sizes_match_declared_kinds() {
        let descriptor = ShaderVariant::NoiseFeedback.descriptor();
        let entries = uniform_layout_entries(&descriptor);
        let sizes: Vec<u64> = entries
            .iter()
            .map(|entry| match entry.ty {
                wgpu::BindingType::Buffer {
                    min_binding_size, ..
                } => min_binding_size.map(|size| size.get()).unwrap_or(0),
                _ => 0,
            })
            .collect();
        // frame: f32, res: vec2f, audio: vec3f, mouse: vec3f
        assert_eq!(sizes, [4, 8, 12, 12]);
        assert!(sizes
            .iter()
            .all(|&size| size <= UNIFORM_BUFFER_SIZE));
    }

    #[test]
    fn warp_layout_declares_six_uniform_buffers() {
        let descriptor = ShaderVariant::VideoWarp.descriptor();
        let entries = uniform_layout_entries(&descriptor);
        assert_eq!(entries.len(), 6);
        assert_eq!(entries.last().unwrap().binding, 5);
    }

    #[test]
    fn kinds_round_trip_through_byte_len() {
        assert_eq!(UniformKind::Scalar.byte_len(), 4);
        assert_eq!(UniformKind::Vec3.byte_len(), 12);
    }
}
