//! The temporally persistent feedback pair.
//!
//! Two color textures alternate roles every tick: one is the scene pass's
//! render target, the other is bound as `backBuffer` for reading. The parity
//! index is the only moving part, and it flips exactly once per tick, after
//! the submission — so within a tick the write target is never also the read
//! source.

/// Texture format of both feedback buffers and the scene render target.
pub(crate) const FEEDBACK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Parity bookkeeping for a two-element ping-pong pair.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PingPong {
    parity: usize,
}

impl PingPong {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Index read as "previous frame" this tick.
    pub(crate) fn read_index(&self) -> usize {
        self.parity
    }

    /// Index written this tick. Always the other element.
    pub(crate) fn write_index(&self) -> usize {
        self.parity ^ 1
    }

    /// Flips roles; call once per tick, after the submission.
    pub(crate) fn swap(&mut self) {
        self.parity ^= 1;
    }
}

pub(crate) struct FeedbackSurface {
    views: [wgpu::TextureView; 2],
    _textures: [wgpu::Texture; 2],
    parity: PingPong,
}

impl FeedbackSurface {
    /// Allocates both buffers and seeds them to black, so the very first
    /// tick reads defined zeros instead of whatever the allocation happens
    /// to contain.
    pub(crate) fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
    ) -> Self {
        let textures = std::array::from_fn(|index| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("feedback buffer #{index}")),
                size: wgpu::Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: FEEDBACK_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        });

        let zeros = vec![0u8; (width.max(1) * height.max(1) * 4) as usize];
        for texture in &textures {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &zeros,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(width.max(1) * 4),
                    rows_per_image: Some(height.max(1)),
                },
                wgpu::Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
            );
        }

        let views = std::array::from_fn(|index| {
            textures[index].create_view(&wgpu::TextureViewDescriptor::default())
        });

        Self {
            views,
            _textures: textures,
            parity: PingPong::new(),
        }
    }

    pub(crate) fn view(&self, index: usize) -> &wgpu::TextureView {
        &self.views[index]
    }

    pub(crate) fn read_index(&self) -> usize {
        self.parity.read_index()
    }

    pub(crate) fn write_index(&self) -> usize {
        self.parity.write_index()
    }

    pub(crate) fn write_view(&self) -> &wgpu::TextureView {
        &self.views[self.parity.write_index()]
    }

    pub(crate) fn swap(&mut self) {
        self.parity.swap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_index_alternates_with_tick_parity() {
        let mut pair = PingPong::new();
        for tick in 0..32usize {
            assert_eq!(pair.read_index(), tick % 2);
            assert_eq!(pair.write_index(), (tick + 1) % 2);
            pair.swap();
        }
    }

    #[test]
    fn write_target_is_never_the_read_source() {
        let mut pair = PingPong::new();
        for _ in 0..8 {
            assert_ne!(pair.read_index(), pair.write_index());
            pair.swap();
        }
    }

    #[test]
    fn buffer_written_on_tick_n_is_read_on_tick_n_plus_one() {
        let mut pair = PingPong::new();
        for _ in 0..8 {
            let written = pair.write_index();
            pair.swap();
            assert_eq!(pair.read_index(), written);
        }
    }
}
