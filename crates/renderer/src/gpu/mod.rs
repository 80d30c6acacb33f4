//! GPU orchestration for the two shader variants.
//!
//! - `context` owns wgpu instance/device/surface wiring and rebuilds the
//!   swapchain on resize.
//! - `uniforms` materialises one small uniform buffer per declared name and
//!   rewrites the whole table from each tick's `UniformSet`.
//! - `feedback` holds the ping-pong pair behind the temporal trail and the
//!   parity bookkeeping that keeps read and write targets disjoint per tick.
//! - `pipeline` compiles the embedded WGSL into render pipelines and derives
//!   bind group layouts from the variant's render descriptor.
//! - `state` glues everything together and exposes the `GpuState` API used
//!   by `window`.

mod context;
mod feedback;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::{GpuState, TickError};
