//! Host-side core for the noisefeed renderer.
//!
//! The crate owns everything the render loop needs *before* a draw is
//! submitted: the uniform synchronization contract (which named values a
//! shader variant declares, and the guarantee that a populated, validated
//! snapshot exists for every one of them), the external signal snapshots
//! (audio band levels, warp controls, mouse), and the frame scheduler that
//! turns "one display tick" into "one `UniformSet` to submit".
//!
//! Nothing in here touches the GPU; the renderer crate consumes these types
//! and maps them onto buffers and bind groups.

mod frame;
mod signals;
mod uniforms;

pub use frame::{advance_uniforms, FrameScheduler, FrameUpdate, Phase, SchedulerError};
pub use signals::{
    AudioLevels, AudioSource, ControlPanel, FixedControls, SignalSnapshot, SilentAudio,
    WarpControls,
};
pub use uniforms::{
    ContractError, RenderDescriptor, ShaderVariant, UniformDecl, UniformKind, UniformSet,
    UniformValue,
};
