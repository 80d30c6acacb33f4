//! Per-tick frame scheduling.
//!
//! The scheduler owns the frame counter and the current `UniformSet`. The
//! render loop calls `tick` once per display refresh; each call reads the
//! latest signal snapshot, derives the next uniform set through the pure
//! [`advance_uniforms`] function, and hands it back for submission. The
//! uniforms are replaced wholesale every tick rather than mutated field by
//! field, so the draw always observes one consistent snapshot.

use thiserror::Error;
use tracing::debug;

use crate::signals::SignalSnapshot;
use crate::uniforms::{ContractError, ShaderVariant, UniformSet, UniformValue};

/// Lifecycle of a scheduler. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
    Running,
    Stopped,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler is {0:?}; expected {1:?}")]
    WrongPhase(Phase, Phase),
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Output of one tick: the frame index it was built for and the complete
/// uniform set to submit.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    pub frame: u64,
    pub uniforms: UniformSet,
}

/// Derives the uniform set for `frame` from the previous set and the current
/// signal snapshot. Pure: same inputs, same output.
///
/// `previous` carries values the snapshot does not cover (none today, but the
/// signature keeps the update explicit rather than reaching into shared
/// state).
pub fn advance_uniforms(
    variant: ShaderVariant,
    previous: &UniformSet,
    frame: u64,
    resolution: [f32; 2],
    signals: &SignalSnapshot,
) -> UniformSet {
    let mut next = previous.clone();
    next.set("frame", UniformValue::Scalar(frame as f32));
    next.set("res", UniformValue::Vec2(resolution));
    match variant {
        ShaderVariant::NoiseFeedback => {
            next.set(
                "audio",
                UniformValue::Vec3([signals.audio.low, signals.audio.mid, signals.audio.high]),
            );
            next.set("mouse", UniformValue::Vec3(signals.mouse));
        }
        ShaderVariant::VideoWarp => {
            let controls = signals.controls;
            next.set("speed", UniformValue::Scalar(controls.speed));
            next.set(
                "largeWaveStrength",
                UniformValue::Scalar(controls.large_waves),
            );
            next.set(
                "smallWaveStrength",
                UniformValue::Scalar(controls.small_waves),
            );
            next.set(
                "interferenceStrength",
                UniformValue::Scalar(controls.interference),
            );
        }
    }
    next
}

/// Builds the uniform set a variant starts from: frame 0, the given
/// resolution, and default signals.
fn initial_uniforms(variant: ShaderVariant, resolution: [f32; 2]) -> UniformSet {
    advance_uniforms(
        variant,
        &UniformSet::new(),
        0,
        resolution,
        &SignalSnapshot::default(),
    )
}

/// Drives the per-tick uniform update for one shader variant.
///
/// The tick cadence itself belongs to the render loop (one call per display
/// refresh); this type only guarantees the ordering contract: validate at
/// setup, one counter increment and one uniform snapshot per tick, nothing
/// after `stop`.
pub struct FrameScheduler {
    variant: ShaderVariant,
    phase: Phase,
    frame: u64,
    uniforms: UniformSet,
}

impl FrameScheduler {
    pub fn new(variant: ShaderVariant) -> Self {
        Self {
            variant,
            phase: Phase::Uninitialized,
            frame: 0,
            uniforms: UniformSet::new(),
        }
    }

    pub fn variant(&self) -> ShaderVariant {
        self.variant
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of completed ticks. The next tick will be built for this index.
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    /// Populates the declared defaults and validates them against the
    /// variant's descriptor. Any violation is a configuration error and is
    /// raised here, before the first submission.
    pub fn prepare(&mut self, resolution: [f32; 2]) -> Result<(), SchedulerError> {
        if self.phase != Phase::Uninitialized {
            return Err(SchedulerError::WrongPhase(self.phase, Phase::Uninitialized));
        }
        let defaults = initial_uniforms(self.variant, resolution);
        defaults.validate(&self.variant.descriptor())?;
        self.uniforms = defaults;
        self.phase = Phase::Ready;
        debug!(variant = %self.variant, "scheduler ready");
        Ok(())
    }

    pub fn begin(&mut self) -> Result<(), SchedulerError> {
        if self.phase != Phase::Ready {
            return Err(SchedulerError::WrongPhase(self.phase, Phase::Ready));
        }
        self.phase = Phase::Running;
        Ok(())
    }

    /// Advances one frame and returns the uniform set to submit, or `None`
    /// once the scheduler has been stopped.
    pub fn tick(
        &mut self,
        signals: &SignalSnapshot,
        resolution: [f32; 2],
    ) -> Option<FrameUpdate> {
        if self.phase != Phase::Running {
            return None;
        }
        let frame = self.frame;
        self.frame = self.frame.saturating_add(1);
        self.uniforms =
            advance_uniforms(self.variant, &self.uniforms, frame, resolution, signals);
        Some(FrameUpdate {
            frame,
            uniforms: self.uniforms.clone(),
        })
    }

    /// Cooperative cancellation: takes effect between ticks, in-flight
    /// submissions drain on their own.
    pub fn stop(&mut self) {
        if self.phase != Phase::Stopped {
            debug!(frames = self.frame, "scheduler stopped");
            self.phase = Phase::Stopped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{AudioLevels, WarpControls};

    const RES: [f32; 2] = [800.0, 600.0];

    fn running(variant: ShaderVariant) -> FrameScheduler {
        let mut scheduler = FrameScheduler::new(variant);
        scheduler.prepare(RES).unwrap();
        scheduler.begin().unwrap();
        scheduler
    }

    #[test]
    fn frame_counter_increments_once_per_tick_from_zero() {
        let mut scheduler = running(ShaderVariant::NoiseFeedback);
        let signals = SignalSnapshot::default();
        for expected in 0..48u64 {
            let update = scheduler.tick(&signals, RES).unwrap();
            assert_eq!(update.frame, expected);
            assert_eq!(
                update.uniforms.get("frame"),
                Some(&UniformValue::Scalar(expected as f32))
            );
        }
        assert_eq!(scheduler.frame_index(), 48);
    }

    #[test]
    fn tick_is_inert_before_begin_and_after_stop() {
        let mut scheduler = FrameScheduler::new(ShaderVariant::VideoWarp);
        let signals = SignalSnapshot::default();
        assert!(scheduler.tick(&signals, RES).is_none());

        scheduler.prepare(RES).unwrap();
        assert!(scheduler.tick(&signals, RES).is_none());

        scheduler.begin().unwrap();
        assert!(scheduler.tick(&signals, RES).is_some());

        scheduler.stop();
        assert!(scheduler.tick(&signals, RES).is_none());
        assert_eq!(scheduler.frame_index(), 1);
    }

    #[test]
    fn prepare_validates_against_the_descriptor() {
        let mut scheduler = FrameScheduler::new(ShaderVariant::NoiseFeedback);
        scheduler.prepare(RES).unwrap();
        assert_eq!(scheduler.phase(), Phase::Ready);
        // Defaults must already satisfy the full contract.
        scheduler
            .uniforms
            .validate(&ShaderVariant::NoiseFeedback.descriptor())
            .unwrap();
    }

    #[test]
    fn begin_out_of_order_is_rejected() {
        let mut scheduler = FrameScheduler::new(ShaderVariant::NoiseFeedback);
        assert_eq!(
            scheduler.begin(),
            Err(SchedulerError::WrongPhase(
                Phase::Uninitialized,
                Phase::Ready
            ))
        );
    }

    #[test]
    fn feedback_tick_forwards_audio_and_mouse() {
        let mut scheduler = running(ShaderVariant::NoiseFeedback);
        let signals = SignalSnapshot {
            audio: AudioLevels {
                low: 0.2,
                mid: 0.4,
                high: 0.8,
            },
            mouse: [120.0, 88.0, 1.0],
            ..SignalSnapshot::default()
        };
        let update = scheduler.tick(&signals, RES).unwrap();
        assert_eq!(
            update.uniforms.get("audio"),
            Some(&UniformValue::Vec3([0.2, 0.4, 0.8]))
        );
        assert_eq!(
            update.uniforms.get("mouse"),
            Some(&UniformValue::Vec3([120.0, 88.0, 1.0]))
        );
        assert_eq!(
            update.uniforms.get("res"),
            Some(&UniformValue::Vec2(RES))
        );
    }

    #[test]
    fn warp_tick_forwards_the_four_controls() {
        let mut scheduler = running(ShaderVariant::VideoWarp);
        let signals = SignalSnapshot {
            controls: WarpControls::clamped(2.0, 0.5, 0.4, 0.9),
            ..SignalSnapshot::default()
        };
        let update = scheduler.tick(&signals, RES).unwrap();
        assert_eq!(
            update.uniforms.get("speed"),
            Some(&UniformValue::Scalar(2.0))
        );
        assert_eq!(
            update.uniforms.get("largeWaveStrength"),
            Some(&UniformValue::Scalar(0.5))
        );
        assert_eq!(
            update.uniforms.get("smallWaveStrength"),
            Some(&UniformValue::Scalar(0.4))
        );
        assert_eq!(
            update.uniforms.get("interferenceStrength"),
            Some(&UniformValue::Scalar(0.9))
        );
    }

    #[test]
    fn advance_uniforms_is_pure() {
        let previous = initial_uniforms(ShaderVariant::VideoWarp, RES);
        let signals = SignalSnapshot::default();
        let a = advance_uniforms(ShaderVariant::VideoWarp, &previous, 7, RES, &signals);
        let b = advance_uniforms(ShaderVariant::VideoWarp, &previous, 7, RES, &signals);
        assert_eq!(a, b);
    }
}
