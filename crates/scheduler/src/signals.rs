//! External signal producers as seen by the frame scheduler.
//!
//! Audio analysis, parameter panels, and the window's cursor all live outside
//! the core; the scheduler only ever reads a latest-value snapshot once per
//! tick. Reads never block, and a producer that has not published anything
//! yet simply yields its default.

/// Three audio band levels, each nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioLevels {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

/// Non-blocking view of an audio analyser.
///
/// Band extraction itself is a collaborator concern; the scheduler consumes
/// only the three scalars.
pub trait AudioSource {
    fn levels(&self) -> AudioLevels;
}

/// Audio source for runs without a capture backend. Always reports silence.
pub struct SilentAudio;

impl AudioSource for SilentAudio {
    fn levels(&self) -> AudioLevels {
        AudioLevels::default()
    }
}

/// Bounded warp parameters, as exposed by a parameter panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpControls {
    /// Playback speed multiplier, `[0, 3]`.
    pub speed: f32,
    /// Large wave strength, `[0, 3]`.
    pub large_waves: f32,
    /// Small wave strength, `[0, 0.5]`.
    pub small_waves: f32,
    /// Interference mix strength, `[0, 1]`.
    pub interference: f32,
}

impl WarpControls {
    /// Builds a control set, clamping each value into its documented range.
    pub fn clamped(speed: f32, large_waves: f32, small_waves: f32, interference: f32) -> Self {
        Self {
            speed: speed.clamp(0.0, 3.0),
            large_waves: large_waves.clamp(0.0, 3.0),
            small_waves: small_waves.clamp(0.0, 0.5),
            interference: interference.clamp(0.0, 1.0),
        }
    }
}

impl Default for WarpControls {
    fn default() -> Self {
        Self {
            speed: 1.0,
            large_waves: 1.0,
            small_waves: 0.25,
            interference: 0.3,
        }
    }
}

/// Non-blocking view of the parameter panel.
pub trait ControlPanel {
    fn snapshot(&self) -> WarpControls;
}

/// Control panel stand-in that always reports the same values.
pub struct FixedControls(pub WarpControls);

impl ControlPanel for FixedControls {
    fn snapshot(&self) -> WarpControls {
        self.0
    }
}

/// Everything the scheduler reads from the outside world on one tick.
///
/// `mouse` is `[x, y, pressed]` in pixels, matching the shader's vec3 uniform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalSnapshot {
    pub audio: AudioLevels,
    pub controls: WarpControls,
    pub mouse: [f32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls_clamp_into_documented_bounds() {
        let controls = WarpControls::clamped(5.0, -1.0, 2.0, 1.5);
        assert_eq!(controls.speed, 3.0);
        assert_eq!(controls.large_waves, 0.0);
        assert_eq!(controls.small_waves, 0.5);
        assert_eq!(controls.interference, 1.0);
    }

    #[test]
    fn in_range_controls_pass_through() {
        let controls = WarpControls::clamped(1.5, 2.0, 0.1, 0.7);
        assert_eq!(
            controls,
            WarpControls {
                speed: 1.5,
                large_waves: 2.0,
                small_waves: 0.1,
                interference: 0.7,
            }
        );
    }

    #[test]
    fn silent_audio_reports_zero_levels() {
        let levels = SilentAudio.levels();
        assert_eq!(levels, AudioLevels::default());
    }
}
