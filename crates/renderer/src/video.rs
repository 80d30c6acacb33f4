//! Video input sources.
//!
//! The renderer treats video as an external collaborator: a source must
//! finish `init` before the first tick, after which the loop polls it once
//! per tick and tolerates "nothing new yet" indefinitely. Frames are plain
//! RGBA8 buffers uploaded into the video texture; a source that cannot keep
//! up simply leaves the previous frame on screen.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use glam::Vec2;
use tracing::{debug, warn};

use crate::noise::value_noise;

/// Image formats probed when scanning a frame directory.
const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// One decoded RGBA8 frame.
#[derive(Debug)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl VideoFrame {
    fn black(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; (width * height * 4) as usize],
        }
    }
}

/// A live video input as seen by the render loop.
pub trait VideoSource {
    /// Completes any setup the source needs. Called exactly once, before the
    /// first tick; a failure here is fatal.
    fn init(&mut self) -> Result<()>;

    /// Frame dimensions, fixed for the source's lifetime.
    fn dimensions(&self) -> (u32, u32);

    /// Latest frame if one arrived since the previous poll, `None` otherwise.
    /// Never blocks.
    fn poll_frame(&mut self) -> Option<&VideoFrame>;
}

/// Procedural stand-in for a camera: animated value-noise luminance.
/// Deterministic, so renders against it are reproducible.
pub struct TestPatternVideo {
    frame: VideoFrame,
    tick: u64,
}

impl TestPatternVideo {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: VideoFrame::black(width, height),
            tick: 0,
        }
    }
}

impl Default for TestPatternVideo {
    fn default() -> Self {
        Self::new(320, 240)
    }
}

impl VideoSource for TestPatternVideo {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn poll_frame(&mut self) -> Option<&VideoFrame> {
        let t = self.tick as f32 / 30.0;
        let (width, height) = (self.frame.width, self.frame.height);
        for y in 0..height {
            for x in 0..width {
                let sample = value_noise(Vec2::new(
                    x as f32 * 0.05 + t,
                    y as f32 * 0.05 + t * 0.25,
                ));
                let luma = (sample * 255.0) as u8;
                let offset = ((y * width + x) * 4) as usize;
                self.frame.rgba[offset] = luma;
                self.frame.rgba[offset + 1] = luma;
                self.frame.rgba[offset + 2] = luma;
                self.frame.rgba[offset + 3] = 255;
            }
        }
        self.tick = self.tick.saturating_add(1);
        Some(&self.frame)
    }
}

/// Plays a directory of image files as a looping clip at a fixed rate.
///
/// All frames must share the first frame's dimensions; offenders are skipped
/// with a warning rather than failing the run.
#[derive(Debug)]
pub struct ImageSequenceVideo {
    paths: Vec<PathBuf>,
    width: u32,
    height: u32,
    fps: f32,
    started: Option<Instant>,
    loaded: Option<usize>,
    frame: VideoFrame,
}

impl ImageSequenceVideo {
    pub fn open(directory: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(directory)
            .with_context(|| format!("failed to read frame directory {}", directory.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            anyhow::bail!(
                "no image frames ({}) found in {}",
                FRAME_EXTENSIONS.join("/"),
                directory.display()
            );
        }

        Ok(Self {
            paths,
            width: 0,
            height: 0,
            fps: 30.0,
            started: None,
            loaded: None,
            frame: VideoFrame::black(1, 1),
        })
    }

    fn decode(&self, index: usize) -> Result<VideoFrame> {
        let path = &self.paths[index];
        let image = image::open(path)
            .with_context(|| format!("failed to decode frame at {}", path.display()))?;
        let rgba = image.to_rgba8();
        Ok(VideoFrame {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }

    fn current_index(&self) -> usize {
        let elapsed = self
            .started
            .map(|start| start.elapsed().as_secs_f32())
            .unwrap_or(0.0);
        (elapsed * self.fps) as usize % self.paths.len()
    }
}

impl VideoSource for ImageSequenceVideo {
    fn init(&mut self) -> Result<()> {
        let first = self.decode(0)?;
        self.width = first.width;
        self.height = first.height;
        self.frame = first;
        self.loaded = Some(0);
        self.started = Some(Instant::now());
        debug!(
            frames = self.paths.len(),
            width = self.width,
            height = self.height,
            "image sequence ready"
        );
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn poll_frame(&mut self) -> Option<&VideoFrame> {
        let index = self.current_index();
        if self.loaded == Some(index) {
            return None;
        }

        match self.decode(index) {
            Ok(frame) if frame.width == self.width && frame.height == self.height => {
                self.frame = frame;
                self.loaded = Some(index);
                Some(&self.frame)
            }
            Ok(frame) => {
                warn!(
                    index,
                    width = frame.width,
                    height = frame.height,
                    expected_width = self.width,
                    expected_height = self.height,
                    "skipping frame with mismatched dimensions"
                );
                self.loaded = Some(index);
                None
            }
            Err(error) => {
                warn!(index, error = %error, "failed to decode frame; keeping previous");
                self.loaded = Some(index);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_deterministic_per_tick() {
        let mut a = TestPatternVideo::new(16, 16);
        let mut b = TestPatternVideo::new(16, 16);
        let frame_a = a.poll_frame().unwrap().rgba.clone();
        let frame_b = b.poll_frame().unwrap().rgba.clone();
        assert_eq!(frame_a, frame_b);

        let frame_a2 = a.poll_frame().unwrap().rgba.clone();
        assert_ne!(frame_a, frame_a2, "pattern must animate between ticks");
    }

    #[test]
    fn test_pattern_frames_are_opaque_rgba() {
        let mut source = TestPatternVideo::new(8, 4);
        let frame = source.poll_frame().unwrap();
        assert_eq!(frame.rgba.len(), 8 * 4 * 4);
        assert!(frame.rgba.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn empty_directory_is_a_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageSequenceVideo::open(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no image frames"));
    }

    #[test]
    fn missing_directory_is_a_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        assert!(ImageSequenceVideo::open(&gone).is_err());
    }
}
