//! Frame dimension type shared across the pipeline.

use serde::{Deserialize, Serialize};

/// Width and height of a video frame in pixels.
///
/// Sizes flow through the pipeline unclamped so that an empty upstream
/// frame (either dimension zero) stays observable and render code can
/// bypass it. Hosts querying the stage's reported output size go through
/// [`FrameSize::clamped_nonzero`], which guarantees each dimension is at
/// least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Creates a frame size.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Total pixel count.
    #[inline]
    pub const fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns this size with each dimension clamped to at least 1.
    #[inline]
    pub const fn clamped_nonzero(self) -> Self {
        Self {
            width: if self.width == 0 { 1 } else { self.width },
            height: if self.height == 0 { 1 } else { self.height },
        }
    }

    /// Scales both dimensions by `factor`, rounding to the nearest pixel.
    ///
    /// The result is clamped to at least 1 per dimension so a provider
    /// can never report an empty output for a non-empty input.
    pub fn scaled(self, factor: f32) -> Self {
        let width = ((self.width as f32 * factor).round() as u32).max(1);
        let height = ((self.height as f32 * factor).round() as u32).max(1);
        Self { width, height }
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for FrameSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(FrameSize::new(0, 0).is_empty());
        assert!(FrameSize::new(1920, 0).is_empty());
        assert!(FrameSize::new(0, 1080).is_empty());
        assert!(!FrameSize::new(1, 1).is_empty());
    }

    #[test]
    fn test_clamped_nonzero() {
        assert_eq!(FrameSize::new(0, 0).clamped_nonzero(), FrameSize::new(1, 1));
        assert_eq!(FrameSize::new(0, 720).clamped_nonzero(), FrameSize::new(1, 720));
        assert_eq!(
            FrameSize::new(1920, 1080).clamped_nonzero(),
            FrameSize::new(1920, 1080)
        );
    }

    #[test]
    fn test_scaled() {
        assert_eq!(FrameSize::new(1280, 720).scaled(1.5), FrameSize::new(1920, 1080));
        assert_eq!(FrameSize::new(100, 100).scaled(1.0), FrameSize::new(100, 100));
        // Zero input never produces a zero output
        assert_eq!(FrameSize::new(0, 0).scaled(4.0), FrameSize::new(1, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(FrameSize::new(640, 480).to_string(), "640x480");
    }
}
