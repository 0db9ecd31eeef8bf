//! # Configuration Module
//!
//! Validated configuration for a rotation check run. This is the common
//! surface between the CLI front end and the library entry point
//! [`crate::run_check`].
//!
//! ## Parameters
//!
//! | Parameter | Default | Description |
//! |-----------|---------|-------------|
//! | `output_dir` | fresh temp dir | Where captured frames are written |
//! | `expected_width` | 1080 | Frame width after rotation |
//! | `expected_height` | 1920 | Frame height after rotation |
//! | `allow_unrotated` | false | Treat swapped dimensions as a pass |
//! | `frames` | 5 | Frame budget for the capture pipeline |
//! | `timeout` | 30s | Bound on portal requests and the capture run |

use std::path::PathBuf;
use std::time::Duration;

/// Default frame budget; the first few frames of a fresh stream are often
/// black or garbage, so a single frame is not enough.
pub const DEFAULT_FRAMES: u32 = 5;

/// Default bound for portal requests and the capture pipeline.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for one rotation check run.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Directory captured frame artifacts are written into. Created if it
    /// does not exist; kept on disk afterwards for inspection.
    pub output_dir: PathBuf,

    /// Expected frame width after display rotation has been applied.
    pub expected_width: u32,

    /// Expected frame height after display rotation has been applied.
    pub expected_height: u32,

    /// Whether transposed (unrotated) dimensions still count as a pass.
    pub allow_unrotated: bool,

    /// How many frames to request from the capture pipeline.
    pub frames: u32,

    /// Bound applied to each portal request and to the capture subprocess.
    pub timeout: Duration,
}

impl CheckConfig {
    /// Build a configuration with defaults for everything but the output
    /// directory and the expected geometry.
    pub fn new(output_dir: PathBuf, expected_width: u32, expected_height: u32) -> Self {
        Self {
            output_dir,
            expected_width,
            expected_height,
            allow_unrotated: false,
            frames: DEFAULT_FRAMES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Validate the configuration, returning a human-readable message on
    /// failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.expected_width == 0 || self.expected_height == 0 {
            return Err(format!(
                "expected dimensions must be non-zero (got {}x{})",
                self.expected_width, self.expected_height
            ));
        }
        if self.frames == 0 {
            return Err("frame budget must be at least 1".to_string());
        }
        if self.timeout.is_zero() {
            return Err("timeout must be non-zero".to_string());
        }
        Ok(())
    }

    /// The expected `(width, height)` pair, in classifier form.
    pub fn expected(&self) -> (u32, u32) {
        (self.expected_width, self.expected_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CheckConfig::new(PathBuf::from("/tmp/frames"), 1080, 1920);
        assert!(config.validate().is_ok());
        assert_eq!(config.frames, DEFAULT_FRAMES);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.expected(), (1080, 1920));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let config = CheckConfig::new(PathBuf::from("/tmp/frames"), 0, 1920);
        assert!(config.validate().unwrap_err().contains("0x1920"));
    }

    #[test]
    fn zero_frame_budget_is_rejected() {
        let mut config = CheckConfig::new(PathBuf::from("/tmp/frames"), 1080, 1920);
        config.frames = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = CheckConfig::new(PathBuf::from("/tmp/frames"), 1080, 1920);
        config.timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
