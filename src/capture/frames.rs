//! # Frame Capture
//!
//! Runs `gst-launch-1.0` against the negotiated PipeWire node and picks the
//! canonical frame from whatever the pipeline managed to write.
//!
//! The pipeline's exit status is advisory only: a late failure after some
//! frames hit disk is common (stream teardown racing the sink), and those
//! frames are perfectly usable. The one status that is authoritative is the
//! artifact scan afterwards — zero frames is a failure no matter what the
//! pipeline claimed.
//!
//! ## Selection policy
//!
//! Among all `frame_<N>.png` artifacts, the highest `N` wins: the most
//! recently completed frame is the most likely to be fully flushed, and the
//! early frames of a live stream are often black before the pipeline
//! stabilizes. Ordinals compare numerically, so `frame_10` beats `frame_9`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{CheckError, CheckResult};

const CAPTURE_TOOL: &str = "gst-launch-1.0";

/// Invokes the capture pipeline and resolves the canonical frame artifact.
pub struct FrameCapture {
    output_dir: PathBuf,
    timeout: Duration,
    tool: String,
}

impl FrameCapture {
    pub fn new(output_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            output_dir,
            timeout,
            tool: CAPTURE_TOOL.to_string(),
        }
    }

    /// Override the pipeline launcher binary. Used by tests; the default is
    /// `gst-launch-1.0`.
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// Capture up to `num_frames` frames from PipeWire node `node_id` and
    /// return the path of the canonical artifact.
    pub async fn capture(&self, node_id: u32, num_frames: u32) -> CheckResult<PathBuf> {
        println!(
            "Capturing {} frames from PipeWire node {}...",
            num_frames, node_id
        );

        // pipewiresrc path=<node> num-buffers=<n> ! videoconvert ! pngenc !
        //   multifilesink location=<dir>/frame_%d.png
        let location = self.output_dir.join("frame_%d.png");
        let mut command = Command::new(&self.tool);
        command
            .arg("-e")
            .arg("pipewiresrc")
            .arg(format!("path={node_id}"))
            .arg(format!("num-buffers={num_frames}"))
            .args(["!", "videoconvert"])
            .args(["!", "pngenc"])
            .args(["!", "multifilesink"])
            .arg(format!("location={}", location.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|error| {
            if error.kind() == ErrorKind::NotFound {
                CheckError::ToolMissing {
                    tool: self.tool.clone(),
                }
            } else {
                CheckError::io("spawning capture pipeline", error)
            }
        })?;

        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) if !status.success() => {
                // Keep going; the artifact scan below is the real arbiter.
                eprintln!("Warning: capture pipeline exited with {status}");
            }
            Ok(Ok(_)) => {}
            Ok(Err(error)) => return Err(CheckError::io("waiting for capture pipeline", error)),
            Err(_) => {
                eprintln!(
                    "Warning: capture pipeline still running after {}s, killing it",
                    self.timeout.as_secs()
                );
                let _ = child.kill().await;
            }
        }

        let frame = latest_frame(&self.output_dir)?;
        println!("Captured frame: {}", frame.display());
        Ok(frame)
    }
}

/// Scan `dir` for `frame_<N>.png` artifacts and return the one with the
/// highest ordinal.
pub fn latest_frame(dir: &Path) -> CheckResult<PathBuf> {
    let entries =
        std::fs::read_dir(dir).map_err(|error| CheckError::io("reading output directory", error))?;

    let mut best: Option<(u64, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|error| CheckError::io("reading output directory", error))?;
        let name = entry.file_name();
        let Some(ordinal) = frame_ordinal(&name.to_string_lossy()) else {
            continue;
        };
        if best.as_ref().is_none_or(|(top, _)| ordinal > *top) {
            best = Some((ordinal, entry.path()));
        }
    }

    best.map(|(_, path)| path)
        .ok_or_else(|| CheckError::NoFramesProduced {
            dir: dir.to_path_buf(),
        })
}

fn frame_ordinal(name: &str) -> Option<u64> {
    name.strip_prefix("frame_")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn picks_the_highest_ordinal() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "frame_1.png");
        touch(dir.path(), "frame_3.png");

        let frame = latest_frame(dir.path()).unwrap();
        assert_eq!(frame.file_name().unwrap(), "frame_3.png");
    }

    #[test]
    fn ordinals_compare_numerically_not_lexically() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "frame_9.png");
        touch(dir.path(), "frame_10.png");

        let frame = latest_frame(dir.path()).unwrap();
        assert_eq!(frame.file_name().unwrap(), "frame_10.png");
    }

    #[test]
    fn unrelated_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "frame_2.png");
        touch(dir.path(), "frame_.png");
        touch(dir.path(), "frame_x.png");
        touch(dir.path(), "snapshot_99.png");
        touch(dir.path(), "frame_100.jpg");

        let frame = latest_frame(dir.path()).unwrap();
        assert_eq!(frame.file_name().unwrap(), "frame_2.png");
    }

    #[test]
    fn empty_directory_means_no_frames_produced() {
        let dir = tempfile::tempdir().unwrap();
        let error = latest_frame(dir.path()).unwrap_err();
        assert_eq!(error.category(), "no_frames");
    }

    #[test]
    fn frame_ordinal_parsing() {
        assert_eq!(frame_ordinal("frame_0.png"), Some(0));
        assert_eq!(frame_ordinal("frame_42.png"), Some(42));
        assert_eq!(frame_ordinal("frame_42.jpg"), None);
        assert_eq!(frame_ordinal("frame_.png"), None);
        assert_eq!(frame_ordinal("other_1.png"), None);
    }

    #[tokio::test]
    async fn missing_launcher_binary_is_a_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let capture = FrameCapture::new(dir.path().to_path_buf(), Duration::from_secs(5))
            .with_tool("rotcheck-no-such-launcher");

        let error = capture.capture(42, 1).await.unwrap_err();
        assert_eq!(error.category(), "tool_missing");
        assert!(error.to_string().contains("rotcheck-no-such-launcher"));
    }
}
