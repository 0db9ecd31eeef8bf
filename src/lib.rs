//! # Portal Rotation Check
//!
//! End-to-end check that a ScreenCast portal backend applies display
//! rotation to the frames it delivers. The check drives a full portal
//! session (create, select sources, start), captures frames from the
//! negotiated PipeWire stream through an external GStreamer pipeline,
//! measures the resulting image, and classifies the geometry against the
//! expected post-rotation dimensions.
//!
//! ## Architecture
//!
//! - `portal`: zbus client for the ScreenCast portal — request/response
//!   correlation and the session lifecycle state machine
//! - `capture`: the external capture pipeline and frame selection policy
//! - `probe`: dimension measurement fallback chain
//! - `verdict`: pass/fail classification of the measured geometry
//! - `config`: validated run configuration
//! - `error`: the crate-wide error taxonomy
//!
//! The regression this exists to catch is the transposed case: rotation
//! metadata advertised but never applied, so a portrait display yields
//! landscape frames. See [`verdict::Verdict::SwappedMatch`].

use std::time::Duration;

pub mod capture;
pub mod config;
pub mod error;
pub mod portal;
pub mod probe;
pub mod verdict;

pub use config::CheckConfig;
pub use error::{CheckError, CheckResult};
pub use verdict::{Verdict, classify};

use capture::FrameCapture;
use portal::ScreencastSession;

/// Run the whole check: session setup, capture, measurement,
/// classification.
///
/// Session cleanup always runs, exactly once, no matter which step failed;
/// its own failures are logged and swallowed so they cannot mask the error
/// that interrupted the run.
pub async fn run_check(config: &CheckConfig) -> CheckResult<Verdict> {
    std::fs::create_dir_all(&config.output_dir)
        .map_err(|error| CheckError::io("creating output directory", error))?;

    let mut session = ScreencastSession::connect(config.timeout).await?;
    let outcome = drive(&mut session, config).await;
    session.close().await;
    let actual = outcome?;

    println!("Captured frame dimensions: {}x{}", actual.0, actual.1);
    println!(
        "Expected dimensions: {}x{}",
        config.expected_width, config.expected_height
    );
    Ok(classify(actual, config.expected()))
}

/// The fallible part of the run, separated out so [`run_check`] can close
/// the session unconditionally around it.
async fn drive(session: &mut ScreencastSession, config: &CheckConfig) -> CheckResult<(u32, u32)> {
    session.create_session().await?;
    session.select_sources().await?;
    let stream = session.start().await?;

    // Give the stream a moment to stabilize before sampling it.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let frames = FrameCapture::new(config.output_dir.clone(), config.timeout);
    let frame = frames.capture(stream.node_id, config.frames).await?;
    probe::measure_dimensions(&frame).await
}
