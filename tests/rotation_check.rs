//! Integration tests for the pieces of the rotation check that do not need
//! a live portal: classification scenarios, exit-code policy, frame
//! selection, and the dimension probe's text extraction.

use std::fs::File;
use std::time::Duration;

use portal_rotation_check::capture::FrameCapture;
use portal_rotation_check::capture::frames::latest_frame;
use portal_rotation_check::config::CheckConfig;
use portal_rotation_check::probe::extract_dimensions;
use portal_rotation_check::verdict::Verdict;
use portal_rotation_check::classify;

/// Scenario: portrait display, rotation applied correctly.
#[test]
fn matching_dimensions_pass() {
    let verdict = classify((1080, 1920), (1080, 1920));
    assert_eq!(verdict, Verdict::Match);
    assert_eq!(verdict.exit_code(false), 0);
}

/// Scenario: rotation metadata present but not applied — the regression
/// under test.
#[test]
fn transposed_dimensions_fail_without_override() {
    let verdict = classify((1920, 1080), (1080, 1920));
    assert_eq!(verdict, Verdict::SwappedMatch);
    assert_eq!(verdict.exit_code(false), 1);
}

/// Scenario: same measurement, but the caller opted out of failing on
/// unrotated output.
#[test]
fn transposed_dimensions_pass_with_override() {
    let verdict = classify((1920, 1080), (1080, 1920));
    assert_eq!(verdict, Verdict::SwappedMatch);
    assert_eq!(verdict.exit_code(true), 0);
}

/// Scenario: the stream produced something else entirely.
#[test]
fn unrelated_dimensions_fail_either_way() {
    let verdict = classify((640, 480), (1080, 1920));
    assert_eq!(verdict, Verdict::Mismatch);
    assert_eq!(verdict.exit_code(false), 1);
    assert_eq!(verdict.exit_code(true), 1);
}

#[test]
fn frame_selection_prefers_the_latest_artifact() {
    let dir = tempfile::tempdir().unwrap();
    File::create(dir.path().join("frame_1.png")).unwrap();
    File::create(dir.path().join("frame_3.png")).unwrap();

    let frame = latest_frame(dir.path()).unwrap();
    assert_eq!(frame.file_name().unwrap(), "frame_3.png");
}

#[tokio::test]
async fn absent_capture_binary_reports_tool_missing() {
    let dir = tempfile::tempdir().unwrap();
    let capture = FrameCapture::new(dir.path().to_path_buf(), Duration::from_secs(5))
        .with_tool("rotcheck-integration-no-such-tool");

    let error = capture.capture(7, 5).await.unwrap_err();
    assert_eq!(error.category(), "tool_missing");
}

#[test]
fn file_tool_output_parses_into_a_pair() {
    let parsed = extract_dimensions(
        "captured_frame.png: PNG image data, 1080 x 1920, 8-bit/color RGBA, non-interlaced",
    );
    assert_eq!(parsed, Some((1080, 1920)));
}

#[test]
fn config_defaults_line_up_with_the_cli_contract() {
    let config = CheckConfig::new("/tmp/rotcheck".into(), 1080, 1920);
    assert!(config.validate().is_ok());
    assert!(!config.allow_unrotated);
    assert_eq!(config.frames, 5);
    assert_eq!(config.timeout, Duration::from_secs(30));
}
