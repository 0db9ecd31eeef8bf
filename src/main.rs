use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use portal_rotation_check::config::{CheckConfig, DEFAULT_FRAMES, DEFAULT_TIMEOUT_SECS};
use portal_rotation_check::verdict::Verdict;

/// End-to-end rotation check for portal screen capture:
/// drives a ScreenCast session over D-Bus, grabs frames from the negotiated
/// PipeWire stream via GStreamer, and verifies the captured geometry.
#[derive(Parser, Debug)]
#[command(name = "rotcheck")]
#[command(about = "Check that portal screen capture applies display rotation")]
#[command(
    long_about = "Drives the org.freedesktop.portal.ScreenCast flow end to end, captures frames \
from the resulting PipeWire stream, and compares the frame geometry against the expected \
post-rotation dimensions.

Exit codes: 0 = dimensions match (or swapped with --allow-unrotated), 1 = swapped or wrong \
dimensions, 2 = the check itself failed."
)]
struct Args {
    /// Directory for captured frames (default: a fresh temporary directory,
    /// kept on disk for inspection)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Expected frame width after rotation
    #[arg(long, default_value_t = 1080)]
    expected_width: u32,

    /// Expected frame height after rotation
    #[arg(long, default_value_t = 1920)]
    expected_height: u32,

    /// Do not fail when dimensions come back transposed (unrotated)
    #[arg(long)]
    allow_unrotated: bool,

    /// Number of frames to request from the capture pipeline
    #[arg(long, default_value_t = DEFAULT_FRAMES)]
    frames: u32,

    /// Timeout in seconds for portal requests and the capture pipeline
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let output_dir = match args.output_dir {
        Some(dir) => dir,
        None => match tempfile::Builder::new().prefix("rotcheck_").tempdir() {
            // Keep the directory so frames survive for inspection.
            Ok(dir) => dir.keep(),
            Err(error) => {
                eprintln!("ERROR: could not create temporary output directory: {error}");
                return ExitCode::from(2);
            }
        },
    };

    let mut config = CheckConfig::new(output_dir, args.expected_width, args.expected_height);
    config.allow_unrotated = args.allow_unrotated;
    config.frames = args.frames;
    config.timeout = std::time::Duration::from_secs(args.timeout);
    if let Err(message) = config.validate() {
        eprintln!("ERROR: {message}");
        return ExitCode::from(2);
    }

    println!("=== Portal rotation check ===");
    println!("Output directory: {}", config.output_dir.display());
    println!(
        "Expected dimensions: {}x{}",
        config.expected_width, config.expected_height
    );
    println!();

    match portal_rotation_check::run_check(&config).await {
        Ok(verdict) => {
            report(verdict, config.allow_unrotated);
            ExitCode::from(verdict.exit_code(config.allow_unrotated))
        }
        Err(error) => {
            eprintln!("ERROR: {error}");
            ExitCode::from(2)
        }
    }
}

fn report(verdict: Verdict, allow_unrotated: bool) {
    match verdict {
        Verdict::Match => {
            println!("[PASS] Frame dimensions match expected (rotation applied correctly)");
        }
        Verdict::SwappedMatch => {
            println!("[FAIL] Frame dimensions are transposed (raw buffer passed through)");
            if allow_unrotated {
                println!("       (--allow-unrotated set, not failing)");
            }
        }
        Verdict::Mismatch => {
            println!("[FAIL] Frame dimensions match neither orientation");
        }
    }
}
