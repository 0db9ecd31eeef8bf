//! # Dimension Probe
//!
//! Measures the pixel dimensions of a captured frame without decoding it.
//!
//! No single tool is reliably present on every system, so this is an ordered
//! fallback chain behind one trait: ImageMagick's `identify` first, then an
//! in-process header read via the `image` crate, then the `file` command
//! with textual extraction. The first probe that yields a parseable pair
//! wins; if all of them come up empty the frame is unmeasurable and the run
//! fails with [`CheckError::DimensionUnavailable`].

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{CheckError, CheckResult};

/// One way of measuring an image file's dimensions.
trait DimensionProbe {
    fn name(&self) -> &'static str;

    /// Try to measure; `None` means "this probe cannot answer here", not an
    /// error — the chain just moves on.
    fn probe(&self, path: &Path) -> Option<(u32, u32)>;
}

/// Measure `path` with the first probe in the chain that succeeds.
///
/// The subprocess probes block, so the chain runs on tokio's blocking pool
/// rather than stalling a runtime worker.
pub async fn measure_dimensions(path: &Path) -> CheckResult<(u32, u32)> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || measure_dimensions_blocking(&path))
        .await
        .map_err(|error| CheckError::io("joining dimension probe task", std::io::Error::other(error)))?
}

/// Synchronous probe chain; prefer [`measure_dimensions`] from async code.
pub fn measure_dimensions_blocking(path: &Path) -> CheckResult<(u32, u32)> {
    let probes: [&dyn DimensionProbe; 3] = [&IdentifyProbe, &ImageCrateProbe, &FileSniffProbe];
    for probe in probes {
        if let Some((width, height)) = probe.probe(path) {
            println!("Measured {}x{} via {}", width, height, probe.name());
            return Ok((width, height));
        }
    }
    Err(CheckError::DimensionUnavailable {
        path: PathBuf::from(path),
    })
}

/// ImageMagick: `identify -format "%w %h" <path>`.
struct IdentifyProbe;

impl DimensionProbe for IdentifyProbe {
    fn name(&self) -> &'static str {
        "identify"
    }

    fn probe(&self, path: &Path) -> Option<(u32, u32)> {
        let output = Command::new("identify")
            .args(["-format", "%w %h"])
            .arg(path)
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        parse_pair(&String::from_utf8_lossy(&output.stdout))
    }
}

/// In-process fallback: the `image` crate reads only the header.
struct ImageCrateProbe;

impl DimensionProbe for ImageCrateProbe {
    fn name(&self) -> &'static str {
        "image crate"
    }

    fn probe(&self, path: &Path) -> Option<(u32, u32)> {
        image::image_dimensions(path).ok()
    }
}

/// Last resort: `file <path>` prints something like
/// `PNG image data, 1920 x 1080, 8-bit/color RGBA` and we fish the pair out
/// of the text.
struct FileSniffProbe;

impl DimensionProbe for FileSniffProbe {
    fn name(&self) -> &'static str {
        "file"
    }

    fn probe(&self, path: &Path) -> Option<(u32, u32)> {
        let output = Command::new("file").arg(path).output().ok()?;
        if !output.status.success() {
            return None;
        }
        extract_dimensions(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `"<w> <h>"` as printed by `identify -format "%w %h"`.
fn parse_pair(text: &str) -> Option<(u32, u32)> {
    let mut fields = text.split_whitespace();
    let width = fields.next()?.parse().ok()?;
    let height = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((width, height))
}

/// Extract the first `<digits> x <digits>` pattern from free-form tool
/// output, tolerating the commas `file` sticks onto its fields. Both the
/// spaced form (`1920 x 1080`) and the compact form (`1920x1080`) occur in
/// the wild.
pub fn extract_dimensions(text: &str) -> Option<(u32, u32)> {
    let tokens: Vec<&str> = text
        .split_whitespace()
        .map(|token| token.trim_matches(','))
        .collect();
    for (i, token) in tokens.iter().enumerate() {
        if let Some(pair) = embedded_pair(token) {
            return Some(pair);
        }
        if let (Some(&"x"), Some(after)) = (tokens.get(i + 1), tokens.get(i + 2)) {
            if let (Ok(width), Ok(height)) = (token.parse(), after.parse()) {
                return Some((width, height));
            }
        }
    }
    None
}

/// Parse a single `<digits>x<digits>` token.
fn embedded_pair(token: &str) -> Option<(u32, u32)> {
    let (width, height) = token.split_once('x')?;
    if width.is_empty()
        || height.is_empty()
        || !width.bytes().all(|b| b.is_ascii_digit())
        || !height.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    Some((width.parse().ok()?, height.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identify_output() {
        assert_eq!(parse_pair("1920 1080"), Some((1920, 1080)));
        assert_eq!(parse_pair(" 1080 1920 \n"), Some((1080, 1920)));
        assert_eq!(parse_pair("1920"), None);
        assert_eq!(parse_pair("1920 1080 60"), None);
        assert_eq!(parse_pair("widthxheight"), None);
    }

    #[test]
    fn extracts_dimensions_from_file_output() {
        assert_eq!(
            extract_dimensions(
                "frame_3.png: PNG image data, 1920 x 1080, 8-bit/color RGBA, non-interlaced"
            ),
            Some((1920, 1080))
        );
        assert_eq!(
            extract_dimensions("JPEG image data, baseline, precision 8, 640 x 480, components 3"),
            Some((640, 480))
        );
    }

    #[test]
    fn extracts_the_compact_no_space_form() {
        assert_eq!(
            extract_dimensions("frame_3.png: PNG image data, 1920x1080, 8-bit/color RGBA"),
            Some((1920, 1080))
        );
        assert_eq!(extract_dimensions("size is 1080x1920"), Some((1080, 1920)));
        // Not dimensions: hex literals, half-formed pairs.
        assert_eq!(extract_dimensions("offset 0x1A2B in file"), None);
        assert_eq!(extract_dimensions("x1080 and 1920x"), None);
    }

    #[test]
    fn file_output_without_a_pair_yields_nothing() {
        assert_eq!(extract_dimensions("frame_3.png: empty"), None);
        assert_eq!(extract_dimensions("data, x , more"), None);
        assert_eq!(extract_dimensions(""), None);
    }

    #[test]
    fn image_crate_probe_reads_a_real_png() {
        // Minimal 1x1 PNG written through the image crate itself; the probe
        // only needs the header.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_1.png");
        image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]))
            .save(&path)
            .unwrap();

        assert_eq!(ImageCrateProbe.probe(&path), Some((1, 1)));
    }

    #[test]
    fn unmeasurable_file_is_a_dimension_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_1.png");
        std::fs::write(&path, b"not an image").unwrap();

        let error = measure_dimensions_blocking(&path).unwrap_err();
        assert_eq!(error.category(), "dimension_unavailable");
    }

    #[tokio::test]
    async fn async_chain_measures_a_real_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_1.png");
        image::RgbaImage::from_pixel(2, 3, image::Rgba([0, 0, 0, 255]))
            .save(&path)
            .unwrap();

        assert_eq!(measure_dimensions(&path).await.unwrap(), (2, 3));
    }
}
