//! # Verdict Classification
//!
//! Maps a measured frame geometry against the expected geometry to one of
//! three verdicts. The interesting case is [`Verdict::SwappedMatch`]: the two
//! dimensions are exactly transposed, which is the signature of rotation
//! metadata being advertised but never applied, so the raw pre-rotation
//! buffer was passed through unchanged. That specific regression is the whole
//! reason this tool exists.

/// Outcome of comparing measured frame dimensions to expected dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Dimensions match exactly; rotation was applied correctly.
    Match,
    /// Width and height are transposed; the frame went out unrotated.
    SwappedMatch,
    /// Dimensions match neither orientation.
    Mismatch,
}

/// Classify measured `actual` dimensions against `expected` dimensions.
///
/// Equal pairs are a [`Verdict::Match`], including the square case where a
/// transposition would be indistinguishable. Transposed-but-not-equal pairs
/// are a [`Verdict::SwappedMatch`]; everything else is a
/// [`Verdict::Mismatch`].
///
/// Whether a swapped match is acceptable is deliberately not decided here;
/// see [`Verdict::exit_code`].
pub fn classify(actual: (u32, u32), expected: (u32, u32)) -> Verdict {
    if actual == expected {
        Verdict::Match
    } else if actual.0 == expected.1 && actual.1 == expected.0 {
        Verdict::SwappedMatch
    } else {
        Verdict::Mismatch
    }
}

impl Verdict {
    /// Map the verdict to the process exit code.
    ///
    /// `allow_unrotated` is a caller policy: it turns a swapped match into an
    /// overall pass without changing what was measured.
    pub fn exit_code(self, allow_unrotated: bool) -> u8 {
        match self {
            Verdict::Match => 0,
            Verdict::SwappedMatch if allow_unrotated => 0,
            Verdict::SwappedMatch | Verdict::Mismatch => 1,
        }
    }
}
