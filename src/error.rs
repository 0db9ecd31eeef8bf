//! # Error Types
//!
//! This module defines the error taxonomy for the rotation check.
//!
//! Every failure here is unrecoverable at this layer: the portal protocol
//! offers no retry semantics (a permission dialog the user dismissed must not
//! be silently re-raised), so errors propagate straight to the binary, which
//! maps all of them to exit code 2 with a diagnostic. The one exception is
//! session cleanup, whose failures are logged and swallowed so they never
//! mask the error that triggered the unwind.

use std::{error::Error as StdError, fmt, path::PathBuf};

/// All the ways the rotation check can fail.
#[derive(Debug)]
pub enum CheckError {
    /// No `Response` signal arrived on the request object before the deadline.
    Timeout {
        operation: &'static str,
        secs: u64,
    },
    /// The portal delivered a `Response` with a non-zero status code, e.g.
    /// the user cancelled the source-selection dialog or access was denied.
    RequestFailed {
        operation: &'static str,
        code: u32,
    },
    /// A success response was malformed or missing a required field.
    Protocol {
        detail: String,
    },
    /// `Start` succeeded but returned an empty stream list.
    NoStream,
    /// A session operation was attempted out of lifecycle order.
    State {
        current: &'static str,
        attempted: &'static str,
    },
    /// An external tool this check depends on is not installed.
    ToolMissing {
        tool: String,
    },
    /// The capture pipeline ran but left zero frame artifacts behind.
    NoFramesProduced {
        dir: PathBuf,
    },
    /// No dimension probe could measure the captured frame.
    DimensionUnavailable {
        path: PathBuf,
    },
    /// Transport-level D-Bus failure (bus unreachable, call rejected, ...).
    Dbus(zbus::Error),
    /// I/O failure outside the D-Bus transport.
    Io {
        operation: &'static str,
        source: std::io::Error,
    },
}

impl CheckError {
    /// Create a protocol error from any message-ish value.
    pub fn protocol(detail: impl Into<String>) -> Self {
        Self::Protocol {
            detail: detail.into(),
        }
    }

    /// Create an I/O error tagged with the operation that failed.
    pub fn io(operation: &'static str, source: std::io::Error) -> Self {
        Self::Io { operation, source }
    }

    /// Short category name, used in diagnostics and tests.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::RequestFailed { .. } => "request_failed",
            Self::Protocol { .. } => "protocol",
            Self::NoStream => "no_stream",
            Self::State { .. } => "state",
            Self::ToolMissing { .. } => "tool_missing",
            Self::NoFramesProduced { .. } => "no_frames",
            Self::DimensionUnavailable { .. } => "dimension_unavailable",
            Self::Dbus(_) => "dbus",
            Self::Io { .. } => "io",
        }
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Timeout { operation, secs } => {
                write!(f, "portal request {} timed out after {}s", operation, secs)
            }
            CheckError::RequestFailed { operation, code } => {
                // Response code 1 means the user cancelled the interaction.
                if *code == 1 {
                    write!(f, "portal request {} was cancelled by the user", operation)
                } else {
                    write!(
                        f,
                        "portal request {} failed with response code {}",
                        operation, code
                    )
                }
            }
            CheckError::Protocol { detail } => {
                write!(f, "portal protocol error: {}", detail)
            }
            CheckError::NoStream => {
                write!(f, "portal Start returned no streams")
            }
            CheckError::State { current, attempted } => {
                write!(
                    f,
                    "invalid operation {} in session state {}",
                    attempted, current
                )
            }
            CheckError::ToolMissing { tool } => {
                write!(f, "required tool '{}' not found in PATH", tool)
            }
            CheckError::NoFramesProduced { dir } => {
                write!(f, "capture produced no frames in {}", dir.display())
            }
            CheckError::DimensionUnavailable { path } => {
                write!(f, "could not determine dimensions of {}", path.display())
            }
            CheckError::Dbus(source) => {
                write!(f, "D-Bus error: {}", source)
            }
            CheckError::Io { operation, source } => {
                write!(f, "I/O error while {}: {}", operation, source)
            }
        }
    }
}

impl StdError for CheckError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Dbus(source) => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<zbus::Error> for CheckError {
    fn from(error: zbus::Error) -> Self {
        Self::Dbus(error)
    }
}

/// Result type alias used throughout the crate.
pub type CheckResult<T> = Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_names_operation_and_bound() {
        let error = CheckError::Timeout {
            operation: "CreateSession",
            secs: 30,
        };
        assert_eq!(
            error.to_string(),
            "portal request CreateSession timed out after 30s"
        );
        assert_eq!(error.category(), "timeout");
    }

    #[test]
    fn cancelled_request_is_called_out() {
        let error = CheckError::RequestFailed {
            operation: "SelectSources",
            code: 1,
        };
        assert!(error.to_string().contains("cancelled by the user"));

        let error = CheckError::RequestFailed {
            operation: "SelectSources",
            code: 2,
        };
        assert!(error.to_string().contains("response code 2"));
    }

    #[test]
    fn io_errors_keep_their_source() {
        let error = CheckError::io(
            "reading output directory",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(error.source().is_some());
        assert_eq!(error.category(), "io");
    }

    #[test]
    fn state_violation_display() {
        let error = CheckError::State {
            current: "Uninitialized",
            attempted: "Start",
        };
        assert_eq!(
            error.to_string(),
            "invalid operation Start in session state Uninitialized"
        );
    }
}
