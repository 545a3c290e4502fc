//! Crate-level error types.

use std::fmt;

use crate::api::TransportError;

/// Errors that abort a viewer boot sequence.
///
/// Per-asset load failures are deliberately not represented here; they are
/// recorded as [`crate::loader::LoadFailure`] values on the session and
/// never stop the batch.
#[derive(Debug)]
pub enum SomavisError {
    /// Transport failure while fetching the scene envelope.
    Transport(TransportError),
    /// The scene endpoint answered with a non-JSON or malformed body.
    Envelope(String),
    /// The scene endpoint answered with a business error (`code != 0`).
    Api {
        /// Upstream error code.
        code: i64,
        /// Upstream error message.
        msg: String,
    },
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Generic I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for SomavisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "scene fetch failed: {e}"),
            Self::Envelope(msg) => {
                write!(f, "malformed scene envelope: {msg}")
            }
            Self::Api { code, msg } => {
                write!(f, "scene API error {code}: {msg}")
            }
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for SomavisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for SomavisError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<std::io::Error> for SomavisError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
