//! Error types for the runtime.
//!
//! Only startup and I/O can fail. Decoding, size probing, modal stack
//! operations and the notifier are total and never produce an [`Error`].

use std::io;

/// Errors surfaced by the runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// stdin or stdout is not an interactive terminal.
    #[error("not running on an interactive terminal")]
    NotATerminal,

    /// Reading input or writing a frame failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    /// An environment variable held a value that could not be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    Config {
        /// The environment variable name.
        var: &'static str,
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Signal handlers could not be registered.
    #[error("failed to register signal handlers: {0}")]
    Signal(io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = Error::Config {
            var: "PAGEWHEEL_SIZE",
            value: "wide".to_string(),
            reason: "expected COLSxROWS",
        };
        assert_eq!(
            err.to_string(),
            "invalid value \"wide\" for PAGEWHEEL_SIZE: expected COLSxROWS"
        );
    }

    #[test]
    fn test_io_error_converts() {
        fn fails() -> Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(Error::Io(_))));
    }
}
