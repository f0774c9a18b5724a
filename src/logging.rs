//! Diagnostic logging.
//!
//! The UI owns the terminal, so log output never goes to stdout or
//! stderr. When a log file is configured, a `tracing-subscriber` fmt layer
//! writes there instead. Every failure along the way is ignored: logging
//! must never change what the user sees or how input is handled.

use crate::config::RuntimeConfig;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "pagewheel=debug";

/// Install the file logger if `config.log_file` is set.
///
/// Returns `true` when a subscriber was installed by this call.
pub fn init_logging(config: &RuntimeConfig) -> bool {
    let Some(path) = config.log_file.as_ref() else {
        return false;
    };

    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return false;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(path = %path.display(), "debug logging enabled");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_disabled_without_path() {
        assert!(!init_logging(&RuntimeConfig::default()));
    }

    #[test]
    fn test_unopenable_path_is_ignored() {
        let config = RuntimeConfig {
            log_file: Some(PathBuf::from("/nonexistent-dir/pagewheel/debug.log")),
            ..RuntimeConfig::default()
        };
        assert!(!init_logging(&config));
    }
}
