//! Runtime configuration.
//!
//! Defaults mirror what an interactive dashboard wants; a handful of
//! switches can be flipped from the environment without recompiling.

use crate::error::{Error, Result};
use crate::terminal::Size;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the debug log file.
pub const ENV_LOG: &str = "PAGEWHEEL_LOG";
/// Environment variable forcing the terminal size (`COLSxROWS`).
pub const ENV_SIZE: &str = "PAGEWHEEL_SIZE";
/// Environment variable selecting ASCII borders.
pub const ENV_ASCII: &str = "PAGEWHEEL_ASCII";
/// Environment variable enabling the FPS overlay.
pub const ENV_DEBUG_OVERLAY: &str = "PAGEWHEEL_DEBUG_OVERLAY";

/// Configuration for the driver, decoder and renderer.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// How long one input poll blocks before producing an idle tick.
    pub poll_timeout: Duration,
    /// How many extra short reads may complete a partial escape sequence.
    pub escape_retries: u32,
    /// Timeout of each escape-completion read.
    pub escape_retry_timeout: Duration,
    /// Minimum quiet period before a background notify becomes a redraw.
    pub debounce: Duration,
    /// Below this many columns the narrow-terminal warning kicks in.
    pub narrow_threshold: u16,
    /// How long the narrow-terminal modal stays up without a key press.
    pub narrow_dismiss_after: Duration,
    /// Maximum footer lines before the key list is cut with "more…".
    pub footer_max_lines: usize,
    /// Whether to enable mouse tracking.
    pub mouse: bool,
    /// Whether to use the alternate screen buffer.
    pub alternate_screen: bool,
    /// Debug log destination. Logging is off when `None`.
    pub log_file: Option<PathBuf>,
    /// Size override consulted right after the direct terminal query.
    pub forced_size: Option<Size>,
    /// Draw modal borders with ASCII instead of box-drawing characters.
    pub ascii_borders: bool,
    /// Show a frames-per-second figure on the title line.
    pub debug_overlay: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(25),
            escape_retries: 3,
            escape_retry_timeout: Duration::from_millis(5),
            debounce: Duration::from_millis(50),
            narrow_threshold: 80,
            narrow_dismiss_after: Duration::from_secs(5),
            footer_max_lines: 2,
            mouse: true,
            alternate_screen: true,
            log_file: None,
            forced_size: None,
            ascii_borders: false,
            debug_overlay: false,
        }
    }
}

impl RuntimeConfig {
    /// Build a configuration from defaults plus the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from defaults plus an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_LOG).filter(|p| !p.is_empty()) {
            config.log_file = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_SIZE) {
            config.forced_size = Some(parse_size(ENV_SIZE, &raw)?);
        }
        if let Some(raw) = lookup(ENV_ASCII) {
            config.ascii_borders = parse_flag(ENV_ASCII, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEBUG_OVERLAY) {
            config.debug_overlay = parse_flag(ENV_DEBUG_OVERLAY, &raw)?;
        }

        Ok(config)
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config {
            var,
            value: raw.to_string(),
            reason: "expected a boolean",
        }),
    }
}

fn parse_size(var: &'static str, raw: &str) -> Result<Size> {
    let invalid = || Error::Config {
        var,
        value: raw.to_string(),
        reason: "expected COLSxROWS with non-zero dimensions",
    };
    let (cols, rows) = raw.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let cols: u16 = cols.trim().parse().map_err(|_| invalid())?;
    let rows: u16 = rows.trim().parse().map_err(|_| invalid())?;
    if cols == 0 || rows == 0 {
        return Err(invalid());
    }
    Ok(Size::new(rows, cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.narrow_threshold, 80);
        assert_eq!(config.footer_max_lines, 2);
        assert!(config.log_file.is_none());
        assert!(config.forced_size.is_none());
        assert!(!config.ascii_borders);
    }

    #[test]
    fn test_env_overrides() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            (ENV_LOG, "/tmp/pagewheel.log"),
            (ENV_SIZE, "120x40"),
            (ENV_ASCII, "yes"),
            (ENV_DEBUG_OVERLAY, "1"),
        ]))
        .unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/pagewheel.log")));
        assert_eq!(config.forced_size, Some(Size::new(40, 120)));
        assert!(config.ascii_borders);
        assert!(config.debug_overlay);
    }

    #[test]
    fn test_bad_size_rejected() {
        for raw in ["120", "0x40", "ax b", "120x"] {
            let err = RuntimeConfig::from_lookup(lookup(&[(ENV_SIZE, raw)])).unwrap_err();
            assert!(matches!(err, Error::Config { var: ENV_SIZE, .. }), "{raw}");
        }
    }

    #[test]
    fn test_bad_flag_rejected() {
        let err = RuntimeConfig::from_lookup(lookup(&[(ENV_ASCII, "maybe")])).unwrap_err();
        assert!(matches!(err, Error::Config { var: ENV_ASCII, .. }));
    }
}
