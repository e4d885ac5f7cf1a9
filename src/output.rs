//! # Output Configuration
//!
//! Controls whether CLI output uses color and emoji, honoring the
//! `--color=always|never|auto` flag and the usual environment conventions:
//! `NO_COLOR` (https://no-color.org/), `CLICOLOR=0`, `CLICOLOR_FORCE=1`,
//! and `TERM=dumb`, with `console`'s TTY detection as the final word in
//! auto mode.

use std::env;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `always` forces colors on, `never` forces them off, anything else
    /// detects from the environment.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of NO_COLOR (even empty) disables colors.
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// A configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// A configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain alternative when
/// they are not.
pub fn emoji<'a>(config: &OutputConfig, emoji: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji
    } else {
        plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_flag_forces_color() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_never_flag_disables_color() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
    }

    #[test]
    fn test_emoji_respects_config() {
        assert_eq!(emoji(&OutputConfig::with_color(), "✅", "[OK]"), "✅");
        assert_eq!(emoji(&OutputConfig::without_color(), "✅", "[OK]"), "[OK]");
    }
}
