//! # Output Configuration
//!
//! Controls how the CLI renders resolution results: colors and status
//! markers, based on terminal capabilities and user preferences.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;

use console::Style;

/// Output configuration for controlling colors and markers.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emoji markers should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and the `--color`
    /// flag (`always`, `never` or `auto`).
    ///
    /// `always` overrides `NO_COLOR`; `auto` disables colors when `NO_COLOR`
    /// is set, `CLICOLOR=0`, `TERM=dumb`, or stdout is not a TTY (unless
    /// `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable, even empty, disables colors.
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

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// Highlights a chosen version or repository name.
    pub fn highlight(&self, text: &str) -> String {
        self.paint(Style::new().green().bold(), text)
    }

    /// De-emphasizes secondary details such as locations.
    pub fn dim(&self, text: &str) -> String {
        self.paint(Style::new().dim(), text)
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.use_color {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns `emoji_str` when colors are enabled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("NEVER");
        assert!(!config.use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "✅", "[OK]"), "✅");
        assert_eq!(emoji(&OutputConfig::without_color(), "✅", "[OK]"), "[OK]");
    }

    #[test]
    fn test_plain_output_is_unstyled() {
        let config = OutputConfig::without_color();
        assert_eq!(config.highlight("1.2.0"), "1.2.0");
        assert_eq!(config.dim("/cache/g/n"), "/cache/g/n");
    }

    #[test]
    fn test_colored_output_wraps_text() {
        let config = OutputConfig::with_color();
        let painted = config.highlight("1.2.0");
        assert!(painted.contains("1.2.0"));
        assert_ne!(painted, "1.2.0");
    }
}
