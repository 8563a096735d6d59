//! Terminal styling for search results and status messages.

use console::Style;
use std::sync::LazyLock;

use crate::types::SourceType;

/// Global theme instance for consistent styling across the application.
pub static THEME: LazyLock<Theme> = LazyLock::new(Theme::default);

/// Scores at or above this are shown as strong matches.
pub const STRONG_MATCH: f32 = 0.5;
/// Scores below this are shown as weak matches.
pub const WEAK_MATCH: f32 = 0.2;

/// How closely a hit matched its query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrength {
    Strong,
    Moderate,
    Weak,
}

impl MatchStrength {
    pub fn of(score: f32) -> Self {
        if score >= STRONG_MATCH {
            Self::Strong
        } else if score >= WEAK_MATCH {
            Self::Moderate
        } else {
            Self::Weak
        }
    }
}

/// Styles used by the CLI.
#[derive(Debug, Clone)]
pub struct Theme {
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub header: Style,
    /// Retrieved context and other secondary text
    pub dim: Style,
    /// File paths and article URLs
    pub source: Style,
    pub static_source: Style,
    pub online_source: Style,
    pub strong_match: Style,
    pub moderate_match: Style,
    pub weak_match: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success: Style::new().green().bright(),
            error: Style::new().red().bright(),
            warning: Style::new().yellow().bright(),
            header: Style::new().cyan().bold(),
            dim: Style::new().dim(),
            source: Style::new().magenta(),
            static_source: Style::new().blue(),
            online_source: Style::new().cyan(),
            strong_match: Style::new().green().bold(),
            moderate_match: Style::new().yellow(),
            weak_match: Style::new().dim(),
        }
    }
}

impl Theme {
    pub fn success_with_icon(&self, text: &str) -> String {
        self.status("✓", &self.success, text)
    }

    pub fn error_with_icon(&self, text: &str) -> String {
        self.status("✗", &self.error, text)
    }

    pub fn warning_with_icon(&self, text: &str) -> String {
        self.status("⚠", &self.warning, text)
    }

    /// Similarity score to three decimals, colored by [`MatchStrength`].
    pub fn score(&self, score: f32) -> String {
        let style = match MatchStrength::of(score) {
            MatchStrength::Strong => &self.strong_match,
            MatchStrength::Moderate => &self.moderate_match,
            MatchStrength::Weak => &self.weak_match,
        };
        self.apply(style, format!("{score:.3}"))
    }

    /// Source type label padded to a fixed width.
    pub fn source_type(&self, source_type: SourceType) -> String {
        let style = match source_type {
            SourceType::Static => &self.static_source,
            SourceType::Online => &self.online_source,
        };
        self.apply(style, format!("{:<6}", source_type.as_str()))
    }

    /// Check if color output should be disabled.
    pub fn should_disable_colors() -> bool {
        use is_terminal::IsTerminal;
        std::env::var("NO_COLOR").is_ok() || !std::io::stdout().is_terminal()
    }

    /// Apply theme styling conditionally based on terminal support.
    pub fn apply<T: std::fmt::Display>(&self, style: &Style, text: T) -> String {
        if Self::should_disable_colors() {
            text.to_string()
        } else {
            style.apply_to(text).to_string()
        }
    }

    fn status(&self, icon: &str, style: &Style, text: &str) -> String {
        format!("{} {}", self.apply(style, icon), self.apply(style, text))
    }
}
