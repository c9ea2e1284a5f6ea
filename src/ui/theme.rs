//! cliclack theme
//!
//! Build output uses a cyan accent. Prompts that delete build output switch
//! the accent to yellow for as long as they are on screen. The spinner and
//! bar glyphs are shared with the indicatif install bar so both read as
//! one progress style.

use cliclack::ThemeState;
use console::Style;

/// Spinner frames; the last one is shown when a spinner finishes
pub const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ";

/// Filled, head and empty bar segments
pub const PROGRESS_CHARS: &str = "━╸─";

/// Accent color of the active prompt or step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Accent {
    /// Building, verifying, reporting
    #[default]
    Build,
    /// Removing staging trees or archives
    Destructive,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LayerkitTheme {
    accent: Accent,
}

impl LayerkitTheme {
    pub fn new(accent: Accent) -> Self {
        Self { accent }
    }

    fn accent_style(&self) -> Style {
        match self.accent {
            Accent::Build => Style::new().cyan(),
            Accent::Destructive => Style::new().yellow(),
        }
    }
}

impl cliclack::Theme for LayerkitTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => self.accent_style(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => self.accent_style().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Submit => Style::new().green(),
            _ => self.bar_color(state),
        }
    }

    fn spinner_chars(&self) -> String {
        SPINNER_CHARS.to_string()
    }

    fn progress_chars(&self) -> String {
        PROGRESS_CHARS.to_string()
    }
}

/// Install the build theme globally
pub fn init_theme() {
    cliclack::set_theme(LayerkitTheme::default());
}

/// Run `f` with `accent` applied, then restore the build theme
pub(crate) fn with_accent<T>(accent: Accent, f: impl FnOnce() -> T) -> T {
    cliclack::set_theme(LayerkitTheme::new(accent));
    let result = f();
    init_theme();
    result
}
