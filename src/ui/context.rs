//! UI context: interactive terminal, CI, or machine-readable output

use std::io::IsTerminal;

/// Environment variables that mark a CI run
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "BUILDKITE",
    "JENKINS_URL",
    "CODEBUILD_BUILD_ID",
    "TF_BUILD",
];

/// Decides how human-facing output is rendered
#[derive(Debug, Clone)]
pub struct UiContext {
    /// stdin and stdout are terminals and no CI marker is set
    interactive: bool,
    /// --yes was passed
    auto_yes: bool,
    /// stdout carries machine-readable output only
    quiet: bool,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        Self {
            interactive: Self::detect_interactive(),
            auto_yes: false,
            quiet: false,
        }
    }

    /// Plain output, no prompts
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
            quiet: false,
        }
    }

    /// Approve prompts without asking
    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    /// Suppress human-facing output (used with `--format json`)
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive && !self.quiet
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Spinners, progress bars and cliclack framing
    pub fn use_fancy_output(&self) -> bool {
        self.is_interactive()
    }

    fn detect_interactive() -> bool {
        std::io::stdout().is_terminal()
            && std::io::stdin().is_terminal()
            && !CI_VARS.iter().any(|var| std::env::var_os(var).is_some())
    }
}
