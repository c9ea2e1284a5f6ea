//! Progress indicators with CI fallback

use super::context::UiContext;
use super::theme::{PROGRESS_CHARS, SPINNER_CHARS};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
    quiet: bool,
}

impl TaskSpinner {
    /// Create a new spinner (shows nothing until started)
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
            quiet: ctx.is_quiet(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.quiet {
            return;
        }
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if !self.quiet {
            let mark = if self.interactive { "✓" } else { "[OK]" };
            println!("{} {}", style(mark).green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if !self.quiet {
            let mark = if self.interactive { "✗" } else { "[FAIL]" };
            println!("{} {}", style(mark).red(), message);
        }
    }
}

/// Progress display for package installation.
///
/// Counts `Collecting <pkg>` lines from pip and shows the latest package
/// on an indicatif bar in interactive mode, or plain lines in CI.
pub struct InstallProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl InstallProgress {
    /// `requirements` is the number of direct requirements; pip may
    /// collect more than that once dependencies resolve.
    pub fn new(ctx: &UiContext, tool: &str, requirements: usize) -> Self {
        let bar = if ctx.is_quiet() {
            None
        } else if ctx.use_fancy_output() {
            let bar = ProgressBar::new(requirements as u64);
            if let Ok(bar_style) = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} {prefix}  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}")
            {
                bar.set_style(
                    bar_style
                        .tick_chars(SPINNER_CHARS)
                        .progress_chars(PROGRESS_CHARS),
                );
            }
            bar.set_prefix(format!("{} install", tool));
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Installing {} requirement(s) with {}...", requirements, tool);
            None
        };
        Self {
            bar,
            quiet: ctx.is_quiet(),
        }
    }

    /// Process one line of installer output
    pub fn on_line(&self, line: String) {
        if self.quiet {
            return;
        }
        match parse_install_line(&line) {
            Some(InstallEvent::Collecting(name)) => {
                if let Some(ref bar) = self.bar {
                    bar.inc(1);
                    if bar.position() > bar.length().unwrap_or(0) {
                        bar.set_length(bar.position());
                    }
                    bar.set_message(name.to_string());
                } else {
                    println!("  Collecting {}", name);
                }
            }
            Some(InstallEvent::Installing(count)) => {
                if let Some(ref bar) = self.bar {
                    bar.set_message(format!("installing {} package(s)", count));
                }
            }
            Some(InstallEvent::Installed(count)) => {
                if self.bar.is_none() {
                    println!("  Installed {} package(s)", count);
                }
            }
            None => {
                if let Some(ref bar) = self.bar {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && !is_install_noise(trimmed) {
                        bar.set_message(truncate(trimmed, 60));
                    }
                }
            }
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum InstallEvent<'a> {
    /// pip started resolving a package
    Collecting(&'a str),
    /// pip is about to install this many packages
    Installing(usize),
    /// Installation finished with this many packages
    Installed(usize),
}

/// Recognize pip and npm progress lines
fn parse_install_line(line: &str) -> Option<InstallEvent<'_>> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("Collecting ") {
        let name = rest.split_whitespace().next()?;
        return Some(InstallEvent::Collecting(name));
    }
    if let Some(rest) = line.strip_prefix("Installing collected packages:") {
        let count = rest.split(',').filter(|p| !p.trim().is_empty()).count();
        return Some(InstallEvent::Installing(count));
    }
    if let Some(rest) = line.strip_prefix("Successfully installed ") {
        return Some(InstallEvent::Installed(rest.split_whitespace().count()));
    }
    // npm: "added 57 packages in 3s" / "added 1 package, and audited 2 packages in 1s"
    if let Some(rest) = line.strip_prefix("added ") {
        let count = rest.split_whitespace().next()?.parse().ok()?;
        return Some(InstallEvent::Installed(count));
    }
    None
}

/// pip lines that only restate progress already shown
fn is_install_noise(line: &str) -> bool {
    line.starts_with("Using cached")
        || line.starts_with("Requirement already satisfied")
        || line.starts_with("━")
}

fn truncate(line: &str, max: usize) -> String {
    if line.chars().count() > max {
        let head: String = line.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_non_interactive() {
        let ctx = UiContext::non_interactive();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Archiving...");
        spinner.stop("Done");
    }

    #[test]
    fn parses_pip_collecting() {
        assert_eq!(
            parse_install_line("Collecting requests==2.31.0"),
            Some(InstallEvent::Collecting("requests==2.31.0"))
        );
        assert_eq!(
            parse_install_line("Collecting charset-normalizer<4,>=2 (from requests==2.31.0)"),
            Some(InstallEvent::Collecting("charset-normalizer<4,>=2"))
        );
    }

    #[test]
    fn parses_pip_install_summary() {
        assert_eq!(
            parse_install_line("Installing collected packages: urllib3, idna, certifi, requests"),
            Some(InstallEvent::Installing(4))
        );
        assert_eq!(
            parse_install_line("Successfully installed certifi-2024.2.2 idna-3.6 requests-2.31.0"),
            Some(InstallEvent::Installed(3))
        );
    }

    #[test]
    fn parses_npm_summary() {
        assert_eq!(
            parse_install_line("added 57 packages in 3s"),
            Some(InstallEvent::Installed(57))
        );
        assert_eq!(parse_install_line("added lots"), None);
    }

    #[test]
    fn ignores_other_lines() {
        assert!(parse_install_line("  Downloading requests-2.31.0-py3-none-any.whl (62 kB)").is_none());
        assert!(parse_install_line("").is_none());
    }

    #[test]
    fn noise_filter() {
        assert!(is_install_noise("Using cached idna-3.6-py3-none-any.whl (61 kB)"));
        assert!(is_install_noise("Requirement already satisfied: six in ./site-packages"));
        assert!(!is_install_noise("Building wheel for pyyaml"));
    }

    #[test]
    fn truncates_long_lines() {
        let long = "x".repeat(80);
        assert_eq!(truncate(&long, 60).chars().count(), 60);
        assert_eq!(truncate("short", 60), "short");
    }

    #[test]
    fn install_progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = InstallProgress::new(&ctx, "pip", 1);
        progress.on_line("Collecting requests==2.31.0".to_string());
        progress.on_line("Successfully installed requests-2.31.0".to_string());
        progress.finish();
    }
}
