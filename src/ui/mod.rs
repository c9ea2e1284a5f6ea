//! UI module for consistent CLI output
//!
//! Uses `cliclack` for framed output and prompts in a terminal, with
//! plain line output in CI and nothing at all when a command prints JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use layerkit::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//! ui::intro(&ctx, "Building python-dependencies");
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Archiving...");
//! spinner.stop("Archived python-dependencies.zip");
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, remark, section, step_error, step_info, step_ok,
    step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::{InstallProgress, TaskSpinner};
pub use prompts::confirm_removal;
pub use theme::{init_theme, Accent, LayerkitTheme};
