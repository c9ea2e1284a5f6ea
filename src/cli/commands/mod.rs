//! CLI command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod config;
pub mod history;
pub mod init;
pub mod status;
pub mod verify;

pub use build::execute as build;
pub use clean::execute as clean;
pub use completions::execute as completions;
pub use config::execute as config;
pub use history::execute as history;
pub use init::execute as init;
pub use status::execute as status;
pub use verify::execute as verify;
