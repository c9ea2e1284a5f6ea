//! Layerkit - serverless dependency layer builder
//!
//! Installs a requirements manifest into the directory layout a
//! serverless runtime searches for packages and zips the result into a
//! deployable layer archive.

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod install;
pub mod layer;
pub mod process;
pub mod ui;

pub use error::{LayerkitError, LayerkitResult};
