//! Layer model and build pipeline
//!
//! A layer is a zip archive whose top-level layout matches the runtime's
//! package search path. Building one takes three steps: stage a directory
//! tree, install the manifest into it, and archive the tree.

pub mod builder;
pub mod layout;
pub mod manifest;
pub mod runtime;

pub use builder::{digest_file, BuildObserver, BuildOptions, BuildReport, BuildStep, LayerBuilder};
pub use layout::{validate_bundle_name, LayerLayout};
pub use manifest::{normalize_name, Manifest, Requirement};
pub use runtime::{Ecosystem, Runtime};
