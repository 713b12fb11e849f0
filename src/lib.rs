//! wfm - workflow bundle manager.
//!
//! Installs, enables, disables, updates, and removes declarative workflow
//! bundles (agents, slash-commands, skill directories) inside a project,
//! reconciling them against the live tree without ever destroying content
//! it does not own.

pub mod app;
pub mod cli;
pub mod collision;
pub mod config;
pub mod error;
pub mod hash;
pub mod integrity;
pub mod manifest;
pub mod model;
pub mod ops;
pub mod pm;
pub mod sync;
pub mod utils;

pub use error::{Result, WfmError};
