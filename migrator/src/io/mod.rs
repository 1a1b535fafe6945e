//! File-backed collaborators of the engine: state files and configuration.

pub mod config;
pub mod state_store;
