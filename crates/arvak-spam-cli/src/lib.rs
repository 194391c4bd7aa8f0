//! Command implementations for the `arvak-spam` binary.

pub mod commands;
pub mod config;
