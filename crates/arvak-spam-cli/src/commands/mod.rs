//! CLI command implementations.

pub mod calibrate;
pub mod circuits;
pub mod common;
pub mod correct;
pub mod inspect;
