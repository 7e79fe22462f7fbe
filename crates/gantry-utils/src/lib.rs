//! # Gantry Utils
//!
//! Shared configuration and logging for the Gantry gateway crates.

pub mod config;
pub mod logging;
