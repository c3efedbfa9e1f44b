//! # L1 Launcher Library
//!
//! This library exposes the launcher modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod config;
pub mod driver;
pub mod wallet;

// Re-export l1_launcher_core for convenience
pub use l1_launcher_core;
