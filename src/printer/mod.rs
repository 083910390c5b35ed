//! # Printer Module
//!
//! This module provides printer-specific configurations and utilities.
//!
//! ## Modules
//!
//! - [`config`]: Printer hardware and link specifications

pub mod config;

pub use config::PrinterConfig;
