//! Configuration loading
//!
//! The display configuration is a TOML file embedded at build time
//! (`display.toml`, checked by `build.rs`) and parsed with the `toml`
//! crate into a [`DisplayConfig`](scanout_core::config::DisplayConfig).

pub mod loader;

pub use loader::{load_embedded, parse_config, ConfigError, DISPLAY_TOML};
