//! Board glue for Scanout
//!
//! Wires the board-agnostic pipeline to a real board:
//!
//! - [`Mmio`]: volatile register access
//! - [`config`]: the embedded `display.toml`
//! - [`video_hw_init`]: frame-buffer console entry point
//!
//! The clock controller and delay source come from the board support code
//! that calls in here.

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod mmio;
pub mod video;

pub use mmio::Mmio;
pub use video::{video_hw_init, VideoOutput};
