//! Display pipeline drivers
//!
//! Register-level drivers for the three blocks of the sunxi HDMI output
//! path and the sequencer that brings them up together:
//!
//! - Compositor (display engine back-end): layer 0 scan-out
//! - Timing controller (LCD controller, TCON1 path): sync generation
//! - Transmitter (HDMI): PHY setup, hot-plug detect, FIFO status
//! - DRC clocking for SoCs that need it in pass-through
//!
//! All hardware access goes through the `scanout-hal` traits, so the
//! same code runs against MMIO on a board and against [`sim`] on the host.

#![no_std]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod blocks;
pub mod sequencer;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use sequencer::{DisplayContext, PipelineSequencer, PipelineState};
