//! Board-agnostic core logic for the display pipeline
//!
//! This crate contains everything that does not touch a register:
//!
//! - Video mode descriptors and standard presets
//! - Pixel clock divisor search
//! - Chip variant descriptors (per-SoC constants)
//! - Bring-up state machine and error taxonomy
//! - Frame-buffer placement and the produced descriptor
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod framebuffer;
pub mod mode;
pub mod state;
pub mod variant;
