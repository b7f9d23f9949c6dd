//! Scanout Hardware Abstraction Layer
//!
//! This crate defines the narrow services the display pipeline drivers are
//! allowed to touch. Board crates implement them on top of real memory-mapped
//! I/O and the SoC clock controller; the driver crate ships a simulated
//! backend for host testing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  scanout-drivers (blocks + sequencer)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  scanout-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ scanout-board │       │ drivers::sim  │
//! │    (MMIO)     │       │  (host tests) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`register::RegisterBus`] - 32-bit register load/store
//! - [`clock::ClockTree`] - video PLL, bus gates, resets, module clocks
//! - [`DelayNs`] - microsecond busy-wait (from `embedded-hal`)

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod register;

// Re-export key traits at crate root for convenience
pub use clock::{BlockId, ClockSource, ClockTree, ModuleClock};
pub use embedded_hal::delay::DelayNs;
pub use register::{RegisterBlock, RegisterBus};
