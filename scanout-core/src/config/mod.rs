//! Configuration types
//!
//! Board-agnostic display configuration. Boards load it from a TOML file
//! through the `serde` derives; everything here has a sensible default so a
//! partial file is enough.

use crate::framebuffer::FramebufferRegion;
use crate::mode::ModeDescriptor;
use crate::variant::{ChipKind, ChipVariant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default frame-buffer reservation (8 MiB, enough for 1920x1080 XRGB8888)
pub const DEFAULT_FRAMEBUFFER_SIZE: u32 = 8 << 20;

/// CPU address of DRAM on all supported SoCs
pub const DEFAULT_SDRAM_BASE: u32 = 0x4000_0000;

/// Display configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DisplayConfig {
    /// SoC generation
    pub variant: ChipKind,
    /// Mode to bring up
    pub mode: ModeDescriptor,
    /// Bytes reserved at the top of DRAM for scan-out
    pub framebuffer_size: u32,
    /// CPU address where DRAM starts
    pub sdram_base: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            variant: ChipKind::default(),
            mode: ModeDescriptor::default(),
            framebuffer_size: DEFAULT_FRAMEBUFFER_SIZE,
            sdram_base: DEFAULT_SDRAM_BASE,
        }
    }
}

impl DisplayConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Constants for the configured SoC
    pub fn chip_variant(&self) -> ChipVariant {
        ChipVariant::for_kind(self.variant)
    }

    /// Reserve the frame buffer below `dram_end`
    pub fn framebuffer_region(&self, dram_end: u32) -> Option<FramebufferRegion> {
        FramebufferRegion::at_top_of_ram(self.sdram_base, dram_end, self.framebuffer_size)
    }
}
