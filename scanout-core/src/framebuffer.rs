//! Frame-buffer placement and the descriptor handed to consumers

use crate::mode::{ModeDescriptor, BYTES_PER_PIXEL};

/// Pixel layouts the compositor is programmed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelFormat {
    /// 32-bit packed, 8 bits unused, then red, green, blue
    Xrgb8888,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Xrgb8888 => BYTES_PER_PIXEL,
        }
    }
}

/// What a generic frame-buffer console needs to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameBufferInfo {
    /// CPU address of the first pixel
    pub base: u32,
    pub format: PixelFormat,
    pub bytes_per_pixel: u32,
    /// Visible width in pixels
    pub width: u32,
    /// Visible height in pixels
    pub height: u32,
}

impl FrameBufferInfo {
    pub fn new(base: u32, mode: &ModeDescriptor) -> Self {
        let format = PixelFormat::Xrgb8888;
        Self {
            base,
            format,
            bytes_per_pixel: format.bytes_per_pixel(),
            width: mode.xres,
            height: mode.yres,
        }
    }

    /// Bytes per scan line (the hardware has no padding)
    pub fn stride(&self) -> u32 {
        self.width * self.bytes_per_pixel
    }
}

/// Memory carved off the top of DRAM for scan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramebufferRegion {
    /// CPU address where DRAM starts
    pub sdram_base: u32,
    /// CPU address of the reserved region
    pub base: u32,
    /// Reserved size in bytes
    pub size: u32,
}

impl FramebufferRegion {
    /// Reserve `size` bytes directly below `dram_end`
    ///
    /// Returns `None` if the region would start below `sdram_base`.
    pub fn at_top_of_ram(sdram_base: u32, dram_end: u32, size: u32) -> Option<Self> {
        let base = dram_end.checked_sub(size)?;
        if base < sdram_base {
            return None;
        }
        Some(Self {
            sdram_base,
            base,
            size,
        })
    }

    /// Address as seen by the display engine (DRAM-relative)
    pub fn bus_address(&self) -> u32 {
        self.base - self.sdram_base
    }

    /// Check that one frame of `mode` fits
    pub fn holds(&self, mode: &ModeDescriptor) -> bool {
        mode.checked_framebuffer_bytes().is_some_and(|bytes| bytes <= self.size)
    }
}
