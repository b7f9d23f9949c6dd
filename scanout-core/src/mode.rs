//! Video mode descriptors
//!
//! A [`ModeDescriptor`] is the single caller-supplied description of the
//! timing to drive. Margins follow the fbdev convention: `left_margin` is
//! the horizontal back porch, `right_margin` the front porch, and likewise
//! `upper_margin`/`lower_margin` vertically.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bytes per pixel of the only supported scan-out format (XRGB8888)
pub const BYTES_PER_PIXEL: u32 = 4;

/// Fixed slack added to every settle delay (microseconds)
pub const SETTLE_SLACK_US: u32 = 500;

/// Largest line length the 16-bit minus-one timing fields can hold
pub const MAX_HTOTAL: u32 = 0x1_0000;

/// Largest frame height; the controller counts it in half-lines in 16 bits
pub const MAX_VTOTAL: u32 = 0x7FFF;

/// Video timing description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModeDescriptor {
    /// Active pixels per line
    pub xres: u32,
    /// Active lines per frame
    pub yres: u32,
    /// Pixel clock in kHz
    pub pixclock_khz: u32,
    /// Horizontal back porch
    pub left_margin: u32,
    /// Horizontal front porch
    pub right_margin: u32,
    /// Vertical back porch
    pub upper_margin: u32,
    /// Vertical front porch
    pub lower_margin: u32,
    /// Horizontal sync pulse width
    pub hsync_len: u32,
    /// Vertical sync pulse width
    pub vsync_len: u32,
    /// Refresh rate in Hz
    pub refresh_hz: u32,
    /// Horizontal sync is active high
    #[cfg_attr(feature = "serde", serde(default))]
    pub hsync_active_high: bool,
    /// Vertical sync is active high
    #[cfg_attr(feature = "serde", serde(default))]
    pub vsync_active_high: bool,
}

/// Reasons a mode cannot be driven at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeError {
    /// Width or height is zero
    ZeroResolution,
    /// Pixel clock is zero
    ZeroPixelClock,
    /// Refresh rate is zero
    ZeroRefresh,
    /// Line or frame total does not fit the timing registers
    TimingOutOfRange,
    /// One frame needs more than 4 GiB
    FrameTooLarge,
}

impl ModeDescriptor {
    /// VESA 1024x768@60, -hsync -vsync
    pub const VESA_1024X768_60: Self = Self {
        xres: 1024,
        yres: 768,
        pixclock_khz: 65_000,
        left_margin: 160,
        right_margin: 24,
        upper_margin: 29,
        lower_margin: 3,
        hsync_len: 136,
        vsync_len: 6,
        refresh_hz: 60,
        hsync_active_high: false,
        vsync_active_high: false,
    };

    /// CEA 1920x1080@60, +hsync +vsync
    pub const CEA_1920X1080_60: Self = Self {
        xres: 1920,
        yres: 1080,
        pixclock_khz: 148_500,
        left_margin: 88,
        right_margin: 148,
        upper_margin: 36,
        lower_margin: 4,
        hsync_len: 44,
        vsync_len: 5,
        refresh_hz: 60,
        hsync_active_high: true,
        vsync_active_high: true,
    };

    /// CEA 1280x720@50, +hsync +vsync
    pub const CEA_1280X720_50: Self = Self {
        xres: 1280,
        yres: 720,
        pixclock_khz: 74_250,
        left_margin: 440,
        right_margin: 220,
        upper_margin: 20,
        lower_margin: 5,
        hsync_len: 40,
        vsync_len: 5,
        refresh_hz: 50,
        hsync_active_high: true,
        vsync_active_high: true,
    };

    /// Check the invariants every register computation relies on
    pub fn validate(&self) -> Result<(), ModeError> {
        if self.xres == 0 || self.yres == 0 {
            return Err(ModeError::ZeroResolution);
        }
        if self.pixclock_khz == 0 {
            return Err(ModeError::ZeroPixelClock);
        }
        if self.refresh_hz == 0 {
            return Err(ModeError::ZeroRefresh);
        }
        let htotal = checked_total(self.left_margin, self.xres, self.right_margin, self.hsync_len);
        let vtotal = checked_total(self.upper_margin, self.yres, self.lower_margin, self.vsync_len);
        match (htotal, vtotal) {
            (Some(h), Some(v)) if h <= MAX_HTOTAL && v <= MAX_VTOTAL => {}
            _ => return Err(ModeError::TimingOutOfRange),
        }
        if self.checked_framebuffer_bytes().is_none() {
            return Err(ModeError::FrameTooLarge);
        }
        Ok(())
    }

    /// Total line length in pixel clocks (back porch + active + front porch + sync)
    ///
    /// Saturates for modes [`validate`](Self::validate) rejects.
    pub fn htotal(&self) -> u32 {
        checked_total(self.left_margin, self.xres, self.right_margin, self.hsync_len)
            .unwrap_or(u32::MAX)
    }

    /// Total frame height in lines
    pub fn vtotal(&self) -> u32 {
        checked_total(self.upper_margin, self.yres, self.lower_margin, self.vsync_len)
            .unwrap_or(u32::MAX)
    }

    /// Bytes per scan line in the frame buffer
    pub fn stride_bytes(&self) -> u32 {
        self.xres.saturating_mul(BYTES_PER_PIXEL)
    }

    /// Bytes needed to hold one frame, or `None` past 4 GiB
    pub fn checked_framebuffer_bytes(&self) -> Option<u32> {
        self.xres.checked_mul(BYTES_PER_PIXEL)?.checked_mul(self.yres)
    }

    /// Bytes needed to hold one frame, saturating at `u32::MAX`
    pub fn framebuffer_bytes(&self) -> u32 {
        self.checked_framebuffer_bytes().unwrap_or(u32::MAX)
    }

    /// Time to wait for one block to latch: one frame period plus slack
    ///
    /// Returns 0-refresh modes as the bare slack; [`validate`](Self::validate)
    /// rejects them before any hardware is touched.
    pub fn settle_delay_us(&self) -> u32 {
        match self.refresh_hz {
            0 => SETTLE_SLACK_US,
            hz => 1_000_000 / hz + SETTLE_SLACK_US,
        }
    }
}

fn checked_total(back: u32, active: u32, front: u32, sync: u32) -> Option<u32> {
    back.checked_add(active)?.checked_add(front)?.checked_add(sync)
}

impl Default for ModeDescriptor {
    fn default() -> Self {
        Self::CEA_1280X720_50
    }
}

impl fmt::Display for ModeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}Hz", self.xres, self.yres, self.refresh_hz)
    }
}

impl fmt::Display for ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ModeError::ZeroResolution => "active resolution must be at least 1x1",
            ModeError::ZeroPixelClock => "pixel clock must be non-zero",
            ModeError::ZeroRefresh => "refresh rate must be non-zero",
            ModeError::TimingOutOfRange => "line or frame total exceeds the timing registers",
            ModeError::FrameTooLarge => "frame does not fit a 32-bit address space",
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for mode in [
            ModeDescriptor::VESA_1024X768_60,
            ModeDescriptor::CEA_1920X1080_60,
            ModeDescriptor::CEA_1280X720_50,
        ] {
            assert_eq!(mode.validate(), Ok(()));
        }
    }

    #[test]
    fn test_totals_720p50() {
        let mode = ModeDescriptor::CEA_1280X720_50;
        assert_eq!(mode.htotal(), 1980);
        assert_eq!(mode.vtotal(), 750);
        // 1980 * 750 * 50 = 74.25 MHz
        assert_eq!(mode.htotal() * mode.vtotal() * mode.refresh_hz, 74_250_000);
    }

    #[test]
    fn test_settle_delay() {
        assert_eq!(ModeDescriptor::CEA_1280X720_50.settle_delay_us(), 20_500);
        assert_eq!(ModeDescriptor::VESA_1024X768_60.settle_delay_us(), 17_166);
    }

    #[test]
    fn test_validate_rejects_degenerate_modes() {
        let mut mode = ModeDescriptor::default();
        mode.yres = 0;
        assert_eq!(mode.validate(), Err(ModeError::ZeroResolution));

        let mut mode = ModeDescriptor::default();
        mode.pixclock_khz = 0;
        assert_eq!(mode.validate(), Err(ModeError::ZeroPixelClock));

        let mut mode = ModeDescriptor::default();
        mode.refresh_hz = 0;
        assert_eq!(mode.validate(), Err(ModeError::ZeroRefresh));
        assert_eq!(mode.settle_delay_us(), SETTLE_SLACK_US);
    }

    #[test]
    fn test_validate_bounds_totals() {
        let huge = ModeDescriptor {
            xres: 32768,
            yres: 32768,
            ..ModeDescriptor::CEA_1280X720_50
        };
        assert_eq!(huge.validate(), Err(ModeError::TimingOutOfRange));

        let wrapping = ModeDescriptor {
            right_margin: u32::MAX,
            ..ModeDescriptor::CEA_1280X720_50
        };
        assert_eq!(wrapping.validate(), Err(ModeError::TimingOutOfRange));
        assert_eq!(wrapping.htotal(), u32::MAX);

        // Largest line the registers take
        let widest = ModeDescriptor {
            xres: MAX_HTOTAL - 700,
            ..ModeDescriptor::CEA_1280X720_50
        };
        assert_eq!(widest.htotal(), MAX_HTOTAL);
        assert_eq!(widest.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_frames_past_4gib() {
        let mode = ModeDescriptor {
            xres: 60_000,
            yres: 20_000,
            ..ModeDescriptor::CEA_1280X720_50
        };
        assert_eq!(mode.validate(), Err(ModeError::FrameTooLarge));
        assert_eq!(mode.checked_framebuffer_bytes(), None);
        assert_eq!(mode.framebuffer_bytes(), u32::MAX);
    }

    #[test]
    fn test_zero_margins_are_valid() {
        let mode = ModeDescriptor {
            right_margin: 0,
            lower_margin: 0,
            ..ModeDescriptor::CEA_1280X720_50
        };
        assert_eq!(mode.validate(), Ok(()));
    }

    #[test]
    fn test_framebuffer_geometry() {
        let mode = ModeDescriptor::CEA_1280X720_50;
        assert_eq!(mode.stride_bytes(), 5120);
        assert_eq!(mode.framebuffer_bytes(), 3_686_400);
    }
}
