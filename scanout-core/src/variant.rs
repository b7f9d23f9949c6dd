//! Chip variant descriptors
//!
//! The SoC generations differ only in a handful of constants: HDMI pad and
//! PLL tuning words, whether the transmitter wants its divider zero-based,
//! and whether the DRC needs a clock in pass-through mode. A variant is
//! picked once at startup and handed to the drivers, so a single build can
//! be tested against all of them.

use crate::clock::DEFAULT_STEP_KHZ;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Supported SoC generations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChipKind {
    /// A10
    Sun4i,
    /// A10s / A13
    Sun5i,
    /// A31
    Sun6i,
    /// A20
    #[default]
    Sun7i,
}

/// Physical base addresses of the pipeline's blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockMap {
    /// Display engine back-end 0
    pub compositor: u32,
    /// LCD controller 0
    pub timing_controller: u32,
    /// HDMI transmitter
    pub transmitter: u32,
}

impl BlockMap {
    /// Addresses shared by sun4i, sun5i, sun6i and sun7i
    pub const SUNXI: Self = Self {
        compositor: 0x01E6_0000,
        timing_controller: 0x01C0_C000,
        transmitter: 0x01C1_6000,
    };
}

/// HDMI PHY tuning words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransmitterConstants {
    /// Pad control 0 while probing hot-plug detect
    pub pad_ctrl0_hpd: u32,
    /// Pad control 0 while running
    pub pad_ctrl0_run: u32,
    /// Pad control 1 (drive strength)
    pub pad_ctrl1: u32,
    /// PHY PLL control
    pub pll_ctrl: u32,
    /// PLL debug 0: selects the video PLL as the PHY PLL feed
    pub pll_dbg0: u32,
}

/// Everything the drivers need to know about one SoC generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipVariant {
    pub kind: ChipKind,
    pub blocks: BlockMap,
    pub transmitter: TransmitterConstants,
    /// Video PLL granularity (kHz)
    pub step_khz: u32,
    /// Video PLL rate used while probing hot-plug detect
    pub hpd_reference_hz: u32,
    /// Ceiling for the compositor module clock
    pub composer_max_hz: u32,
    /// Transmitter divider field holds `divisor - 1`
    pub divisor_zero_based: bool,
    /// DRC must be clocked even in pass-through
    pub needs_drc: bool,
}

/// PLL debug 0 value selecting the video PLL (PLL3)
pub const PLL_DBG0_VIDEO_PLL: u32 = 0;

impl ChipVariant {
    pub const SUN4I: Self = Self::legacy(ChipKind::Sun4i, 0x00D8_C820);
    pub const SUN5I: Self = Self::legacy(ChipKind::Sun5i, 0x00D8_C830);
    pub const SUN7I: Self = Self::legacy(ChipKind::Sun7i, 0x00D8_C830);

    pub const SUN6I: Self = Self {
        kind: ChipKind::Sun6i,
        blocks: BlockMap::SUNXI,
        transmitter: TransmitterConstants {
            pad_ctrl0_hpd: 0x7E80_000F,
            pad_ctrl0_run: 0x7E80_00FF,
            pad_ctrl1: 0x01DE_D030,
            pll_ctrl: 0xBA48_A308,
            pll_dbg0: PLL_DBG0_VIDEO_PLL,
        },
        step_khz: DEFAULT_STEP_KHZ,
        hpd_reference_hz: 300_000_000,
        composer_max_hz: 300_000_000,
        divisor_zero_based: true,
        needs_drc: true,
    };

    const fn legacy(kind: ChipKind, pad_ctrl1: u32) -> Self {
        Self {
            kind,
            blocks: BlockMap::SUNXI,
            transmitter: TransmitterConstants {
                pad_ctrl0_hpd: 0xFE80_0000,
                pad_ctrl0_run: 0xFE80_0000,
                pad_ctrl1,
                pll_ctrl: 0xFA4E_F708,
                pll_dbg0: PLL_DBG0_VIDEO_PLL,
            },
            step_khz: DEFAULT_STEP_KHZ,
            hpd_reference_hz: 300_000_000,
            composer_max_hz: 300_000_000,
            divisor_zero_based: false,
            needs_drc: false,
        }
    }

    /// Descriptor for a SoC generation
    pub const fn for_kind(kind: ChipKind) -> Self {
        match kind {
            ChipKind::Sun4i => Self::SUN4I,
            ChipKind::Sun5i => Self::SUN5I,
            ChipKind::Sun6i => Self::SUN6I,
            ChipKind::Sun7i => Self::SUN7I,
        }
    }

    /// Value for the transmitter's 4-bit divider field
    pub fn transmitter_divider_field(&self, divisor: u8) -> u32 {
        let field = if self.divisor_zero_based {
            u32::from(divisor).saturating_sub(1)
        } else {
            u32::from(divisor)
        };
        field & 0xF
    }
}

impl From<ChipKind> for ChipVariant {
    fn from(kind: ChipKind) -> Self {
        Self::for_kind(kind)
    }
}

impl Default for ChipVariant {
    fn default() -> Self {
        Self::for_kind(ChipKind::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_kind_round_trips() {
        for kind in [
            ChipKind::Sun4i,
            ChipKind::Sun5i,
            ChipKind::Sun6i,
            ChipKind::Sun7i,
        ] {
            assert_eq!(ChipVariant::for_kind(kind).kind, kind);
        }
    }

    #[test]
    fn test_only_sun6i_is_zero_based() {
        assert_eq!(ChipVariant::SUN6I.transmitter_divider_field(4), 3);
        assert_eq!(ChipVariant::SUN7I.transmitter_divider_field(4), 4);
        assert_eq!(ChipVariant::SUN4I.transmitter_divider_field(15), 15);
        assert_eq!(ChipVariant::SUN6I.transmitter_divider_field(1), 0);
    }

    #[test]
    fn test_pad_constants_differ_per_generation() {
        assert_eq!(ChipVariant::SUN4I.transmitter.pad_ctrl1, 0x00D8_C820);
        assert_eq!(ChipVariant::SUN7I.transmitter.pad_ctrl1, 0x00D8_C830);
        assert_eq!(ChipVariant::SUN6I.transmitter.pad_ctrl0_run, 0x7E80_00FF);
        assert!(ChipVariant::SUN6I.needs_drc);
        assert!(!ChipVariant::SUN5I.needs_drc);
    }
}
