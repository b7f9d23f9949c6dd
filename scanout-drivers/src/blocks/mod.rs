//! Hardware block drivers
//!
//! Each block is a [`RegisterBlock`](scanout_hal::RegisterBlock) plus an
//! offset table (`reg`) and bit definitions (`bits`). Nothing here keeps
//! software state beyond the variant constants; the registers are the state.

pub mod composer;
pub mod drc;
pub mod hdmi;
pub mod tcon;

pub use composer::CompositorBlock;
pub use drc::DrcBlock;
pub use hdmi::{FifoStatus, TransmitterBlock};
pub use tcon::TimingControllerBlock;

/// Pack two hardware "N minus one" fields into one register
///
/// Zero-length fields wrap to all-ones within their 16 bits, the same
/// value the hardware would see from a signed subtraction.
pub(crate) fn pack_minus_one(high: u32, low: u32) -> u32 {
    (high.wrapping_sub(1) << 16) | (low.wrapping_sub(1) & 0xFFFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_minus_one() {
        assert_eq!(pack_minus_one(720, 1280), (719 << 16) | 1279);
        assert_eq!(pack_minus_one(1, 1), 0);
        assert_eq!(pack_minus_one(1, 0), 0x0000_FFFF);
    }
}
