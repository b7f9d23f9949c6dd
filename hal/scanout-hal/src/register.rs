//! Register access abstractions
//!
//! Every hardware block is described as a base address plus a table of
//! offsets. All accesses funnel through [`RegisterBus`], so nothing depends
//! on the memory layout of a Rust struct.

/// 32-bit memory-mapped register primitive
///
/// Implementations must perform each access exactly once and in program
/// order. Reads take `&mut self` because some status registers have
/// read side effects.
pub trait RegisterBus {
    /// Load the 32-bit register at `addr`
    fn read32(&mut self, addr: u32) -> u32;

    /// Store `value` to the 32-bit register at `addr`
    fn write32(&mut self, addr: u32, value: u32);

    /// Read-modify-write: replace the bits selected by `mask` with `value`
    fn modify32(&mut self, addr: u32, value: u32, mask: u32) {
        let current = self.read32(addr);
        self.write32(addr, (current & !mask) | (value & mask));
    }

    /// Set the bits in `bits`
    fn set_bits32(&mut self, addr: u32, bits: u32) {
        self.modify32(addr, bits, bits);
    }

    /// Clear the bits in `bits`
    fn clear_bits32(&mut self, addr: u32, bits: u32) {
        self.modify32(addr, 0, bits);
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    fn read32(&mut self, addr: u32) -> u32 {
        (**self).read32(addr)
    }

    fn write32(&mut self, addr: u32, value: u32) {
        (**self).write32(addr, value)
    }
}

/// A hardware block located at a fixed physical base address
///
/// Offsets are byte offsets from the base, taken from the block's
/// register table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterBlock {
    base: u32,
}

impl RegisterBlock {
    /// Create a block at the given base address
    pub const fn new(base: u32) -> Self {
        Self { base }
    }

    /// Base address of the block
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Absolute address of the register at `offset`
    pub const fn addr(&self, offset: u32) -> u32 {
        self.base + offset
    }

    pub fn read<B: RegisterBus + ?Sized>(&self, bus: &mut B, offset: u32) -> u32 {
        bus.read32(self.addr(offset))
    }

    pub fn write<B: RegisterBus + ?Sized>(&self, bus: &mut B, offset: u32, value: u32) {
        bus.write32(self.addr(offset), value);
    }

    pub fn modify<B: RegisterBus + ?Sized>(&self, bus: &mut B, offset: u32, value: u32, mask: u32) {
        bus.modify32(self.addr(offset), value, mask);
    }

    pub fn set_bits<B: RegisterBus + ?Sized>(&self, bus: &mut B, offset: u32, bits: u32) {
        bus.set_bits32(self.addr(offset), bits);
    }

    pub fn clear_bits<B: RegisterBus + ?Sized>(&self, bus: &mut B, offset: u32, bits: u32) {
        bus.clear_bits32(self.addr(offset), bits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Four-register file at 0x1000
    struct TinyBus {
        regs: [u32; 4],
    }

    impl RegisterBus for TinyBus {
        fn read32(&mut self, addr: u32) -> u32 {
            self.regs[((addr - 0x1000) / 4) as usize]
        }

        fn write32(&mut self, addr: u32, value: u32) {
            self.regs[((addr - 0x1000) / 4) as usize] = value;
        }
    }

    #[test]
    fn test_modify_only_touches_masked_bits() {
        let mut bus = TinyBus {
            regs: [0xFFFF_0000, 0, 0, 0],
        };
        bus.modify32(0x1000, 0x0000_00AB, 0x0000_00FF);
        assert_eq!(bus.regs[0], 0xFFFF_00AB);

        bus.modify32(0x1000, 0, 0xF000_0000);
        assert_eq!(bus.regs[0], 0x0FFF_00AB);
    }

    #[test]
    fn test_set_and_clear_bits() {
        let mut bus = TinyBus { regs: [0; 4] };
        bus.set_bits32(0x1004, 0x8000_0001);
        assert_eq!(bus.regs[1], 0x8000_0001);

        bus.clear_bits32(0x1004, 0x0000_0001);
        assert_eq!(bus.regs[1], 0x8000_0000);
    }

    #[test]
    fn test_block_offsets() {
        let block = RegisterBlock::new(0x1000);
        let mut bus = TinyBus { regs: [0; 4] };

        block.write(&mut bus, 0x8, 42);
        assert_eq!(bus.regs[2], 42);
        assert_eq!(block.read(&mut bus, 0x8), 42);
        assert_eq!(block.addr(0xC), 0x100C);
    }
}
