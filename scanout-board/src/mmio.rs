//! Memory-mapped register access
//!
//! The one place in the workspace that dereferences raw addresses. Every
//! block driver reaches hardware through this type.

use scanout_hal::RegisterBus;

/// Volatile 32-bit access to physical addresses
///
/// Assumes an identity-mapped (or MMU-off) address space, as during board
/// bring-up.
#[derive(Debug)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Create the register bus
    ///
    /// # Safety
    ///
    /// Only one `Mmio` may exist, and every address the drivers pass to it
    /// must be a mapped, 4-byte aligned device register. The block base
    /// addresses in `ChipVariant` satisfy this on sunxi SoCs.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for Mmio {
    fn read32(&mut self, addr: u32) -> u32 {
        // SAFETY: `Mmio::new` callers guarantee `addr` is a valid device register
        unsafe { core::ptr::read_volatile(addr as usize as *const u32) }
    }

    fn write32(&mut self, addr: u32, value: u32) {
        // SAFETY: `Mmio::new` callers guarantee `addr` is a valid device register
        unsafe { core::ptr::write_volatile(addr as usize as *mut u32, value) }
    }
}
