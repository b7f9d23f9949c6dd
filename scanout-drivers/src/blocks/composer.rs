//! Display engine back-end (compositor)
//!
//! Only layer 0 is used: one XRGB8888 plane covering the whole screen,
//! fetched from the frame buffer at the bottom of the reserved region.
//! Register writes are double-buffered; nothing takes effect until
//! [`CompositorBlock::load_registers`] latches them.

use scanout_core::clock::composer_divider;
use scanout_core::mode::ModeDescriptor;
use scanout_core::state::BringUpError;
use scanout_core::variant::ChipVariant;
use scanout_hal::{BlockId, ClockSource, ClockTree, ModuleClock, RegisterBlock, RegisterBus};

use super::pack_minus_one;

/// Register offsets
pub mod reg {
    /// Mode control (enable, start, layer enables)
    pub const MODE: u32 = 0x800;
    /// Output size
    pub const DISP_SIZE: u32 = 0x808;
    /// Layer 0 size
    pub const LAYER0_SIZE: u32 = 0x810;
    /// Layer 0 line stride in bits
    pub const LAYER0_STRIDE: u32 = 0x840;
    /// Layer 0 address, low 32 bits of the bit address
    pub const LAYER0_ADDR_LOW32B: u32 = 0x850;
    /// Layer 0 address, high 4 bits of the bit address
    pub const LAYER0_ADDR_HIGH4B: u32 = 0x860;
    /// Register latch control
    pub const REG_CTRL: u32 = 0x870;
    /// Layer 0 pixel format
    pub const LAYER0_ATTR1_CTRL: u32 = 0x8A0;

    /// Register window left undefined by reset
    pub const CLEAR_START: u32 = 0x800;
    pub const CLEAR_END: u32 = 0x1000;
}

/// Bit definitions
pub mod bits {
    pub const MODE_ENABLE: u32 = 1 << 0;
    pub const MODE_START: u32 = 1 << 1;
    pub const MODE_LAYER0_ENABLE: u32 = 1 << 8;

    pub const REG_CTRL_LOAD_REGS: u32 = 1 << 0;

    pub const FMT_XRGB8888: u32 = 0x09 << 8;
}

/// Compositor driver
#[derive(Debug, Clone, Copy)]
pub struct CompositorBlock {
    regs: RegisterBlock,
    max_hz: u32,
}

impl CompositorBlock {
    pub fn new(variant: &ChipVariant) -> Self {
        Self {
            regs: RegisterBlock::new(variant.blocks.compositor),
            max_hz: variant.composer_max_hz,
        }
    }

    /// Clock the block and put it in a known state
    ///
    /// Picks the smallest module clock divider keeping the compositor at or
    /// under its ceiling. Fails with nothing touched when the display engine
    /// PLL is too fast for any divider.
    pub fn init<B, C>(&self, bus: &mut B, clocks: &mut C) -> Result<(), BringUpError>
    where
        B: RegisterBus,
        C: ClockTree,
    {
        let parent_hz = clocks.rate(ClockSource::DisplayEngine);
        let divider =
            composer_divider(parent_hz, self.max_hz).ok_or(BringUpError::ClockUnsolvable)?;
        debug!("composer: parent {}Hz / {}", parent_hz, divider);

        clocks.reset_clear(BlockId::Compositor);
        clocks.gate_enable(BlockId::Compositor);
        clocks.gate_enable(BlockId::CompositorDram);
        clocks.configure_module_clock(
            BlockId::Compositor,
            ModuleClock::new(ClockSource::DisplayEngine, divider),
        );

        // Power-on contents of this window are undefined
        for offset in (reg::CLEAR_START..reg::CLEAR_END).step_by(4) {
            self.regs.write(bus, offset, 0);
        }

        self.regs.set_bits(bus, reg::MODE, bits::MODE_ENABLE);
        Ok(())
    }

    /// Stage a full-screen layer 0 for `mode`
    ///
    /// `address` is the DRAM-relative address of the first pixel.
    pub fn configure<B: RegisterBus>(&self, bus: &mut B, mode: &ModeDescriptor, address: u32) {
        let size = pack_minus_one(mode.yres, mode.xres);
        self.regs.write(bus, reg::DISP_SIZE, size);
        self.regs.write(bus, reg::LAYER0_SIZE, size);
        self.regs.write(bus, reg::LAYER0_STRIDE, mode.xres << 5);
        self.regs.write(bus, reg::LAYER0_ADDR_LOW32B, address << 3);
        self.regs.write(bus, reg::LAYER0_ADDR_HIGH4B, address >> 29);
        self.regs
            .write(bus, reg::LAYER0_ATTR1_CTRL, bits::FMT_XRGB8888);
        self.regs
            .set_bits(bus, reg::MODE, bits::MODE_LAYER0_ENABLE);
    }

    /// Stop fetching
    pub fn clear_start<B: RegisterBus>(&self, bus: &mut B) {
        self.regs.clear_bits(bus, reg::MODE, bits::MODE_START);
    }

    /// Latch the staged registers
    pub fn load_registers<B: RegisterBus>(&self, bus: &mut B) {
        self.regs
            .set_bits(bus, reg::REG_CTRL, bits::REG_CTRL_LOAD_REGS);
    }

    /// Start fetching
    pub fn set_start<B: RegisterBus>(&self, bus: &mut B) {
        self.regs.set_bits(bus, reg::MODE, bits::MODE_START);
    }

    /// Stop fetching and gate the block off
    pub fn shutdown<B, C>(&self, bus: &mut B, clocks: &mut C)
    where
        B: RegisterBus,
        C: ClockTree,
    {
        self.clear_start(bus);
        clocks.gate_disable(BlockId::CompositorDram);
        clocks.gate_disable(BlockId::Compositor);
    }
}
