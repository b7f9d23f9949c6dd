//! LCD timing controller, channel 1 (HDMI path)
//!
//! Generates sync timing for the transmitter and owns the pixel clock:
//! [`TimingControllerBlock::configure`] solves the divisor search and
//! programs the video PLL.

use scanout_core::clock::{ClockDivisorSolver, ClockSolution};
use scanout_core::mode::ModeDescriptor;
use scanout_core::state::BringUpError;
use scanout_core::variant::ChipVariant;
use scanout_hal::{BlockId, ClockSource, ClockTree, ModuleClock, RegisterBlock, RegisterBus};

use super::pack_minus_one;

/// Register offsets
pub mod reg {
    /// Global enable
    pub const ENABLE: u32 = 0x000;
    /// Interrupt enables
    pub const INT0: u32 = 0x004;
    /// Interrupt status / line trigger
    pub const INT1: u32 = 0x008;
    /// Channel 0 dot clock
    pub const TCON0_DOTCLOCK: u32 = 0x044;
    /// Channel 0 pin tri-state
    pub const TCON0_IO_TRI: u32 = 0x08C;
    /// Channel 1 control
    pub const TCON1_ENABLE: u32 = 0x090;
    /// Channel 1 source size
    pub const SRC: u32 = 0x094;
    /// Channel 1 scaled size
    pub const SCALE: u32 = 0x098;
    /// Channel 1 output size
    pub const OUT: u32 = 0x09C;
    /// Horizontal total and back porch
    pub const H: u32 = 0x0A0;
    /// Vertical total and back porch
    pub const V: u32 = 0x0A4;
    /// Sync pulse widths
    pub const SYNC: u32 = 0x0A8;
    /// Channel 1 pin tri-state
    pub const TCON1_IO_TRI: u32 = 0x0F4;
}

/// Bit definitions
pub mod bits {
    pub const ENABLE_OUTPUT: u32 = 1 << 31;
    /// HDMI is fed by channel 1
    pub const ENABLE_HDMI_SRC: u32 = 0x01;

    pub const INT1_LINE_DEFAULT: u32 = 0x20;
    pub const DOTCLOCK_DISABLED: u32 = 0xF000_0000;

    /// Enable, interlace off, start delay 30 lines
    pub const TCON1_ENABLE_RUN: u32 = 0x8000_01E0;

    pub const IO_TRI_ALL: u32 = 0xFFFF_FFFF;
    /// HSYNC and VSYNC pins
    pub const IO_TRI_SYNC: u32 = 0x0300_0000;
}

/// Timing controller driver
#[derive(Debug, Clone, Copy)]
pub struct TimingControllerBlock {
    regs: RegisterBlock,
    solver: ClockDivisorSolver,
}

impl TimingControllerBlock {
    pub fn new(variant: &ChipVariant) -> Self {
        Self {
            regs: RegisterBlock::new(variant.blocks.timing_controller),
            solver: ClockDivisorSolver::new(variant.step_khz),
        }
    }

    /// Divisor search used for the pixel clock
    pub fn solver(&self) -> &ClockDivisorSolver {
        &self.solver
    }

    /// Clock the block, mask interrupts and tri-state every pin
    pub fn init<B, C>(&self, bus: &mut B, clocks: &mut C)
    where
        B: RegisterBus,
        C: ClockTree,
    {
        clocks.reset_clear(BlockId::TimingController);
        clocks.gate_enable(BlockId::TimingController);

        self.regs.write(bus, reg::ENABLE, 0);
        self.regs.write(bus, reg::INT0, 0);
        self.regs.write(bus, reg::INT1, bits::INT1_LINE_DEFAULT);
        self.regs
            .write(bus, reg::TCON0_DOTCLOCK, bits::DOTCLOCK_DISABLED);
        self.regs.write(bus, reg::TCON0_IO_TRI, bits::IO_TRI_ALL);
        self.regs.write(bus, reg::TCON1_IO_TRI, bits::IO_TRI_ALL);
    }

    /// Program channel 1 timing and the pixel clock for `mode`
    ///
    /// Returns the clock actually achieved so the transmitter can match its
    /// PHY divider to it.
    pub fn configure<B, C>(
        &self,
        bus: &mut B,
        clocks: &mut C,
        mode: &ModeDescriptor,
    ) -> Result<ClockSolution, BringUpError>
    where
        B: RegisterBus,
        C: ClockTree,
    {
        let solution = self.solver.solve(mode.pixclock_khz)?;

        self.regs.modify(
            bus,
            reg::ENABLE,
            bits::ENABLE_HDMI_SRC,
            bits::ENABLE_HDMI_SRC,
        );
        self.regs
            .write(bus, reg::TCON1_ENABLE, bits::TCON1_ENABLE_RUN);

        let size = pack_minus_one(mode.xres, mode.yres);
        self.regs.write(bus, reg::SRC, size);
        self.regs.write(bus, reg::SCALE, size);
        self.regs.write(bus, reg::OUT, size);

        self.regs.write(
            bus,
            reg::H,
            pack_minus_one(mode.htotal(), mode.hsync_len + mode.left_margin),
        );
        // Vertical total is counted in half-lines
        self.regs.write(
            bus,
            reg::V,
            (mode.vtotal().saturating_mul(2) << 16)
                | ((mode.vsync_len + mode.upper_margin).wrapping_sub(1) & 0xFFFF),
        );
        self.regs.write(
            bus,
            reg::SYNC,
            pack_minus_one(mode.hsync_len, mode.vsync_len),
        );

        let step = self.solver.step_khz();
        info!(
            "dotclock: {}kHz = {}kHz: ({} * 3MHz * {}) / {}",
            mode.pixclock_khz,
            solution.achieved_khz,
            solution.doubling_factor(),
            solution.multiplier,
            solution.divisor
        );

        clocks.set_reference_clock(solution.reference_hz(step));
        let source = if solution.doubler {
            ClockSource::VideoPllDouble
        } else {
            ClockSource::VideoPll
        };
        clocks.configure_module_clock(
            BlockId::TimingController,
            ModuleClock::new(source, solution.divisor),
        );

        Ok(solution)
    }

    /// Start generating timing and release the sync pins
    pub fn enable_output<B: RegisterBus>(&self, bus: &mut B) {
        self.regs.set_bits(bus, reg::ENABLE, bits::ENABLE_OUTPUT);
        self.regs
            .modify(bus, reg::TCON1_IO_TRI, 0, bits::IO_TRI_SYNC);
    }

    /// Stop generating timing
    pub fn disable_output<B: RegisterBus>(&self, bus: &mut B) {
        self.regs.clear_bits(bus, reg::ENABLE, bits::ENABLE_OUTPUT);
    }

    /// Stop generating timing, float the pins and gate the block off
    pub fn shutdown<B, C>(&self, bus: &mut B, clocks: &mut C)
    where
        B: RegisterBus,
        C: ClockTree,
    {
        self.disable_output(bus);
        self.regs.write(bus, reg::TCON1_IO_TRI, bits::IO_TRI_ALL);
        clocks.gate_disable(BlockId::TimingController);
    }
}
