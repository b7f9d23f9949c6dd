//! HDMI transmitter
//!
//! Handles hot-plug detection, the PHY pad and PLL words for the chip
//! generation, and the video timing the encoder emits. The timing here
//! duplicates what the timing controller generates; both must agree or
//! the transmitter FIFO runs dry.

use scanout_core::clock::ClockSolution;
use scanout_core::mode::ModeDescriptor;
use scanout_core::variant::{ChipVariant, TransmitterConstants};
use scanout_hal::{
    BlockId, ClockSource, ClockTree, DelayNs, ModuleClock, RegisterBlock, RegisterBus,
};

use super::pack_minus_one;

/// Register offsets
pub mod reg {
    /// Module control
    pub const CTRL: u32 = 0x004;
    /// Interrupt enables and FIFO status
    pub const INT_CTRL: u32 = 0x008;
    /// Hot-plug detect
    pub const HPD: u32 = 0x00C;
    /// Video encoder control
    pub const VIDEO_CTRL: u32 = 0x010;
    /// Active size
    pub const VIDEO_SIZE: u32 = 0x014;
    /// Back porches (sync included)
    pub const VIDEO_BP: u32 = 0x018;
    /// Front porches
    pub const VIDEO_FP: u32 = 0x01C;
    /// Sync pulse widths
    pub const VIDEO_SPW: u32 = 0x020;
    /// Sync polarity
    pub const VIDEO_POLARITY: u32 = 0x024;
    /// PHY pad control 0
    pub const PAD_CTRL0: u32 = 0x200;
    /// PHY pad control 1
    pub const PAD_CTRL1: u32 = 0x204;
    /// PHY PLL control
    pub const PLL_CTRL: u32 = 0x208;
    /// PHY PLL source
    pub const PLL_DBG0: u32 = 0x20C;
}

/// Bit definitions
pub mod bits {
    pub const CTRL_ENABLE: u32 = 1 << 31;

    pub const IRQ_CLEAR_ALL: u32 = 0xFFFF_FFFF;
    pub const IRQ_STATUS_FIFO_UNDERRUN: u32 = 1 << 0;
    pub const IRQ_STATUS_FIFO_OVERRUN: u32 = 1 << 1;
    pub const IRQ_STATUS_FIFO_FAULT: u32 = IRQ_STATUS_FIFO_UNDERRUN | IRQ_STATUS_FIFO_OVERRUN;

    pub const HPD_DETECTED: u32 = 1 << 0;

    pub const VIDEO_CTRL_ENABLE: u32 = 1 << 31;

    pub const POLARITY_DEFAULT: u32 = 0x03E0_0000;
    pub const POLARITY_HSYNC_HIGH: u32 = 1 << 0;
    pub const POLARITY_VSYNC_HIGH: u32 = 1 << 1;

    /// Pad control 1: halve the PHY clock
    pub const PAD_CTRL1_HALVE_CLK: u32 = 1 << 6;

    pub const PLL_CTRL_DIV_MASK: u32 = 0xF << 4;
    pub const PLL_CTRL_DIV_SHIFT: u32 = 4;
}

/// Settling time between powering the PHY and sampling hot-plug detect
pub const HPD_SETTLE_US: u32 = 1000;

/// Transmitter FIFO status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoStatus(pub u32);

impl FifoStatus {
    /// FIFO ran dry
    pub fn underrun(&self) -> bool {
        self.0 & bits::IRQ_STATUS_FIFO_UNDERRUN != 0
    }

    /// FIFO overflowed
    pub fn overrun(&self) -> bool {
        self.0 & bits::IRQ_STATUS_FIFO_OVERRUN != 0
    }

    /// Either condition: the output is not locked
    pub fn is_faulted(&self) -> bool {
        self.0 & bits::IRQ_STATUS_FIFO_FAULT != 0
    }
}

/// HDMI transmitter driver
#[derive(Debug, Clone, Copy)]
pub struct TransmitterBlock {
    regs: RegisterBlock,
    variant: ChipVariant,
}

impl TransmitterBlock {
    pub fn new(variant: &ChipVariant) -> Self {
        Self {
            regs: RegisterBlock::new(variant.blocks.transmitter),
            variant: *variant,
        }
    }

    fn phy(&self) -> &TransmitterConstants {
        &self.variant.transmitter
    }

    /// Power the transmitter just enough to sample hot-plug detect
    ///
    /// With a sink present the block stays clocked and enabled for the
    /// configuration that follows. Without one, every clock, gate and reset
    /// change made here is undone and the video PLL is powered down.
    pub fn detect_link<B, C, D>(&self, bus: &mut B, clocks: &mut C, delay: &mut D) -> bool
    where
        B: RegisterBus,
        C: ClockTree,
        D: DelayNs,
    {
        clocks.set_reference_clock(self.variant.hpd_reference_hz);
        clocks.reset_clear(BlockId::Transmitter);
        clocks.gate_enable(BlockId::Transmitter);
        clocks.configure_module_clock(
            BlockId::Transmitter,
            ModuleClock::new(ClockSource::VideoPll, 1),
        );

        self.regs.write(bus, reg::CTRL, bits::CTRL_ENABLE);
        self.regs.write(bus, reg::PAD_CTRL0, self.phy().pad_ctrl0_hpd);

        delay.delay_us(HPD_SETTLE_US);

        if self.regs.read(bus, reg::HPD) & bits::HPD_DETECTED != 0 {
            return true;
        }

        self.regs.write(bus, reg::CTRL, 0);
        clocks.gate_disable(BlockId::Transmitter);
        clocks.reset_assert(BlockId::Transmitter);
        clocks.set_reference_clock(0);
        false
    }

    /// Make sure the module is on and the encoder is off
    pub fn init<B: RegisterBus>(&self, bus: &mut B) {
        self.regs.set_bits(bus, reg::CTRL, bits::CTRL_ENABLE);
        self.regs
            .clear_bits(bus, reg::VIDEO_CTRL, bits::VIDEO_CTRL_ENABLE);
    }

    /// Program the PHY and encoder timing for `mode`
    ///
    /// `clock` must be the solution the timing controller programmed; the
    /// PHY divider and clock halving are derived from it.
    pub fn configure<B: RegisterBus>(
        &self,
        bus: &mut B,
        mode: &ModeDescriptor,
        clock: &ClockSolution,
    ) {
        self.regs.write(bus, reg::INT_CTRL, bits::IRQ_CLEAR_ALL);
        self.regs
            .write(bus, reg::VIDEO_POLARITY, bits::POLARITY_DEFAULT);

        self.regs.write(bus, reg::PAD_CTRL0, self.phy().pad_ctrl0_run);
        self.regs.write(bus, reg::PAD_CTRL1, self.phy().pad_ctrl1);
        self.regs.write(bus, reg::PLL_CTRL, self.phy().pll_ctrl);
        self.regs.write(bus, reg::PLL_DBG0, self.phy().pll_dbg0);

        let field = self.variant.transmitter_divider_field(clock.divisor);
        self.regs.modify(
            bus,
            reg::PLL_CTRL,
            field << bits::PLL_CTRL_DIV_SHIFT,
            bits::PLL_CTRL_DIV_MASK,
        );
        // Doubled pixel clock: the PHY must not halve it again
        let halve = if clock.doubler {
            0
        } else {
            bits::PAD_CTRL1_HALVE_CLK
        };
        self.regs
            .modify(bus, reg::PAD_CTRL1, halve, bits::PAD_CTRL1_HALVE_CLK);

        self.regs
            .write(bus, reg::VIDEO_SIZE, pack_minus_one(mode.yres, mode.xres));
        self.regs.write(
            bus,
            reg::VIDEO_BP,
            pack_minus_one(
                mode.vsync_len + mode.upper_margin,
                mode.hsync_len + mode.left_margin,
            ),
        );
        self.regs.write(
            bus,
            reg::VIDEO_FP,
            pack_minus_one(mode.lower_margin, mode.right_margin),
        );
        self.regs.write(
            bus,
            reg::VIDEO_SPW,
            pack_minus_one(mode.vsync_len, mode.hsync_len),
        );

        let hsync = if mode.hsync_active_high {
            bits::POLARITY_HSYNC_HIGH
        } else {
            0
        };
        self.regs
            .modify(bus, reg::VIDEO_POLARITY, hsync, bits::POLARITY_HSYNC_HIGH);
        let vsync = if mode.vsync_active_high {
            bits::POLARITY_VSYNC_HIGH
        } else {
            0
        };
        self.regs
            .modify(bus, reg::VIDEO_POLARITY, vsync, bits::POLARITY_VSYNC_HIGH);
    }

    /// Start the encoder
    pub fn enable_output<B: RegisterBus>(&self, bus: &mut B) {
        self.regs
            .set_bits(bus, reg::VIDEO_CTRL, bits::VIDEO_CTRL_ENABLE);
    }

    /// Stop the encoder
    pub fn disable_output<B: RegisterBus>(&self, bus: &mut B) {
        self.regs
            .clear_bits(bus, reg::VIDEO_CTRL, bits::VIDEO_CTRL_ENABLE);
    }

    /// Sample the FIFO status bits
    pub fn read_fault_status<B: RegisterBus>(&self, bus: &mut B) -> FifoStatus {
        FifoStatus(self.regs.read(bus, reg::INT_CTRL) & bits::IRQ_STATUS_FIFO_FAULT)
    }

    /// Stop the encoder, power the PHY down and put the block in reset
    pub fn shutdown<B, C>(&self, bus: &mut B, clocks: &mut C)
    where
        B: RegisterBus,
        C: ClockTree,
    {
        self.disable_output(bus);
        self.regs.write(bus, reg::CTRL, 0);
        clocks.gate_disable(BlockId::Transmitter);
        clocks.reset_assert(BlockId::Transmitter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ClockOp, Op, SimBus, SimClocks, SimDelay, SimLog};
    use core::cell::RefCell;
    use scanout_core::clock::ClockDivisorSolver;

    const BASE: u32 = 0x01C1_6000;

    #[test]
    fn test_detect_link_with_sink() {
        let log = RefCell::new(SimLog::new());
        let mut bus = SimBus::new(&log);
        let mut clocks = SimClocks::new(&log);
        let mut delay = SimDelay::new(&log);
        bus.preset(BASE + reg::HPD, bits::HPD_DETECTED);
        let hdmi = TransmitterBlock::new(&ChipVariant::SUN7I);

        assert!(hdmi.detect_link(&mut bus, &mut clocks, &mut delay));

        assert_eq!(bus.peek(BASE + reg::CTRL), bits::CTRL_ENABLE);
        assert_eq!(bus.peek(BASE + reg::PAD_CTRL0), 0xFE80_0000);
        assert_eq!(clocks.reference_hz(), 300_000_000);
        assert_eq!(delay.total_us(), u64::from(HPD_SETTLE_US));
    }

    #[test]
    fn test_detect_link_without_sink_undoes_everything() {
        let log = RefCell::new(SimLog::new());
        let mut bus = SimBus::new(&log);
        let mut clocks = SimClocks::new(&log);
        let mut delay = SimDelay::new(&log);
        let hdmi = TransmitterBlock::new(&ChipVariant::SUN7I);

        assert!(!hdmi.detect_link(&mut bus, &mut clocks, &mut delay));

        assert_eq!(bus.peek(BASE + reg::CTRL), 0);
        assert_eq!(clocks.reference_hz(), 0);
        let log = log.borrow();
        let gate_on = log.position(Op::Clock(ClockOp::GateEnable(BlockId::Transmitter)));
        let gate_off = log.position(Op::Clock(ClockOp::GateDisable(BlockId::Transmitter)));
        let reset = log.position(Op::Clock(ClockOp::ResetAssert(BlockId::Transmitter)));
        assert!(gate_on.is_some());
        assert!(gate_on < gate_off);
        assert!(gate_off < reset);
        assert_eq!(
            log.ops().last(),
            Some(&Op::Clock(ClockOp::SetReference(0)))
        );
    }

    #[test]
    fn test_configure_720p_sun7i() {
        let log = RefCell::new(SimLog::new());
        let mut bus = SimBus::new(&log);
        let hdmi = TransmitterBlock::new(&ChipVariant::SUN7I);
        let mode = ModeDescriptor::CEA_1280X720_50;
        let clock = ClockDivisorSolver::default().solve(mode.pixclock_khz).unwrap();

        hdmi.configure(&mut bus, &mode, &clock);

        assert_eq!(bus.peek(BASE + reg::PAD_CTRL0), 0xFE80_0000);
        // Not doubled: halving bit set on top of the generation's value
        assert_eq!(bus.peek(BASE + reg::PAD_CTRL1), 0x00D8_C830 | bits::PAD_CTRL1_HALVE_CLK);
        assert_eq!(bus.peek(BASE + reg::PLL_CTRL), (0xFA4E_F708 & !0xF0) | (4 << 4));
        assert_eq!(bus.peek(BASE + reg::PLL_DBG0), 0);
        assert_eq!(bus.peek(BASE + reg::VIDEO_SIZE), (719 << 16) | 1279);
        assert_eq!(
            bus.peek(BASE + reg::VIDEO_BP),
            ((mode.vsync_len + mode.upper_margin - 1) << 16) | (mode.hsync_len + mode.left_margin - 1)
        );
        assert_eq!(
            bus.peek(BASE + reg::VIDEO_FP),
            ((mode.lower_margin - 1) << 16) | (mode.right_margin - 1)
        );
        assert_eq!(
            bus.peek(BASE + reg::VIDEO_POLARITY),
            bits::POLARITY_DEFAULT | bits::POLARITY_HSYNC_HIGH | bits::POLARITY_VSYNC_HIGH
        );
    }

    #[test]
    fn test_configure_sun6i_zero_based_doubled() {
        let log = RefCell::new(SimLog::new());
        let mut bus = SimBus::new(&log);
        let hdmi = TransmitterBlock::new(&ChipVariant::SUN6I);
        let clock = ClockSolution {
            multiplier: 99,
            divisor: 4,
            doubler: true,
            achieved_khz: 148_500,
        };

        hdmi.configure(&mut bus, &ModeDescriptor::CEA_1920X1080_60, &clock);

        assert_eq!(bus.peek(BASE + reg::PAD_CTRL0), 0x7E80_00FF);
        assert_eq!(bus.peek(BASE + reg::PAD_CTRL1), 0x01DE_D030 & !bits::PAD_CTRL1_HALVE_CLK);
        assert_eq!(bus.peek(BASE + reg::PLL_CTRL) & 0xF0, 3 << 4);
    }

    #[test]
    fn test_fault_status() {
        let log = RefCell::new(SimLog::new());
        let mut bus = SimBus::new(&log);
        let hdmi = TransmitterBlock::new(&ChipVariant::SUN7I);

        bus.script_reads(BASE + reg::INT_CTRL, &[0x8000_0001, 0x0000_0002, 0xFFFF_FFFC]);
        let first = hdmi.read_fault_status(&mut bus);
        assert!(first.underrun() && !first.overrun() && first.is_faulted());
        let second = hdmi.read_fault_status(&mut bus);
        assert!(second.overrun() && second.is_faulted());
        assert!(!hdmi.read_fault_status(&mut bus).is_faulted());
    }

    #[test]
    fn test_enable_disable_output() {
        let log = RefCell::new(SimLog::new());
        let mut bus = SimBus::new(&log);
        let hdmi = TransmitterBlock::new(&ChipVariant::SUN7I);
        bus.preset(BASE + reg::VIDEO_CTRL, bits::VIDEO_CTRL_ENABLE);

        hdmi.init(&mut bus);
        assert_eq!(bus.peek(BASE + reg::VIDEO_CTRL), 0);
        assert_eq!(bus.peek(BASE + reg::CTRL), bits::CTRL_ENABLE);

        hdmi.enable_output(&mut bus);
        assert_eq!(bus.peek(BASE + reg::VIDEO_CTRL), bits::VIDEO_CTRL_ENABLE);
        hdmi.disable_output(&mut bus);
        assert_eq!(bus.peek(BASE + reg::VIDEO_CTRL), 0);
    }
}
