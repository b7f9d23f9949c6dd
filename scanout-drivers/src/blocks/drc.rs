//! Dynamic range controller
//!
//! Sits between the compositor and the timing controller on sun6i. The
//! pipeline leaves it in pass-through, but it still needs a running
//! clock or no pixels reach the controller. It has no registers we touch.

use scanout_hal::{BlockId, ClockSource, ClockTree, ModuleClock};

/// Module clock divider for pass-through
pub const DRC_CLOCK_DIVIDER: u8 = 4;

/// DRC clock driver
#[derive(Debug, Clone, Copy, Default)]
pub struct DrcBlock;

impl DrcBlock {
    pub const fn new() -> Self {
        Self
    }

    /// Clock the block for pass-through operation
    pub fn init<C: ClockTree>(&self, clocks: &mut C) {
        clocks.configure_module_clock(
            BlockId::Drc,
            ModuleClock::new(ClockSource::Default, DRC_CLOCK_DIVIDER),
        );
        clocks.reset_clear(BlockId::Drc);
        clocks.gate_enable(BlockId::Drc);
    }

    pub fn shutdown<C: ClockTree>(&self, clocks: &mut C) {
        clocks.gate_disable(BlockId::Drc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ClockOp, Op, SimClocks, SimLog};
    use core::cell::RefCell;

    #[test]
    fn test_init_order() {
        let log = RefCell::new(SimLog::new());
        let mut clocks = SimClocks::new(&log);

        DrcBlock::new().init(&mut clocks);

        assert_eq!(
            log.borrow().ops(),
            &[
                Op::Clock(ClockOp::Module(
                    BlockId::Drc,
                    ModuleClock::new(ClockSource::Default, 4)
                )),
                Op::Clock(ClockOp::ResetClear(BlockId::Drc)),
                Op::Clock(ClockOp::GateEnable(BlockId::Drc)),
            ]
        );
    }
}
