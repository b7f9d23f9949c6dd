//! Simulated hardware backend
//!
//! A register file, clock controller and delay source that record every
//! side effect into one shared, ordered [`SimLog`]. Used by the unit tests
//! and, with the `sim` feature, by board crates testing on the host.
//!
//! ```
//! use core::cell::RefCell;
//! use scanout_drivers::sim::{SimBus, SimClocks, SimDelay, SimLog};
//! use scanout_drivers::DisplayContext;
//!
//! let log = RefCell::new(SimLog::new());
//! let ctx = DisplayContext::new(
//!     SimBus::new(&log),
//!     SimClocks::new(&log),
//!     SimDelay::new(&log),
//! );
//! ```

use core::cell::RefCell;

use heapless::{Deque, FnvIndexMap, Vec};
use scanout_hal::{BlockId, ClockSource, ClockTree, DelayNs, ModuleClock, RegisterBus};

/// Maximum recorded operations
pub const LOG_CAPACITY: usize = 4096;

/// Maximum distinct registers with a stored value
pub const REGISTER_CAPACITY: usize = 1024;

/// Maximum registers with scripted reads
const SCRIPT_SLOTS: usize = 8;

/// Maximum queued values per scripted register
const SCRIPT_DEPTH: usize = 8;

/// Maximum write-one-to-clear registers
const W1C_SLOTS: usize = 8;

/// Clock controller side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockOp {
    SetReference(u32),
    GateEnable(BlockId),
    GateDisable(BlockId),
    ResetAssert(BlockId),
    ResetClear(BlockId),
    Module(BlockId, ModuleClock),
}

/// One recorded side effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Write { addr: u32, value: u32 },
    Clock(ClockOp),
    Delay { us: u32 },
}

/// Ordered record of everything the drivers did
#[derive(Debug, Default)]
pub struct SimLog {
    ops: Vec<Op, LOG_CAPACITY>,
    overflowed: bool,
}

impl SimLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, op: Op) {
        if self.ops.push(op).is_err() {
            self.overflowed = true;
        }
    }

    /// All recorded operations, oldest first
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// True if operations were dropped because the log was full
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Values written to `addr`, oldest first
    pub fn writes_to(&self, addr: u32) -> impl Iterator<Item = u32> + '_ {
        self.ops.iter().filter_map(move |op| match op {
            Op::Write { addr: a, value } if *a == addr => Some(*value),
            _ => None,
        })
    }

    /// Index of the first write into `[start, end)`
    pub fn first_write_in(&self, start: u32, end: u32) -> Option<usize> {
        self.ops
            .iter()
            .position(|op| matches!(op, Op::Write { addr, .. } if (start..end).contains(addr)))
    }

    /// Index of the first occurrence of `op`
    pub fn position(&self, op: Op) -> Option<usize> {
        self.ops.iter().position(|o| *o == op)
    }

    /// Index of the last occurrence of `op`
    pub fn last_position(&self, op: Op) -> Option<usize> {
        self.ops.iter().rposition(|o| *o == op)
    }

    /// Number of occurrences of `op`
    pub fn count(&self, op: Op) -> usize {
        self.ops.iter().filter(|o| **o == op).count()
    }

    /// Durations of every delay, in order
    pub fn delays(&self) -> impl Iterator<Item = u32> + '_ {
        self.ops.iter().filter_map(|op| match op {
            Op::Delay { us } => Some(*us),
            _ => None,
        })
    }

    /// Discard everything recorded so far
    pub fn clear(&mut self) {
        self.ops.clear();
        self.overflowed = false;
    }
}

/// Simulated register file
///
/// Unwritten registers read as zero. Scripted registers return queued
/// values first; write-one-to-clear registers clear the written bits.
pub struct SimBus<'a> {
    log: &'a RefCell<SimLog>,
    regs: FnvIndexMap<u32, u32, REGISTER_CAPACITY>,
    scripted: FnvIndexMap<u32, Deque<u32, SCRIPT_DEPTH>, SCRIPT_SLOTS>,
    w1c: Vec<u32, W1C_SLOTS>,
}

impl<'a> SimBus<'a> {
    pub fn new(log: &'a RefCell<SimLog>) -> Self {
        Self {
            log,
            regs: FnvIndexMap::new(),
            scripted: FnvIndexMap::new(),
            w1c: Vec::new(),
        }
    }

    /// Preload a register without recording a write
    pub fn preset(&mut self, addr: u32, value: u32) {
        self.store(addr, value);
    }

    /// Current stored value of a register
    pub fn peek(&self, addr: u32) -> u32 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }

    /// Queue values returned by the next reads of `addr`
    ///
    /// # Panics
    /// If more than the supported number of registers or values are queued.
    pub fn script_reads(&mut self, addr: u32, values: &[u32]) {
        if !self.scripted.contains_key(&addr) {
            self.scripted
                .insert(addr, Deque::new())
                .expect("too many scripted registers");
        }
        if let Some(queue) = self.scripted.get_mut(&addr) {
            for &value in values {
                queue.push_back(value).expect("script queue full");
            }
        }
    }

    /// Treat writes to `addr` as write-one-to-clear
    pub fn write_one_to_clear(&mut self, addr: u32) {
        self.w1c.push(addr).expect("too many W1C registers");
    }

    fn store(&mut self, addr: u32, value: u32) {
        // Out of slots means the test touched an unexpected register range
        self.regs
            .insert(addr, value)
            .expect("simulated register file full");
    }
}

impl RegisterBus for SimBus<'_> {
    fn read32(&mut self, addr: u32) -> u32 {
        if let Some(value) = self.scripted.get_mut(&addr).and_then(|q| q.pop_front()) {
            return value;
        }
        self.peek(addr)
    }

    fn write32(&mut self, addr: u32, value: u32) {
        self.log.borrow_mut().push(Op::Write { addr, value });
        let stored = if self.w1c.contains(&addr) {
            self.peek(addr) & !value
        } else {
            value
        };
        self.store(addr, stored);
    }
}

/// Simulated clock controller
pub struct SimClocks<'a> {
    log: &'a RefCell<SimLog>,
    reference_hz: u32,
    display_engine_hz: u32,
}

impl<'a> SimClocks<'a> {
    /// Display engine PLL used unless overridden (pll5p on a typical A20 board)
    pub const DEFAULT_DISPLAY_ENGINE_HZ: u32 = 360_000_000;

    pub fn new(log: &'a RefCell<SimLog>) -> Self {
        Self {
            log,
            reference_hz: 0,
            display_engine_hz: Self::DEFAULT_DISPLAY_ENGINE_HZ,
        }
    }

    /// Override the display engine PLL rate
    pub fn with_display_engine_hz(mut self, hz: u32) -> Self {
        self.display_engine_hz = hz;
        self
    }

    /// Current video PLL rate
    pub fn reference_hz(&self) -> u32 {
        self.reference_hz
    }

    fn record(&self, op: ClockOp) {
        self.log.borrow_mut().push(Op::Clock(op));
    }
}

impl ClockTree for SimClocks<'_> {
    fn set_reference_clock(&mut self, hz: u32) {
        self.reference_hz = hz;
        self.record(ClockOp::SetReference(hz));
    }

    fn rate(&self, source: ClockSource) -> u32 {
        match source {
            ClockSource::Default => 24_000_000,
            ClockSource::VideoPll => self.reference_hz,
            ClockSource::VideoPllDouble => self.reference_hz.saturating_mul(2),
            ClockSource::DisplayEngine => self.display_engine_hz,
        }
    }

    fn gate_enable(&mut self, block: BlockId) {
        self.record(ClockOp::GateEnable(block));
    }

    fn gate_disable(&mut self, block: BlockId) {
        self.record(ClockOp::GateDisable(block));
    }

    fn reset_assert(&mut self, block: BlockId) {
        self.record(ClockOp::ResetAssert(block));
    }

    fn reset_clear(&mut self, block: BlockId) {
        self.record(ClockOp::ResetClear(block));
    }

    fn configure_module_clock(&mut self, block: BlockId, clock: ModuleClock) {
        self.record(ClockOp::Module(block, clock));
    }
}

/// Simulated busy-wait that only records its duration
pub struct SimDelay<'a> {
    log: &'a RefCell<SimLog>,
    total_us: u64,
}

impl<'a> SimDelay<'a> {
    pub fn new(log: &'a RefCell<SimLog>) -> Self {
        Self { log, total_us: 0 }
    }

    /// Sum of all requested delays
    pub fn total_us(&self) -> u64 {
        self.total_us
    }

    fn record(&mut self, us: u32) {
        self.total_us += u64::from(us);
        self.log.borrow_mut().push(Op::Delay { us });
    }
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.record(ns.div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        self.record(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.record(ms.saturating_mul(1000));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritten_registers_read_zero() {
        let log = RefCell::new(SimLog::new());
        let mut bus = SimBus::new(&log);
        assert_eq!(bus.read32(0x1000), 0);
    }

    #[test]
    fn test_scripted_reads_take_priority() {
        let log = RefCell::new(SimLog::new());
        let mut bus = SimBus::new(&log);
        bus.preset(0x10, 7);
        bus.script_reads(0x10, &[1, 2]);

        assert_eq!(bus.read32(0x10), 1);
        assert_eq!(bus.read32(0x10), 2);
        assert_eq!(bus.read32(0x10), 7);
    }

    #[test]
    fn test_write_one_to_clear() {
        let log = RefCell::new(SimLog::new());
        let mut bus = SimBus::new(&log);
        bus.write_one_to_clear(0x8);
        bus.preset(0x8, 0b111);

        bus.write32(0x8, 0b101);
        assert_eq!(bus.peek(0x8), 0b010);
        assert_eq!(log.borrow().writes_to(0x8).next(), Some(0b101));
    }

    #[test]
    fn test_shared_log_keeps_order() {
        let log = RefCell::new(SimLog::new());
        let mut bus = SimBus::new(&log);
        let mut clocks = SimClocks::new(&log);
        let mut delay = SimDelay::new(&log);

        clocks.set_reference_clock(297_000_000);
        bus.write32(0x4, 1);
        delay.delay_us(20_500);

        let log = log.borrow();
        assert_eq!(
            log.ops(),
            &[
                Op::Clock(ClockOp::SetReference(297_000_000)),
                Op::Write { addr: 0x4, value: 1 },
                Op::Delay { us: 20_500 },
            ]
        );
        assert_eq!(clocks.rate(ClockSource::VideoPllDouble), 594_000_000);
        assert_eq!(delay.total_us(), 20_500);
    }
}
