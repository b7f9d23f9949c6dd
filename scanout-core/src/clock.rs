//! Pixel clock divisor search
//!
//! The LCD channel clock is generated as `step * n / m`, optionally doubled,
//! where `step` is the video PLL granularity (3 MHz on sunxi), `n` is the
//! PLL multiplier and `m` the channel divider. The same `m` and doubler
//! flag must be programmed into the HDMI transmitter or the two blocks drift
//! out of lock.
//!
//! # Search
//!
//! Every divider from 15 down to 1 is tried. For each one the largest
//! multiplier that does not overshoot the request is taken, once with the
//! plain step and, for odd dividers only, once with the doubled step (for
//! even dividers the doubled case repeats a plain candidate). The candidate
//! with the smallest `requested - achieved` wins; ties keep the first one
//! found, which biases towards larger dividers.

use core::fmt;

/// Video PLL granularity on all supported SoCs (kHz)
pub const DEFAULT_STEP_KHZ: u32 = 3000;

/// Smallest multiplier the video PLL accepts
pub const MULTIPLIER_MIN: u32 = 9;

/// Largest multiplier the video PLL accepts
pub const MULTIPLIER_MAX: u32 = 127;

/// Largest channel divider (4-bit field, 0 unused)
pub const DIVISOR_MAX: u32 = 15;

/// Largest composer clock divider (4-bit field holding `div - 1`)
pub const COMPOSER_DIVIDER_MAX: u32 = 16;

/// A realizable pixel clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockSolution {
    /// Video PLL multiplier (9-127)
    pub multiplier: u8,
    /// Channel divider (1-15)
    pub divisor: u8,
    /// Channel is fed from the doubled PLL output
    pub doubler: bool,
    /// Resulting pixel clock in kHz
    pub achieved_khz: u32,
}

impl ClockSolution {
    /// Video PLL frequency to program, in Hz
    pub fn reference_hz(&self, step_khz: u32) -> u32 {
        u32::from(self.multiplier) * step_khz * 1000
    }

    /// Factor applied on top of the PLL (1 or 2)
    pub fn doubling_factor(&self) -> u32 {
        if self.doubler {
            2
        } else {
            1
        }
    }
}

/// No multiplier/divider pair reaches the requested clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoSolution {
    /// The clock that was asked for (kHz)
    pub requested_khz: u32,
}

impl fmt::Display for NoSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no PLL setting for {} kHz", self.requested_khz)
    }
}

/// Exhaustive divisor search for a fixed PLL step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockDivisorSolver {
    step_khz: u32,
}

impl Default for ClockDivisorSolver {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_KHZ)
    }
}

impl ClockDivisorSolver {
    pub const fn new(step_khz: u32) -> Self {
        Self { step_khz }
    }

    pub const fn step_khz(&self) -> u32 {
        self.step_khz
    }

    /// Lowest clock any candidate can produce (kHz)
    pub const fn min_khz(&self) -> u32 {
        self.step_khz * MULTIPLIER_MIN / DIVISOR_MAX
    }

    /// Highest clock any candidate can produce (kHz)
    pub const fn max_khz(&self) -> u32 {
        self.step_khz * MULTIPLIER_MAX * 2
    }

    /// Find the best (multiplier, divisor, doubler) triple for `requested_khz`
    pub fn solve(&self, requested_khz: u32) -> Result<ClockSolution, NoSolution> {
        let no_solution = NoSolution { requested_khz };
        if self.step_khz == 0 || requested_khz > self.max_khz() {
            return Err(no_solution);
        }

        let mut best: Option<(i64, ClockSolution)> = None;

        for m in (1..=DIVISOR_MAX).rev() {
            if let Some(candidate) = self.candidate(requested_khz, m, false) {
                best = keep_better(best, requested_khz, candidate);
            }

            // Even dividers with a doubled step repeat a plain candidate
            if m & 1 == 0 {
                continue;
            }

            if let Some(candidate) = self.candidate(requested_khz, m, true) {
                best = keep_better(best, requested_khz, candidate);
            }
        }

        best.map(|(_, solution)| solution).ok_or(no_solution)
    }

    fn candidate(&self, requested_khz: u32, m: u32, doubler: bool) -> Option<ClockSolution> {
        let step = if doubler {
            self.step_khz * 2
        } else {
            self.step_khz
        };
        // m <= 15 and requested <= max_khz, so this cannot overflow
        let n = (m * requested_khz) / step;
        if !(MULTIPLIER_MIN..=MULTIPLIER_MAX).contains(&n) {
            return None;
        }

        Some(ClockSolution {
            multiplier: n as u8,
            divisor: m as u8,
            doubler,
            achieved_khz: (step * n) / m,
        })
    }
}

fn keep_better(
    best: Option<(i64, ClockSolution)>,
    requested_khz: u32,
    candidate: ClockSolution,
) -> Option<(i64, ClockSolution)> {
    let diff = i64::from(requested_khz) - i64::from(candidate.achieved_khz);
    match best {
        Some((best_diff, _)) if diff >= best_diff => best,
        _ => Some((diff, candidate)),
    }
}

/// Smallest divider bringing `parent_hz` at or under `max_hz`
///
/// Used for the compositor module clock. Returns `None` when even the
/// largest divider leaves the clock too fast.
pub fn composer_divider(parent_hz: u32, max_hz: u32) -> Option<u8> {
    (1..=COMPOSER_DIVIDER_MAX)
        .find(|div| parent_hz / div <= max_hz)
        .map(|div| div as u8)
}
