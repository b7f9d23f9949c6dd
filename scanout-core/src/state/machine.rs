//! State machine definition
//!
//! Stage order is fixed: detect the sink, configure all three blocks,
//! enable them in order, verify the transmitter locked. Only a sync fault
//! loops back to Configuring.

use core::fmt;

use super::events::Event;
use crate::clock::NoSolution;
use crate::mode::ModeError;

/// Bring-up stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Nothing requested, or shut down
    Idle,
    /// Probing hot-plug detect
    Detecting,
    /// Programming compositor, timing controller and transmitter
    Configuring,
    /// Releasing the blocks one frame apart
    Enabling,
    /// Checking the transmitter FIFO status
    Verifying,
    /// Pipeline is scanning out
    Running,
    /// Bring-up gave up
    Failed(BringUpError),
}

/// Reasons bring-up fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringUpError {
    /// Hot-plug detect saw no sink (never retried)
    NoSink,
    /// No PLL setting reaches the pixel clock (checked before touching hardware)
    ClockUnsolvable,
    /// Transmitter FIFO under/overrun persisted through every retry
    SyncFault,
    /// Mode descriptor breaks its invariants (checked before touching hardware)
    InvalidMode,
}

impl BringUpError {
    /// Diagnostic line for the console
    pub fn diagnostic(&self) -> &'static str {
        match self {
            BringUpError::NoSink => "no sink",
            BringUpError::ClockUnsolvable => "no PLL solution",
            BringUpError::SyncFault => "HDMI fifo under or overrun",
            BringUpError::InvalidMode => "invalid video mode",
        }
    }
}

impl fmt::Display for BringUpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.diagnostic())
    }
}

impl From<NoSolution> for BringUpError {
    fn from(_: NoSolution) -> Self {
        BringUpError::ClockUnsolvable
    }
}

impl From<ModeError> for BringUpError {
    fn from(_: ModeError) -> Self {
        BringUpError::InvalidMode
    }
}

impl Stage {
    /// Check if bring-up has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Idle | Stage::Running | Stage::Failed(_))
    }

    /// Failure reason, if any
    pub fn error(&self) -> Option<BringUpError> {
        match self {
            Stage::Failed(e) => Some(*e),
            _ => None,
        }
    }

    /// Process an event and return the next stage
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use Stage::*;

        match (self, event) {
            // Idle transitions
            (Idle, BringUpRequested) => Detecting,
            (Idle, Rejected(e)) => Failed(e),

            // Detecting transitions
            (Detecting, SinkDetected) => Configuring,
            (Detecting, SinkAbsent) => Failed(BringUpError::NoSink),

            // Configuring transitions
            (Configuring, Configured) => Enabling,
            (Configuring, ConfigureFailed(e)) => Failed(e),

            // Enabling transitions
            (Enabling, Enabled) => Verifying,

            // Verifying transitions
            (Verifying, SyncStable) => Running,
            (Verifying, SyncFaultRetry) => Configuring,
            (Verifying, SyncFaultExhausted) => Failed(BringUpError::SyncFault),

            // Shutdown from any settled stage
            (Running, Shutdown) | (Failed(_), Shutdown) | (Idle, Shutdown) => Idle,

            // Default: stay in current stage
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut stage = Stage::Idle;
        for event in [
            Event::BringUpRequested,
            Event::SinkDetected,
            Event::Configured,
            Event::Enabled,
            Event::SyncStable,
        ] {
            stage = stage.transition(event);
        }
        assert_eq!(stage, Stage::Running);
        assert!(stage.is_terminal());
    }

    #[test]
    fn test_no_sink_is_terminal() {
        let stage = Stage::Detecting.transition(Event::SinkAbsent);
        assert_eq!(stage, Stage::Failed(BringUpError::NoSink));
        assert_eq!(stage.error(), Some(BringUpError::NoSink));
    }

    #[test]
    fn test_retry_reenters_configuring() {
        let stage = Stage::Verifying.transition(Event::SyncFaultRetry);
        assert_eq!(stage, Stage::Configuring);

        let stage = Stage::Verifying.transition(Event::SyncFaultExhausted);
        assert_eq!(stage, Stage::Failed(BringUpError::SyncFault));
    }

    #[test]
    fn test_rejected_request() {
        let stage = Stage::Idle.transition(Event::Rejected(BringUpError::ClockUnsolvable));
        assert_eq!(stage, Stage::Failed(BringUpError::ClockUnsolvable));
    }

    #[test]
    fn test_out_of_order_events_are_ignored() {
        assert_eq!(Stage::Idle.transition(Event::SyncStable), Stage::Idle);
        assert_eq!(Stage::Configuring.transition(Event::SinkDetected), Stage::Configuring);
        assert_eq!(Stage::Enabling.transition(Event::Shutdown), Stage::Enabling);
        assert_eq!(Stage::Running.transition(Event::BringUpRequested), Stage::Running);
    }

    #[test]
    fn test_shutdown_returns_to_idle() {
        assert_eq!(Stage::Running.transition(Event::Shutdown), Stage::Idle);
        assert_eq!(
            Stage::Failed(BringUpError::SyncFault).transition(Event::Shutdown),
            Stage::Idle
        );
    }

    #[test]
    fn test_diagnostics() {
        assert_eq!(BringUpError::SyncFault.diagnostic(), "HDMI fifo under or overrun");
        assert_eq!(BringUpError::NoSink.diagnostic(), "no sink");
    }
}
