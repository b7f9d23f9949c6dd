//! Events that trigger stage transitions

use super::machine::BringUpError;

/// Outcomes reported by the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Request events
    /// Caller asked for a mode
    BringUpRequested,
    /// Request refused before touching hardware
    Rejected(BringUpError),

    // Detection events
    /// Hot-plug detect bit set
    SinkDetected,
    /// Hot-plug detect bit clear
    SinkAbsent,

    // Configuration events
    /// All blocks staged
    Configured,
    /// A block could not be configured
    ConfigureFailed(BringUpError),

    // Enable events
    /// Compositor, controller and transmitter released in order
    Enabled,

    // Verification events
    /// FIFO status clear
    SyncStable,
    /// FIFO fault, retry budget left
    SyncFaultRetry,
    /// FIFO fault, retry budget spent
    SyncFaultExhausted,

    // Lifecycle events
    /// Caller asked to power the pipeline down
    Shutdown,
}

impl Event {
    /// Check if this event ends bring-up with an error
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::Rejected(_)
                | Event::SinkAbsent
                | Event::ConfigureFailed(_)
                | Event::SyncFaultExhausted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_events() {
        assert!(Event::SinkAbsent.is_failure());
        assert!(Event::SyncFaultExhausted.is_failure());
        assert!(Event::Rejected(BringUpError::InvalidMode).is_failure());
        assert!(!Event::SyncFaultRetry.is_failure());
        assert!(!Event::SyncStable.is_failure());
    }
}
