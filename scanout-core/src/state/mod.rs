//! Pipeline bring-up state machine
//!
//! Bring-up is an explicit, finite state machine. The sequencer in the
//! driver crate performs the hardware work for each stage and reports the
//! outcome as an [`Event`]; this module decides what comes next.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::{BringUpError, Stage};
