//! Recap records emitted by the coordinator when a session resolves.

pub mod record;
pub mod sink;

pub use record::{RecapEntry, RecapRecord};
pub use sink::{NullSink, RecapSink};
