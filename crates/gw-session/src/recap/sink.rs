//! Where recap records go.

use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use super::record::RecapRecord;

/// Fire-and-forget destination for recap records.
pub trait RecapSink: Send {
    /// Hand a record off. Must not block.
    fn publish(&mut self, record: RecapRecord);
}

/// Forwards records to a channel; a dropped receiver is logged and ignored.
impl RecapSink for UnboundedSender<RecapRecord> {
    fn publish(&mut self, record: RecapRecord) {
        let session = record.session_id;
        if self.send(record).is_err() {
            warn!(%session, "recap receiver dropped");
        }
    }
}

/// Discards everything. Used by clients that never coordinate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RecapSink for NullSink {
    fn publish(&mut self, _record: RecapRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_core::{EntrantId, Roster, SessionDescriptor};

    use crate::replica::SessionReplica;

    fn record() -> RecapRecord {
        let replica = SessionReplica::new(
            SessionDescriptor::new([EntrantId::from("a")]).with_dc(10),
            &Roster::new(),
        );
        RecapRecord::from_replica(&replica, &replica.verdict(), true)
    }

    #[test]
    fn channel_sink_forwards() {
        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let rec = record();
        tx.publish(rec.clone());
        assert_eq!(rx.try_recv().unwrap(), rec);
    }

    #[test]
    fn closed_channel_is_not_fatal() {
        let (mut tx, rx) = tokio::sync::mpsc::unbounded_channel::<RecapRecord>();
        drop(rx);
        tx.publish(record());
    }
}
