//! Outbound buffer.
//!
//! Holds encoded records while the transport is not ready and hands them
//! back, in submission order, once it is.

use std::collections::VecDeque;

use bytes::Bytes;
use tracing::debug;

/// What to do with a submitted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Transport is ready and nothing is pending: write it now.
    Transmit(Bytes),
    /// Record was appended to the pending list.
    Buffered,
}

/// Ordered list of records awaiting a ready transport.
///
/// Unbounded unless a limit is set; with a limit, the oldest pending record
/// is dropped to admit a new one.
#[derive(Debug, Default)]
pub struct OutboundBuffer {
    pending: VecDeque<Bytes>,
    limit: Option<usize>,
    dropped: u64,
}

impl OutboundBuffer {
    /// Create an unbounded buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding at most `limit` pending records (minimum 1).
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit: limit.map(|l| l.max(1)),
            ..Self::default()
        }
    }

    /// Submit a record.
    ///
    /// A record only bypasses the pending list when the transport is ready
    /// and nothing older is still waiting.
    pub fn submit(&mut self, record: Bytes, ready: bool) -> Dispatch {
        if ready && self.pending.is_empty() {
            return Dispatch::Transmit(record);
        }
        self.push_back(record);
        Dispatch::Buffered
    }

    /// Take every pending record in submission order, leaving the list empty.
    pub fn take_pending(&mut self) -> Vec<Bytes> {
        self.pending.drain(..).collect()
    }

    /// Put unsent records back at the front, preserving their order.
    pub fn requeue_front(&mut self, records: Vec<Bytes>) {
        for record in records.into_iter().rev() {
            self.pending.push_front(record);
        }
        self.enforce_limit();
    }

    /// Number of pending records.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total pending bytes.
    pub fn pending_bytes(&self) -> usize {
        self.pending.iter().map(Bytes::len).sum()
    }

    /// Records discarded because of the limit.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn push_back(&mut self, record: Bytes) {
        self.pending.push_back(record);
        self.enforce_limit();
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        while self.pending.len() > limit {
            self.pending.pop_front();
            self.dropped += 1;
            debug!(limit, dropped_total = self.dropped, "outbound buffer full, dropped oldest record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[test]
    fn test_buffer_while_not_ready() {
        let mut buffer = OutboundBuffer::new();

        assert_eq!(buffer.submit(rec("a"), false), Dispatch::Buffered);
        assert_eq!(buffer.submit(rec("b"), false), Dispatch::Buffered);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.pending_bytes(), 2);

        assert_eq!(buffer.take_pending(), vec![rec("a"), rec("b")]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_transmit_when_ready() {
        let mut buffer = OutboundBuffer::new();
        assert_eq!(buffer.submit(rec("a"), true), Dispatch::Transmit(rec("a")));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_ready_does_not_overtake_pending() {
        let mut buffer = OutboundBuffer::new();
        buffer.submit(rec("old"), false);

        // Ready, but an older record still waits
        assert_eq!(buffer.submit(rec("new"), true), Dispatch::Buffered);
        assert_eq!(buffer.take_pending(), vec![rec("old"), rec("new")]);
    }

    #[test]
    fn test_requeue_front_keeps_order() {
        let mut buffer = OutboundBuffer::new();
        buffer.submit(rec("c"), false);
        buffer.requeue_front(vec![rec("a"), rec("b")]);
        assert_eq!(buffer.take_pending(), vec![rec("a"), rec("b"), rec("c")]);
    }

    #[test]
    fn test_unbounded_by_default() {
        let mut buffer = OutboundBuffer::new();
        for _ in 0..10_000 {
            buffer.submit(rec("x"), false);
        }
        assert_eq!(buffer.len(), 10_000);
        assert_eq!(buffer.dropped(), 0);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut buffer = OutboundBuffer::with_limit(Some(2));
        for s in ["a", "b", "c"] {
            buffer.submit(rec(s), false);
        }
        assert_eq!(buffer.dropped(), 1);
        assert_eq!(buffer.take_pending(), vec![rec("b"), rec("c")]);
    }
}
