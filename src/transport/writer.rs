//! Write half of a ready connection.
//!
//! Records handed to the transport wait in a [`WriteQueue`] drained by a
//! dedicated writer task, so a peer that stops reading stalls only that task
//! and never the connection actor. A record leaves the queue once it has been
//! written in full; aborting the task leaves every unwritten record in place
//! for the actor to take back.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Notify;

/// Ordered records waiting for the writer task.
#[derive(Debug, Clone, Default)]
pub(crate) struct WriteQueue {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: Mutex<VecDeque<Bytes>>,
    notify: Notify,
}

impl WriteQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append records behind everything already queued.
    pub(crate) fn extend(&self, records: impl IntoIterator<Item = Bytes>) {
        let mut queue = self.inner.records.lock();
        let before = queue.len();
        queue.extend(records);
        if queue.len() > before {
            self.inner.notify.notify_one();
        }
    }

    /// Take every record not yet fully written, in order.
    pub(crate) fn drain(&self) -> Vec<Bytes> {
        self.inner.records.lock().drain(..).collect()
    }

    fn front(&self) -> Option<Bytes> {
        self.inner.records.lock().front().cloned()
    }

    fn pop_written(&self) {
        self.inner.records.lock().pop_front();
    }
}

/// Write queued records until a write fails.
///
/// The record being written stays at the head of the queue until
/// `write_all` completes, so a failed or aborted write leaves it queued.
pub(crate) async fn write_loop<W>(mut writer: W, queue: WriteQueue, sent: Arc<AtomicU64>) -> io::Error
where
    W: AsyncWrite + Unpin,
{
    loop {
        let Some(record) = queue.front() else {
            queue.inner.notify.notified().await;
            continue;
        };
        if let Err(err) = writer.write_all(&record).await {
            return err;
        }
        queue.pop_written();
        sent.fetch_add(1, Ordering::Relaxed);
    }
}
