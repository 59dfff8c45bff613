//! Framing-aware receive side of the connection.
//!
//! [`RecordReader`] pulls chunks from any async byte stream into an
//! accumulator and splits complete records off its front.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::core::{DecodeError, MAX_RECORD_LEN, RECV_CHUNK_SIZE};
use crate::message::{InboundMessage, codec};

/// Reads delimited records from an async byte stream.
#[derive(Debug)]
pub struct RecordReader<R> {
    /// The underlying stream.
    inner: R,
    /// Scratch buffer for a single receive.
    recv_buffer: Vec<u8>,
    /// Bytes received but not yet consumed as records.
    accumulator: BytesMut,
    /// Prefix of the accumulator known to hold no delimiter.
    scanned: usize,
    /// Longest record accepted.
    max_record_len: usize,
    /// Skipping the tail of a record that exceeded `max_record_len`.
    discarding: bool,
}

impl<R: AsyncRead + Unpin> RecordReader<R> {
    /// Create a reader requesting at most [`RECV_CHUNK_SIZE`] bytes per read.
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, RECV_CHUNK_SIZE)
    }

    /// Create a reader with a custom chunk size (minimum 1).
    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            recv_buffer: vec![0u8; chunk_size.max(1)],
            accumulator: BytesMut::new(),
            scanned: 0,
            max_record_len: MAX_RECORD_LEN,
            discarding: false,
        }
    }

    /// Set the longest record accepted (minimum 1).
    pub fn with_max_record_len(mut self, max_record_len: usize) -> Self {
        self.max_record_len = max_record_len.max(1);
        self
    }

    /// Receive one chunk into the accumulator.
    ///
    /// Returns the number of bytes read; `0` means end of stream.
    pub async fn fill(&mut self) -> io::Result<usize> {
        let len = self.inner.read(&mut self.recv_buffer).await?;
        self.accumulator.extend_from_slice(&self.recv_buffer[..len]);
        Ok(len)
    }

    /// Append bytes to the accumulator directly.
    pub fn push(&mut self, data: &[u8]) {
        self.accumulator.extend_from_slice(data);
    }

    /// Remove the first complete record (without delimiter) from the accumulator.
    ///
    /// Only bytes received since the last call are searched for the
    /// delimiter. A record longer than the limit yields
    /// [`DecodeError::TooLong`] once; its remaining bytes are dropped up to
    /// and including the next delimiter.
    pub fn next_record(&mut self) -> Option<Result<Bytes, DecodeError>> {
        loop {
            let Some((body, _)) = codec::split_record(&self.accumulator[self.scanned..]) else {
                self.scanned = self.accumulator.len();
                if self.discarding {
                    self.accumulator.clear();
                    self.scanned = 0;
                } else if self.accumulator.len() > self.max_record_len {
                    self.accumulator.clear();
                    self.scanned = 0;
                    self.discarding = true;
                    return Some(Err(self.too_long()));
                }
                return None;
            };

            let end = self.scanned + body.len();
            self.scanned = 0;
            let mut record = self.accumulator.split_to(end + 1);
            if std::mem::take(&mut self.discarding) {
                trace!(skipped = end, "end of oversized record");
                continue;
            }
            if end > self.max_record_len {
                return Some(Err(self.too_long()));
            }
            record.truncate(end);
            return Some(Ok(record.freeze()));
        }
    }

    /// Decode the next non-empty record.
    pub fn next_message(&mut self) -> Option<Result<InboundMessage, DecodeError>> {
        while let Some(record) = self.next_record() {
            let record = match record {
                Ok(record) => record,
                Err(err) => return Some(Err(err)),
            };
            match codec::decode(&record) {
                Ok(Some(message)) => return Some(Ok(message)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }

    /// Bytes held in the accumulator.
    pub fn buffered(&self) -> usize {
        self.accumulator.len()
    }

    /// Size of a single receive request.
    pub fn chunk_size(&self) -> usize {
        self.recv_buffer.len()
    }

    fn too_long(&self) -> DecodeError {
        DecodeError::TooLong {
            limit: self.max_record_len,
        }
    }
}

/// How a receive loop ended.
#[derive(Debug)]
pub enum ReceiveOutcome {
    /// Peer closed the stream.
    EndOfStream,
    /// Reading failed.
    Failed(io::Error),
    /// Nobody consumes inbound messages anymore.
    InboundClosed,
}

/// Read and decode records until the stream ends.
///
/// Every complete record already buffered is drained before the next read,
/// including after end of stream or a read error. Malformed records are
/// counted in `decode_failures`, logged and skipped.
pub async fn receive_loop<R>(
    mut reader: RecordReader<R>,
    inbound: mpsc::Sender<InboundMessage>,
    decode_failures: Arc<AtomicU64>,
) -> ReceiveOutcome
where
    R: AsyncRead + Unpin,
{
    loop {
        let read = reader.fill().await;

        while let Some(result) = reader.next_message() {
            match result {
                Ok(message) => {
                    trace!(kind = message.kind(), "inbound message");
                    if inbound.send(message).await.is_err() {
                        return ReceiveOutcome::InboundClosed;
                    }
                }
                Err(err) => {
                    decode_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(error = %err, "discarding malformed inbound record");
                }
            }
        }

        match read {
            Ok(0) => return ReceiveOutcome::EndOfStream,
            Ok(_) => {}
            Err(err) => return ReceiveOutcome::Failed(err),
        }
    }
}
