//! Bounded channels between stages.
//!
//! A pipe carries [`Domain`]s from exactly one producer stage to exactly one
//! consumer, followed by a terminal sentinel: `Finished` for a normal end,
//! or `Failed` carrying the error that stopped the producer. The sentinel is
//! the only way an error crosses from one worker to another.
//!
//! # Backpressure
//!
//! The channel is bounded, so a fast producer blocks in [`PipeSender::put`]
//! once `capacity` messages are buffered instead of growing memory.
//!
//! # Blocking and async consumers
//!
//! Stage workers run on blocking threads and use the blocking API
//! (`put`, `has_next`, `get`, `Iterator`). Async callers use
//! [`PipeReceiver::recv`] or the `Stream` impl; both observe the same
//! protocol.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use super::domain::Domain;
use super::error::QueryError;

/// A message travelling through a pipe.
#[derive(Debug)]
enum Message {
    Item(Domain),
    Finished,
    Failed(QueryError),
}

/// Create a pipe holding at most `capacity` buffered messages.
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn pipe(capacity: usize) -> (PipeSender, PipeReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        PipeSender { tx },
        PipeReceiver {
            rx,
            peeked: None,
            exhausted: false,
        },
    )
}

/// Producer half of a pipe.
#[derive(Debug)]
pub struct PipeSender {
    tx: mpsc::Sender<Message>,
}

impl PipeSender {
    /// Put a domain, blocking while the pipe is full.
    ///
    /// # Errors
    ///
    /// Returns `PipeClosed` if the consumer has gone away; the producer
    /// should stop.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn put(&self, domain: Domain) -> Result<(), QueryError> {
        self.tx
            .blocking_send(Message::Item(domain))
            .map_err(|_| QueryError::PipeClosed)
    }

    /// Close the pipe normally.
    ///
    /// Consuming the sender makes any later `put` impossible. If the
    /// consumer is already gone the sentinel is discarded.
    pub fn close(self) {
        let _ = self.tx.blocking_send(Message::Finished);
    }

    /// Close the pipe with an error, to be raised by the consumer.
    pub fn close_with(self, error: QueryError) {
        let _ = self.tx.blocking_send(Message::Failed(error));
    }

    /// True once the consumer has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of a pipe.
#[derive(Debug)]
pub struct PipeReceiver {
    rx: mpsc::Receiver<Message>,
    peeked: Option<Domain>,
    exhausted: bool,
}

impl PipeReceiver {
    /// Wait for the next domain or the end of the pipe.
    ///
    /// Returns `Ok(true)` when a domain is ready for [`get`](Self::get),
    /// `Ok(false)` once the pipe finished normally.
    ///
    /// # Errors
    ///
    /// Returns the producer's error once, after which the pipe is
    /// exhausted. Returns `Disconnected` if the producer went away without
    /// closing the pipe.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn has_next(&mut self) -> Result<bool, QueryError> {
        if self.peeked.is_some() {
            return Ok(true);
        }
        if self.exhausted {
            return Ok(false);
        }
        let message = self.rx.blocking_recv();
        self.accept(message)
    }

    /// Take the domain announced by a successful [`has_next`](Self::has_next).
    ///
    /// # Errors
    ///
    /// Returns `NoSuchElement` if no domain is ready.
    pub fn get(&mut self) -> Result<Domain, QueryError> {
        self.peeked.take().ok_or(QueryError::NoSuchElement)
    }

    /// Receive the next domain asynchronously.
    ///
    /// Returns `None` at the end of the pipe.
    pub async fn recv(&mut self) -> Option<Result<Domain, QueryError>> {
        if let Some(domain) = self.peeked.take() {
            return Some(Ok(domain));
        }
        if self.exhausted {
            return None;
        }
        let message = self.rx.recv().await;
        self.next_result(message)
    }

    /// Number of messages currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.rx.len()
    }

    /// Stop accepting messages. A producer blocked in `put` wakes with
    /// `PipeClosed`; already buffered domains are discarded.
    pub fn close(&mut self) {
        self.rx.close();
        self.peeked = None;
        self.exhausted = true;
    }

    /// Fold a raw channel message into the pipe state.
    fn accept(&mut self, message: Option<Message>) -> Result<bool, QueryError> {
        match message {
            Some(Message::Item(domain)) => {
                self.peeked = Some(domain);
                Ok(true)
            }
            Some(Message::Finished) => {
                self.exhausted = true;
                Ok(false)
            }
            Some(Message::Failed(error)) => {
                self.exhausted = true;
                Err(error)
            }
            None => {
                self.exhausted = true;
                Err(QueryError::Disconnected)
            }
        }
    }

    fn next_result(&mut self, message: Option<Message>) -> Option<Result<Domain, QueryError>> {
        match self.accept(message) {
            Ok(true) => self.peeked.take().map(Ok),
            Ok(false) => None,
            Err(error) => Some(Err(error)),
        }
    }
}

impl Iterator for PipeReceiver {
    type Item = Result<Domain, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => self.peeked.take().map(Ok),
            Ok(false) => None,
            Err(error) => Some(Err(error)),
        }
    }
}

impl Stream for PipeReceiver {
    type Item = Result<Domain, QueryError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(domain) = this.peeked.take() {
            return Poll::Ready(Some(Ok(domain)));
        }
        if this.exhausted {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(message) => Poll::Ready(this.next_result(message)),
            Poll::Pending => Poll::Pending,
        }
    }
}
