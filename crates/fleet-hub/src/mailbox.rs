// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded outbound queue owned by each client connection.
//!
//! The registry and the protocol handlers push serialized frames; the
//! connection's writer drains them. Closing the mailbox is the signal for
//! both connection duties to stop.

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

/// One serialized outbound message. Cloning is a reference-count bump.
pub type Frame = Utf8Bytes;

/// Why a push was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// The consumer is too slow; the queue is at capacity.
    Full,
    /// The mailbox was closed or its writer is gone.
    Closed,
}

/// Producer side of a client mailbox.
#[derive(Debug, Clone)]
pub struct Mailbox {
    tx: mpsc::Sender<Frame>,
    closed: CancellationToken,
}

/// Consumer side of a client mailbox, held by the writer.
#[derive(Debug)]
pub struct MailboxReceiver {
    rx: mpsc::Receiver<Frame>,
    closed: CancellationToken,
}

/// Create a mailbox holding at most `capacity` pending frames.
pub fn mailbox(capacity: usize) -> (Mailbox, MailboxReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let closed = CancellationToken::new();
    (
        Mailbox {
            tx,
            closed: closed.clone(),
        },
        MailboxReceiver { rx, closed },
    )
}

impl Mailbox {
    /// Queue a frame without waiting.
    pub fn try_push(&self, frame: Frame) -> Result<(), PushError> {
        if self.closed.is_cancelled() {
            return Err(PushError::Closed);
        }
        self.tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => PushError::Full,
            TrySendError::Closed(_) => PushError::Closed,
        })
    }

    /// Close the mailbox. Idempotent; later pushes are refused.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled() || self.tx.is_closed()
    }

    /// Token cancelled when the mailbox closes.
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }
}

impl MailboxReceiver {
    /// Wait for the next frame. `None` once every producer is dropped.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Take an already-queued frame, if any.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }

    /// Token cancelled when the mailbox closes.
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_arrive_in_order() {
        let (tx, mut rx) = mailbox(4);
        tx.try_push(Frame::from("a")).unwrap();
        tx.try_push(Frame::from("b")).unwrap();
        assert_eq!(rx.recv().await.unwrap().as_str(), "a");
        assert_eq!(rx.try_recv().unwrap().as_str(), "b");
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn full_mailbox_refuses_push() {
        let (tx, _rx) = mailbox(2);
        tx.try_push(Frame::from("1")).unwrap();
        tx.try_push(Frame::from("2")).unwrap();
        assert_eq!(tx.try_push(Frame::from("3")), Err(PushError::Full));
    }

    #[test]
    fn closed_mailbox_refuses_push() {
        let (tx, rx) = mailbox(2);
        tx.close();
        tx.close();
        assert!(tx.is_closed());
        assert!(rx.is_closed());
        assert_eq!(tx.try_push(Frame::from("x")), Err(PushError::Closed));
    }

    #[test]
    fn dropped_receiver_reads_as_closed() {
        let (tx, rx) = mailbox(2);
        drop(rx);
        assert!(tx.is_closed());
        assert_eq!(tx.try_push(Frame::from("x")), Err(PushError::Closed));
    }

    #[tokio::test]
    async fn close_wakes_receiver() {
        let (tx, rx) = mailbox(1);
        let waiter = tokio::spawn(async move { rx.closed_token().cancelled().await });
        tx.close();
        waiter.await.unwrap();
    }
}
