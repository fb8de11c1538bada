//! Channel plumbing shared by the in-process actors.
//!
//! Senders capture the current tracing span alongside each event so the
//! receiving side can enter it and keep causality visible in the logs.

pub mod broadcast;

use std::future::Future;

use tokio::sync::mpsc;
use tracing::Span;

pub struct Sender<E>(mpsc::UnboundedSender<(Span, E)>);

// manual impl; derive would require E: Clone
impl<E> Clone for Sender<E> {
    fn clone(&self) -> Self { Sender(self.0.clone()) }
}

impl<E> std::fmt::Debug for Sender<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("actor::Sender")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("actor channel closed")]
pub struct SendError;

impl<E> Sender<E> {
    pub fn send(&self, event: E) -> Result<(), SendError> {
        self.0.send((Span::current(), event)).map_err(|_| SendError)
    }
}

pub struct Receiver<E>(mpsc::UnboundedReceiver<(Span, E)>);

impl<E> Receiver<E> {
    pub async fn recv(&mut self) -> Option<(Span, E)> { self.0.recv().await }
}

pub fn channel<E>() -> (Sender<E>, Receiver<E>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Sender(tx), Receiver(rx))
}

/// Fire-and-forget task on the current thread's `LocalSet`. The entity
/// graph is `Rc`-based, so everything stays on one thread.
pub fn spawn(task: impl Future<Output = ()> + 'static) {
    tokio::task::spawn_local(task);
}
