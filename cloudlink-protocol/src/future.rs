//! Non-blocking publish outcome.
//!
//! The engine keeps the [`PublishPromise`] and resolves it once the cloud
//! answers (or immediately when the outcome is already known). The caller
//! holds the [`PublishFuture`] and may poll it, block on it, await it, or
//! drop it. A promise dropped without resolving reads as failure.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::oneshot::{self, error::TryRecvError};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Engine-side half of a publish outcome.
#[derive(Debug)]
pub struct PublishPromise {
    tx: oneshot::Sender<bool>,
}

impl PublishPromise {
    /// Resolves the paired future. Ignored if the future was dropped.
    pub fn resolve(self, success: bool) {
        let _ = self.tx.send(success);
    }
}

enum State {
    Pending(oneshot::Receiver<bool>),
    Done(bool),
}

/// Caller-side handle for the eventual outcome of a publish.
pub struct PublishFuture {
    state: State,
}

impl PublishFuture {
    /// Creates a connected promise/future pair.
    #[must_use]
    pub fn pair() -> (PublishPromise, PublishFuture) {
        let (tx, rx) = oneshot::channel();
        (
            PublishPromise { tx },
            PublishFuture {
                state: State::Pending(rx),
            },
        )
    }

    /// Creates an already-resolved future.
    #[must_use]
    pub fn ready(success: bool) -> Self {
        Self {
            state: State::Done(success),
        }
    }

    /// Returns the outcome if it is known, without blocking.
    pub fn try_result(&mut self) -> Option<bool> {
        let outcome = match &mut self.state {
            State::Done(success) => return Some(*success),
            State::Pending(rx) => match rx.try_recv() {
                Ok(success) => success,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => false,
            },
        };
        self.state = State::Done(outcome);
        Some(outcome)
    }

    /// Returns true once the outcome is known.
    pub fn is_done(&mut self) -> bool {
        self.try_result().is_some()
    }

    /// Returns true if the publish is known to have succeeded.
    pub fn is_succeeded(&mut self) -> bool {
        self.try_result() == Some(true)
    }

    /// Blocks the current thread until the outcome is known.
    ///
    /// # Panics
    /// Panics if called from within an async runtime before the outcome has
    /// been observed (a [`PublishFuture::ready`] future, or one on which
    /// `try_result` already returned `Some`, never panics). `.await` the
    /// future there instead.
    pub fn wait(self) -> bool {
        match self.state {
            State::Done(success) => success,
            State::Pending(rx) => rx.blocking_recv().unwrap_or(false),
        }
    }

    /// Blocks for at most `timeout`. Returns `None` if still pending.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(success) = self.try_result() {
                return Some(success);
            }
            if Instant::now() >= deadline {
                return None;
            }
            std::thread::sleep(WAIT_POLL_INTERVAL);
        }
    }
}

impl Future for PublishFuture {
    type Output = bool;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        let this = self.get_mut();
        let outcome = match &mut this.state {
            State::Done(success) => return Poll::Ready(*success),
            State::Pending(rx) => match Pin::new(rx).poll(cx) {
                Poll::Ready(result) => result.unwrap_or(false),
                Poll::Pending => return Poll::Pending,
            },
        };
        this.state = State::Done(outcome);
        Poll::Ready(outcome)
    }
}

impl fmt::Debug for PublishFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            State::Pending(_) => f.write_str("PublishFuture(pending)"),
            State::Done(success) => write!(f, "PublishFuture(done: {success})"),
        }
    }
}
