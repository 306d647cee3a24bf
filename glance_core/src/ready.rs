// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Readiness future returned by `start()`.
//!
//! [`Ready`] resolves with the subscription handle one host tick after the
//! first signal batch has been processed, or with an error if setup failed or
//! the session was stopped first. It is the receiving half of a
//! [`futures_channel::oneshot`] channel; the session owns the sending half
//! until it hands it to the deferred task.

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures_channel::oneshot;

use crate::error::Error;

type Outcome<T> = Result<T, Error>;

/// Resolves once the session has processed its first signal batch.
#[must_use = "the readiness outcome (including setup errors) is only observable through `Ready`"]
pub struct Ready<T> {
    receiver: oneshot::Receiver<Outcome<T>>,
    outcome: Option<Outcome<T>>,
    taken: bool,
}

/// The resolving half of a [`Ready`].
///
/// Dropping an unresolved `Resolver` settles its [`Ready`] with
/// [`Error::Stopped`].
pub(crate) struct Resolver<T> {
    sender: oneshot::Sender<Outcome<T>>,
}

/// Creates a connected resolver and future.
pub(crate) fn channel<T>() -> (Resolver<T>, Ready<T>) {
    let (sender, receiver) = oneshot::channel();
    (
        Resolver { sender },
        Ready {
            receiver,
            outcome: None,
            taken: false,
        },
    )
}

fn flatten<T>(received: Result<Outcome<T>, oneshot::Canceled>) -> Outcome<T> {
    received.unwrap_or(Err(Error::Stopped))
}

impl<T> Ready<T> {
    /// Returns a future that is already settled with `err`.
    pub fn rejected(err: Error) -> Self {
        let (resolver, ready) = channel();
        resolver.resolve(Err(err));
        ready
    }

    /// Returns `true` once an outcome is available (or was taken).
    #[must_use]
    pub fn is_settled(&mut self) -> bool {
        if self.taken || self.outcome.is_some() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(Some(outcome)) => self.outcome = Some(outcome),
            Ok(None) => return false,
            Err(oneshot::Canceled) => self.outcome = Some(Err(Error::Stopped)),
        }
        true
    }
}

// The outcome is moved out, never pinned.
impl<T> Unpin for Ready<T> {}

impl<T> Future for Ready<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(outcome) = this.outcome.take() {
            this.taken = true;
            return Poll::Ready(outcome);
        }
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(received) => {
                this.taken = true;
                Poll::Ready(flatten(received))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for Ready<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ready")
            .field("outcome", &self.outcome.as_ref().map(Result::is_ok))
            .field("taken", &self.taken)
            .finish_non_exhaustive()
    }
}

impl<T> Resolver<T> {
    /// Settles the connected [`Ready`] and wakes its task.
    pub(crate) fn resolve(self, outcome: Outcome<T>) {
        // A dropped `Ready` means nobody is waiting.
        let _ = self.sender.send(outcome);
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("canceled", &self.sender.is_canceled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt as _;

    #[test]
    fn pending_until_resolved() {
        let (resolver, mut ready) = channel::<u32>();
        assert!(!ready.is_settled());
        assert_eq!((&mut ready).now_or_never(), None);

        resolver.resolve(Ok(5));
        assert!(ready.is_settled());
        assert_eq!(ready.now_or_never(), Some(Ok(5)));
    }

    #[test]
    fn dropped_resolver_reports_stopped() {
        let (resolver, mut ready) = channel::<u32>();
        drop(resolver);
        assert!(ready.is_settled());
        assert_eq!(ready.now_or_never(), Some(Err(Error::Stopped)));
    }

    #[test]
    fn rejected_is_settled_immediately() {
        let mut ready = Ready::<u32>::rejected(Error::UnsupportedEnvironment);
        assert!(ready.is_settled());
        assert_eq!(ready.now_or_never(), Some(Err(Error::UnsupportedEnvironment)));
    }

    #[test]
    fn settled_stays_settled_after_polling() {
        let (resolver, mut ready) = channel::<u32>();
        resolver.resolve(Ok(1));
        assert_eq!((&mut ready).now_or_never(), Some(Ok(1)));
        assert!(ready.is_settled());
    }
}
