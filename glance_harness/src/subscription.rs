// Copyright 2026 the Glance Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory subscription.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use glance_core::ObservePolicy;
use glance_core::host::{BatchHandler, Signal, Subscription};

use crate::FakeElement;

/// Last delivered state of one attached element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Reported {
    pub(crate) intersecting: bool,
    pub(crate) above: bool,
}

pub(crate) struct SubscriptionState {
    pub(crate) policy: ObservePolicy,
    pub(crate) attached: Vec<FakeElement>,
    pub(crate) reported: BTreeMap<FakeElement, Reported>,
    pub(crate) handler: Option<BatchHandler<FakeElement>>,
    pub(crate) disposed: bool,
    pub(crate) batches: usize,
}

/// Handle to an in-memory intersection subscription.
///
/// Clones share state. Batches are only delivered when the owning
/// [`FakeHost`](crate::FakeHost) is told to observe or deliver.
#[derive(Clone)]
pub struct FakeSubscription {
    pub(crate) state: Rc<RefCell<SubscriptionState>>,
}

impl FakeSubscription {
    pub(crate) fn new(policy: ObservePolicy, handler: BatchHandler<FakeElement>) -> Self {
        Self {
            state: Rc::new(RefCell::new(SubscriptionState {
                policy,
                attached: Vec::new(),
                reported: BTreeMap::new(),
                handler: Some(handler),
                disposed: false,
                batches: 0,
            })),
        }
    }

    /// Returns the policy the subscription was created with.
    #[must_use]
    pub fn policy(&self) -> ObservePolicy {
        self.state.borrow().policy
    }

    /// Returns the attached elements in attach order.
    #[must_use]
    pub fn attached(&self) -> Vec<FakeElement> {
        self.state.borrow().attached.clone()
    }

    /// Returns `true` if `element` is attached.
    #[must_use]
    pub fn is_attached(&self, element: FakeElement) -> bool {
        self.state.borrow().attached.contains(&element)
    }

    /// Returns `true` once disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    /// Returns the number of batches delivered.
    #[must_use]
    pub fn batches(&self) -> usize {
        self.state.borrow().batches
    }

    /// Returns `true` if both handles refer to the same subscription.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Hands `signals` to the batch handler.
    ///
    /// The handler is taken out for the duration of the call, so it may
    /// attach, detach, or dispose this subscription. Empty batches and
    /// disposed subscriptions deliver nothing.
    pub(crate) fn deliver(&self, signals: Vec<Signal<FakeElement>>) {
        if signals.is_empty() {
            return;
        }
        let handler = {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.batches += 1;
            state.handler.take()
        };
        let Some(mut handler) = handler else {
            return;
        };
        handler(signals);
        let mut state = self.state.borrow_mut();
        if !state.disposed && state.handler.is_none() {
            state.handler = Some(handler);
        }
    }
}

impl Subscription for FakeSubscription {
    type Element = FakeElement;

    fn attach(&self, element: &FakeElement) {
        let mut state = self.state.borrow_mut();
        if !state.disposed && !state.attached.contains(element) {
            state.attached.push(*element);
        }
    }

    fn detach(&self, element: &FakeElement) {
        let mut state = self.state.borrow_mut();
        state.attached.retain(|e| e != element);
        state.reported.remove(element);
    }

    fn dispose(&self) {
        let mut state = self.state.borrow_mut();
        state.disposed = true;
        state.attached.clear();
        state.reported.clear();
        state.handler = None;
    }
}

impl PartialEq for FakeSubscription {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for FakeSubscription {}

impl fmt::Debug for FakeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FakeSubscription")
            .field("policy", &state.policy)
            .field("attached", &state.attached)
            .field("disposed", &state.disposed)
            .field("batches", &state.batches)
            .finish_non_exhaustive()
    }
}
