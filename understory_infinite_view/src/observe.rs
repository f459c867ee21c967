// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed change notification with weakly held subscribers.

use alloc::rc::{Rc, Weak};
use core::fmt;

use smallvec::SmallVec;

type Handler<V> = dyn Fn(&V);

/// A channel that delivers values of type `V` to its live subscribers.
///
/// The publisher only holds subscribers weakly. Dropping or disposing a
/// [`Subscription`] removes it, and dead entries are pruned on the next publish.
pub struct Publisher<V: 'static> {
    subscribers: SmallVec<[Weak<Handler<V>>; 4]>,
}

impl<V: 'static> fmt::Debug for Publisher<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<V: 'static> Default for Publisher<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: 'static> Publisher<V> {
    /// Creates a publisher with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: SmallVec::new(),
        }
    }

    /// Registers `handler`; it stays subscribed while the returned value is alive.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe(&mut self, handler: impl Fn(&V) + 'static) -> Subscription<V> {
        let handler: Rc<Handler<V>> = Rc::new(handler);
        self.subscribers.push(Rc::downgrade(&handler));
        Subscription {
            handler: Some(handler),
        }
    }

    /// Delivers a value to every live subscriber.
    ///
    /// `value` is evaluated at most once, and not at all when nobody listens.
    pub fn publish(&mut self, value: impl FnOnce() -> V) {
        self.subscribers.retain(|s| s.strong_count() > 0);
        if self.subscribers.is_empty() {
            return;
        }
        let value = value();
        for subscriber in &self.subscribers {
            if let Some(handler) = subscriber.upgrade() {
                handler(&value);
            }
        }
    }

    /// Number of subscribers that are still alive.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|s| s.strong_count() > 0)
            .count()
    }
}

/// Keeps a [`Publisher`] handler registered.
pub struct Subscription<V: 'static> {
    handler: Option<Rc<Handler<V>>>,
}

impl<V: 'static> fmt::Debug for Subscription<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

impl<V: 'static> Subscription<V> {
    /// Unsubscribes the handler. Later publishes do not reach it.
    pub fn dispose(&mut self) {
        self.handler = None;
    }

    /// Returns `true` until [`Subscription::dispose`] is called.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.handler.is_some()
    }
}
