//! In-process change broadcast.
//!
//! # Responsibility
//! - Fan a payload-free "something changed" signal out to any number of
//!   decoupled observers.
//! - Bind each subscription to an RAII token so teardown detaches it.
//!
//! # Invariants
//! - Handlers run synchronously on the publishing thread, in subscription
//!   order, after the registry lock has been released.
//! - A cancelled or dropped `Subscription` is never invoked again.

use log::trace;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Channel name used by the watchlist store.
pub const WATCHLIST_UPDATED: &str = "watchlist-updated";
/// Channel name used by the notification inbox.
pub const INBOX_UPDATED: &str = "inbox-updated";

type Handler = Arc<dyn Fn() + Send + Sync>;

struct Registry {
    name: String,
    next_id: AtomicU64,
    handlers: Mutex<BTreeMap<u64, Handler>>,
}

/// Named publish/subscribe signal without payload.
///
/// Clones share one registry. Subscribers re-derive state from its owner
/// (for example `WatchlistStore::get_all`) rather than from the event.
#[derive(Clone)]
pub struct ChangeChannel {
    registry: Arc<Registry>,
}

impl ChangeChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            registry: Arc::new(Registry {
                name: name.into(),
                next_id: AtomicU64::new(1),
                handlers: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.registry.name
    }

    /// Registers `handler` until the returned token is cancelled or dropped.
    pub fn subscribe(&self, handler: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.handlers.lock().insert(id, Arc::new(handler));
        trace!(
            "event=channel_subscribe module=broadcast status=ok channel={} subscription_id={id}",
            self.registry.name
        );
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Notifies every current subscriber and returns how many were called.
    pub fn publish(&self) -> usize {
        let handlers: Vec<Handler> = self.registry.handlers.lock().values().cloned().collect();
        trace!(
            "event=channel_publish module=broadcast status=ok channel={} subscribers={}",
            self.registry.name,
            handlers.len()
        );
        for handler in &handlers {
            handler();
        }
        handlers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.handlers.lock().len()
    }
}

impl fmt::Debug for ChangeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeChannel")
            .field("name", &self.registry.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Unsubscribe token returned by `ChangeChannel::subscribe`.
#[must_use = "dropping a Subscription detaches its handler immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Detaches the handler now.
    pub fn cancel(self) {
        drop(self);
    }

    fn detach(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.handlers.lock().remove(&self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
