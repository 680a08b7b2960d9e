//! Two-phase observer activation.
//!
//! # Responsibility
//! - Hold placeholder state until the first render pass has completed.
//! - Perform the first real read on activation and re-read on every
//!   broadcast afterwards.
//!
//! # Invariants
//! - Construction never reads the durable medium.
//! - `current()` is `None` until `activate()` ran.
//! - Broadcasts received before activation are ignored.
//! - Dropping the guard detaches its subscription.

use crate::broadcast::{ChangeChannel, Subscription};
use log::trace;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Activation phase of a `MountGuard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountPhase {
    /// Constructed; placeholder state only.
    Inert,
    /// First real read performed; following broadcasts.
    Active,
    /// Subscription released; value frozen.
    Detached,
}

type Reader<T> = Box<dyn Fn() -> T + Send + Sync>;

struct Shared<T> {
    active: AtomicBool,
    value: Mutex<T>,
    read: Reader<T>,
}

impl<T> Shared<T> {
    fn reload(&self) {
        if self.active.load(Ordering::Acquire) {
            let next = (self.read)();
            *self.value.lock() = next;
        }
    }
}

/// Observer state that only starts reading after activation.
pub struct MountGuard<T> {
    shared: Arc<Shared<T>>,
    subscription: Option<Subscription>,
    phase: MountPhase,
}

impl<T: Clone + Send + 'static> MountGuard<T> {
    /// Phase 1: subscribes to `channel` and holds `initial`.
    pub fn new(
        channel: &ChangeChannel,
        initial: T,
        read: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        let shared = Arc::new(Shared {
            active: AtomicBool::new(false),
            value: Mutex::new(initial),
            read: Box::new(read),
        });
        let handler_state = Arc::clone(&shared);
        let subscription = channel.subscribe(move || handler_state.reload());
        Self {
            shared,
            subscription: Some(subscription),
            phase: MountPhase::Inert,
        }
    }

    /// Constructs and activates at once, for hosts without a first-render
    /// matching concern.
    pub fn mounted(
        channel: &ChangeChannel,
        initial: T,
        read: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        let mut guard = Self::new(channel, initial, read);
        guard.activate();
        guard
    }

    /// Phase 2: performs the first real read.
    ///
    /// Returns `false` when the guard is already active or detached.
    pub fn activate(&mut self) -> bool {
        if self.phase != MountPhase::Inert || self.subscription.is_none() {
            return false;
        }
        self.shared.active.store(true, Ordering::Release);
        self.shared.reload();
        self.phase = MountPhase::Active;
        trace!("event=mount_activate module=lifecycle status=ok");
        true
    }

    pub fn phase(&self) -> MountPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == MountPhase::Active
    }

    /// Current value, or `None` while inert.
    pub fn current(&self) -> Option<T> {
        match self.phase {
            MountPhase::Inert => None,
            MountPhase::Active | MountPhase::Detached => Some(self.value()),
        }
    }

    /// Current value including the placeholder held while inert.
    pub fn value(&self) -> T {
        self.shared.value.lock().clone()
    }

    /// Re-runs the reader outside of a broadcast.
    pub fn reload(&self) {
        self.shared.reload();
    }

    /// Releases the subscription and freezes the value.
    pub fn detach(&mut self) {
        self.shared.active.store(false, Ordering::Release);
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        if self.phase == MountPhase::Active {
            self.phase = MountPhase::Detached;
        }
    }
}

impl<T> std::fmt::Debug for MountGuard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountGuard")
            .field("phase", &self.phase)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}
