//! Channel delivery of TotalSpaces notifications
//!
//! Native notifications arrive on a thread chosen by TotalSpaces. The
//! dispatcher turns them into `SpaceEvent` values and pushes them into
//! a bounded tokio channel so an async event loop can consume them.
//!
//! ## Architecture
//!
//! ```text
//! +-------------+      +------------+      +--------+      +------------+
//! | TotalSpaces | ---> | trampoline | ---> | mpsc   | ---> | Event loop |
//! | (native)    |      | + registry |      | channel|      |            |
//! +-------------+      +------------+      +--------+      +------------+
//! ```
//!
//! The native thread never blocks on the channel: when it is full the event
//! is dropped and a warning is logged.

use std::fmt;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace, warn};

use crate::callbacks::CallbackRegistry;
use crate::ffi::NativeApi;
use crate::types::SpaceChange;

/// Default channel buffer size for event dispatch
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;

/// A notification from TotalSpaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceEvent {
    /// The current space is about to change
    SpaceWillChange(SpaceChange),
    /// Spaces were added, removed or renamed; stored space data is stale
    LayoutChanged,
}

/// Receiver for events from the dispatcher
pub type EventReceiver = mpsc::Receiver<SpaceEvent>;

/// Forwards native notifications into a channel
///
/// Handlers always go into `CallbackRegistry::global()`, the registry the
/// native trampolines dispatch into. `TotalSpaces::subscribe` is the public
/// entry point.
#[derive(Debug)]
pub(crate) struct EventDispatcher {
    sender: mpsc::Sender<SpaceEvent>,
}

impl EventDispatcher {
    /// Create a dispatcher with the given channel capacity
    ///
    /// # Panics
    ///
    /// Panics if `buffer_size` is zero.
    pub(crate) fn new(buffer_size: usize) -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        (Self { sender }, receiver)
    }

    /// Register handlers for both notifications in `registry`
    ///
    /// Any handlers already registered there are replaced. The channel closes
    /// once the returned subscription is dropped.
    pub(crate) fn subscribe<'a, A: NativeApi + ?Sized>(
        self,
        api: &'a A,
        registry: &'a CallbackRegistry,
    ) -> EventSubscription<'a, A> {
        let sender = self.sender.clone();
        registry.register_space_change(api, move |from, to| {
            forward(&sender, SpaceEvent::SpaceWillChange(SpaceChange { from, to }))
        });

        let sender = self.sender;
        registry.register_layout_changed(api, move || forward(&sender, SpaceEvent::LayoutChanged));

        EventSubscription { api, registry }
    }
}

fn forward(sender: &mpsc::Sender<SpaceEvent>, event: SpaceEvent) {
    match sender.try_send(event) {
        Ok(()) => trace!(?event, "Dispatched event"),
        Err(TrySendError::Full(event)) => {
            warn!(?event, "Event channel full, dropping event");
        }
        Err(TrySendError::Closed(event)) => {
            debug!(?event, "Event receiver dropped, discarding event");
        }
    }
}

/// Active channel registration returned by `TotalSpaces::subscribe`
///
/// Dropping it cancels both notifications.
///
/// # Example
///
/// ```ignore
/// let (_subscription, mut rx) = client.subscribe(DEFAULT_CHANNEL_BUFFER);
///
/// while let Some(event) = rx.recv().await {
///     match event {
///         SpaceEvent::SpaceWillChange(change) => { /* handle space change */ }
///         SpaceEvent::LayoutChanged => { /* re-read the layout */ }
///     }
/// }
/// ```
pub struct EventSubscription<'a, A: NativeApi + ?Sized> {
    api: &'a A,
    registry: &'a CallbackRegistry,
}

impl<A: NativeApi + ?Sized> Drop for EventSubscription<'_, A> {
    fn drop(&mut self) {
        self.registry.cancel_all(self.api);
    }
}

impl<A: NativeApi + ?Sized> fmt::Debug for EventSubscription<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSubscription")
            .field("registry", self.registry)
            .finish_non_exhaustive()
    }
}
