//! Registration of native notification callbacks
//!
//! The native API accepts a bare function pointer per notification and gives
//! no user-data argument, so it is always handed one of the fixed trampolines
//! in this module. The trampolines look the current handler up in the
//! process-wide `CallbackRegistry` and forward the call.
//!
//! ## Lifetime rules
//!
//! - Each event kind has a single slot; registering replaces the previous
//!   handler, it never adds a second one.
//! - Handlers are held by `Arc`. A dispatch clones the `Arc` out of the slot
//!   before calling it, so a handler that is replaced or cancelled while it is
//!   running stays alive until that call returns.
//! - A replaced handler is dropped only after the native "set" call for its
//!   replacement has returned; a cancelled one only after the native "unset"
//!   call has returned.
//! - Register and cancel are serialized per kind, so the native registration
//!   and the slot never disagree. Dispatch does not take that lock.

use std::fmt;
use std::os::raw::c_uint;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, trace};

use crate::ffi::NativeApi;

/// Handler for space-will-change notifications, called with `(from, to)`
pub type SpaceChangeHandler = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Handler for layout-changed notifications
pub type LayoutChangedHandler = Arc<dyn Fn() + Send + Sync>;

/// The notifications the native API can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Sent before TotalSpaces switches from one space to another
    SpaceWillChange,
    /// Sent when the layout changes: fullscreen apps, space names, grid size
    LayoutChanged,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Slot contents are valid even if a holder panicked
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One registration slot
struct Slot<H> {
    /// Serializes register/cancel for this kind
    registration: Mutex<()>,
    handler: Mutex<Option<H>>,
}

impl<H: Clone> Slot<H> {
    const fn new() -> Self {
        Self {
            registration: Mutex::new(()),
            handler: Mutex::new(None),
        }
    }

    /// Store `handler`, run the native `set` call, then drop the previous handler
    fn register(&self, handler: H, set: impl FnOnce()) -> bool {
        let _registration = lock(&self.registration);
        let previous = lock(&self.handler).replace(handler);
        set();
        let replaced = previous.is_some();
        drop(previous);
        replaced
    }

    /// Run the native `unset` call, then clear and drop the handler
    fn cancel(&self, unset: impl FnOnce()) -> bool {
        let _registration = lock(&self.registration);
        unset();
        let previous = lock(&self.handler).take();
        let cancelled = previous.is_some();
        drop(previous);
        cancelled
    }

    /// Copy the current handler out without holding the lock during the call
    fn current(&self) -> Option<H> {
        lock(&self.handler).clone()
    }

    fn is_registered(&self) -> bool {
        lock(&self.handler).is_some()
    }
}

/// Registry holding at most one handler per `EventKind`
///
/// The trampolines passed to the native API always dispatch into
/// `CallbackRegistry::global()`, the only instance reachable outside this
/// crate.
///
/// # Example
///
/// ```ignore
/// let registry = CallbackRegistry::global();
/// registry.register_space_change(&api, |from, to| {
///     println!("Moving from space {} to space {}", from, to);
/// });
/// // ...
/// registry.cancel(&api, EventKind::SpaceWillChange);
/// ```
pub struct CallbackRegistry {
    space_change: Slot<SpaceChangeHandler>,
    layout_changed: Slot<LayoutChangedHandler>,
}

static GLOBAL: CallbackRegistry = CallbackRegistry::new();

impl CallbackRegistry {
    pub(crate) const fn new() -> Self {
        Self {
            space_change: Slot::new(),
            layout_changed: Slot::new(),
        }
    }

    /// The process-wide registry the native trampolines dispatch into
    pub fn global() -> &'static CallbackRegistry {
        &GLOBAL
    }

    /// Register the space-will-change handler, replacing any previous one
    pub fn register_space_change<A, F>(&self, api: &A, handler: F)
    where
        A: NativeApi + ?Sized,
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        let replaced = self.space_change.register(Arc::new(handler), || {
            api.set_space_will_change_callback(space_change_trampoline)
        });
        debug!(replaced, "Registered space change handler");
    }

    /// Register the layout-changed handler, replacing any previous one
    pub fn register_layout_changed<A, F>(&self, api: &A, handler: F)
    where
        A: NativeApi + ?Sized,
        F: Fn() + Send + Sync + 'static,
    {
        let replaced = self.layout_changed.register(Arc::new(handler), || {
            api.set_layout_changed_callback(layout_changed_trampoline)
        });
        debug!(replaced, "Registered layout change handler");
    }

    /// Unregister the handler for `kind`
    ///
    /// The native "unset" call is always made; with nothing registered this
    /// has no other effect.
    pub fn cancel<A: NativeApi + ?Sized>(&self, api: &A, kind: EventKind) {
        let cancelled = match kind {
            EventKind::SpaceWillChange => self
                .space_change
                .cancel(|| api.unset_space_will_change_callback()),
            EventKind::LayoutChanged => self
                .layout_changed
                .cancel(|| api.unset_layout_changed_callback()),
        };
        debug!(?kind, cancelled, "Cancelled handler");
    }

    /// Unregister both handlers
    pub fn cancel_all<A: NativeApi + ?Sized>(&self, api: &A) {
        self.cancel(api, EventKind::SpaceWillChange);
        self.cancel(api, EventKind::LayoutChanged);
    }

    /// Whether a handler is currently registered for `kind`
    pub fn is_registered(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::SpaceWillChange => self.space_change.is_registered(),
            EventKind::LayoutChanged => self.layout_changed.is_registered(),
        }
    }

    /// Forward a space-will-change notification to the current handler
    ///
    /// Returns `false` when no handler is registered; the notification is
    /// dropped in that case.
    pub fn dispatch_space_change(&self, from: u32, to: u32) -> bool {
        match self.space_change.current() {
            Some(handler) => {
                handler(from, to);
                true
            }
            None => {
                trace!(from, to, "Space change with no handler registered");
                false
            }
        }
    }

    /// Forward a layout-changed notification to the current handler
    ///
    /// Returns `false` when no handler is registered.
    pub fn dispatch_layout_changed(&self) -> bool {
        match self.layout_changed.current() {
            Some(handler) => {
                handler();
                true
            }
            None => {
                trace!("Layout change with no handler registered");
                false
            }
        }
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("space_change", &self.space_change.is_registered())
            .field("layout_changed", &self.layout_changed.is_registered())
            .finish()
    }
}

// Panics must not unwind into the native caller.

extern "C" fn space_change_trampoline(from: c_uint, to: c_uint) {
    let result = catch_unwind(AssertUnwindSafe(|| {
        CallbackRegistry::global().dispatch_space_change(from, to)
    }));
    if result.is_err() {
        error!(from, to, "Space change handler panicked");
    }
}

extern "C" fn layout_changed_trampoline() {
    let result = catch_unwind(AssertUnwindSafe(|| {
        CallbackRegistry::global().dispatch_layout_changed()
    }));
    if result.is_err() {
        error!("Layout change handler panicked");
    }
}
