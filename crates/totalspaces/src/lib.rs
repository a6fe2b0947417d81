//! Safe bindings to the TotalSpaces native control API
//!
//! This crate lets a host process query and control a running TotalSpaces
//! instance through `libtotalspacesapi`:
//! - Read the space/desktop layout and the names of spaces
//! - Switch spaces and rename them
//! - List windows grouped by space and move them between spaces
//! - Receive space-change and layout-change notifications
//!
//! ## Architecture
//!
//! - `NativeApi`: the raw C entry points, implemented by `LinkedApi` when the
//!   `link` feature is enabled
//! - `take_string`: copies native strings out and releases them exactly once
//! - `read_topology`: decodes the native two-level window list
//! - `CallbackRegistry`: keeps registered handlers alive while the native
//!   side may call them
//! - `TotalSpaces`: the command façade built on top of the above
//! - `TotalSpaces::subscribe`: forwards notifications into a tokio channel
//!
//! ## Memory ownership
//!
//! Every string and window list returned by the native library is copied into
//! owned Rust values and then released through the matching native free
//! function. Callers never see a raw native handle.

mod callbacks;
mod client;
mod error;
mod events;
pub mod ffi;
mod record;
mod string;
mod topology;
mod types;

#[cfg(test)]
mod testing;

pub use callbacks::{CallbackRegistry, EventKind, LayoutChangedHandler, SpaceChangeHandler};
pub use client::{TotalSpaces, MAX_SPACE_NAME_BYTES};
pub use error::TotalSpacesError;
pub use events::{EventReceiver, EventSubscription, SpaceEvent, DEFAULT_CHANNEL_BUFFER};
#[cfg(feature = "link")]
pub use ffi::LinkedApi;
pub use ffi::NativeApi;
pub use string::take_string;
pub use topology::read_topology;
pub use types::{
    GridLayout, SpaceChange, SpaceCounts, SpaceDescriptor, Topology, Versions, WindowDescriptor,
};
