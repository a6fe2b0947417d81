//! TotalSpaces command façade
//!
//! `TotalSpaces` wraps a `NativeApi` implementation and exposes the native
//! queries and commands as owned Rust values. Scalar results are passed
//! through unchanged; strings and the window list go through the marshaling
//! layer and are released before the call returns.

use std::ffi::CString;

use tracing::{debug, warn};

use crate::callbacks::{CallbackRegistry, EventKind};
use crate::error::TotalSpacesError;
use crate::events::{EventDispatcher, EventReceiver, EventSubscription};
use crate::ffi::NativeApi;
use crate::string::take_string;
use crate::topology::read_topology;
use crate::types::{GridLayout, SpaceCounts, Topology, Versions};

/// Longest space name, in bytes, accepted by TotalSpaces
pub const MAX_SPACE_NAME_BYTES: usize = 255;

/// Client for a running TotalSpaces instance
///
/// # Example
///
/// ```ignore
/// let client = TotalSpaces::new(LinkedApi)?;
/// let current = client.current_space();
/// println!("Current space {} is called {}", current, client.space_name(current));
/// client.move_to_space(1);
/// ```
#[derive(Debug)]
pub struct TotalSpaces<A: NativeApi> {
    api: A,
    registry: &'static CallbackRegistry,
}

impl<A: NativeApi> TotalSpaces<A> {
    /// Create a client after checking that the library and service agree on the API version
    ///
    /// The record layouts decoded by this crate are tied to the API version. A
    /// mismatch between the linked library and the running TotalSpaces means
    /// those layouts can no longer be trusted, so the client refuses to start.
    ///
    /// # Errors
    ///
    /// Returns `TotalSpacesError::ApiVersionMismatch` if the versions differ.
    pub fn new(api: A) -> Result<Self, TotalSpacesError> {
        let client = Self::new_unchecked(api);
        let library = client.library_version();
        let api_version = client.api_version();

        if library != api_version {
            warn!(%library, api = %api_version, "TotalSpaces API version mismatch");
            return Err(TotalSpacesError::ApiVersionMismatch {
                library,
                api: api_version,
            });
        }

        debug!(version = %api_version, "TotalSpaces API version check passed");
        Ok(client)
    }

    /// Like `new`, but also require the API version to equal `expected`
    ///
    /// # Errors
    ///
    /// Returns `TotalSpacesError::ApiVersionMismatch` or
    /// `TotalSpacesError::UnexpectedApiVersion`.
    pub fn with_expected_api_version(api: A, expected: &str) -> Result<Self, TotalSpacesError> {
        let client = Self::new(api)?;
        let actual = client.api_version();

        if actual != expected {
            return Err(TotalSpacesError::UnexpectedApiVersion {
                expected: expected.to_string(),
                actual,
            });
        }

        Ok(client)
    }

    /// Create a client without any version check
    pub fn new_unchecked(api: A) -> Self {
        Self {
            api,
            registry: CallbackRegistry::global(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_registry(api: A, registry: &'static CallbackRegistry) -> Self {
        Self { api, registry }
    }

    /// The underlying native API
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Version of the linked `libtotalspacesapi`, e.g. "1.0"
    pub fn library_version(&self) -> String {
        unsafe { take_string(&self.api, self.api.lib_total_spaces_version()) }
    }

    /// API version implemented by the running TotalSpaces, e.g. "1.0"
    pub fn api_version(&self) -> String {
        unsafe { take_string(&self.api, self.api.api_version()) }
    }

    /// Version of the running TotalSpaces, e.g. "1.1.4"
    pub fn service_version(&self) -> String {
        unsafe { take_string(&self.api, self.api.total_spaces_version()) }
    }

    pub fn versions(&self) -> Versions {
        Versions {
            library: self.library_version(),
            api: self.api_version(),
            service: self.service_version(),
        }
    }

    /// Number of the current space
    ///
    /// Numbering starts at 1, except when the Dashboard is a space, in which
    /// case it is space 0.
    pub fn current_space(&self) -> u32 {
        self.api.current_space_number()
    }

    /// Name of a space; empty if the space number is not valid
    pub fn space_name(&self, space_number: u32) -> String {
        unsafe {
            take_string(
                &self.api,
                self.api.space_name_for_space_number(space_number),
            )
        }
    }

    /// All spaces, including fullscreens, the Dashboard and unused grid cells
    pub fn number_of_spaces(&self) -> u32 {
        self.api.number_of_spaces()
    }

    pub fn number_of_fullscreens(&self) -> u32 {
        self.api.number_of_full_screens()
    }

    /// Fullscreen slots defined in the grid, regardless of how many exist
    pub fn number_of_fullscreens_in_grid(&self) -> u32 {
        self.api.number_of_full_screens_in_grid()
    }

    /// Desktops present; may exceed rows × columns if more were created in Mission Control
    pub fn number_of_desktops(&self) -> u32 {
        self.api.number_of_desktops()
    }

    pub fn dashboard_is_a_space(&self) -> bool {
        self.api.dashboard_is_a_space()
    }

    pub fn grid_rows(&self) -> u32 {
        self.api.defined_rows()
    }

    pub fn grid_columns(&self) -> u32 {
        self.api.defined_columns()
    }

    pub fn space_counts(&self) -> SpaceCounts {
        SpaceCounts {
            spaces: self.number_of_spaces(),
            fullscreens: self.number_of_fullscreens(),
            fullscreens_in_grid: self.number_of_fullscreens_in_grid(),
            desktops: self.number_of_desktops(),
            dashboard_is_space: self.dashboard_is_a_space(),
        }
    }

    pub fn grid(&self) -> GridLayout {
        GridLayout {
            rows: self.grid_rows(),
            columns: self.grid_columns(),
        }
    }

    /// Switch to a space
    ///
    /// Returns `false` if the space number is invalid. A space change
    /// notification is sent on success.
    pub fn move_to_space(&self, space_number: u32) -> bool {
        let moved = self.api.move_to_space(space_number);
        debug!(space_number, moved, "Move to space");
        moved
    }

    /// Set the name of a space
    ///
    /// Returns `Ok(false)` if the space number is invalid. A layout change
    /// notification is sent if the name differs from the previous one.
    ///
    /// # Errors
    ///
    /// Returns `TotalSpacesError::NameTooLong` for names over
    /// `MAX_SPACE_NAME_BYTES` bytes and `TotalSpacesError::NameContainsNul` for
    /// names with an embedded NUL. The native API is not called in either case.
    pub fn set_space_name(&self, space_number: u32, name: &str) -> Result<bool, TotalSpacesError> {
        if name.len() > MAX_SPACE_NAME_BYTES {
            return Err(TotalSpacesError::NameTooLong {
                len: name.len(),
                max: MAX_SPACE_NAME_BYTES,
            });
        }
        let name = CString::new(name).map_err(TotalSpacesError::NameContainsNul)?;

        let renamed = self.api.set_name_for_space(space_number, &name);
        debug!(space_number, renamed, "Set space name");
        Ok(renamed)
    }

    /// Current windows grouped by space, windows in front-to-back order
    pub fn window_list(&self) -> Topology {
        read_topology(&self.api)
    }

    /// Move a window to a space
    ///
    /// `window_id` must come from `window_list`. Returns `false` if the window
    /// id or the space number is invalid.
    pub fn move_window_to_space(&self, window_id: u32, space_number: u32) -> bool {
        let moved = self.api.move_window_to_space(window_id, space_number);
        debug!(window_id, space_number, moved, "Move window to space");
        moved
    }

    /// Call `handler` with `(from, to)` whenever the space is about to change
    ///
    /// Only one handler can be registered; registering again replaces it.
    pub fn on_space_change<F>(&self, handler: F)
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        self.registry.register_space_change(&self.api, handler);
    }

    pub fn cancel_on_space_change(&self) {
        self.registry.cancel(&self.api, EventKind::SpaceWillChange);
    }

    /// Call `handler` whenever the layout changes
    ///
    /// This covers apps going fullscreen, space renames and grid changes. Any
    /// stored space information should be re-fetched. Only one handler can be
    /// registered; registering again replaces it.
    pub fn on_layout_change<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.registry.register_layout_changed(&self.api, handler);
    }

    pub fn cancel_on_layout_change(&self) {
        self.registry.cancel(&self.api, EventKind::LayoutChanged);
    }

    /// Deliver both notifications into a bounded channel
    ///
    /// Replaces any handlers registered through `on_space_change` or
    /// `on_layout_change`. Dropping the subscription cancels both.
    pub fn subscribe(&self, buffer_size: usize) -> (EventSubscription<'_, A>, EventReceiver) {
        let (dispatcher, receiver) = EventDispatcher::new(buffer_size);
        (dispatcher.subscribe(&self.api, self.registry), receiver)
    }
}
