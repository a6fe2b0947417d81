//! Owned types for TotalSpaces data
//!
//! Everything here is a plain copy of what the native service reported. None
//! of these values point back into native memory, so they can be kept, sent
//! across threads and serialized freely.

use serde::Serialize;

/// A window as reported by the window list
///
/// # Example
///
/// ```ignore
/// for window in &space.windows {
///     println!("{}: {} ({})", window.window_id, window.title, window.app_name);
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WindowDescriptor {
    /// Native window identifier
    ///
    /// This is the only handle accepted by `move_window_to_space`. It is valid
    /// for the current window set only and may be reused once the window closes.
    pub window_id: u32,

    /// The window title
    pub title: String,

    /// The window frame as formatted by TotalSpaces, passed through unparsed
    pub frame: String,

    /// Name of the owning application
    pub app_name: String,

    /// Whether the window is shown on every space
    pub is_on_all_spaces: bool,
}

/// A space together with the windows on it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SpaceDescriptor {
    /// Native space number
    ///
    /// Numbering starts at 1 unless the Dashboard is a space, in which case
    /// the Dashboard is space 0. Numbers need not be contiguous.
    pub space_number: u32,

    /// Windows on this space in front-to-back order
    pub windows: Vec<WindowDescriptor>,
}

/// Point-in-time copy of the window layout, one entry per space
///
/// A fresh snapshot is produced by every query; nothing is cached.
pub type Topology = Vec<SpaceDescriptor>;

/// The three version strings exposed by the native API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Versions {
    /// Version of the linked `libtotalspacesapi`
    pub library: String,
    /// API version implemented by the running TotalSpaces
    pub api: String,
    /// Version of TotalSpaces itself
    pub service: String,
}

/// Space and desktop counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpaceCounts {
    /// All spaces, including fullscreens, the Dashboard and unused grid cells
    pub spaces: u32,
    /// Fullscreen apps currently present
    pub fullscreens: u32,
    /// Fullscreen slots defined in the grid (a setting, not a live count)
    pub fullscreens_in_grid: u32,
    /// Desktops present in Mission Control
    pub desktops: u32,
    /// Whether the Dashboard is configured as a space
    pub dashboard_is_space: bool,
}

/// Dimensions of the TotalSpaces grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridLayout {
    pub rows: u32,
    pub columns: u32,
}

/// Payload of a space-will-change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SpaceChange {
    /// Space being left
    pub from: u32,
    /// Space being entered
    pub to: u32,
}
