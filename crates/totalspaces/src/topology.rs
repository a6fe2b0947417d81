//! Window list decoding
//!
//! `tsapi_windowList` returns a two-level native structure: a root record
//! holding an array of spaces, each of which holds an array of windows. The
//! whole graph, including every string inside it, is released by a single
//! `tsapi_freeWindowList` call. Decoding therefore copies everything out first
//! and releases the root only once the owned `Topology` is complete.

use std::ptr::NonNull;

use tracing::{debug, warn};

use crate::ffi::{NativeApi, RawSpace, RawSpaces, RawWindow};
use crate::record::{borrowed_str, RecordArray};
use crate::types::{SpaceDescriptor, Topology, WindowDescriptor};

/// A window list handed over by the native API, released when dropped
struct WindowList<'a, A: NativeApi + ?Sized> {
    api: &'a A,
    root: NonNull<RawSpaces>,
}

impl<'a, A: NativeApi + ?Sized> WindowList<'a, A> {
    fn fetch(api: &'a A) -> Option<Self> {
        NonNull::new(api.window_list()).map(|root| Self { api, root })
    }

    fn decode(&self) -> Topology {
        // SAFETY: the root stays valid until this guard is dropped
        let root = unsafe { self.root.as_ref() };
        let spaces: RecordArray<'_, RawSpace> =
            unsafe { RecordArray::new(root.spaces, root.count as usize) };

        if spaces.len() != root.count as usize {
            warn!(count = root.count, "Window list reports spaces but no space array");
        }

        spaces.iter().map(decode_space).collect()
    }
}

impl<A: NativeApi + ?Sized> Drop for WindowList<'_, A> {
    fn drop(&mut self) {
        // SAFETY: we hold the only handle and this is the only release
        unsafe { self.api.free_window_list(self.root.as_ptr()) }
    }
}

fn decode_space(raw: &RawSpace) -> SpaceDescriptor {
    // SAFETY: the window array belongs to the same graph as `raw`
    let windows: RecordArray<'_, RawWindow> =
        unsafe { RecordArray::new(raw.windows, raw.count as usize) };

    if windows.len() != raw.count as usize {
        warn!(
            space_number = raw.space_number,
            count = raw.count,
            "Space reports windows but no window array"
        );
    }

    SpaceDescriptor {
        space_number: raw.space_number,
        windows: windows.iter().map(decode_window).collect(),
    }
}

fn decode_window(raw: &RawWindow) -> WindowDescriptor {
    // SAFETY: string fields are owned by the window list, which is still alive
    unsafe {
        WindowDescriptor {
            window_id: raw.window_id,
            title: borrowed_str(raw.title).into_owned(),
            frame: borrowed_str(raw.frame).into_owned(),
            app_name: borrowed_str(raw.app_name).into_owned(),
            is_on_all_spaces: raw.is_on_all_spaces,
        }
    }
}

/// Read the current window layout, grouped by space
///
/// Spaces appear in the order the native side reports them and windows in
/// front-to-back order; nothing is sorted or deduplicated. The native list is
/// released exactly once after everything has been copied, on every exit
/// path. A null list from the native side yields an empty topology and
/// nothing is released.
///
/// # Example
///
/// ```ignore
/// for space in read_topology(&api) {
///     println!("space {}: {} window(s)", space.space_number, space.windows.len());
/// }
/// ```
pub fn read_topology<A: NativeApi + ?Sized>(api: &A) -> Topology {
    let Some(list) = WindowList::fetch(api) else {
        debug!("Native window list is null");
        return Vec::new();
    };

    let topology = list.decode();
    drop(list);

    debug!(spaces = topology.len(), "Read window list");
    topology
}
