//! In-process stand-in for `libtotalspacesapi`
//!
//! `FakeApi` allocates real C strings and real `#[repr(C)]` window lists, keeps
//! track of every live allocation, and records each release and registration
//! call in a shared journal. Releasing something twice, or something it never
//! handed out, panics.

use std::collections::{HashMap, HashSet};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_uint};
use std::ptr;
use std::sync::{Arc, Mutex};

use crate::ffi::{LayoutChangedFn, NativeApi, RawSpace, RawSpaces, RawWindow, SpaceChangeFn};

/// Serializes tests that register handlers in `CallbackRegistry::global()`
pub(crate) static GLOBAL_REGISTRY_MUTEX: Mutex<()> = Mutex::new(());

/// A call observed by the fake, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    FreeString(String),
    FreeWindowList,
    SetSpaceWillChange,
    UnsetSpaceWillChange,
    SetLayoutChanged,
    UnsetLayoutChanged,
    MoveToSpace(u32),
    SetName(u32, String),
    MoveWindow(u32, u32),
    HandlerDropped(&'static str),
}

type Journal = Arc<Mutex<Vec<Call>>>;

/// Records `Call::HandlerDropped` when the handler owning it is dropped
pub(crate) struct DropProbe {
    journal: Journal,
    name: &'static str,
}

impl DropProbe {
    pub(crate) fn new(api: &FakeApi, name: &'static str) -> Self {
        Self {
            journal: Arc::clone(&api.journal),
            name,
        }
    }

    pub(crate) fn touch(&self) {}
}

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.journal
            .lock()
            .unwrap()
            .push(Call::HandlerDropped(self.name));
    }
}

/// Shared view of a `FakeApi`'s bookkeeping that outlives the fake itself
pub(crate) struct FakeObserver {
    journal: Journal,
    live_strings: Arc<Mutex<HashSet<usize>>>,
}

impl FakeObserver {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.journal.lock().unwrap().clone()
    }

    pub(crate) fn string_releases(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::FreeString(_)))
            .count()
    }

    pub(crate) fn live_strings(&self) -> usize {
        self.live_strings.lock().unwrap().len()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakeWindow {
    id: u32,
    app_name: Vec<u8>,
    title: Vec<u8>,
    frame: Vec<u8>,
    on_all_spaces: bool,
}

impl FakeWindow {
    pub(crate) fn new(id: u32, app_name: &str, title: &str, frame: &str) -> Self {
        Self::from_bytes(id, app_name.as_bytes(), title.as_bytes(), frame.as_bytes())
    }

    pub(crate) fn from_bytes(id: u32, app_name: &[u8], title: &[u8], frame: &[u8]) -> Self {
        Self {
            id,
            app_name: app_name.to_vec(),
            title: title.to_vec(),
            frame: frame.to_vec(),
            on_all_spaces: false,
        }
    }

    pub(crate) fn on_all_spaces(mut self) -> Self {
        self.on_all_spaces = true;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakeSpace {
    number: u32,
    windows: Vec<FakeWindow>,
}

impl FakeSpace {
    pub(crate) fn new(number: u32, windows: Vec<FakeWindow>) -> Self {
        Self { number, windows }
    }
}

/// Addresses of everything one window list allocated
struct ListAllocation {
    spaces: usize,
    space_count: usize,
    windows: Vec<(usize, usize)>,
    strings: Vec<usize>,
}

#[derive(Debug, Default)]
struct Callbacks {
    space_change: Option<SpaceChangeFn>,
    layout_changed: Option<LayoutChangedFn>,
}

pub(crate) struct FakeApi {
    journal: Journal,
    live_strings: Arc<Mutex<HashSet<usize>>>,
    live_lists: Mutex<HashMap<usize, ListAllocation>>,
    callbacks: Mutex<Callbacks>,
    spaces: Mutex<Vec<FakeSpace>>,
    names: Mutex<HashMap<u32, Vec<u8>>>,
    current_space: Mutex<u32>,
    null_window_list: bool,
    library_version: String,
    api_version: String,
    service_version: String,
    dashboard_is_space: bool,
    fullscreens: u32,
    rows: u32,
    columns: u32,
}

impl std::fmt::Debug for FakeApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeApi").finish_non_exhaustive()
    }
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self {
            journal: Arc::new(Mutex::new(Vec::new())),
            live_strings: Arc::new(Mutex::new(HashSet::new())),
            live_lists: Mutex::new(HashMap::new()),
            callbacks: Mutex::new(Callbacks::default()),
            spaces: Mutex::new(Vec::new()),
            names: Mutex::new(HashMap::new()),
            current_space: Mutex::new(1),
            null_window_list: false,
            library_version: "1.0".to_string(),
            api_version: "1.0".to_string(),
            service_version: "2.3.6".to_string(),
            dashboard_is_space: false,
            fullscreens: 0,
            rows: 2,
            columns: 3,
        }
    }

    pub(crate) fn with_spaces(self, spaces: Vec<FakeSpace>) -> Self {
        *self.spaces.lock().unwrap() = spaces;
        self
    }

    pub(crate) fn with_null_window_list(mut self) -> Self {
        self.null_window_list = true;
        self
    }

    pub(crate) fn with_versions(mut self, library: &str, api: &str) -> Self {
        self.library_version = library.to_string();
        self.api_version = api.to_string();
        self
    }

    pub(crate) fn with_name(self, space_number: u32, name: &[u8]) -> Self {
        self.names
            .lock()
            .unwrap()
            .insert(space_number, name.to_vec());
        self
    }

    pub(crate) fn with_dashboard_space(mut self) -> Self {
        self.dashboard_is_space = true;
        self
    }

    pub(crate) fn with_fullscreens(mut self, fullscreens: u32) -> Self {
        self.fullscreens = fullscreens;
        self
    }

    /// Remove a window, making its id stale
    pub(crate) fn close_window(&self, window_id: u32) {
        for space in self.spaces.lock().unwrap().iter_mut() {
            space.windows.retain(|window| window.id != window_id);
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.observer().calls()
    }

    /// Keep watching releases after the fake has been moved or dropped
    pub(crate) fn observer(&self) -> FakeObserver {
        FakeObserver {
            journal: Arc::clone(&self.journal),
            live_strings: Arc::clone(&self.live_strings),
        }
    }

    pub(crate) fn string_releases(&self) -> usize {
        self.observer().string_releases()
    }

    pub(crate) fn live_strings(&self) -> usize {
        self.observer().live_strings()
    }

    pub(crate) fn live_window_lists(&self) -> usize {
        self.live_lists.lock().unwrap().len()
    }

    /// Invoke the registered space-will-change callback, as the service would
    pub(crate) fn fire_space_change(&self, from: u32, to: u32) {
        let callback = self.callbacks.lock().unwrap().space_change;
        if let Some(callback) = callback {
            callback(from, to);
        }
    }

    /// Invoke the registered layout-changed callback, as the service would
    pub(crate) fn fire_layout_changed(&self) {
        let callback = self.callbacks.lock().unwrap().layout_changed;
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Allocate a string to be released through `free_string`
    pub(crate) fn alloc_string(&self, bytes: &[u8]) -> *mut c_char {
        let ptr = CString::new(bytes).unwrap().into_raw();
        self.live_strings.lock().unwrap().insert(ptr as usize);
        ptr
    }

    fn record(&self, call: Call) {
        self.journal.lock().unwrap().push(call);
    }

    fn space_count(&self) -> u32 {
        self.spaces.lock().unwrap().len() as u32
    }

    fn has_space(&self, space_number: u32) -> bool {
        self.spaces
            .lock()
            .unwrap()
            .iter()
            .any(|space| space.number == space_number)
    }

    fn build_window_list(&self) -> *mut RawSpaces {
        let spaces = self.spaces.lock().unwrap().clone();
        let mut strings = Vec::new();
        let mut windows = Vec::new();
        let mut raw_spaces = Vec::with_capacity(spaces.len());

        let mut graph_string = |bytes: &[u8]| -> *const c_char {
            let ptr = CString::new(bytes).unwrap().into_raw();
            strings.push(ptr as usize);
            ptr
        };

        for space in &spaces {
            let raw_windows: Vec<RawWindow> = space
                .windows
                .iter()
                .map(|window| RawWindow {
                    app_name: graph_string(&window.app_name),
                    window_id: window.id,
                    is_on_all_spaces: window.on_all_spaces,
                    title: graph_string(&window.title),
                    frame: graph_string(&window.frame),
                })
                .collect();

            let (windows_ptr, count) = if raw_windows.is_empty() {
                (ptr::null_mut(), 0)
            } else {
                let count = raw_windows.len();
                let ptr = Box::into_raw(raw_windows.into_boxed_slice()) as *mut RawWindow;
                windows.push((ptr as usize, count));
                (ptr, count)
            };

            raw_spaces.push(RawSpace {
                space_number: space.number,
                count: count as c_uint,
                windows: windows_ptr,
            });
        }

        let space_count = raw_spaces.len();
        let spaces_ptr = if raw_spaces.is_empty() {
            ptr::null_mut()
        } else {
            Box::into_raw(raw_spaces.into_boxed_slice()) as *mut RawSpace
        };

        let root = Box::into_raw(Box::new(RawSpaces {
            count: space_count as c_uint,
            spaces: spaces_ptr,
        }));

        self.live_lists.lock().unwrap().insert(
            root as usize,
            ListAllocation {
                spaces: spaces_ptr as usize,
                space_count,
                windows,
                strings,
            },
        );
        root
    }
}

unsafe impl NativeApi for FakeApi {
    unsafe fn free_string(&self, string: *mut c_char) {
        assert!(
            self.live_strings.lock().unwrap().remove(&(string as usize)),
            "free_string on a pointer that is not live"
        );
        let owned = CString::from_raw(string);
        self.record(Call::FreeString(owned.to_string_lossy().into_owned()));
    }

    fn lib_total_spaces_version(&self) -> *mut c_char {
        self.alloc_string(self.library_version.as_bytes())
    }

    fn api_version(&self) -> *mut c_char {
        self.alloc_string(self.api_version.as_bytes())
    }

    fn total_spaces_version(&self) -> *mut c_char {
        self.alloc_string(self.service_version.as_bytes())
    }

    fn current_space_number(&self) -> c_uint {
        *self.current_space.lock().unwrap()
    }

    fn space_name_for_space_number(&self, space_number: c_uint) -> *mut c_char {
        let name = self.names.lock().unwrap().get(&space_number).cloned();
        self.alloc_string(&name.unwrap_or_default())
    }

    fn number_of_spaces(&self) -> c_uint {
        self.space_count()
    }

    fn number_of_full_screens(&self) -> c_uint {
        self.fullscreens
    }

    fn number_of_full_screens_in_grid(&self) -> c_uint {
        1
    }

    fn number_of_desktops(&self) -> c_uint {
        self.space_count() - self.fullscreens.min(self.space_count())
    }

    fn dashboard_is_a_space(&self) -> bool {
        self.dashboard_is_space
    }

    fn defined_rows(&self) -> c_uint {
        self.rows
    }

    fn defined_columns(&self) -> c_uint {
        self.columns
    }

    fn move_to_space(&self, space_number: c_uint) -> bool {
        self.record(Call::MoveToSpace(space_number));
        if !self.has_space(space_number) {
            return false;
        }
        let from = std::mem::replace(&mut *self.current_space.lock().unwrap(), space_number);
        self.fire_space_change(from, space_number);
        true
    }

    fn set_name_for_space(&self, space_number: c_uint, name: &CStr) -> bool {
        let name = name.to_bytes().to_vec();
        self.record(Call::SetName(
            space_number,
            String::from_utf8_lossy(&name).into_owned(),
        ));
        if !self.has_space(space_number) {
            return false;
        }
        let previous = self.names.lock().unwrap().insert(space_number, name.clone());
        if previous.as_ref() != Some(&name) {
            self.fire_layout_changed();
        }
        true
    }

    fn set_space_will_change_callback(&self, callback: SpaceChangeFn) {
        self.record(Call::SetSpaceWillChange);
        self.callbacks.lock().unwrap().space_change = Some(callback);
    }

    fn unset_space_will_change_callback(&self) {
        self.record(Call::UnsetSpaceWillChange);
        self.callbacks.lock().unwrap().space_change = None;
    }

    fn set_layout_changed_callback(&self, callback: LayoutChangedFn) {
        self.record(Call::SetLayoutChanged);
        self.callbacks.lock().unwrap().layout_changed = Some(callback);
    }

    fn unset_layout_changed_callback(&self) {
        self.record(Call::UnsetLayoutChanged);
        self.callbacks.lock().unwrap().layout_changed = None;
    }

    fn window_list(&self) -> *mut RawSpaces {
        if self.null_window_list {
            return ptr::null_mut();
        }
        self.build_window_list()
    }

    unsafe fn free_window_list(&self, list: *mut RawSpaces) {
        let allocation = self
            .live_lists
            .lock()
            .unwrap()
            .remove(&(list as usize))
            .expect("free_window_list on a list that is not live");

        for string in allocation.strings {
            drop(CString::from_raw(string as *mut c_char));
        }
        for (windows, count) in allocation.windows {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                windows as *mut RawWindow,
                count,
            )));
        }
        if allocation.spaces != 0 {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                allocation.spaces as *mut RawSpace,
                allocation.space_count,
            )));
        }
        drop(Box::from_raw(list));
        self.record(Call::FreeWindowList);
    }

    fn move_window_to_space(&self, window_id: c_uint, space_number: c_uint) -> bool {
        self.record(Call::MoveWindow(window_id, space_number));
        if !self.has_space(space_number) {
            return false;
        }
        let mut spaces = self.spaces.lock().unwrap();
        let window = spaces.iter_mut().find_map(|space| {
            let index = space.windows.iter().position(|w| w.id == window_id)?;
            Some(space.windows.remove(index))
        });
        match window {
            Some(window) => {
                if let Some(target) = spaces.iter_mut().find(|s| s.number == space_number) {
                    target.windows.insert(0, window);
                }
                true
            }
            None => false,
        }
    }
}
