//! Native ABI of `libtotalspacesapi`
//!
//! The record layouts below mirror the structures declared in the library's
//! C header. The `NativeApi` trait abstracts over the entry points so the
//! marshaling layer can be exercised without the dylib; `LinkedApi` is the
//! real implementation and is only compiled with the `link` feature.

use std::ffi::CStr;
use std::os::raw::{c_char, c_uint};

/// Signature of the space-will-change callback: `(from, to)`
pub type SpaceChangeFn = extern "C" fn(from: c_uint, to: c_uint);

/// Signature of the layout-changed callback
pub type LayoutChangedFn = extern "C" fn();

/// Root of the window list: an array of per-space records
#[repr(C)]
#[derive(Debug)]
pub struct RawSpaces {
    pub count: c_uint,
    pub spaces: *mut RawSpace,
}

/// One space and its array of window records
#[repr(C)]
#[derive(Debug)]
pub struct RawSpace {
    pub space_number: c_uint,
    pub count: c_uint,
    pub windows: *mut RawWindow,
}

/// One window record
///
/// The string fields are part of the window list allocation and are released
/// together with it by `tsapi_freeWindowList`.
#[repr(C)]
#[derive(Debug)]
pub struct RawWindow {
    pub app_name: *const c_char,
    pub window_id: c_uint,
    pub is_on_all_spaces: bool,
    pub title: *const c_char,
    pub frame: *const c_char,
}

/// Entry points of the native TotalSpaces API
///
/// # Safety
///
/// Implementors must uphold the native contract the marshaling layer relies on:
///
/// - Every `*mut c_char` returned is either null or a NUL-terminated string
///   that stays valid until passed to `free_string`.
/// - `window_list` returns either null or a `RawSpaces` graph laid out as
///   declared in this module whose counts match the allocated arrays, valid
///   until passed to `free_window_list`.
/// - Callbacks passed to the `set_*` functions may be invoked from any thread
///   until the matching `unset_*` call or a later `set_*` call returns.
pub unsafe trait NativeApi: Send + Sync {
    /// Release a string returned by one of the string-returning functions
    ///
    /// # Safety
    ///
    /// `string` must come from this API and must not have been released yet.
    unsafe fn free_string(&self, string: *mut c_char);

    fn lib_total_spaces_version(&self) -> *mut c_char;
    fn api_version(&self) -> *mut c_char;
    fn total_spaces_version(&self) -> *mut c_char;

    fn current_space_number(&self) -> c_uint;
    fn space_name_for_space_number(&self, space_number: c_uint) -> *mut c_char;
    fn number_of_spaces(&self) -> c_uint;
    fn number_of_full_screens(&self) -> c_uint;
    fn number_of_full_screens_in_grid(&self) -> c_uint;
    fn number_of_desktops(&self) -> c_uint;
    fn dashboard_is_a_space(&self) -> bool;
    fn defined_rows(&self) -> c_uint;
    fn defined_columns(&self) -> c_uint;

    fn move_to_space(&self, space_number: c_uint) -> bool;
    fn set_name_for_space(&self, space_number: c_uint, name: &CStr) -> bool;

    fn set_space_will_change_callback(&self, callback: SpaceChangeFn);
    fn unset_space_will_change_callback(&self);
    fn set_layout_changed_callback(&self, callback: LayoutChangedFn);
    fn unset_layout_changed_callback(&self);

    fn window_list(&self) -> *mut RawSpaces;

    /// Release a window list together with every string it contains
    ///
    /// # Safety
    ///
    /// `list` must come from `window_list` and must not have been released yet.
    unsafe fn free_window_list(&self, list: *mut RawSpaces);

    fn move_window_to_space(&self, window_id: c_uint, space_number: c_uint) -> bool;
}

#[cfg(feature = "link")]
mod sys {
    use super::{LayoutChangedFn, RawSpaces, SpaceChangeFn};
    use std::os::raw::{c_char, c_uint};

    #[link(name = "totalspacesapi")]
    extern "C" {
        pub fn tsapi_freeString(string: *mut c_char);

        pub fn tsapi_libTotalSpacesVersion() -> *mut c_char;
        pub fn tsapi_apiVersion() -> *mut c_char;
        pub fn tsapi_totalSpacesVersion() -> *mut c_char;

        pub fn tsapi_currentSpaceNumber() -> c_uint;
        pub fn tsapi_spaceNameForSpaceNumber(space_number: c_uint) -> *mut c_char;
        pub fn tsapi_numberOfSpaces() -> c_uint;
        pub fn tsapi_numberOfFullScreens() -> c_uint;
        pub fn tsapi_numberOfFullScreensInGrid() -> c_uint;
        pub fn tsapi_numberOfDesktops() -> c_uint;
        pub fn tsapi_dashboardIsASpace() -> bool;
        pub fn tsapi_definedRows() -> c_uint;
        pub fn tsapi_definedColumns() -> c_uint;

        pub fn tsapi_moveToSpace(space_number: c_uint) -> bool;
        pub fn tsapi_setNameForSpace(space_number: c_uint, name: *const c_char) -> bool;

        pub fn tsapi_setSpaceWillChangeCallback(callback: SpaceChangeFn);
        pub fn tsapi_unsetSpaceWillChangeCallback();
        pub fn tsapi_setLayoutChangedCallback(callback: LayoutChangedFn);
        pub fn tsapi_unsetLayoutChangedCallback();

        pub fn tsapi_windowList() -> *mut RawSpaces;
        pub fn tsapi_freeWindowList(list: *mut RawSpaces);

        pub fn tsapi_moveWindowToSpace(window_id: c_uint, space_number: c_uint) -> bool;
    }
}

/// The linked `libtotalspacesapi`
///
/// The library is loaded by the dynamic linker once per process; this type
/// carries no state of its own.
#[cfg(feature = "link")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedApi;

// SAFETY: forwards directly to the library, whose contract is the one
// documented on `NativeApi`.
#[cfg(feature = "link")]
unsafe impl NativeApi for LinkedApi {
    unsafe fn free_string(&self, string: *mut c_char) {
        sys::tsapi_freeString(string)
    }

    fn lib_total_spaces_version(&self) -> *mut c_char {
        unsafe { sys::tsapi_libTotalSpacesVersion() }
    }

    fn api_version(&self) -> *mut c_char {
        unsafe { sys::tsapi_apiVersion() }
    }

    fn total_spaces_version(&self) -> *mut c_char {
        unsafe { sys::tsapi_totalSpacesVersion() }
    }

    fn current_space_number(&self) -> c_uint {
        unsafe { sys::tsapi_currentSpaceNumber() }
    }

    fn space_name_for_space_number(&self, space_number: c_uint) -> *mut c_char {
        unsafe { sys::tsapi_spaceNameForSpaceNumber(space_number) }
    }

    fn number_of_spaces(&self) -> c_uint {
        unsafe { sys::tsapi_numberOfSpaces() }
    }

    fn number_of_full_screens(&self) -> c_uint {
        unsafe { sys::tsapi_numberOfFullScreens() }
    }

    fn number_of_full_screens_in_grid(&self) -> c_uint {
        unsafe { sys::tsapi_numberOfFullScreensInGrid() }
    }

    fn number_of_desktops(&self) -> c_uint {
        unsafe { sys::tsapi_numberOfDesktops() }
    }

    fn dashboard_is_a_space(&self) -> bool {
        unsafe { sys::tsapi_dashboardIsASpace() }
    }

    fn defined_rows(&self) -> c_uint {
        unsafe { sys::tsapi_definedRows() }
    }

    fn defined_columns(&self) -> c_uint {
        unsafe { sys::tsapi_definedColumns() }
    }

    fn move_to_space(&self, space_number: c_uint) -> bool {
        unsafe { sys::tsapi_moveToSpace(space_number) }
    }

    fn set_name_for_space(&self, space_number: c_uint, name: &CStr) -> bool {
        unsafe { sys::tsapi_setNameForSpace(space_number, name.as_ptr()) }
    }

    fn set_space_will_change_callback(&self, callback: SpaceChangeFn) {
        unsafe { sys::tsapi_setSpaceWillChangeCallback(callback) }
    }

    fn unset_space_will_change_callback(&self) {
        unsafe { sys::tsapi_unsetSpaceWillChangeCallback() }
    }

    fn set_layout_changed_callback(&self, callback: LayoutChangedFn) {
        unsafe { sys::tsapi_setLayoutChangedCallback(callback) }
    }

    fn unset_layout_changed_callback(&self) {
        unsafe { sys::tsapi_unsetLayoutChangedCallback() }
    }

    fn window_list(&self) -> *mut RawSpaces {
        unsafe { sys::tsapi_windowList() }
    }

    unsafe fn free_window_list(&self, list: *mut RawSpaces) {
        sys::tsapi_freeWindowList(list)
    }

    fn move_window_to_space(&self, window_id: c_uint, space_number: c_uint) -> bool {
        unsafe { sys::tsapi_moveWindowToSpace(window_id, space_number) }
    }
}
