//! Owned copies of native strings

use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr::NonNull;

use crate::ffi::NativeApi;

/// A string handed over by the native API, released when dropped
struct NativeString<'a, A: NativeApi + ?Sized> {
    api: &'a A,
    ptr: NonNull<c_char>,
}

impl<'a, A: NativeApi + ?Sized> NativeString<'a, A> {
    /// # Safety
    ///
    /// `ptr` must be null or an unreleased string returned by `api`.
    unsafe fn from_raw(api: &'a A, ptr: *mut c_char) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { api, ptr })
    }

    fn to_owned_lossy(&self) -> String {
        // SAFETY: non-null and NUL-terminated per the `NativeApi` contract
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }
}

impl<A: NativeApi + ?Sized> Drop for NativeString<'_, A> {
    fn drop(&mut self) {
        // SAFETY: we hold the only handle and this is the only release
        unsafe { self.api.free_string(self.ptr.as_ptr()) }
    }
}

/// Copy a native string into an owned `String` and release the native buffer
///
/// Invalid UTF-8 is replaced with U+FFFD rather than rejected. A null pointer
/// yields an empty string and nothing is released. Otherwise `free_string` is
/// called exactly once, after the bytes have been copied.
///
/// # Safety
///
/// `ptr` must be null or a string returned by `api` that has not been released.
/// Ownership of the buffer passes to this function.
///
/// # Example
///
/// ```ignore
/// let version = unsafe { take_string(&api, api.api_version()) };
/// ```
pub unsafe fn take_string<A: NativeApi + ?Sized>(api: &A, ptr: *mut c_char) -> String {
    match NativeString::from_raw(api, ptr) {
        Some(native) => native.to_owned_lossy(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeApi};

    #[test]
    fn null_handle_is_empty_and_never_released() {
        let api = FakeApi::new();

        let text = unsafe { take_string(&api, std::ptr::null_mut()) };

        assert_eq!(text, "");
        assert_eq!(api.string_releases(), 0);
    }

    #[test]
    fn non_null_handle_is_copied_and_released_once() {
        let api = FakeApi::new();
        let ptr = api.alloc_string(b"Home");

        let text = unsafe { take_string(&api, ptr) };

        assert_eq!(text, "Home");
        assert_eq!(api.calls(), vec![Call::FreeString("Home".to_string())]);
        assert_eq!(api.live_strings(), 0);
    }

    #[test]
    fn empty_native_string_is_still_released() {
        let api = FakeApi::new();
        let ptr = api.alloc_string(b"");

        let text = unsafe { take_string(&api, ptr) };

        assert_eq!(text, "");
        assert_eq!(api.string_releases(), 1);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let api = FakeApi::new();
        let ptr = api.alloc_string(b"Caf\xe9 \xff");

        let text = unsafe { take_string(&api, ptr) };

        assert_eq!(text, "Caf\u{fffd} \u{fffd}");
        assert_eq!(api.string_releases(), 1);
    }

    #[test]
    fn multibyte_text_survives_the_copy() {
        let api = FakeApi::new();
        let ptr = api.alloc_string("Büro ✈".as_bytes());

        let text = unsafe { take_string(&api, ptr) };

        assert_eq!(text, "Büro ✈");
        assert_eq!(api.live_strings(), 0);
    }
}
