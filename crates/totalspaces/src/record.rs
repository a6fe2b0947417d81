//! Fixed-size record decoding over native memory
//!
//! Native arrays are described only by a base pointer and an element count.
//! Records are located at `base + index * SIZE`, where `SIZE` comes from the
//! declared `#[repr(C)]` layout. There is no way to check the count against
//! the real allocation: a wrong count from the native side is undetectable
//! here and is treated as a trust boundary.

use std::borrow::Cow;
use std::ffi::CStr;
use std::marker::PhantomData;
use std::mem;
use std::os::raw::c_char;

use crate::ffi::{RawSpace, RawSpaces, RawWindow};

/// A `#[repr(C)]` record type that can be read out of native memory
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` and match the native layout exactly.
pub(crate) unsafe trait NativeRecord: Sized {
    /// Byte stride between consecutive records in a native array
    const SIZE: usize = mem::size_of::<Self>();
}

unsafe impl NativeRecord for RawSpaces {}
unsafe impl NativeRecord for RawSpace {}
unsafe impl NativeRecord for RawWindow {}

/// Borrow the record at `index` in the array starting at `base`
///
/// # Safety
///
/// `base` must point to at least `index + 1` valid records that outlive `'a`.
pub(crate) unsafe fn read_record<'a, T: NativeRecord>(base: *const T, index: usize) -> &'a T {
    &*base.cast::<u8>().add(index * T::SIZE).cast::<T>()
}

/// A borrowed view over a native array of records
pub(crate) struct RecordArray<'a, T: NativeRecord> {
    base: *const T,
    count: usize,
    _buffer: PhantomData<&'a T>,
}

impl<'a, T: NativeRecord> RecordArray<'a, T> {
    /// # Safety
    ///
    /// Unless `base` is null, it must point to `count` valid records that
    /// outlive `'a`. A null `base` is read as an empty array.
    pub(crate) unsafe fn new(base: *const T, count: usize) -> Self {
        let count = if base.is_null() { 0 } else { count };
        Self {
            base,
            count,
            _buffer: PhantomData,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    pub(crate) fn get(&self, index: usize) -> Option<&'a T> {
        // SAFETY: in bounds of the count the native side reported
        (index < self.count).then(|| unsafe { read_record(self.base, index) })
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        (0..self.count).filter_map(move |index| self.get(index))
    }
}

/// Borrow an embedded string field without taking ownership
///
/// Invalid UTF-8 is replaced with U+FFFD; a null field reads as empty.
///
/// # Safety
///
/// `ptr` must be null or a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn borrowed_str<'a>(ptr: *const c_char) -> Cow<'a, str> {
    if ptr.is_null() {
        Cow::Borrowed("")
    } else {
        CStr::from_ptr(ptr).to_string_lossy()
    }
}
