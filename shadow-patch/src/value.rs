//! Type-erased views of the two sides of a patch.
//!
//! These are call-scoped: they are created while walking a value and never
//! outlive the top-level [`patch`](crate::patch) call that produced them.

use facet_core::{Field, OptionDef, PtrConst, PtrMut, Shape};

/// The side being mutated.
#[derive(Clone, Copy)]
pub(crate) struct Target {
    pub data: PtrMut,
    pub shape: &'static Shape,
}

impl Target {
    /// View a field of this struct (or enum variant) as a target.
    ///
    /// # Safety
    /// - `field` must belong to the struct or active variant stored at `self.data`
    pub unsafe fn field(self, field: &'static Field) -> Target {
        Target {
            // SAFETY: caller guarantees the field offset is within this value
            data: unsafe { self.data.field(field.offset) },
            shape: field.shape(),
        }
    }

    /// View the element at byte offset `offset` of a sequence buffer.
    ///
    /// # Safety
    /// - `offset` must address an initialized element of `shape`
    pub unsafe fn at(base: *mut u8, offset: usize, shape: &'static Shape) -> Target {
        Target {
            // SAFETY: caller guarantees the offset is in bounds
            data: PtrMut::new(unsafe { base.add(offset) }),
            shape,
        }
    }

    /// Re-read this target through a read-only pointer.
    pub fn as_const(self) -> PtrConst {
        self.data.as_const()
    }
}

/// The side supplying replacement data. Never written through.
#[derive(Clone, Copy)]
pub(crate) struct Shadow {
    pub data: PtrConst,
    pub shape: &'static Shape,
}

impl Shadow {
    /// View a field of this struct as a shadow.
    ///
    /// # Safety
    /// - `field` must belong to the struct stored at `self.data`
    pub unsafe fn field(self, field: &'static Field) -> Shadow {
        Shadow {
            // SAFETY: caller guarantees the field offset is within this value
            data: PtrConst::new(unsafe { self.data.as_byte_ptr().add(field.offset) }),
            shape: field.shape(),
        }
    }

    /// View the element at byte offset `offset` of a sequence buffer.
    ///
    /// # Safety
    /// - `offset` must address an initialized element of `shape`
    pub unsafe fn at(base: *const u8, offset: usize, shape: &'static Shape) -> Shadow {
        Shadow {
            // SAFETY: caller guarantees the offset is in bounds
            data: PtrConst::new(unsafe { base.add(offset) }),
            shape,
        }
    }
}

/// Read the pointee address out of a `Box<T>` with a sized `T`.
///
/// # Safety
/// - `data` must point to an initialized `Box<T>` where `T: Sized`
pub(crate) unsafe fn box_pointee(data: PtrConst) -> *mut u8 {
    // Box<T> of a sized T is a single non-null pointer to T.
    unsafe { *(data.as_byte_ptr() as *const *mut u8) }
}

/// Get the value stored in an `Option`, or `None` if it is absent.
///
/// # Safety
/// - `data` must point to an initialized option described by `option_def`
pub(crate) unsafe fn option_value(data: PtrConst, option_def: &OptionDef) -> Option<PtrConst> {
    // SAFETY: caller guarantees data is an initialized option
    let value = unsafe { (option_def.vtable.get_value)(data) };
    if value.is_null() {
        None
    } else {
        Some(PtrConst::new(value))
    }
}

/// Turn a read-only pointer obtained from a mutable parent back into a mutable one.
pub(crate) fn reborrow_mut(ptr: PtrConst) -> PtrMut {
    PtrMut::new(ptr.as_byte_ptr() as *mut u8)
}
