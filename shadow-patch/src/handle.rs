//! Untyped handles to the values passed into [`patch`](crate::patch).

use std::marker::PhantomData;
use std::ptr;

use facet_core::{Facet, PtrConst, PtrMut, Shape};

use crate::enum_helpers::{active_variant, single_payload};
use crate::kind::{Indirection, Kind, classify};
use crate::value::{Shadow, Target, box_pointee, option_value};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub(crate) struct Access: u8 {
        /// The handle is the storage itself, not a way to reach it
        const ADDRESSABLE = 1 << 0;
        /// The storage may be written through this handle
        const MUTABLE = 1 << 1;
        /// The handle is a reference; the storage is one dereference away
        const INDIRECT = 1 << 2;
        /// The handle owns a value that was moved into it
        const OWNED = 1 << 3;
    }
}

/// A type-erased value handed to [`patch`](crate::patch).
///
/// How the handle was built decides whether the patcher may use it as-is,
/// must dereference it first, or has to reject it:
///
/// | constructor | addressable | mutable | can be unwrapped |
/// |---|---|---|---|
/// | `From<&mut T>` | no | yes | yes, to `T` |
/// | `From<&T>` | no | no | yes, to `T` |
/// | [`Handle::place`] | yes | yes | no |
/// | [`Handle::place_ref`] | yes | no | no |
/// | [`Handle::by_value`] | no | yes | only if `T` is a `Box`, a `Some`, or an enum holding one value |
/// | [`Handle::nil`] | no | no | no |
///
/// The lifetime `'a` ties the handle to the borrow it was built from.
pub struct Handle<'a> {
    data: *mut u8,
    shape: Option<&'static Shape>,
    access: Access,
    drop_owned: Option<unsafe fn(*mut u8)>,
    _marker: PhantomData<&'a mut ()>,
}

impl<'a> Handle<'a> {
    fn new(data: *mut u8, shape: &'static Shape, access: Access) -> Self {
        Self {
            data,
            shape: Some(shape),
            access,
            drop_owned: None,
            _marker: PhantomData,
        }
    }

    /// A handle that is the mutable storage of `value` itself.
    pub fn place<T: Facet<'static>>(value: &'a mut T) -> Self {
        Self::new(
            (value as *mut T).cast(),
            T::SHAPE,
            Access::ADDRESSABLE | Access::MUTABLE,
        )
    }

    /// A handle that is the read-only storage of `value` itself.
    pub fn place_ref<T: Facet<'static>>(value: &'a T) -> Self {
        Self::new(
            (value as *const T).cast_mut().cast(),
            T::SHAPE,
            Access::ADDRESSABLE,
        )
    }

    /// A handle that owns `value`.
    ///
    /// The value itself has no address the caller can observe, so it can only
    /// take part in a patch through an indirection it holds.
    pub fn by_value<T: Facet<'static>>(value: T) -> Self {
        let data = Box::into_raw(Box::new(value)).cast::<u8>();
        let mut handle = Self::new(data, T::SHAPE, Access::OWNED | Access::MUTABLE);
        handle.drop_owned = Some(drop_boxed::<T>);
        handle
    }

    /// A handle to nothing.
    pub fn nil() -> Self {
        Self {
            data: ptr::null_mut(),
            shape: None,
            access: Access::empty(),
            drop_owned: None,
            _marker: PhantomData,
        }
    }

    /// Shape of the value this handle refers to, or `None` for nil.
    pub fn shape(&self) -> Option<&'static Shape> {
        self.shape
    }

    /// Whether the handle is usable storage without unwrapping.
    pub fn is_addressable(&self) -> bool {
        self.access.contains(Access::ADDRESSABLE)
    }

    /// Whether the storage may be written through this handle.
    pub fn is_mutable(&self) -> bool {
        self.access.contains(Access::MUTABLE)
    }

    /// Whether this is the nil handle.
    pub fn is_nil(&self) -> bool {
        self.shape.is_none()
    }

    /// Unwrap one level of indirection, yielding addressable storage.
    ///
    /// References unwrap to their referent; owned or placed values unwrap
    /// through a `Box`, a `Some`, or an enum whose active variant holds a
    /// single value. Anything else has nothing to unwrap to.
    pub(crate) fn elem(&self) -> Option<Handle<'_>> {
        let shape = self.shape?;
        let mutable = self.access & Access::MUTABLE;

        if self.access.contains(Access::INDIRECT) {
            return Some(Handle::new(self.data, shape, Access::ADDRESSABLE | mutable));
        }

        let data = PtrConst::new(self.data.cast_const());
        // SAFETY: a non-nil handle points at a live value of `shape` for as
        // long as it is borrowed.
        let (inner, inner_shape) = unsafe {
            match classify(shape) {
                Kind::Indirection(Indirection::Box { pointee }) => (box_pointee(data), pointee),
                Kind::Indirection(Indirection::Option(option_def)) => {
                    let value = option_value(data, option_def)?;
                    (value.as_byte_ptr().cast_mut(), option_def.t)
                }
                Kind::Slot(enum_type) => {
                    let variant = active_variant(data, shape, enum_type).ok()?;
                    let payload = single_payload(variant)?;
                    (self.data.add(payload.offset), payload.shape())
                }
                _ => return None,
            }
        };
        Some(Handle::new(inner, inner_shape, Access::ADDRESSABLE | mutable))
    }

    /// The handle's storage as a patch target, if it may be written.
    pub(crate) fn target(&self) -> Option<Target> {
        let shape = self.shape?;
        if !self.is_mutable() {
            return None;
        }
        Some(Target {
            data: PtrMut::new(self.data),
            shape,
        })
    }

    /// The handle's storage as a patch shadow.
    pub(crate) fn shadow(&self) -> Option<Shadow> {
        Some(Shadow {
            data: PtrConst::new(self.data.cast_const()),
            shape: self.shape?,
        })
    }
}

impl<'a, T: Facet<'static>> From<&'a mut T> for Handle<'a> {
    fn from(value: &'a mut T) -> Self {
        Self::new(
            (value as *mut T).cast(),
            T::SHAPE,
            Access::INDIRECT | Access::MUTABLE,
        )
    }
}

impl<'a, T: Facet<'static>> From<&'a T> for Handle<'a> {
    fn from(value: &'a T) -> Self {
        Self::new(
            (value as *const T).cast_mut().cast(),
            T::SHAPE,
            Access::INDIRECT,
        )
    }
}

impl Drop for Handle<'_> {
    fn drop(&mut self) {
        if let Some(drop_owned) = self.drop_owned {
            // SAFETY: drop_owned was paired with this data in Handle::by_value
            unsafe { drop_owned(self.data) };
        }
    }
}

/// # Safety
/// - `data` must come from `Box::<T>::into_raw` and not have been freed
unsafe fn drop_boxed<T>(data: *mut u8) {
    drop(unsafe { Box::from_raw(data.cast::<T>()) });
}
