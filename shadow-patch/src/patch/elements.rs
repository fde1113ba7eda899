//! Arrays and lists, matched by position.

use facet_core::{PtrConst, Shape};

use crate::errors::{PatchError, PatchErrorKind};
use crate::kind::{Elements, Kind, classify};
use crate::path::PathSegment;
use crate::value::{Shadow, Target};

use super::dispatch;

/// A contiguous run of initialized elements.
struct Sequence<P> {
    base: P,
    len: usize,
    element: &'static Shape,
    stride: usize,
}

impl Sequence<*mut u8> {
    /// Locate the elements of a target sequence, writable through `base`.
    ///
    /// # Safety
    /// - `target` must point to an initialized value described by `elements`
    unsafe fn of_target(target: Target, elements: Elements) -> Result<Self, PatchErrorKind> {
        let base = match elements {
            Elements::Array { .. } => target.data.as_mut_byte_ptr(),
            Elements::List(list_def) => {
                let as_mut_ptr = list_def
                    .vtable
                    .as_mut_ptr
                    .ok_or(PatchErrorKind::UnsupportedList {
                        shape: target.shape,
                    })?;
                // SAFETY: caller guarantees target is an initialized list
                unsafe { as_mut_ptr(target.data) }.as_mut_byte_ptr()
            }
        };
        // SAFETY: forwarded from the caller
        unsafe { Sequence::measure(base, target.as_const(), elements) }
    }
}

impl Sequence<*const u8> {
    /// Locate the elements of a shadow sequence, read-only.
    ///
    /// # Safety
    /// - `shadow` must point to an initialized value described by `elements`
    unsafe fn of_shadow(shadow: Shadow, elements: Elements) -> Result<Self, PatchErrorKind> {
        let base = match elements {
            Elements::Array { .. } => shadow.data.as_byte_ptr(),
            Elements::List(list_def) => {
                let as_ptr = list_def
                    .vtable
                    .as_ptr
                    .ok_or(PatchErrorKind::UnsupportedList {
                        shape: shadow.shape,
                    })?;
                // SAFETY: caller guarantees shadow is an initialized list
                unsafe { as_ptr(shadow.data) }.as_byte_ptr()
            }
        };
        // SAFETY: forwarded from the caller
        unsafe { Sequence::measure(base, shadow.data, elements) }
    }
}

impl<P> Sequence<P> {
    /// # Safety
    /// - `data` must point to an initialized value described by `elements`,
    ///   whose element buffer starts at `base`
    unsafe fn measure(base: P, data: PtrConst, elements: Elements) -> Result<Self, PatchErrorKind> {
        let (len, element) = match elements {
            Elements::Array { element, len } => (len, element),
            // SAFETY: caller guarantees data is an initialized list
            Elements::List(list_def) => (unsafe { (list_def.vtable.len)(data) }, list_def.t),
        };
        let stride = element
            .layout
            .sized_layout()
            .map_err(|_| PatchErrorKind::Unsized { shape: element })?
            .size();
        Ok(Self {
            base,
            len,
            element,
            stride,
        })
    }
}

/// Patch `target` element by element from an equally long shadow sequence.
///
/// # Safety
/// - same as [`dispatch`], with `elements` describing `target.shape`
pub(crate) unsafe fn patch_elements(
    target: Target,
    elements: Elements,
    shadow: Shadow,
) -> Result<(), PatchError> {
    let Kind::Elements(shadow_elements) = classify(shadow.shape) else {
        return Err(PatchErrorKind::KindMismatch {
            expected: "sequence",
            shadow: shadow.shape,
        }
        .into());
    };

    // SAFETY: both sides are initialized values of the classified shapes
    let (dst, src) = unsafe {
        (
            Sequence::of_target(target, elements)?,
            Sequence::of_shadow(shadow, shadow_elements)?,
        )
    };

    if dst.len != src.len {
        return Err(PatchErrorKind::LengthMismatch {
            target: dst.len,
            shadow: src.len,
        }
        .into());
    }

    for i in 0..dst.len {
        // SAFETY: i is below both lengths, so both offsets address elements
        unsafe {
            let item = Target::at(dst.base, i * dst.stride, dst.element);
            let source = Shadow::at(src.base, i * src.stride, src.element);
            dispatch(item, source).map_err(|err| err.within(PathSegment::Index(i)))?;
        }
    }
    Ok(())
}
