//! The visibility-bypassing writer.
//!
//! Every mutation of target memory goes through this module: [`write`]
//! replaces a value wholesale and [`attach`] turns an absent option into a
//! present one. Nothing else in the crate writes through a target pointer.
//!
//! Both functions ignore field privacy. Handlers reach a target through the
//! offsets published by the type's facet shape, private fields included.

use std::ptr;

use facet_core::{OptionDef, PtrUninit, Shape};
use log::trace;

use crate::copy::{Scratch, copy_into, sized};
use crate::errors::PatchErrorKind;
use crate::kind::{Indirection, Kind, classify};
use crate::value::{Shadow, Target, option_value, reborrow_mut};

/// Write the default value of `shape` into uninitialized memory.
///
/// `Box<T>` gets a fresh allocation holding `T`'s default even when the box
/// type itself publishes no default.
///
/// # Safety
/// - `dst` must be valid, uninitialized memory laid out for `shape`
unsafe fn default_into(shape: &'static Shape, dst: *mut u8) -> Result<(), PatchErrorKind> {
    if let Kind::Indirection(Indirection::Box { pointee }) = classify(shape) {
        let scratch = Scratch::alloc(sized(pointee)?)?;
        // SAFETY: scratch is uninitialized memory laid out for pointee
        unsafe { default_into(pointee, scratch.ptr)? };
        // Box<T> of a sized T is a single owning pointer to a global-allocator
        // block with T's layout, which is exactly what scratch holds.
        // SAFETY: caller guarantees dst is laid out for Box<T>
        unsafe { (dst as *mut *mut u8).write(scratch.into_raw()) };
        return Ok(());
    }

    // SAFETY: caller guarantees dst is uninitialized memory for shape
    let written = unsafe { shape.call_default_in_place(PtrUninit::new(dst)) };
    if written.is_none() {
        return Err(PatchErrorKind::NoDefault { shape });
    }
    Ok(())
}

/// Overwrite `target` wholesale with a copy of `shadow`.
///
/// The shadow is copied before the target is touched, so on error the target
/// is left exactly as it was. On success the old target value has been
/// dropped and its storage holds the copy's bytes.
///
/// # Safety
/// - `target` must point to an initialized value of `target.shape` that no
///   one else is reading or writing for the duration of the call
/// - `shadow` must point to an initialized value of `shadow.shape`
pub(crate) unsafe fn write(target: Target, shadow: Shadow) -> Result<(), PatchErrorKind> {
    if !target.shape.is_shape(shadow.shape) {
        return Err(PatchErrorKind::TypeMismatch {
            target: target.shape,
            shadow: shadow.shape,
        });
    }
    let layout = sized(target.shape)?;

    let scratch = Scratch::alloc(layout)?;
    // SAFETY: scratch is laid out for the shadow's shape, which is the target's
    unsafe { copy_into(shadow.data, shadow.shape, scratch.ptr)? };

    trace!("overwriting {} wholesale", target.shape.type_identifier);

    // SAFETY: target is initialized and exclusively ours (caller contract);
    // scratch holds an initialized value of the same shape, which is moved
    // into the target by the byte copy and never dropped from scratch.
    unsafe {
        target.shape.call_drop_in_place(target.data);
        ptr::copy_nonoverlapping(scratch.ptr, target.data.as_mut_byte_ptr(), layout.size());
    }
    Ok(())
}

/// What [`attach`] put into an absent option.
pub(crate) enum Attached {
    /// A copy of the shadow's pointee; nothing more to patch.
    Snapshot,
    /// A default value that still has to be patched from the shadow.
    Fresh(Target),
}

/// Give an absent option a value so the shadow's pointee has somewhere to land.
///
/// When the option's inner type is the shadow pointee's type, the value is a
/// copy of the pointee. Otherwise it is the inner type's default.
///
/// # Safety
/// - `slot` must point to an initialized `None` of the option described by
///   `option_def`, with the same exclusivity requirement as [`write`]
/// - `shadow` must point to an initialized value of `shadow.shape`
pub(crate) unsafe fn attach(
    slot: Target,
    option_def: &'static OptionDef,
    shadow: Shadow,
) -> Result<Attached, PatchErrorKind> {
    let inner = option_def.t;
    let scratch = Scratch::alloc(sized(inner)?)?;

    let snapshot = inner.is_shape(shadow.shape);
    if snapshot {
        // SAFETY: scratch is laid out for inner, which is the shadow's shape
        unsafe { copy_into(shadow.data, inner, scratch.ptr)? };
    } else {
        // SAFETY: scratch is uninitialized memory laid out for inner
        unsafe { default_into(inner, scratch.ptr)? };
    }

    trace!(
        "attaching {} value to absent {}",
        if snapshot { "copied" } else { "default" },
        slot.shape.type_identifier
    );

    // SAFETY: slot holds None, which owns nothing, so it can be overwritten
    // without a drop; init_some moves the scratch value into the option.
    let option = unsafe {
        (option_def.vtable.init_some)(
            PtrUninit::new(slot.data.as_mut_byte_ptr()),
            scratch.ptr_mut(),
        )
    };

    if snapshot {
        return Ok(Attached::Snapshot);
    }
    // SAFETY: init_some returned the initialized option
    let value = unsafe { option_value(option.as_const(), option_def) }
        .ok_or(PatchErrorKind::AttachFailed { shape: slot.shape })?;
    Ok(Attached::Fresh(Target {
        data: reborrow_mut(value),
        shape: inner,
    }))
}
