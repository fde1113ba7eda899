//! `Option` and `Box`: follow both sides to their pointees.

use facet_core::{PtrConst, PtrMut};
use log::trace;

use crate::errors::{PatchError, PatchErrorKind};
use crate::kind::{Indirection, Kind, classify};
use crate::value::{Shadow, Target, box_pointee, option_value, reborrow_mut};
use crate::write::{Attached, attach};

use super::dispatch;

/// Patch the pointee of `target` from the pointee of `shadow`.
///
/// An absent shadow pointee leaves the target alone. An absent target
/// pointee gets a value attached first.
///
/// # Safety
/// - same as [`dispatch`], with `indirection` describing `target.shape`
pub(crate) unsafe fn patch_indirect(
    target: Target,
    indirection: Indirection,
    shadow: Shadow,
) -> Result<(), PatchError> {
    let Kind::Indirection(shadow_indirection) = classify(shadow.shape) else {
        return Err(PatchErrorKind::KindMismatch {
            expected: "indirection",
            shadow: shadow.shape,
        }
        .into());
    };

    // SAFETY: shadow is an initialized value of the classified shape
    let Some(source) = (unsafe { pointee(shadow, shadow_indirection) }) else {
        trace!("shadow {} is absent, nothing to do", shadow.shape.type_identifier);
        return Ok(());
    };

    // SAFETY: target is an initialized value of the classified shape, and we
    // have exclusive access to it
    let dest = unsafe {
        match indirection {
            Indirection::Box { pointee } => Target {
                data: PtrMut::new(box_pointee(target.as_const())),
                shape: pointee,
            },
            Indirection::Option(option_def) => match option_value(target.as_const(), option_def) {
                Some(present) => Target {
                    data: reborrow_mut(present),
                    shape: option_def.t,
                },
                None => match attach(target, option_def, source)? {
                    Attached::Snapshot => return Ok(()),
                    Attached::Fresh(fresh) => fresh,
                },
            },
        }
    };

    // SAFETY: dest is owned by target and disjoint from the shadow
    unsafe { dispatch(dest, source) }
}

/// Resolve a shadow indirection to the value it points at, if any.
///
/// # Safety
/// - `value` must point to an initialized value described by `indirection`
unsafe fn pointee(value: Shadow, indirection: Indirection) -> Option<Shadow> {
    // SAFETY: forwarded from the caller
    unsafe {
        match indirection {
            Indirection::Box { pointee } => Some(Shadow {
                data: PtrConst::new(box_pointee(value.data).cast_const()),
                shape: pointee,
            }),
            Indirection::Option(option_def) => Some(Shadow {
                data: option_value(value.data, option_def)?,
                shape: option_def.t,
            }),
        }
    }
}
