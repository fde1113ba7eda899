//! Enums: the declared type is fixed, the stored variant is patched.

use facet_core::EnumType;

use crate::enum_helpers::{active_variant, single_payload};
use crate::errors::PatchError;
use crate::value::{Shadow, Target};
use crate::write::write;

use super::dispatch;
use super::fields::patch_fields;

/// Patch an enum from `shadow`.
///
/// A shadow of the enum's own type replaces the stored variant outright.
/// Any other shadow is applied to the variant currently stored, which keeps
/// its discriminant.
///
/// # Safety
/// - same as [`dispatch`], with `enum_type` describing `target.shape`
pub(crate) unsafe fn patch_slot(
    target: Target,
    enum_type: &'static EnumType,
    shadow: Shadow,
) -> Result<(), PatchError> {
    if target.shape.is_shape(shadow.shape) {
        // SAFETY: forwarded from the caller
        return unsafe { write(target, shadow) }.map_err(PatchError::from);
    }

    // SAFETY: target is an initialized value of this enum
    let variant = unsafe { active_variant(target.as_const(), target.shape, enum_type) }?;

    match single_payload(variant) {
        Some(payload) => {
            // SAFETY: payload is a field of the stored variant
            let stored = unsafe { target.field(payload) };
            // SAFETY: forwarded from the caller
            unsafe { dispatch(stored, shadow) }
        }
        // SAFETY: the fields are those of the stored variant
        None => unsafe { patch_fields(target, variant.data.fields, shadow) },
    }
}
