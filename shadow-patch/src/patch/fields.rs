//! Structs, tuples and struct-like enum variants, matched by field name.

use facet_core::Field;

use crate::errors::{PatchError, PatchErrorKind};
use crate::kind::{Kind, classify};
use crate::path::PathSegment;
use crate::value::{Shadow, Target};
use crate::write::write;

use super::dispatch;

/// Patch each field of `target` from the shadow field of the same name.
///
/// `fields` are the fields of the value at `target`: the struct's own, or
/// those of the enum variant it currently stores.
///
/// # Safety
/// - same as [`dispatch`], with `fields` describing the value at `target`
pub(crate) unsafe fn patch_fields(
    target: Target,
    fields: &'static [Field],
    shadow: Shadow,
) -> Result<(), PatchError> {
    let Kind::Fields(shadow_fields) = classify(shadow.shape) else {
        return Err(PatchErrorKind::KindMismatch {
            expected: "struct",
            shadow: shadow.shape,
        }
        .into());
    };

    for field in fields {
        let Some(shadow_field) = shadow_fields.iter().find(|f| f.name == field.name) else {
            continue;
        };

        // SAFETY: both fields belong to the values their sides point at
        let (target_field, shadow_field) =
            unsafe { (target.field(field), shadow.field(shadow_field)) };

        let result = if target_field.shape.is_shape(shadow_field.shape) {
            // SAFETY: forwarded from the caller
            unsafe { write(target_field, shadow_field) }.map_err(PatchError::from)
        } else {
            // SAFETY: forwarded from the caller
            unsafe { dispatch(target_field, shadow_field) }
        };
        result.map_err(|err| err.within(PathSegment::Field(field.name)))?;
    }
    Ok(())
}
