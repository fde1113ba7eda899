//! The patch entry point and the dispatcher that walks a target.
//!
//! [`patch`] resolves its two handles into addressable storage, then
//! [`dispatch`] classifies the target at each level and hands it to the
//! handler for its kind. Handlers recurse through `dispatch` and annotate
//! errors with the segment they were working on as they unwind.

mod elements;
mod fields;
mod indirect;
mod slot;

use log::trace;

use crate::errors::{PatchError, PatchErrorKind};
use crate::handle::Handle;
use crate::kind::{Kind, classify};
use crate::value::{Shadow, Target};
use crate::write::write;

/// Overwrite fields of `target` with the same-named fields of `shadow`.
///
/// Matching is by field name, so `shadow` may be a different type that only
/// mirrors the parts of the target it wants to replace; fields it lacks are
/// left alone. Where the two sides have the same type the target value is
/// replaced wholesale with a clone of the shadow's. Private fields are
/// patched like public ones.
///
/// Both sides usually come in as references:
///
/// ```
/// use facet::Facet;
///
/// #[derive(Facet)]
/// struct Server {
///     port: u16,
///     verbose: bool,
/// }
///
/// #[derive(Facet)]
/// struct Overrides {
///     verbose: bool,
/// }
///
/// let mut server = Server { port: 8080, verbose: false };
/// shadow_patch::patch(&mut server, &Overrides { verbose: true }).unwrap();
/// assert_eq!(server.port, 8080);
/// assert!(server.verbose);
/// ```
///
/// See [`Handle`] for which other forms each side accepts.
///
/// Patching stops at the first error, which carries the path to where it
/// happened. Fields visited before the error keep their new values.
pub fn patch<'t, 's>(
    target: impl Into<Handle<'t>>,
    shadow: impl Into<Handle<'s>>,
) -> Result<(), PatchError> {
    let target = target.into();
    let shadow = shadow.into();

    if target.is_addressable() && shadow.is_addressable() {
        return patch_resolved(&target, &shadow);
    }

    let target = target
        .elem()
        .ok_or(PatchErrorKind::UnaddressableTarget)?;
    let shadow = shadow
        .elem()
        .ok_or(PatchErrorKind::UnaddressableShadow)?;
    patch_resolved(&target, &shadow)
}

fn patch_resolved(target: &Handle<'_>, shadow: &Handle<'_>) -> Result<(), PatchError> {
    let target = target
        .target()
        .ok_or(PatchErrorKind::UnaddressableTarget)?;
    let shadow = shadow
        .shadow()
        .ok_or(PatchErrorKind::UnaddressableShadow)?;
    // SAFETY: handles borrow their storage for at least this call, and a
    // mutable target handle was built from exclusive access.
    unsafe { dispatch(target, shadow) }
}

/// Patch `target` from `shadow` according to the target's kind.
///
/// # Safety
/// - `target` must point to an initialized value of `target.shape` that no
///   one else accesses for the duration of the call
/// - `shadow` must point to an initialized value of `shadow.shape`
/// - the two must not overlap
pub(crate) unsafe fn dispatch(target: Target, shadow: Shadow) -> Result<(), PatchError> {
    let kind = classify(target.shape);
    trace!(
        "patching {} {} from {}",
        kind.name(),
        target.shape.type_identifier,
        shadow.shape.type_identifier
    );

    // SAFETY: forwarded from the caller
    unsafe {
        match kind {
            Kind::Indirection(indirection) => indirect::patch_indirect(target, indirection, shadow),
            Kind::Slot(enum_type) => slot::patch_slot(target, enum_type, shadow),
            Kind::Fields(fields) => fields::patch_fields(target, fields, shadow),
            Kind::Elements(elements) => elements::patch_elements(target, elements, shadow),
            Kind::Scalar => patch_scalar(target, shadow),
        }
    }
}

/// # Safety
/// - same as [`dispatch`]
unsafe fn patch_scalar(target: Target, shadow: Shadow) -> Result<(), PatchError> {
    // SAFETY: forwarded from the caller
    unsafe { write(target, shadow) }.map_err(PatchError::from)
}
