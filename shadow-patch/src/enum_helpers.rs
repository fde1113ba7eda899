//! Helpers for reading which variant an enum currently stores.

use facet_core::{EnumRepr, EnumType, PtrConst, Shape, Variant};

use crate::errors::PatchErrorKind;

macro_rules! impl_read_discriminant {
    ($($repr:ident => $ty:ty),* $(,)?) => {
        /// Read the discriminant from an initialized enum value.
        ///
        /// Returns `None` for representations without a stored tag
        /// (niche-optimised enums).
        ///
        /// # Safety
        /// - `data` must point to a valid, initialized enum value of type `enum_type`
        unsafe fn read_discriminant(data: PtrConst, enum_type: &EnumType) -> Option<i64> {
            unsafe {
                match enum_type.enum_repr {
                    $(EnumRepr::$repr => Some(*(data.as_byte_ptr() as *const $ty) as i64),)*
                    _ => None,
                }
            }
        }
    };
}

impl_read_discriminant! {
    U8 => u8,
    U16 => u16,
    U32 => u32,
    U64 => u64,
    I8 => i8,
    I16 => i16,
    I32 => i32,
    I64 => i64,
    USize => usize,
    ISize => isize,
}

/// Find the variant currently stored in an enum value.
///
/// # Safety
/// - `data` must point to a valid, initialized value of `shape`, whose type is `enum_type`
pub(crate) unsafe fn active_variant(
    data: PtrConst,
    shape: &'static Shape,
    enum_type: &'static EnumType,
) -> Result<&'static Variant, PatchErrorKind> {
    // SAFETY: caller guarantees data is an initialized enum of this type
    let discriminant = unsafe { read_discriminant(data, enum_type) }
        .ok_or(PatchErrorKind::UnsupportedEnumRepr { shape })?;

    enum_type
        .variants
        .iter()
        .find(|variant| variant.discriminant == Some(discriminant))
        .ok_or(PatchErrorKind::UnknownVariant {
            shape,
            discriminant,
        })
}

/// The single positional value a variant like `Variant(x)` carries, if that is its shape.
pub(crate) fn single_payload(variant: &'static Variant) -> Option<&'static facet_core::Field> {
    match variant.data.fields {
        [payload] if payload.name == "0" => Some(payload),
        _ => None,
    }
}
