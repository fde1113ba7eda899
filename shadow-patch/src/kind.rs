//! Classification of shapes into the handful of kinds the patcher walks.
//!
//! The set is closed: anything that is not an indirection, a polymorphic
//! slot, or an aggregate is a scalar and gets overwritten wholesale.

use facet_core::{
    Def, EnumType, Field, KnownPointer, ListDef, OptionDef, SequenceType, Shape, Type, UserType,
};

/// How a value of a given shape is patched.
#[derive(Clone, Copy)]
pub enum Kind {
    /// Pointer-like value whose pointee may be absent.
    Indirection(Indirection),
    /// Enum: the declared type is fixed, the stored variant is not.
    Slot(&'static EnumType),
    /// Struct or tuple, accessed by field name.
    Fields(&'static [Field]),
    /// Array or list, accessed by position.
    Elements(Elements),
    /// Everything else, including maps and shared pointers.
    Scalar,
}

/// The two indirections the patcher can follow.
#[derive(Clone, Copy)]
pub enum Indirection {
    /// `Option<T>`; `None` is the absent pointee.
    Option(&'static OptionDef),
    /// `Box<T>` with a sized `T`; never absent.
    Box { pointee: &'static Shape },
}

/// Positional aggregates.
#[derive(Clone, Copy)]
pub enum Elements {
    /// `[T; N]`, stored inline.
    Array { element: &'static Shape, len: usize },
    /// `Vec<T>` and other lists exposing a contiguous buffer.
    List(&'static ListDef),
}

impl Kind {
    /// Short name used in log records and kind-mismatch errors.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Indirection(Indirection::Option(_)) => "option",
            Kind::Indirection(Indirection::Box { .. }) => "box",
            Kind::Slot(_) => "enum",
            Kind::Fields(_) => "struct",
            Kind::Elements(Elements::Array { .. }) => "array",
            Kind::Elements(Elements::List(_)) => "list",
            Kind::Scalar => "scalar",
        }
    }
}

/// Classify a shape.
pub fn classify(shape: &'static Shape) -> Kind {
    // Check Def first because Option/Result have Def::Option/Result
    // but are also UserType::Enum at the ty level
    match &shape.def {
        Def::Option(option_def) => return Kind::Indirection(Indirection::Option(option_def)),
        Def::Pointer(ptr_def) => {
            // Only uniquely owned pointers are walked; Rc/Arc contents are shared.
            if matches!(ptr_def.known, Some(KnownPointer::Box))
                && let Some(pointee) = ptr_def.pointee
                && pointee.layout.sized_layout().is_ok()
            {
                return Kind::Indirection(Indirection::Box { pointee });
            }
            return Kind::Scalar;
        }
        Def::List(list_def) => return Kind::Elements(Elements::List(list_def)),
        Def::Map(_) | Def::Set(_) | Def::Result(_) => return Kind::Scalar,
        _ => {}
    }

    match &shape.ty {
        Type::User(UserType::Struct(st)) => Kind::Fields(st.fields),
        Type::User(UserType::Enum(et)) => Kind::Slot(et),
        Type::Sequence(SequenceType::Array(a)) => Kind::Elements(Elements::Array {
            element: a.t,
            len: a.n,
        }),
        _ => Kind::Scalar,
    }
}
