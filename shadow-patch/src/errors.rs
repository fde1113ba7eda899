//! Error types for patching.

use std::alloc::Layout;
use std::fmt;

use facet_core::Shape;

use crate::path::{Path, PathSegment};

/// An error during patching, with the path at which it occurred.
pub struct PatchError {
    pub path: Path,
    pub kind: PatchErrorKind,
}

impl PatchError {
    /// Create an error at the root of the patch.
    pub fn at_root(kind: PatchErrorKind) -> Self {
        Self {
            path: Path::root(),
            kind,
        }
    }

    /// Annotate the error with the segment of the enclosing level.
    pub(crate) fn within(mut self, seg: PathSegment) -> Self {
        self.path.push_outer(seg);
        self
    }
}

impl From<PatchErrorKind> for PatchError {
    fn from(kind: PatchErrorKind) -> Self {
        Self::at_root(kind)
    }
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.path, self.kind)
        }
    }
}

impl fmt::Debug for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for PatchError {}

/// The kind of patch error.
pub enum PatchErrorKind {
    /// Target does not resolve to mutable, addressable storage.
    UnaddressableTarget,
    /// Shadow does not resolve to readable, addressable storage.
    UnaddressableShadow,
    /// Corresponding sequences differ in element count.
    LengthMismatch { target: usize, shadow: usize },
    /// Wholesale overwrite between different types.
    TypeMismatch {
        target: &'static Shape,
        shadow: &'static Shape,
    },
    /// Shadow cannot be walked the way the target requires.
    KindMismatch {
        expected: &'static str,
        shadow: &'static Shape,
    },
    /// Type has no clone implementation to copy it from the shadow.
    NotCloneable { shape: &'static Shape },
    /// Type has no default to back a newly attached value.
    NoDefault { shape: &'static Shape },
    /// Option still reads as absent after a value was attached to it.
    AttachFailed { shape: &'static Shape },
    /// Cannot allocate or copy an unsized type.
    Unsized { shape: &'static Shape },
    /// Scratch allocation failed.
    AllocFailed { layout: Layout },
    /// Enum representation does not allow reading the active variant.
    UnsupportedEnumRepr { shape: &'static Shape },
    /// Discriminant does not match any declared variant.
    UnknownVariant {
        shape: &'static Shape,
        discriminant: i64,
    },
    /// List type doesn't expose its element buffer.
    UnsupportedList { shape: &'static Shape },
}

impl fmt::Display for PatchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchErrorKind::UnaddressableTarget => write!(f, "cannot patch unaddressable value"),
            PatchErrorKind::UnaddressableShadow => write!(f, "cannot use unaddressable shadow"),
            PatchErrorKind::LengthMismatch { target, shadow } => {
                write!(
                    f,
                    "cannot patch sequences of different length (target has {}, shadow has {})",
                    target, shadow
                )
            }
            PatchErrorKind::TypeMismatch { target, shadow } => {
                write!(
                    f,
                    "Type mismatch: cannot overwrite {} with {}",
                    target.type_identifier, shadow.type_identifier
                )
            }
            PatchErrorKind::KindMismatch { expected, shadow } => {
                write!(
                    f,
                    "Kind mismatch: expected {} shadow, got {}",
                    expected, shadow.type_identifier
                )
            }
            PatchErrorKind::NotCloneable { shape } => {
                write!(f, "{} cannot be cloned", shape.type_identifier)
            }
            PatchErrorKind::NoDefault { shape } => {
                write!(f, "No default for {}", shape.type_identifier)
            }
            PatchErrorKind::AttachFailed { shape } => {
                write!(f, "{} is still None after attaching a value", shape.type_identifier)
            }
            PatchErrorKind::Unsized { shape } => {
                write!(f, "Cannot copy unsized type {}", shape.type_identifier)
            }
            PatchErrorKind::AllocFailed { layout } => {
                write!(
                    f,
                    "Allocation failed for size={}, align={}",
                    layout.size(),
                    layout.align()
                )
            }
            PatchErrorKind::UnsupportedEnumRepr { shape } => {
                write!(
                    f,
                    "Enum {} has unsupported representation",
                    shape.type_identifier
                )
            }
            PatchErrorKind::UnknownVariant {
                shape,
                discriminant,
            } => {
                write!(
                    f,
                    "Enum {} has no variant with discriminant {}",
                    shape.type_identifier, discriminant
                )
            }
            PatchErrorKind::UnsupportedList { shape } => {
                write!(
                    f,
                    "List type {} doesn't expose its element buffer",
                    shape.type_identifier
                )
            }
        }
    }
}

impl fmt::Debug for PatchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
