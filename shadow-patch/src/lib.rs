//! # shadow-patch
//!
//! Structural patching of values in place: [`patch`] overwrites the fields of
//! a target with the same-named fields of a shadow, following `Option`s,
//! `Box`es, enum variants, arrays and lists on the way down. Types describe
//! themselves through [`facet`](https://docs.rs/facet), which also exposes
//! private fields, so a patch reaches state the target's API does not.

// --- path ---
mod path;
pub use path::{Path, PathSegment};

// --- errors ---
mod errors;
pub use errors::{PatchError, PatchErrorKind};

// --- kind ---
mod kind;
pub use kind::{Elements, Indirection, Kind, classify};

// --- value views ---
pub(crate) mod value;

// --- enum helpers ---
pub(crate) mod enum_helpers;

// --- deep copy ---
pub(crate) mod copy;

// --- writer ---
pub(crate) mod write;

// --- handle ---
mod handle;
pub use handle::Handle;

// --- patch ---
mod patch;
pub use patch::patch;
