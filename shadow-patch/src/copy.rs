//! Deep copies of shadow values into uninitialized memory.
//!
//! A copy never shares storage with its source. Types that publish a clone
//! function are copied with it. The standard containers publish none, so they
//! are rebuilt through their vtables from copies of their contents: options,
//! boxes, `Rc`/`Arc`, lists, maps, sets, results, arrays and tuples.

use std::alloc::{Layout, alloc, dealloc};
use std::ptr;

use facet_core::{
    Def, KnownPointer, ListDef, MapDef, OptionDef, PointerDef, PtrConst, PtrMut, PtrUninit,
    ResultDef, SequenceType, SetDef, Shape, StructKind, Type, UserType,
};

use crate::errors::PatchErrorKind;
use crate::value::{box_pointee, option_value};

/// Heap memory for one value that is built before it is moved into place.
///
/// Dropping a `Scratch` frees the memory but never drops its contents: by then
/// the contents have either been moved out or were never initialized.
pub(crate) struct Scratch {
    pub ptr: *mut u8,
    layout: Layout,
}

impl Scratch {
    pub fn alloc(layout: Layout) -> Result<Self, PatchErrorKind> {
        let ptr = if layout.size() == 0 {
            // Zero-sized values live at any well-aligned non-null address.
            ptr::null_mut::<u8>().wrapping_add(layout.align())
        } else {
            // SAFETY: layout has non-zero size
            let ptr = unsafe { alloc(layout) };
            if ptr.is_null() {
                return Err(PatchErrorKind::AllocFailed { layout });
            }
            ptr
        };
        Ok(Self { ptr, layout })
    }

    pub fn ptr_mut(&self) -> PtrMut {
        PtrMut::new(self.ptr)
    }

    /// Give up ownership of the allocation, e.g. because a `Box` now owns it.
    pub fn into_raw(self) -> *mut u8 {
        let ptr = self.ptr;
        std::mem::forget(self);
        ptr
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: ptr was allocated with this layout in Scratch::alloc
            unsafe { dealloc(self.ptr, self.layout) };
        }
    }
}

pub(crate) fn sized(shape: &'static Shape) -> Result<Layout, PatchErrorKind> {
    shape
        .layout
        .sized_layout()
        .map_err(|_| PatchErrorKind::Unsized { shape })
}

/// A copy living in scratch memory until a container takes it.
///
/// Dropped before [`Staged::hand_over`], the copy itself is dropped too.
struct Staged {
    scratch: Scratch,
    shape: &'static Shape,
    moved: bool,
}

impl Staged {
    /// # Safety
    /// - `src` must point to an initialized value of `shape`
    unsafe fn copy_of(src: PtrConst, shape: &'static Shape) -> Result<Self, PatchErrorKind> {
        let scratch = Scratch::alloc(sized(shape)?)?;
        // SAFETY: scratch is uninitialized memory laid out for shape
        unsafe { copy_into(src, shape, scratch.ptr)? };
        Ok(Self {
            scratch,
            shape,
            moved: false,
        })
    }

    /// Pointer for a vtable function that moves the value out.
    fn hand_over(&mut self) -> PtrMut {
        self.moved = true;
        self.scratch.ptr_mut()
    }
}

impl Drop for Staged {
    fn drop(&mut self) {
        if !self.moved {
            // SAFETY: the copy is initialized and nobody took it
            unsafe { self.shape.call_drop_in_place(self.scratch.ptr_mut()) };
        }
    }
}

/// Copy the value of `shape` at `src` into uninitialized memory at `dst`.
///
/// On error `dst` is left uninitialized and everything copied so far has
/// been dropped.
///
/// # Safety
/// - `src` must point to an initialized value of `shape`
/// - `dst` must be valid, uninitialized memory laid out for `shape`
pub(crate) unsafe fn copy_into(
    src: PtrConst,
    shape: &'static Shape,
    dst: *mut u8,
) -> Result<(), PatchErrorKind> {
    // SAFETY: forwarded from the caller; each arm matches the shape's def
    unsafe {
        match &shape.def {
            Def::Option(option_def) => copy_option(src, option_def, dst),
            Def::Pointer(ptr_def) => copy_pointer(src, shape, ptr_def, dst),
            Def::List(list_def) => copy_list(src, shape, list_def, dst),
            Def::Map(map_def) => copy_map(src, shape, map_def, dst),
            Def::Set(set_def) => copy_set(src, shape, set_def, dst),
            Def::Result(result_def) => copy_result(src, result_def, dst),
            _ => match &shape.ty {
                Type::Sequence(SequenceType::Array(array)) => {
                    let element = array.t;
                    let stride = sized(element)?.size();
                    copy_parts(src, dst, (0..array.n).map(move |i| (i * stride, element)))
                }
                Type::User(UserType::Struct(st)) if matches!(st.kind, StructKind::Tuple) => {
                    copy_parts(src, dst, st.fields.iter().map(|f| (f.offset, f.shape())))
                }
                _ => clone_into(src, shape, dst),
            },
        }
    }
}

unsafe fn clone_into(
    src: PtrConst,
    shape: &'static Shape,
    dst: *mut u8,
) -> Result<(), PatchErrorKind> {
    // SAFETY: caller guarantees both pointers match shape
    unsafe { shape.call_clone_into(src, PtrMut::new(dst)) }
        .ok_or(PatchErrorKind::NotCloneable { shape })
}

unsafe fn copy_option(
    src: PtrConst,
    option_def: &'static OptionDef,
    dst: *mut u8,
) -> Result<(), PatchErrorKind> {
    let dst = PtrUninit::new(dst);
    // SAFETY: caller guarantees src is an initialized option and dst its storage
    unsafe {
        match option_value(src, option_def) {
            None => {
                (option_def.vtable.init_none)(dst);
            }
            Some(value) => {
                let mut inner = Staged::copy_of(value, option_def.t)?;
                (option_def.vtable.init_some)(dst, inner.hand_over());
            }
        }
    }
    Ok(())
}

unsafe fn copy_pointer(
    src: PtrConst,
    shape: &'static Shape,
    ptr_def: &'static PointerDef,
    dst: *mut u8,
) -> Result<(), PatchErrorKind> {
    let Some(pointee) = ptr_def
        .pointee
        .filter(|pointee| pointee.layout.sized_layout().is_ok())
    else {
        // SAFETY: forwarded from the caller
        return unsafe { clone_into(src, shape, dst) };
    };
    let vtable = ptr_def.vtable;

    match ptr_def.known {
        Some(KnownPointer::Box) => {
            let scratch = Scratch::alloc(sized(pointee)?)?;
            // SAFETY: src is a Box<T> of a sized T, scratch is laid out for T.
            // Box<T> is a single owning pointer to a global-allocator block
            // with T's layout, which is exactly what scratch holds.
            unsafe {
                copy_into(PtrConst::new(box_pointee(src).cast_const()), pointee, scratch.ptr)?;
                (dst as *mut *mut u8).write(scratch.into_raw());
            }
            Ok(())
        }
        Some(KnownPointer::Rc | KnownPointer::Arc) => {
            let (Some(borrow), Some(new_into)) = (vtable.borrow_fn, vtable.new_into_fn) else {
                // SAFETY: forwarded from the caller
                return unsafe { clone_into(src, shape, dst) };
            };
            // SAFETY: src is an initialized pointer of this def; new_into
            // moves the copied pointee into a fresh allocation at dst
            unsafe {
                let mut inner = Staged::copy_of(borrow(src), pointee)?;
                new_into(PtrUninit::new(dst), inner.hand_over());
            }
            Ok(())
        }
        // SAFETY: forwarded from the caller
        _ => unsafe { clone_into(src, shape, dst) },
    }
}

unsafe fn copy_list(
    src: PtrConst,
    shape: &'static Shape,
    list_def: &'static ListDef,
    dst: *mut u8,
) -> Result<(), PatchErrorKind> {
    let (Some(init), Some(push)) = (list_def.init_in_place_with_capacity(), list_def.push())
    else {
        // SAFETY: forwarded from the caller
        return unsafe { clone_into(src, shape, dst) };
    };

    // SAFETY: caller guarantees src is an initialized list and dst its storage
    unsafe {
        let len = (list_def.vtable.len)(src);
        let list = init(PtrUninit::new(dst), len);
        let filled = (0..len).try_for_each(|i| -> Result<(), PatchErrorKind> {
            let item = (list_def.vtable.get)(src, i, shape)
                .ok_or(PatchErrorKind::UnsupportedList { shape })?;
            let mut item = Staged::copy_of(item, list_def.t)?;
            push(list, item.hand_over());
            Ok(())
        });
        undo_unless_filled(filled, shape, list)
    }
}

unsafe fn copy_map(
    src: PtrConst,
    shape: &'static Shape,
    map_def: &'static MapDef,
    dst: *mut u8,
) -> Result<(), PatchErrorKind> {
    let vtable = map_def.vtable;
    let Some(iter_init) = vtable.iter_vtable.init_with_value else {
        // SAFETY: forwarded from the caller
        return unsafe { clone_into(src, shape, dst) };
    };

    // SAFETY: caller guarantees src is an initialized map and dst its storage
    unsafe {
        let map = (vtable.init_in_place_with_capacity)(PtrUninit::new(dst), (vtable.len)(src));
        let iter = iter_init(src);
        let mut filled = Ok(());
        while let Some((key, value)) = (vtable.iter_vtable.next)(iter) {
            filled = Staged::copy_of(key, map_def.k).and_then(|mut key| {
                let mut value = Staged::copy_of(value, map_def.v)?;
                (vtable.insert)(map, key.hand_over(), value.hand_over());
                Ok(())
            });
            if filled.is_err() {
                break;
            }
        }
        (vtable.iter_vtable.dealloc)(iter);
        undo_unless_filled(filled, shape, map)
    }
}

unsafe fn copy_set(
    src: PtrConst,
    shape: &'static Shape,
    set_def: &'static SetDef,
    dst: *mut u8,
) -> Result<(), PatchErrorKind> {
    let vtable = set_def.vtable;
    let Some(iter_init) = vtable.iter_vtable.init_with_value else {
        // SAFETY: forwarded from the caller
        return unsafe { clone_into(src, shape, dst) };
    };

    // SAFETY: caller guarantees src is an initialized set and dst its storage
    unsafe {
        let set = (vtable.init_in_place_with_capacity)(PtrUninit::new(dst), (vtable.len)(src));
        let iter = iter_init(src);
        let mut filled = Ok(());
        while let Some(item) = (vtable.iter_vtable.next)(iter) {
            filled = Staged::copy_of(item, set_def.t).map(|mut item| {
                (vtable.insert)(set, item.hand_over());
            });
            if filled.is_err() {
                break;
            }
        }
        (vtable.iter_vtable.dealloc)(iter);
        undo_unless_filled(filled, shape, set)
    }
}

unsafe fn copy_result(
    src: PtrConst,
    result_def: &'static ResultDef,
    dst: *mut u8,
) -> Result<(), PatchErrorKind> {
    let vtable = result_def.vtable;
    let dst = PtrUninit::new(dst);
    // SAFETY: caller guarantees src is an initialized result and dst its storage
    unsafe {
        if (vtable.is_ok)(src) {
            let mut ok = Staged::copy_of(PtrConst::new((vtable.get_ok)(src)), result_def.t)?;
            (vtable.init_ok)(dst, ok.hand_over());
        } else {
            let mut err = Staged::copy_of(PtrConst::new((vtable.get_err)(src)), result_def.e)?;
            (vtable.init_err)(dst, err.hand_over());
        }
    }
    Ok(())
}

/// Copy the parts of an inline aggregate one by one, given as
/// `(offset, shape)` pairs.
///
/// # Safety
/// - every part must be an initialized value at its offset from `src`, and
///   `dst` must be uninitialized memory with the same layout
unsafe fn copy_parts<I>(src: PtrConst, dst: *mut u8, parts: I) -> Result<(), PatchErrorKind>
where
    I: Iterator<Item = (usize, &'static Shape)> + Clone,
{
    for (done, (offset, shape)) in parts.clone().enumerate() {
        // SAFETY: caller guarantees the part layout for both sides
        let copied = unsafe { copy_into(src.field(offset), shape, dst.add(offset)) };
        if let Err(err) = copied {
            for (offset, shape) in parts.take(done) {
                // SAFETY: parts before `done` were copied successfully
                unsafe { shape.call_drop_in_place(PtrMut::new(dst.add(offset))) };
            }
            return Err(err);
        }
    }
    Ok(())
}

/// Drop a container whose filling failed, leaving its storage uninitialized.
///
/// # Safety
/// - `container` must be an initialized value of `shape`
unsafe fn undo_unless_filled(
    filled: Result<(), PatchErrorKind>,
    shape: &'static Shape,
    container: PtrMut,
) -> Result<(), PatchErrorKind> {
    if filled.is_err() {
        // SAFETY: caller guarantees the container is initialized
        unsafe { shape.call_drop_in_place(container) };
    }
    filled
}
