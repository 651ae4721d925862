use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;

#[cfg(target_has_atomic = "ptr")]
use alloc::sync::Arc;

// -----------------------------------------------------------------------------
// HandleKind

/// The ownership model of a handle that a container may wrap.
///
/// The set is closed: every [`Handle`] belongs to exactly one kind and no
/// other handle types exist.
///
/// | Kind       | Handles            |
/// |------------|--------------------|
/// | `Borrowed` | `*mut T`           |
/// | `Shared`   | `Rc<T>`, `Arc<T>`  |
/// | `Unique`   | `Box<T>`           |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// No ownership, the lifetime of the pointee is unmanaged.
    Borrowed,
    /// Reference counted, any number of co-owners.
    Shared,
    /// A single exclusive owner.
    Unique,
}

impl HandleKind {
    /// Returns a lowercase name of the kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use ns_ptr::HandleKind;
    ///
    /// assert_eq!(HandleKind::Shared.name(), "shared");
    /// ```
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            HandleKind::Borrowed => "borrowed",
            HandleKind::Shared => "shared",
            HandleKind::Unique => "unique",
        }
    }

    /// Returns `true` if dropping a handle of this kind can free its storage.
    #[inline]
    pub const fn is_owning(self) -> bool {
        !matches!(self, HandleKind::Borrowed)
    }
}

impl fmt::Display for HandleKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// Handle

mod sealed {
    pub trait Sealed {}
}

/// The element type referenced by the handle `H`.
///
/// # Examples
///
/// ```
/// use ns_ptr::ElementOf;
/// use std::rc::Rc;
///
/// let x: ElementOf<Rc<u32>> = 7u32;
/// ```
pub type ElementOf<H> = <H as Handle>::Element;

/// A pointer-like handle that [`Nullable`] and [`NotNull`] can wrap.
///
/// This trait is sealed. It is implemented for `*mut T`, `Rc<T>`, `Arc<T>`
/// and `Box<T>`, and for nothing else, so that naming a container over any
/// other type fails to build.
///
/// The methods are building blocks for the containers. Callers normally
/// go through [`Nullable`] and [`NotNull`] instead.
///
/// ```compile_fail,E0277
/// use ns_ptr::Nullable;
///
/// let x: Nullable<String> = Nullable::empty();
/// ```
///
/// ```compile_fail,E0277
/// use ns_ptr::NotNull;
///
/// let x: NotNull<String> = NotNull::make_from(String::new());
/// ```
///
/// [`Nullable`]: crate::Nullable
/// [`NotNull`]: crate::NotNull
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a supported handle kind",
    label = "unsupported handle",
    note = "only `*mut T` (borrowed), `Rc<T>` or `Arc<T>` (shared) and `Box<T>` (unique) can be wrapped"
)]
pub trait Handle: sealed::Sealed + Sized {
    /// The type of the referenced value.
    type Element;

    /// The ownership kind of this handle.
    const KIND: HandleKind;

    /// Moves `value` into freshly allocated storage and returns a handle to it.
    ///
    /// For `*mut T` the storage comes from a leaked `Box`; nothing frees it
    /// until it is passed back to [`Box::from_raw`].
    fn allocate(value: Self::Element) -> Self;

    /// Returns `true` if the handle references nothing.
    ///
    /// Only a null `*mut T` can be such a handle.
    fn is_null_handle(this: &Self) -> bool;

    /// Returns the address of the referenced element without reading it.
    fn element_ptr(this: &Self) -> *const Self::Element;

    /// Returns a reference to the element.
    ///
    /// # Safety
    ///
    /// The handle must not be null, and for `*mut T` the pointee must be valid
    /// for reads for the returned lifetime with no concurrent mutable access.
    unsafe fn element(this: &Self) -> &Self::Element;
}

// -----------------------------------------------------------------------------
// Capabilities

/// A handle that owns its storage: `Rc<T>`, `Arc<T>` or `Box<T>`.
///
/// The element of an owning handle is valid for as long as the handle is,
/// so it can be read without `unsafe`.
///
/// Like the rest of the handle traits, its functions take `this` instead of
/// `self`, so methods of the element keep their names.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not own its storage",
    label = "borrowed handle",
    note = "a `*mut T` is wrapped with the unsafe `Nullable::from_raw`; a `NotNull` over it only comes from expansion"
)]
pub trait Owning: Handle {
    /// Returns a reference to the element.
    fn get(this: &Self) -> &Self::Element;
}

/// A handle that can be duplicated so both copies reference the same storage:
/// `*mut T`, `Rc<T>` or `Arc<T>`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be aliased",
    label = "exclusive handle",
    note = "a `Box<T>` has a single owner; move it out with `take_not_null` instead"
)]
pub trait Aliasable: Handle {
    /// Returns a second handle to the same storage.
    ///
    /// For shared handles this adds one to the reference count.
    fn alias(this: &Self) -> Self;
}

/// A reference counted handle: `Rc<T>` or `Arc<T>`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not reference counted",
    label = "no reference count",
    note = "only `Rc<T>` and `Arc<T>` report a use count"
)]
pub trait SharedHandle: Aliasable + Owning {
    /// Returns the number of live co-owners.
    fn strong_count(this: &Self) -> usize;

    /// Returns a mutable reference if no other co-owner exists.
    fn get_mut(this: &mut Self) -> Option<&mut Self::Element>;

    /// Returns a mutable reference, cloning the element first if other
    /// co-owners exist.
    fn make_mut(this: &mut Self) -> &mut Self::Element
    where
        Self::Element: Clone;
}

// -----------------------------------------------------------------------------
// Borrowed

impl<T> sealed::Sealed for *mut T {}

impl<T> Handle for *mut T {
    type Element = T;
    const KIND: HandleKind = HandleKind::Borrowed;

    #[inline]
    fn allocate(value: T) -> Self {
        let ptr = Box::into_raw(Box::new(value));
        log::trace!(
            "allocated borrowed `{}` at {ptr:p}",
            core::any::type_name::<T>()
        );
        ptr
    }

    #[inline(always)]
    fn is_null_handle(this: &Self) -> bool {
        this.is_null()
    }

    #[inline(always)]
    fn element_ptr(this: &Self) -> *const T {
        this.cast_const()
    }

    #[inline(always)]
    unsafe fn element(this: &Self) -> &T {
        // SAFETY: the caller guarantees the pointer is non-null and valid.
        unsafe { &**this }
    }
}

impl<T> Aliasable for *mut T {
    #[inline(always)]
    fn alias(this: &Self) -> Self {
        *this
    }
}

// -----------------------------------------------------------------------------
// Shared

macro_rules! impl_shared {
    ($shared:ident) => {
        impl<T> sealed::Sealed for $shared<T> {}

        impl<T> Handle for $shared<T> {
            type Element = T;
            const KIND: HandleKind = HandleKind::Shared;

            #[inline]
            fn allocate(value: T) -> Self {
                $shared::new(value)
            }

            #[inline(always)]
            fn is_null_handle(_: &Self) -> bool {
                false
            }

            #[inline(always)]
            fn element_ptr(this: &Self) -> *const T {
                $shared::as_ptr(this)
            }

            #[inline(always)]
            unsafe fn element(this: &Self) -> &T {
                this
            }
        }

        impl<T> Owning for $shared<T> {
            #[inline(always)]
            fn get(this: &Self) -> &T {
                this
            }
        }

        impl<T> Aliasable for $shared<T> {
            #[inline(always)]
            fn alias(this: &Self) -> Self {
                $shared::clone(this)
            }
        }

        impl<T> SharedHandle for $shared<T> {
            #[inline(always)]
            fn strong_count(this: &Self) -> usize {
                $shared::strong_count(this)
            }

            #[inline(always)]
            fn get_mut(this: &mut Self) -> Option<&mut T> {
                $shared::get_mut(this)
            }

            #[inline]
            fn make_mut(this: &mut Self) -> &mut T
            where
                T: Clone,
            {
                $shared::make_mut(this)
            }
        }
    };
}

impl_shared!(Rc);

#[cfg(target_has_atomic = "ptr")]
impl_shared!(Arc);

// -----------------------------------------------------------------------------
// Unique

impl<T> sealed::Sealed for Box<T> {}

impl<T> Handle for Box<T> {
    type Element = T;
    const KIND: HandleKind = HandleKind::Unique;

    #[inline]
    fn allocate(value: T) -> Self {
        Box::new(value)
    }

    #[inline(always)]
    fn is_null_handle(_: &Self) -> bool {
        false
    }

    #[inline(always)]
    fn element_ptr(this: &Self) -> *const T {
        let element: &T = this;
        element
    }

    #[inline(always)]
    unsafe fn element(this: &Self) -> &T {
        this
    }
}

impl<T> Owning for Box<T> {
    #[inline(always)]
    fn get(this: &Self) -> &T {
        this
    }
}

// -----------------------------------------------------------------------------
// Tests
