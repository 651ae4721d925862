use alloc::boxed::Box;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem;
use core::ops::{Deref, DerefMut};
use core::ptr;

use crate::kind::{Aliasable, Handle, HandleKind, Owning, SharedHandle};
use crate::nullable::Nullable;

/// A handle that always references an element.
///
/// A `NotNull` is created either from a value with [`make_from`](Self::make_from),
/// or by expanding a non-empty [`Nullable`] (see [`Nullable::expand`] and the
/// [`expand_or_return!`](crate::expand_or_return) family). Once it exists no
/// further presence check is needed: the element is reached through [`Deref`].
///
/// # Examples
///
/// ```
/// use ns_ptr::NotNull;
/// use std::rc::Rc;
///
/// let x = NotNull::<Rc<i32>>::make_from(10);
/// let y = x.clone();
///
/// assert_eq!(*y, 10);
/// assert_eq!(NotNull::use_count(&x), 2);
/// ```
///
/// Apart from `Deref`, every operation is an associated function, called as
/// `NotNull::use_count(&x)` rather than `x.use_count()`. Methods of the element
/// are never shadowed.
///
/// # Borrowed handles
///
/// A `NotNull<*mut T>` cannot be allocated from a value, since no safe path
/// would ever free the storage:
///
/// ```compile_fail,E0277
/// use ns_ptr::NotNull;
///
/// let x = NotNull::<*mut i32>::make_from(1);
/// ```
///
/// It only comes from expanding a `Nullable<*mut T>`. Its validity rests on the
/// contract of [`Nullable::from_raw`] and `Nullable::release`: if the storage is
/// released through another alias, the `NotNull` dangles.
///
/// # Use count
///
/// Only shared handles have a use count. Unique handles have none:
///
/// ```compile_fail,E0277
/// use ns_ptr::NotNull;
///
/// let x = NotNull::<Box<i32>>::make_from(1);
/// let n = NotNull::use_count(&x);
/// ```
///
/// Borrowed handles have none either:
///
/// ```compile_fail,E0277
/// use ns_ptr::{NotNull, Nullable};
///
/// let source = Nullable::<*mut i32>::make_from(1);
/// let x = source.expand().unwrap();
/// let n = NotNull::use_count(&x);
/// ```
///
/// # Threads
///
/// `NotNull<H>` is `Send`/`Sync` exactly when `H` is.
///
/// ```compile_fail,E0277
/// use ns_ptr::NotNull;
/// use std::rc::Rc;
///
/// fn assert_send<T: Send>(_: T) {}
/// assert_send(NotNull::<Rc<i32>>::make_from(1));
/// ```
#[must_use]
#[repr(transparent)]
pub struct NotNull<H: Handle> {
    handle: H,
}

impl<H: Handle> NotNull<H> {
    /// Wraps a handle that is known to reference an element.
    ///
    /// # Safety
    ///
    /// `handle` must not be null. A `*mut T` must also satisfy the validity
    /// contract of [`Nullable::from_raw`].
    #[cfg_attr(debug_assertions, track_caller)]
    #[cfg_attr(not(debug_assertions), inline(always))]
    pub(crate) unsafe fn new_unchecked(handle: H) -> Self {
        debug_assert!(
            !H::is_null_handle(&handle),
            "`NotNull` built from a null `{}`",
            core::any::type_name::<H>(),
        );
        Self { handle }
    }

    /// The ownership kind of the wrapped handle.
    pub const KIND: HandleKind = H::KIND;

    /// Moves `value` into new storage owned by the returned container.
    ///
    /// Only owning handles are accepted; see the type level docs.
    ///
    /// # Examples
    ///
    /// ```
    /// use ns_ptr::NotNull;
    ///
    /// let x = NotNull::<Box<String>>::make_from("abc".to_string());
    /// assert_eq!(x.len(), 3);
    /// ```
    #[inline]
    pub fn make_from(value: H::Element) -> Self
    where
        H: Owning,
    {
        Self {
            handle: H::allocate(value),
        }
    }

    /// Returns the ownership kind of the wrapped handle.
    #[inline(always)]
    pub const fn kind(_: &Self) -> HandleKind {
        H::KIND
    }

    /// Returns a reference to the element.
    ///
    /// Same as dereferencing, for places where auto-deref does not apply.
    #[inline(always)]
    pub fn get(this: &Self) -> &H::Element {
        this
    }

    /// Returns the address of the element.
    #[inline(always)]
    pub fn as_ptr(this: &Self) -> *const H::Element {
        H::element_ptr(&this.handle)
    }

    /// Returns `true` if both containers reference the same storage.
    ///
    /// # Examples
    ///
    /// ```
    /// use ns_ptr::NotNull;
    /// use std::rc::Rc;
    ///
    /// let a = NotNull::<Rc<i32>>::make_from(1);
    /// let b = a.clone();
    /// let c = NotNull::<Rc<i32>>::make_from(1);
    ///
    /// assert!(NotNull::ptr_eq(&a, &b));
    /// assert!(!NotNull::ptr_eq(&a, &c));
    /// ```
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        ptr::eq(Self::as_ptr(this), Self::as_ptr(other))
    }

    /// Converts into a [`Nullable`] holding the same handle.
    ///
    /// This never fails.
    #[inline]
    pub fn into_nullable(this: Self) -> Nullable<H> {
        Nullable::from_present(this.handle)
    }

    /// Returns a [`Nullable`] holding a second handle to the same storage.
    ///
    /// For shared handles this adds one to the use count.
    #[inline]
    pub fn to_nullable(this: &Self) -> Nullable<H>
    where
        H: Aliasable,
    {
        Nullable::from_present(H::alias(&this.handle))
    }

    /// Returns the number of live co-owners of the element, at least `1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ns_ptr::NotNull;
    /// use std::sync::Arc;
    ///
    /// let x = NotNull::<Arc<u8>>::make_from(0);
    /// let y = NotNull::to_nullable(&x);
    ///
    /// assert_eq!(NotNull::use_count(&x), 2);
    /// drop(y);
    /// assert_eq!(NotNull::use_count(&x), 1);
    /// ```
    #[inline]
    pub fn use_count(this: &Self) -> usize
    where
        H: SharedHandle,
    {
        H::strong_count(&this.handle)
    }

    /// Returns a mutable reference if this is the only co-owner.
    #[inline]
    pub fn get_mut(this: &mut Self) -> Option<&mut H::Element>
    where
        H: SharedHandle,
    {
        H::get_mut(&mut this.handle)
    }

    /// Returns a mutable reference, detaching from other co-owners by cloning
    /// the element if any exist.
    #[inline]
    pub fn make_mut(this: &mut Self) -> &mut H::Element
    where
        H: SharedHandle,
        H::Element: Clone,
    {
        H::make_mut(&mut this.handle)
    }
}

impl<T> NotNull<Box<T>> {
    /// Overwrites the element.
    #[inline]
    pub fn set(this: &mut Self, value: T) {
        *this.handle = value;
    }

    /// Consumes the container and returns the element.
    #[inline]
    pub fn into_inner(this: Self) -> T {
        *this.handle
    }
}

impl<T> NotNull<*mut T> {
    /// Returns a mutable reference to the element.
    ///
    /// # Safety
    ///
    /// No other reference to the element, through this container, a clone
    /// of it or any other alias of the pointer, may be alive while the
    /// returned reference is.
    #[inline(always)]
    pub unsafe fn as_mut(this: &mut Self) -> &mut T {
        // SAFETY: non-null by construction, exclusivity upheld by the caller.
        unsafe { &mut *this.handle }
    }

    /// Overwrites the element and returns the previous one.
    ///
    /// # Safety
    ///
    /// Same as [`as_mut`](Self::as_mut).
    #[inline]
    pub unsafe fn replace(this: &mut Self, value: T) -> T {
        // SAFETY: upheld by the caller.
        mem::replace(unsafe { Self::as_mut(this) }, value)
    }
}

// -----------------------------------------------------------------------------
// Access

impl<H: Handle> Deref for NotNull<H> {
    type Target = H::Element;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        // SAFETY: the handle is non-null by construction. For `*mut T` the
        // pointee validity is the contract of `Nullable::from_raw`/`release`.
        unsafe { H::element(&self.handle) }
    }
}

impl<T> DerefMut for NotNull<Box<T>> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.handle
    }
}

impl<H: Handle> AsRef<H::Element> for NotNull<H> {
    #[inline(always)]
    fn as_ref(&self) -> &H::Element {
        self
    }
}

// -----------------------------------------------------------------------------
// Traits

impl<H: Aliasable> Clone for NotNull<H> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            handle: H::alias(&self.handle),
        }
    }
}

impl<H: Handle> PartialEq for NotNull<H>
where
    H::Element: PartialEq,
{
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl<H: Handle> Eq for NotNull<H> where H::Element: Eq {}

impl<H: Handle> PartialOrd for NotNull<H>
where
    H::Element: PartialOrd,
{
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (**self).partial_cmp(&**other)
    }
}

impl<H: Handle> Ord for NotNull<H>
where
    H::Element: Ord,
{
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        (**self).cmp(&**other)
    }
}

impl<H: Handle> Hash for NotNull<H>
where
    H::Element: Hash,
{
    #[inline]
    fn hash<S: Hasher>(&self, state: &mut S) {
        (**self).hash(state);
    }
}

impl<H: Handle> fmt::Debug for NotNull<H>
where
    H::Element: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NotNull").field(&**self).finish()
    }
}

impl<H: Handle> fmt::Display for NotNull<H>
where
    H::Element: fmt::Display,
{
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<H: Handle> fmt::Pointer for NotNull<H> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&Self::as_ptr(self), f)
    }
}

// -----------------------------------------------------------------------------
// Tests
