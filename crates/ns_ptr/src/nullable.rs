use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;
use core::ptr;

#[cfg(target_has_atomic = "ptr")]
use alloc::sync::Arc;

use crate::error::AbsentError;
use crate::kind::{Aliasable, Handle, HandleKind, Owning};
use crate::not_null::NotNull;

/// A handle that may or may not reference an element.
///
/// A `Nullable` never gives access to its element. The only thing it can
/// tell is whether something is referenced right now. To reach the data it
/// has to be expanded into a [`NotNull`], which is where the presence check
/// happens, once:
///
/// ```
/// use ns_ptr::{Nullable, expand_or_return};
/// use std::rc::Rc;
///
/// fn double(value: &Nullable<Rc<i32>>) -> i32 {
///     expand_or_return!(value => value, -1);
///     *value * 2
/// }
///
/// assert_eq!(double(&Nullable::make_from(21)), 42);
/// assert_eq!(double(&Nullable::empty()), -1);
/// ```
///
/// Expanding a borrowed or shared handle leaves the `Nullable` as it was. A
/// `Box<T>` cannot be duplicated, so the only expansion for the unique kind is
/// [`take_not_null`](Self::take_not_null), which moves the box out and leaves
/// the source empty:
///
/// ```compile_fail,E0277
/// use ns_ptr::Nullable;
///
/// let x = Nullable::<Box<i32>>::make_from(1);
/// let y = x.expand();
/// ```
///
/// Dropping a `Nullable` drops the wrapped handle and does nothing else. For a
/// `*mut T` that means nothing is freed; see `release`.
///
/// The element is never read, not even for formatting or serialization:
///
/// ```compile_fail,E0277
/// use ns_ptr::Nullable;
///
/// let x = Nullable::<Box<u32>>::make_from(7);
/// let json = serde_json::to_string(&x);
/// ```
pub struct Nullable<H: Handle> {
    handle: Option<H>,
}

impl<H: Handle> Nullable<H> {
    /// The ownership kind of the wrapped handle.
    pub const KIND: HandleKind = H::KIND;

    /// Creates a container that references nothing.
    #[inline(always)]
    pub const fn empty() -> Self {
        Self { handle: None }
    }

    /// Wraps a handle that is known not to be null.
    #[cfg_attr(debug_assertions, track_caller)]
    #[inline]
    pub(crate) fn from_present(handle: H) -> Self {
        debug_assert!(!H::is_null_handle(&handle));
        Self {
            handle: Some(handle),
        }
    }

    /// Wraps a handle, mapping a null one to the empty container.
    #[inline]
    fn from_handle(handle: H) -> Self {
        if H::is_null_handle(&handle) {
            Self::empty()
        } else {
            Self {
                handle: Some(handle),
            }
        }
    }

    /// Moves `value` into newly allocated storage and references it.
    ///
    /// Defined for every handle kind. A `Nullable<*mut T>` created this way
    /// owns the allocation in all but name: the storage is only freed by
    /// `release`, and leaks otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use ns_ptr::Nullable;
    ///
    /// let x = Nullable::<Box<&str>>::make_from("hello");
    /// assert!(x.is_present());
    /// ```
    #[inline]
    pub fn make_from(value: H::Element) -> Self {
        Self::from_present(H::allocate(value))
    }

    /// Returns `true` if an element is referenced.
    #[inline(always)]
    pub const fn is_present(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns `true` if no element is referenced.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.handle.is_none()
    }

    /// Returns the ownership kind of the wrapped handle.
    #[inline(always)]
    pub const fn kind(&self) -> HandleKind {
        H::KIND
    }

    /// Drops the handle and leaves the container empty.
    ///
    /// This is plain reassignment to the empty state. For owning kinds it is the
    /// same as `release`. For a `*mut T` that owned its storage, the storage
    /// leaks unless some other alias releases it.
    #[inline]
    pub fn reset(&mut self) {
        self.handle = None;
    }

    /// Moves the handle into a [`NotNull`], leaving this container empty.
    ///
    /// Returns `None` if nothing was referenced. This is the only expansion
    /// available for `Box<T>`, which cannot be duplicated.
    ///
    /// # Examples
    ///
    /// ```
    /// use ns_ptr::Nullable;
    ///
    /// let mut x = Nullable::<Box<i32>>::make_from(5);
    /// let Some(y) = x.take_not_null() else {
    ///     unreachable!();
    /// };
    ///
    /// assert_eq!(*y, 5);
    /// assert!(x.is_empty());
    /// ```
    #[inline]
    pub fn take_not_null(&mut self) -> Option<NotNull<H>> {
        self.handle.take().map(|handle| {
            // SAFETY: only non-null handles are ever stored.
            unsafe { NotNull::new_unchecked(handle) }
        })
    }

    /// Converts into a [`NotNull`], or reports what was missing.
    #[inline]
    pub fn into_not_null(mut self) -> Result<NotNull<H>, AbsentError> {
        self.take_not_null().ok_or_else(absent::<H>)
    }

    /// Returns the address of the element, or null when empty.
    #[inline]
    pub(crate) fn as_ptr(&self) -> *const H::Element {
        match &self.handle {
            Some(handle) => H::element_ptr(handle),
            None => ptr::null(),
        }
    }

    /// Expands into a [`NotNull`] referencing the same storage.
    ///
    /// Returns `None` if nothing is referenced. The container itself is left
    /// unchanged either way; for shared handles the use count rises by one.
    ///
    /// The result is meant to be matched right at the call site, so that the
    /// empty case leaves the caller's own control path:
    ///
    /// ```
    /// use ns_ptr::{NotNull, Nullable};
    /// use std::rc::Rc;
    ///
    /// let x = Nullable::<Rc<i32>>::make_from(3);
    ///
    /// let Some(y) = x.expand() else {
    ///     return;
    /// };
    ///
    /// assert_eq!(*y, 3);
    /// assert_eq!(NotNull::use_count(&y), 2);
    /// ```
    #[inline]
    pub fn expand(&self) -> Option<NotNull<H>>
    where
        H: Aliasable,
    {
        self.handle.as_ref().map(|handle| {
            // SAFETY: only non-null handles are ever stored, and the alias
            // references the same storage.
            unsafe { NotNull::new_unchecked(H::alias(handle)) }
        })
    }

    /// Like [`expand`](Self::expand), with the empty case as an error for use
    /// with `?`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ns_ptr::{AbsentError, Nullable};
    /// use std::rc::Rc;
    ///
    /// fn first_char(name: &Nullable<Rc<String>>) -> Result<char, AbsentError> {
    ///     let name = name.try_expand()?;
    ///     Ok(name.chars().next().unwrap_or(' '))
    /// }
    ///
    /// assert_eq!(first_char(&Nullable::make_from("ns".into())), Ok('n'));
    /// assert!(first_char(&Nullable::empty()).is_err());
    /// ```
    #[inline]
    pub fn try_expand(&self) -> Result<NotNull<H>, AbsentError>
    where
        H: Aliasable,
    {
        self.expand().ok_or_else(absent::<H>)
    }

    /// Wraps an existing handle.
    ///
    /// For shared handles the caller passes its own co-owner, so the use count
    /// includes this container.
    ///
    /// # Examples
    ///
    /// ```
    /// use ns_ptr::Nullable;
    /// use std::rc::Rc;
    ///
    /// let owner = Rc::new(1);
    /// let x = Nullable::wrap(Rc::clone(&owner));
    ///
    /// assert!(x.is_present());
    /// assert_eq!(Rc::strong_count(&owner), 2);
    /// ```
    #[inline]
    pub fn wrap(handle: H) -> Self
    where
        H: Owning,
    {
        Self::from_present(handle)
    }
}

#[cold]
#[inline(never)]
fn absent<H: Handle>() -> AbsentError {
    let err = AbsentError::of::<H>();
    log::debug!("{err}");
    err
}

// -----------------------------------------------------------------------------
// Owning handles

macro_rules! impl_owning {
    ($owning:ident, $drop_note:literal) => {
        impl<T> Nullable<$owning<T>> {
            /// Empties the container.
            ///
            #[doc = $drop_note]
            #[inline]
            pub fn release(&mut self) {
                self.handle = None;
            }
        }

        impl<T> From<$owning<T>> for Nullable<$owning<T>> {
            #[inline]
            fn from(handle: $owning<T>) -> Self {
                Self::wrap(handle)
            }
        }
    };
}

impl_owning!(
    Rc,
    " Only this handle is dropped; other co-owners keep the element alive."
);

#[cfg(target_has_atomic = "ptr")]
impl_owning!(
    Arc,
    " Only this handle is dropped; other co-owners keep the element alive."
);

impl_owning!(
    Box,
    " The element is dropped along with the box, which was its only owner."
);

// -----------------------------------------------------------------------------
// Borrowed handles

impl<T> Nullable<*mut T> {
    /// Wraps a raw pointer. A null pointer gives the empty container.
    ///
    /// # Safety
    ///
    /// If `ptr` is not null it must point to a valid `T`, and stay valid for
    /// reads and writes for as long as any container derived from this one
    /// (including expanded [`NotNull`]s) is used.
    ///
    /// To [`release`](Self::release) the container later, `ptr` must also
    /// come from [`Box::into_raw`].
    ///
    /// # Examples
    ///
    /// ```
    /// use ns_ptr::Nullable;
    ///
    /// let mut x = 3;
    /// let n = unsafe { Nullable::from_raw(&raw mut x) };
    /// assert!(n.is_present());
    ///
    /// let n = unsafe { Nullable::from_raw(std::ptr::null_mut::<i32>()) };
    /// assert!(n.is_empty());
    /// ```
    #[inline]
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        Self::from_handle(ptr)
    }

    /// Frees the referenced storage and empties the container.
    ///
    /// Does nothing if the container is empty.
    ///
    /// # Safety
    ///
    /// - The pointer must come from [`Box::into_raw`], for example through
    ///   [`make_from`](Self::make_from).
    /// - No other alias of the pointer, whether a raw pointer, a cloned
    ///   `Nullable` or an expanded [`NotNull`], may be used afterwards.
    ///   Nothing tracks those aliases; they are left dangling.
    ///
    /// # Examples
    ///
    /// ```
    /// use ns_ptr::Nullable;
    ///
    /// let mut x = Nullable::<*mut String>::make_from("owned".to_string());
    /// unsafe { x.release() };
    /// assert!(x.is_empty());
    /// ```
    #[inline]
    pub unsafe fn release(&mut self) {
        if let Some(ptr) = self.handle.take() {
            log::trace!(
                "releasing borrowed `{}` at {ptr:p}",
                core::any::type_name::<T>()
            );
            // SAFETY: the caller guarantees `ptr` came from `Box::into_raw`
            // and that no alias is used afterwards.
            drop(unsafe { Box::from_raw(ptr) });
        }
    }
}

// -----------------------------------------------------------------------------
// Conversions

impl<H: Handle> From<NotNull<H>> for Nullable<H> {
    #[inline]
    fn from(value: NotNull<H>) -> Self {
        NotNull::into_nullable(value)
    }
}

impl<H: Aliasable> From<&NotNull<H>> for Nullable<H> {
    #[inline]
    fn from(value: &NotNull<H>) -> Self {
        NotNull::to_nullable(value)
    }
}

impl<H: Handle> TryFrom<Nullable<H>> for NotNull<H> {
    type Error = AbsentError;

    #[inline]
    fn try_from(value: Nullable<H>) -> Result<Self, Self::Error> {
        value.into_not_null()
    }
}

// -----------------------------------------------------------------------------
// Traits

impl<H: Handle> Default for Nullable<H> {
    #[inline(always)]
    fn default() -> Self {
        Self::empty()
    }
}

impl<H: Aliasable> Clone for Nullable<H> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.as_ref().map(Aliasable::alias),
        }
    }
}

// Only the address is shown, never the element.
impl<H: Handle> fmt::Debug for Nullable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.handle {
            Some(handle) => write!(f, "Nullable({:p})", H::element_ptr(handle)),
            None => f.write_str("Nullable(empty)"),
        }
    }
}

impl<H: Handle> fmt::Pointer for Nullable<H> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.as_ptr(), f)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::{String, ToString};
    use core::cell::Cell;

    /// Counts how many times it was dropped.
    struct Tracked(Rc<Cell<usize>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn presence() {
        let mut x = Nullable::<Rc<i32>>::empty();
        assert!(!x.is_present());
        assert!(Nullable::<Box<i32>>::default().is_empty());

        x = Nullable::make_from(1);
        assert!(x.is_present());

        x.reset();
        assert!(!x.is_present());

        x = Nullable::wrap(Rc::new(2));
        assert!(x.is_present());

        x.release();
        assert!(!x.is_present());

        x = Rc::new(3).into();
        assert!(x.is_present());
        assert_eq!(x.kind(), HandleKind::Shared);
    }

    #[test]
    fn null_pointer_is_empty() {
        // SAFETY: a null pointer is never dereferenced.
        let x = unsafe { Nullable::from_raw(ptr::null_mut::<u8>()) };
        assert!(x.is_empty());
        assert!(x.expand().is_none());
        assert_eq!(Nullable::<*mut u8>::KIND, HandleKind::Borrowed);
    }

    #[test]
    fn wrap_shared_counts_owner() {
        let owner = Rc::new(5);
        let x = Nullable::wrap(Rc::clone(&owner));
        assert_eq!(Rc::strong_count(&owner), 2);
        drop(x);
        assert_eq!(Rc::strong_count(&owner), 1);
    }

    #[test]
    fn release_borrowed_frees() {
        let drops = Rc::new(Cell::new(0));
        let mut x = Nullable::<*mut Tracked>::make_from(Tracked(drops.clone()));
        assert_eq!(drops.get(), 0);

        // SAFETY: allocated by `make_from`, no alias exists.
        unsafe { x.release() };
        assert_eq!(drops.get(), 1);
        assert!(x.is_empty());

        // SAFETY: empty, nothing to free.
        unsafe { x.release() };
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn release_shared_keeps_other_owner() {
        let drops = Rc::new(Cell::new(0));
        let owner = Rc::new(Tracked(drops.clone()));

        let mut x = Nullable::wrap(owner.clone());
        x.release();
        assert!(x.is_empty());
        assert_eq!(drops.get(), 0);
        assert_eq!(Rc::strong_count(&owner), 1);

        drop(owner);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn release_unique_drops_once() {
        let drops = Rc::new(Cell::new(0));
        let mut x = Nullable::<Box<Tracked>>::make_from(Tracked(drops.clone()));
        x.release();
        x.release();
        drop(x);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn reset_borrowed_leaks() {
        let drops = Rc::new(Cell::new(0));
        let mut x = Nullable::<*mut Tracked>::make_from(Tracked(drops.clone()));
        let alias = x.as_ptr().cast_mut();

        x.reset();
        assert!(x.is_empty());
        assert_eq!(drops.get(), 0);

        // Only the alias can free it now.
        // SAFETY: `alias` came from `make_from` and is used once.
        drop(unsafe { Box::from_raw(alias) });
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn released_alias_is_not_tracked() {
        let owner: *mut i32 = Box::into_raw(Box::new(7));

        // SAFETY: `owner` is a live `Box` allocation.
        let mut x = unsafe { Nullable::from_raw(owner) };
        // SAFETY: the alias `owner` is never dereferenced again.
        unsafe { x.release() };
        assert!(x.is_empty());

        // The external alias still carries the freed address and nothing
        // stops it from being wrapped again.
        assert!(!owner.is_null());
        // SAFETY: never expanded nor released; only presence is observed.
        let again = unsafe { Nullable::from_raw(owner) };
        assert!(again.is_present());
        assert_eq!(again.as_ptr(), owner.cast_const());
    }

    #[test]
    fn expand_leaves_source() {
        let x = Nullable::<Rc<String>>::make_from("abc".to_string());
        let y = x.expand().unwrap();
        assert_eq!(y.as_str(), "abc");
        assert!(x.is_present());
        assert_eq!(x.as_ptr(), NotNull::as_ptr(&y));
    }

    #[test]
    fn take_moves_handle() {
        let mut x = Nullable::<Box<i32>>::make_from(8);
        let y = x.take_not_null().unwrap();
        assert_eq!(*y, 8);
        assert!(x.is_empty());
        assert!(x.take_not_null().is_none());
    }

    #[test]
    fn not_null_round_trip() {
        let a = NotNull::<Rc<i32>>::make_from(11);
        let n: Nullable<_> = (&a).into();
        let b = n.expand().unwrap();
        assert_eq!(*b, 11);
        assert!(NotNull::ptr_eq(&a, &b));

        let c = NotNull::<Box<i32>>::make_from(12);
        let n = Nullable::from(c);
        let d = NotNull::try_from(n).unwrap();
        assert_eq!(*d, 12);
    }

    #[test]
    fn shared_count_scenario() {
        let owner = Rc::new(1);
        assert_eq!(Rc::strong_count(&owner), 1);

        let nullable = Nullable::wrap(Rc::clone(&owner));
        assert_eq!(Rc::strong_count(&owner), 2);

        let expanded = nullable.expand().unwrap();
        assert_eq!(NotNull::use_count(&expanded), 3);

        let copy = expanded.clone();
        assert_eq!(NotNull::use_count(&copy), 4);

        drop(copy);
        assert_eq!(NotNull::use_count(&expanded), 3);

        drop(expanded);
        assert_eq!(Rc::strong_count(&owner), 2);

        drop(nullable);
        assert_eq!(Rc::strong_count(&owner), 1);
    }

    #[test]
    fn shared_count_scenario_atomic() {
        let owner = Arc::new(1);
        let nullable = Nullable::wrap(Arc::clone(&owner));
        let expanded = nullable.expand().unwrap();
        let copy = expanded.clone();
        assert_eq!(NotNull::use_count(&copy), 4);

        drop((copy, expanded, nullable));
        assert_eq!(Arc::strong_count(&owner), 1);
    }

    #[test]
    fn clone_aliases() {
        let x = Nullable::<Rc<i32>>::make_from(1);
        let y = x.clone();
        assert_eq!(x.as_ptr(), y.as_ptr());

        let e = Nullable::<Rc<i32>>::empty();
        assert!(e.clone().is_empty());
    }

    #[test]
    fn absent_error() {
        let x = Nullable::<Rc<i32>>::empty();
        let err = x.try_expand().unwrap_err();
        assert_eq!(err.kind(), HandleKind::Shared);
        assert_eq!(err.element(), "i32");

        let err = Nullable::<Box<u8>>::empty().into_not_null().unwrap_err();
        assert_eq!(err.kind(), HandleKind::Unique);
    }

    #[test]
    fn formatting_hides_element() {
        let x = Nullable::<Box<i32>>::make_from(12345);
        let shown = format!("{x:?}");
        assert!(shown.starts_with("Nullable(0x"));
        assert!(!shown.contains("12345"));

        assert_eq!(
            format!("{:?}", Nullable::<Box<i32>>::empty()),
            "Nullable(empty)"
        );
        assert_eq!(format!("{x:p}"), format!("{:p}", x.as_ptr()));
    }
}
