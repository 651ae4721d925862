//! Null-safe containers over pointer-like handles.
//!
//! Reading through a pointer that may be null is only allowed after the
//! absence case has been handled. This crate encodes that rule in two types:
//!
//! **Nullable**
//!
//! [`Nullable<H>`] may or may not reference an element. It can be created,
//! cleared, released and tested for presence, but offers no access to the
//! element at all.
//!
//! **NotNull**
//!
//! [`NotNull<H>`] always references an element. It is obtained by allocating
//! from a value or by expanding a present `Nullable`, and dereferences to the
//! element without any further check.
//!
//! **Guarded expansion**
//!
//! [`expand_or_return!`] and [`expand_or_continue!`] turn a `Nullable` into a
//! `NotNull` binding in the caller's scope, leaving the caller's function or
//! loop when the source is empty. [`Nullable::expand`] and
//! [`Nullable::take_not_null`] give the same result as an `Option` for use
//! with `let ... else`.
//!
//! **Handle kinds**
//!
//! The handle `H` decides ownership, see [`HandleKind`]:
//!
//! | Handle          | Kind       | Expansion              | Write access                 |
//! |-----------------|------------|------------------------|------------------------------|
//! | `*mut T`        | `Borrowed` | aliases the pointer    | `unsafe`                     |
//! | `Rc<T>`/`Arc<T>`| `Shared`   | adds a co-owner        | `get_mut`/`make_mut`         |
//! | `Box<T>`        | `Unique`   | moves the box out      | `DerefMut`                   |
//!
//! Any other handle type is rejected when the program is built.
//!
//! Borrowed handles track nothing: storage allocated through
//! [`Nullable::make_from`] is only freed by an explicit `release`, and every
//! other alias of a released pointer dangles. The operations that can expose
//! this are `unsafe`.
#![expect(unsafe_code, reason = "Borrowed handles are raw pointers.")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

#[cfg(any(feature = "std", test))]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod expand;
mod kind;
mod not_null;
mod nullable;

#[cfg(feature = "serde")]
mod serde;

// -----------------------------------------------------------------------------
// Top-level exports

pub use error::AbsentError;
pub use kind::{Aliasable, ElementOf, Handle, HandleKind, Owning, SharedHandle};
pub use not_null::NotNull;
pub use nullable::Nullable;

// -----------------------------------------------------------------------------
// Aliases

/// A [`Nullable`] over a raw pointer.
pub type NullableRaw<T> = Nullable<*mut T>;
/// A [`Nullable`] over an [`Rc`](alloc::rc::Rc).
pub type NullableRc<T> = Nullable<alloc::rc::Rc<T>>;
/// A [`Nullable`] over an [`Arc`](alloc::sync::Arc).
#[cfg(target_has_atomic = "ptr")]
pub type NullableArc<T> = Nullable<alloc::sync::Arc<T>>;
/// A [`Nullable`] over a [`Box`](alloc::boxed::Box).
pub type NullableBox<T> = Nullable<alloc::boxed::Box<T>>;

/// A [`NotNull`] over a raw pointer.
pub type NotNullRaw<T> = NotNull<*mut T>;
/// A [`NotNull`] over an [`Rc`](alloc::rc::Rc).
pub type NotNullRc<T> = NotNull<alloc::rc::Rc<T>>;
/// A [`NotNull`] over an [`Arc`](alloc::sync::Arc).
#[cfg(target_has_atomic = "ptr")]
pub type NotNullArc<T> = NotNull<alloc::sync::Arc<T>>;
/// A [`NotNull`] over a [`Box`](alloc::boxed::Box).
pub type NotNullBox<T> = NotNull<alloc::boxed::Box<T>>;
