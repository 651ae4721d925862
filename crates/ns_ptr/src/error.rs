use core::any::type_name;

use thiserror::Error;

use crate::kind::{Handle, HandleKind};

// -----------------------------------------------------------------------------
// Error

/// An empty [`Nullable`](crate::Nullable) was converted into a
/// [`NotNull`](crate::NotNull).
///
/// Only the `Result` shaped conversions produce this:
/// [`Nullable::try_expand`](crate::Nullable::try_expand),
/// [`Nullable::into_not_null`](crate::Nullable::into_not_null) and `TryFrom`.
///
/// # Examples
///
/// ```
/// use ns_ptr::{AbsentError, HandleKind, NotNull, Nullable};
///
/// let err = NotNull::try_from(Nullable::<Box<u32>>::empty()).unwrap_err();
///
/// assert_eq!(err.kind(), HandleKind::Unique);
/// assert_eq!(
///     err.to_string(),
///     "expected a present unique handle to `u32`, found an empty container",
/// );
/// ```
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("expected a present {kind} handle to `{element}`, found an empty container")]
pub struct AbsentError {
    kind: HandleKind,
    element: &'static str,
}

impl AbsentError {
    /// Creates the error for an empty container over `H`.
    #[inline]
    pub fn of<H: Handle>() -> Self {
        Self {
            kind: H::KIND,
            element: type_name::<H::Element>(),
        }
    }

    /// The ownership kind of the empty container.
    #[inline(always)]
    pub const fn kind(&self) -> HandleKind {
        self.kind
    }

    /// The element type name of the empty container.
    #[inline(always)]
    pub const fn element(&self) -> &'static str {
        self.element
    }
}
