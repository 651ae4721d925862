#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use ns_ptr as ptr;

/// The containers and guarded expansion macros.
pub mod prelude {
    pub use ns_ptr::{NotNull, Nullable, expand_or_continue, expand_or_return};
}
