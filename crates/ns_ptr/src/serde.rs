//! Serialization for containers over owning handles.
//!
//! A [`NotNull`] is encoded like `T` itself. A [`Nullable`] never reads its
//! element, so it can only be decoded, from `Option<T>`. Decoding allocates
//! fresh storage, so aliasing between shared handles is not preserved.
//! Borrowed handles have no implementation.

use crate::kind::Owning;
use crate::not_null::NotNull;
use crate::nullable::Nullable;

impl<'de, H: Owning> ::serde::Deserialize<'de> for Nullable<H>
where
    H::Element: ::serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: ::serde::Deserializer<'de>,
    {
        let value: Option<H::Element> = ::serde::Deserialize::deserialize(deserializer)?;
        Ok(value.map_or_else(Self::empty, Self::make_from))
    }
}

impl<H: Owning> ::serde::Serialize for NotNull<H>
where
    H::Element: ::serde::Serialize,
{
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ::serde::Serializer,
    {
        ::serde::Serialize::serialize(NotNull::get(self), serializer)
    }
}

impl<'de, H: Owning> ::serde::Deserialize<'de> for NotNull<H>
where
    H::Element: ::serde::Deserialize<'de>,
{
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: ::serde::Deserializer<'de>,
    {
        ::serde::Deserialize::deserialize(deserializer).map(Self::make_from)
    }
}

#[cfg(test)]
mod tests {
    use crate::{NotNull, Nullable};
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::string::{String, ToString};
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::marker::PhantomData;
    use ::serde::{Deserialize, Serialize};

    #[derive(Deserialize)]
    struct Node {
        name: String,
        parent: Nullable<Rc<String>>,
        children: Vec<NotNull<Box<u32>>>,
    }

    // Resolves to `Encodable` when `T: Serialize`, to `Opaque` otherwise.
    struct Check<T>(PhantomData<T>);

    trait Encodable {
        fn encodable(&self) -> bool {
            true
        }
    }

    impl<T: Serialize> Encodable for Check<T> {}

    trait Opaque {
        fn encodable(&self) -> bool {
            false
        }
    }

    impl<T> Opaque for &Check<T> {}

    #[test]
    fn nullable_is_never_encoded() {
        assert!(!(&Check::<Nullable<Box<u32>>>(PhantomData)).encodable());
        assert!(!(&Check::<Nullable<Rc<String>>>(PhantomData)).encodable());
        assert!((&Check::<NotNull<Box<u32>>>(PhantomData)).encodable());
        assert!((&Check::<Option<u32>>(PhantomData)).encodable());
    }

    #[test]
    fn nullable_from_option() {
        let back: Nullable<Arc<u32>> = serde_json::from_str("3").unwrap();
        assert_eq!(*back.expand().unwrap(), 3);

        let back: Nullable<Box<u32>> = serde_json::from_str("null").unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn not_null_as_element() {
        let x = NotNull::<Rc<String>>::make_from("leaf".to_string());
        assert_eq!(serde_json::to_string(&x).unwrap(), "\"leaf\"");

        let back: NotNull<Box<String>> = serde_json::from_str("\"leaf\"").unwrap();
        assert_eq!(back.as_str(), "leaf");

        assert!(serde_json::from_str::<NotNull<Box<u32>>>("null").is_err());
    }

    #[test]
    fn nested_decode() {
        let json = r#"{"name":"a","parent":"root","children":[1,2]}"#;
        let node: Node = serde_json::from_str(json).unwrap();

        assert_eq!(node.name, "a");
        assert_eq!(node.parent.expand().unwrap().as_str(), "root");
        assert_eq!(serde_json::to_string(&node.children).unwrap(), "[1,2]");

        let orphan: Node = serde_json::from_str(r#"{"name":"b","parent":null,"children":[]}"#).unwrap();
        assert!(orphan.parent.is_empty());
    }
}
