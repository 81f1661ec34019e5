//! Newtype IDs for type-safe entity references.
//!
//! Each table gets its own ID type so a reply ID can never be passed where a
//! thread ID is expected.

/// Declares an `i32`-backed ID newtype.
///
/// The generated type is `Copy`, ordered, hashable, serializes as a bare
/// number, and converts to and from `i32`. With the `postgres` feature it
/// binds and decodes as a Postgres `INTEGER`.
///
/// ```rust
/// # use coding_gurus_core::define_id;
/// define_id!(TopicId);
/// define_id!(TagId);
///
/// let topic = TopicId::new(1);
/// assert_eq!(i32::from(topic), 1);
/// // let _: TagId = topic; // mismatched types
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::convert::From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl ::core::convert::From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(ThreadId);
define_id!(ReplyId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_bare_number() {
        assert_eq!(ThreadId::new(42).to_string(), "42");
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&ReplyId::new(7)).unwrap();
        assert_eq!(json, "7");

        let parsed: UserId = serde_json::from_str("13").unwrap();
        assert_eq!(parsed, UserId::new(13));
    }

    #[test]
    fn test_ordering_follows_inner_value() {
        assert!(ThreadId::new(1) < ThreadId::new(2));
    }
}
