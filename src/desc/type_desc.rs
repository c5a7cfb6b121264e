use core::any::Any;
use std::sync::OnceLock;

use crate::desc::{MemberDesc, Type, TypePath, Upcast};

// -----------------------------------------------------------------------------
// TypeDesc

/// The full static description of one type.
///
/// Holds the type identity, the default member table (the members that
/// serialize when no rules apply, in declaration order), the hidden member
/// table (non-public storage, only serialized when a rule includes it by
/// name), and an optional parent link.
///
/// The parent link declares an "is-a" relationship: rules registered for the
/// parent descriptor govern this type too. A descriptor lists its complete
/// default member surface itself, including members that live in embedded
/// parent storage (through projection getters); the parent link is consulted
/// only for rule lookup and for hidden members not declared locally.
pub struct TypeDesc {
    ty: Type,
    members: Box<[MemberDesc]>,
    hidden: Box<[MemberDesc]>,
    parent: Option<ParentDesc>,
}

impl TypeDesc {
    /// Creates a new [`TypeDesc`] from the default and hidden member tables.
    ///
    /// The order of `members` is preserved in every resolved contract.
    pub fn new<T: TypePath + ?Sized>(members: &[MemberDesc], hidden: &[MemberDesc]) -> Self {
        Self {
            ty: Type::of::<T>(),
            members: members.into(),
            hidden: hidden.into(),
            parent: None,
        }
    }

    /// Links this descriptor to a parent descriptor.
    ///
    /// `upcast` must project a value of this type onto its embedded parent
    /// value; it is used to reach hidden members declared on ancestors.
    pub fn with_parent<P: Described>(mut self, upcast: Upcast) -> Self {
        self.parent = Some(ParentDesc::new(P::type_desc, upcast));
        self
    }

    /// Returns the [`Type`] identity.
    #[inline(always)]
    pub const fn ty(&self) -> Type {
        self.ty
    }

    /// Returns the default member table in declaration order.
    #[inline]
    pub fn members(&self) -> &[MemberDesc] {
        &self.members
    }

    /// Returns the hidden member table.
    #[inline]
    pub fn hidden(&self) -> &[MemberDesc] {
        &self.hidden
    }

    /// Returns the parent link, if any.
    #[inline]
    pub fn parent(&self) -> Option<&ParentDesc> {
        self.parent.as_ref()
    }

    /// Locates a hidden member by exact declared name.
    ///
    /// Searches this descriptor first, then walks the parent chain. The
    /// returned upcast list projects a value of this type down to the
    /// descriptor the member was found on; it is empty for local members.
    pub fn find_hidden(&'static self, name: &str) -> Option<(&'static MemberDesc, Vec<Upcast>)> {
        let mut upcasts = Vec::new();
        let mut current = self;
        loop {
            if let Some(member) = current.hidden.iter().find(|m| m.name() == name) {
                return Some((member, upcasts));
            }
            let parent = current.parent.as_ref()?;
            upcasts.push(parent.upcast());
            current = parent.desc();
        }
    }
}

impl core::fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeDesc")
            .field("ty", &self.ty)
            .field("members", &self.members)
            .field("hidden", &self.hidden)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ParentDesc

/// A link from a descriptor to its parent descriptor.
#[derive(Clone, Copy)]
pub struct ParentDesc {
    desc: fn() -> &'static TypeDesc,
    upcast: Upcast,
}

impl ParentDesc {
    /// Creates a new parent link.
    #[inline]
    pub const fn new(desc: fn() -> &'static TypeDesc, upcast: Upcast) -> Self {
        Self { desc, upcast }
    }

    /// Returns the parent descriptor.
    #[inline]
    pub fn desc(&self) -> &'static TypeDesc {
        (self.desc)()
    }

    /// Returns the projection onto the embedded parent value.
    #[inline]
    pub const fn upcast(&self) -> Upcast {
        self.upcast
    }
}

// -----------------------------------------------------------------------------
// Described

/// A type with a static [`TypeDesc`].
///
/// Usually implemented through [`impl_describe!`](crate::impl_describe).
/// Manual implementations back the descriptor with a [`DescCell`]:
///
/// ```
/// use serde_contract::desc::{DescCell, Described, TypeDesc, TypePath};
///
/// struct Empty;
///
/// impl TypePath for Empty {
///     fn type_path() -> &'static str { "demo::Empty" }
///     fn type_name() -> &'static str { "Empty" }
/// }
///
/// impl Described for Empty {
///     fn type_desc() -> &'static TypeDesc {
///         static CELL: DescCell = DescCell::new();
///         CELL.get_or_init(|| TypeDesc::new::<Empty>(&[], &[]))
///     }
/// }
///
/// assert_eq!(Empty::type_desc().ty().path(), "demo::Empty");
/// ```
pub trait Described: TypePath {
    /// Returns the static descriptor of this type.
    fn type_desc() -> &'static TypeDesc;
}

// -----------------------------------------------------------------------------
// Describe

/// Dynamic counterpart of [`Described`], implemented for all described types.
///
/// This is the trait serialization adapters work with: it hands out the
/// descriptor and the type-erased value the member accessors read from.
pub trait Describe: Any {
    /// Returns the descriptor of the underlying type.
    fn desc(&self) -> &'static TypeDesc;

    /// Returns the value as [`Any`], for member access.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Described> Describe for T {
    #[inline]
    fn desc(&self) -> &'static TypeDesc {
        T::type_desc()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// -----------------------------------------------------------------------------
// DescCell

/// Lazily initialized storage for a [`TypeDesc`] with a `'static` lifetime.
pub struct DescCell(OnceLock<TypeDesc>);

impl DescCell {
    /// Creates an empty cell.
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored descriptor, initializing it from `f` on first use.
    #[inline]
    pub fn get_or_init(&'static self, f: impl FnOnce() -> TypeDesc) -> &'static TypeDesc {
        self.0.get_or_init(f)
    }
}

// -----------------------------------------------------------------------------
// impl_describe

/// Implements [`TypePath`] and [`Described`] for a flat struct.
///
/// Lists of field names become the default and hidden member tables; the
/// generated getters downcast the erased value and borrow the field. The
/// `hidden` table may be omitted.
///
/// Descriptors with parent links or projected members (fields reached
/// through embedded values) are written by hand; see [`TypeDesc`].
///
/// # Examples
///
/// ```
/// use serde_contract::{impl_describe, Described};
///
/// struct Account {
///     id: u32,
///     balance: f64,
///     pin: u16,
/// }
///
/// impl_describe! {
///     impl Account {
///         path = "bank::Account";
///         members = [id, balance];
///         hidden = [pin];
///     }
/// }
///
/// let desc = Account::type_desc();
/// assert_eq!(desc.members().len(), 2);
/// assert_eq!(desc.hidden()[0].name(), "pin");
/// ```
#[macro_export]
macro_rules! impl_describe {
    (impl $ty:ident {
        path = $path:literal;
        members = [$($member:ident),* $(,)?];
        $(hidden = [$($hidden:ident),* $(,)?];)?
    }) => {
        impl $crate::desc::TypePath for $ty {
            fn type_path() -> &'static str {
                $path
            }

            fn type_name() -> &'static str {
                stringify!($ty)
            }
        }

        impl $crate::desc::Described for $ty {
            fn type_desc() -> &'static $crate::desc::TypeDesc {
                static CELL: $crate::desc::DescCell = $crate::desc::DescCell::new();
                CELL.get_or_init(|| {
                    $crate::desc::TypeDesc::new::<$ty>(
                        &[$($crate::impl_describe!(@member $ty, $member),)*],
                        &[$($($crate::impl_describe!(@member $ty, $hidden),)*)?],
                    )
                })
            }
        }
    };
    (@member $ty:ident, $field:ident) => {
        $crate::desc::MemberDesc::new(stringify!($field), {
            fn get(
                value: &dyn ::core::any::Any,
            ) -> ::core::option::Option<&(dyn $crate::desc::ErasedSerialize + '_)> {
                value
                    .downcast_ref::<$ty>()
                    .map(|v| &v.$field as &dyn $crate::desc::ErasedSerialize)
            }
            get
        })
    };
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::ErasedSerialize;

    struct Inner {
        code: u32,
    }

    impl_describe! {
        impl Inner {
            path = "tests::Inner";
            members = [];
            hidden = [code];
        }
    }

    struct Outer {
        inner: Inner,
        label: &'static str,
    }

    impl TypePath for Outer {
        fn type_path() -> &'static str {
            "tests::Outer"
        }

        fn type_name() -> &'static str {
            "Outer"
        }
    }

    impl Described for Outer {
        fn type_desc() -> &'static TypeDesc {
            static CELL: DescCell = DescCell::new();
            CELL.get_or_init(|| {
                fn get_label(value: &dyn Any) -> Option<&(dyn ErasedSerialize + '_)> {
                    value
                        .downcast_ref::<Outer>()
                        .map(|v| &v.label as &dyn ErasedSerialize)
                }
                fn upcast(value: &dyn Any) -> Option<&dyn Any> {
                    value.downcast_ref::<Outer>().map(|v| &v.inner as &dyn Any)
                }
                TypeDesc::new::<Outer>(&[MemberDesc::new("label", get_label)], &[])
                    .with_parent::<Inner>(upcast)
            })
        }
    }

    #[test]
    fn desc_is_cached() {
        assert!(core::ptr::eq(Inner::type_desc(), Inner::type_desc()));
    }

    #[test]
    fn find_hidden_local() {
        let (member, upcasts) = Inner::type_desc().find_hidden("code").unwrap();
        assert_eq!(member.name(), "code");
        assert!(upcasts.is_empty());
    }

    #[test]
    fn find_hidden_walks_parents() {
        let outer = Outer {
            inner: Inner { code: 7 },
            label: "x",
        };

        let (member, upcasts) = Outer::type_desc().find_hidden("code").unwrap();
        assert_eq!(upcasts.len(), 1);

        let projected = upcasts[0](&outer).unwrap();
        assert!(member.getter()(projected).is_some());
    }

    #[test]
    fn find_hidden_misses() {
        assert!(Outer::type_desc().find_hidden("nope").is_none());
    }

    #[test]
    fn getter_rejects_foreign_values() {
        let member = &Inner::type_desc().hidden()[0];
        assert!(member.getter()(&1_u32).is_none());
    }
}
