use core::any::{Any, TypeId};

// -----------------------------------------------------------------------------
// TypePath

/// A static accessor to type paths and names.
///
/// Provides a stable alternative to [`core::any::type_name`] that works
/// across compiler versions and survives code refactoring.
///
/// The path must be unique per type and must not carry a leading `::`.
/// Implementations are usually generated by
/// [`impl_describe!`](crate::impl_describe), but writing one by hand is
/// equally valid:
///
/// ```
/// use serde_contract::desc::TypePath;
///
/// struct Foo;
///
/// impl TypePath for Foo {
///     fn type_path() -> &'static str { "my_crate::foo::Foo" }
///     fn type_name() -> &'static str { "Foo" }
/// }
/// ```
pub trait TypePath: 'static {
    /// Returns the fully qualified path of the type.
    ///
    /// This is the complete unique identifier of a type and should **not**
    /// be duplicated between types.
    fn type_path() -> &'static str;

    /// Returns the short name of the type, without the module path.
    ///
    /// This name allows for duplication.
    fn type_name() -> &'static str;
}

// -----------------------------------------------------------------------------
// TypePathTable

/// Lightweight vtable providing dynamic access to [`TypePath`] APIs.
///
/// Stores function pointers to a type's `TypePath` implementation, keeping
/// initialization minimal for types that are rarely queried.
#[derive(Clone, Copy)]
pub struct TypePathTable {
    type_path: fn() -> &'static str,
    type_name: fn() -> &'static str,
}

impl TypePathTable {
    /// Creates a new table from a type.
    #[inline]
    pub const fn of<T: TypePath + ?Sized>() -> Self {
        Self {
            type_path: T::type_path,
            type_name: T::type_name,
        }
    }

    /// See [`TypePath::type_path`].
    #[inline(always)]
    pub fn path(&self) -> &'static str {
        (self.type_path)()
    }

    /// See [`TypePath::type_name`].
    #[inline(always)]
    pub fn name(&self) -> &'static str {
        (self.type_name)()
    }
}

// -----------------------------------------------------------------------------
// Type

/// The dynamic identity of a type: its [`TypeId`] plus path information.
///
/// # Examples
///
/// ```
/// use core::any::TypeId;
/// use serde_contract::desc::{Type, TypePath};
///
/// struct Foo;
///
/// impl TypePath for Foo {
///     fn type_path() -> &'static str { "demo::Foo" }
///     fn type_name() -> &'static str { "Foo" }
/// }
///
/// let ty = Type::of::<Foo>();
///
/// assert!(ty.is::<Foo>());
/// assert_eq!(ty.id(), TypeId::of::<Foo>());
/// assert_eq!(ty.path(), "demo::Foo");
/// assert_eq!(ty.name(), "Foo");
/// ```
#[derive(Clone, Copy)]
pub struct Type {
    type_path_table: TypePathTable,
    type_id: TypeId,
}

impl Type {
    /// Creates a new [`Type`] from a type that implements [`TypePath`].
    #[inline]
    pub const fn of<T: TypePath + ?Sized>() -> Self {
        Self {
            type_path_table: TypePathTable::of::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the type.
    #[inline(always)]
    pub const fn id(&self) -> TypeId {
        self.type_id
    }

    /// Check if the given type matches this one.
    ///
    /// This only compares the [`TypeId`] of the types.
    #[inline(always)]
    pub fn is<T: Any>(&self) -> bool {
        TypeId::of::<T>() == self.type_id
    }

    /// See [`TypePath::type_path`].
    #[inline]
    pub fn path(&self) -> &'static str {
        self.type_path_table.path()
    }

    /// See [`TypePath::type_name`].
    #[inline]
    pub fn name(&self) -> &'static str {
        self.type_path_table.name()
    }
}

impl core::fmt::Debug for Type {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Type").field("path", &self.path()).finish()
    }
}

impl PartialEq for Type {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for Type {}
