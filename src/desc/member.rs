use core::any::Any;

pub use erased_serde::Serialize as ErasedSerialize;

// -----------------------------------------------------------------------------
// Accessor signatures

/// Reads one member out of a type-erased value.
///
/// Returns `None` when the value is not of the type the getter was written
/// for; the caller surfaces that as an error instead of panicking.
pub type Getter = for<'a> fn(&'a dyn Any) -> Option<&'a (dyn ErasedSerialize + 'a)>;

/// Projects a type-erased value onto its embedded parent value.
pub type Upcast = for<'a> fn(&'a dyn Any) -> Option<&'a dyn Any>;

/// Decides at serialization time whether a member should be written.
pub type SerializePredicate = fn(&dyn Any) -> bool;

// -----------------------------------------------------------------------------
// MemberDesc

/// Description of a single member: its declared name and the accessor that
/// reads it from a type-erased value.
///
/// Member access goes through an explicit accessor table instead of any
/// lookup-by-string reflection, so a descriptor fully controls which storage
/// is reachable.
///
/// # Examples
///
/// ```
/// use core::any::Any;
/// use serde_contract::desc::{ErasedSerialize, MemberDesc};
///
/// struct Point { x: i32 }
///
/// fn get_x(value: &dyn Any) -> Option<&(dyn ErasedSerialize + '_)> {
///     value.downcast_ref::<Point>().map(|p| &p.x as &dyn ErasedSerialize)
/// }
///
/// let member = MemberDesc::new("x", get_x);
/// assert_eq!(member.name(), "x");
/// ```
#[derive(Clone, Copy)]
pub struct MemberDesc {
    name: &'static str,
    getter: Getter,
    should_serialize: Option<SerializePredicate>,
}

impl MemberDesc {
    /// Creates a new [`MemberDesc`] for the given declared `name`.
    #[inline]
    pub const fn new(name: &'static str, getter: Getter) -> Self {
        Self {
            name,
            getter,
            should_serialize: None,
        }
    }

    /// Attaches a predicate consulted before the member is serialized.
    ///
    /// Members carry no predicate by default and always serialize.
    #[inline]
    pub const fn with_should_serialize(mut self, predicate: SerializePredicate) -> Self {
        self.should_serialize = Some(predicate);
        self
    }

    /// Returns the declared member name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the member accessor.
    #[inline]
    pub const fn getter(&self) -> Getter {
        self.getter
    }

    /// Returns the should-serialize predicate, if any.
    #[inline]
    pub const fn should_serialize(&self) -> Option<SerializePredicate> {
        self.should_serialize
    }
}

impl core::fmt::Debug for MemberDesc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemberDesc")
            .field("name", &self.name)
            .finish()
    }
}
