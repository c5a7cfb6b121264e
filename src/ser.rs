//! The serde adapter that serializes a value through its resolved contract.

use serde_core::ser::{Error as _, Serialize, SerializeMap, Serializer};

use crate::contract::ContractMember;
use crate::desc::{Describe, ErasedSerialize};
use crate::resolver::ContractResolver;

// -----------------------------------------------------------------------------
// ContractSerializer

/// Serializes a described value as a map shaped by its resolved contract.
///
/// The adapter resolves the value's contract on every use (a cache hit after
/// the first resolution), then emits one map entry per contract member whose
/// should-serialize predicate admits the value. Contract resolution failures
/// and unreadable members surface as the target format's own error type.
///
/// # Examples
///
/// ```
/// use serde_contract::{ContractResolver, ContractSerializer, impl_describe};
///
/// struct Point {
///     x: i32,
///     y: i32,
///     cached_hash: u64,
/// }
///
/// impl_describe! {
///     impl Point {
///         path = "geometry::Point";
///         members = [x, y];
///         hidden = [cached_hash];
///     }
/// }
///
/// let mut resolver = ContractResolver::new();
/// resolver
///     .register_with::<Point, _>(|rules| rules.include("cached_hash"))
///     .unwrap();
///
/// let point = Point { x: 3, y: 4, cached_hash: 25 };
/// let json = serde_json::to_string(&ContractSerializer::new(&point, &resolver)).unwrap();
/// assert_eq!(json, r#"{"x":3,"y":4,"cachedHash":25}"#);
/// ```
pub struct ContractSerializer<'a> {
    value: &'a dyn Describe,
    resolver: &'a ContractResolver,
}

impl<'a> ContractSerializer<'a> {
    /// Couples a described value with the resolver that shapes its output.
    #[inline]
    pub fn new(value: &'a dyn Describe, resolver: &'a ContractResolver) -> Self {
        Self { value, resolver }
    }
}

impl Serialize for ContractSerializer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let contract = self
            .resolver
            .resolve_desc(self.value.desc())
            .map_err(S::Error::custom)?;

        let value = self.value.as_any();
        let emitted: Vec<&ContractMember> = contract
            .members()
            .iter()
            .filter(|member| member.wants_serialize(value))
            .collect();

        let mut map = serializer.serialize_map(Some(emitted.len()))?;
        for member in emitted {
            let Some(payload) = member.read(value) else {
                return Err(S::Error::custom(format_args!(
                    "member `{}` of `{}` is not readable from this value",
                    member.name(),
                    contract.ty().path(),
                )));
            };
            map.serialize_entry(member.name(), &SerializeMember(payload))?;
        }
        map.end()
    }
}

impl core::fmt::Debug for ContractSerializer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContractSerializer")
            .field("ty", &self.value.desc().ty())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// SerializeMember

/// Bridges a type-erased member payload back into a concrete serializer.
struct SerializeMember<'a>(&'a (dyn ErasedSerialize + 'a));

impl Serialize for SerializeMember<'_> {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        erased_serde::serialize(self.0, serializer)
    }
}

// -----------------------------------------------------------------------------
// Tests
