//! Resolved contracts: the final description of what serializes, and how.

use core::any::Any;

use crate::desc::{ErasedSerialize, Getter, MemberDesc, SerializePredicate, Type, Upcast};

// -----------------------------------------------------------------------------
// MemberOrigin

/// Where a contract member came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberOrigin {
    /// Part of the type's default member table.
    Declared,
    /// Force-included from the hidden member table by an include rule.
    Included,
}

// -----------------------------------------------------------------------------
// ContractMember

/// One serializable member of a resolved [`Contract`].
///
/// Carries the output name produced by the naming policy, the declared name
/// it originated from, and the accessor that reads the value.
pub struct ContractMember {
    name: Box<str>,
    declared: &'static str,
    getter: Getter,
    upcasts: Box<[Upcast]>,
    readable: bool,
    should_serialize: Option<SerializePredicate>,
    origin: MemberOrigin,
}

impl ContractMember {
    pub(crate) fn declared(name: Box<str>, member: &MemberDesc) -> Self {
        Self {
            name,
            declared: member.name(),
            getter: member.getter(),
            upcasts: Box::new([]),
            readable: true,
            should_serialize: member.should_serialize(),
            origin: MemberOrigin::Declared,
        }
    }

    pub(crate) fn included(name: Box<str>, member: &MemberDesc, upcasts: Vec<Upcast>) -> Self {
        Self {
            name,
            declared: member.name(),
            getter: member.getter(),
            upcasts: upcasts.into_boxed_slice(),
            // Hidden storage has no public accessor; the contract itself is
            // what makes the member readable.
            readable: true,
            should_serialize: member.should_serialize(),
            origin: MemberOrigin::Included,
        }
    }

    /// Returns the output name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared member name.
    #[inline]
    pub const fn declared_name(&self) -> &'static str {
        self.declared
    }

    /// Returns where this member came from.
    #[inline]
    pub const fn origin(&self) -> MemberOrigin {
        self.origin
    }

    /// Returns `true` if the member can be read for serialization.
    #[inline]
    pub const fn is_readable(&self) -> bool {
        self.readable
    }

    /// Consults the should-serialize predicate for `value`.
    ///
    /// Members without a predicate always serialize.
    pub fn wants_serialize(&self, value: &dyn Any) -> bool {
        match self.should_serialize {
            Some(predicate) => predicate(value),
            None => true,
        }
    }

    /// Reads the member out of a type-erased value.
    ///
    /// Returns `None` when `value` is not of the contract's type.
    pub fn read<'a>(&self, value: &'a dyn Any) -> Option<&'a (dyn ErasedSerialize + 'a)> {
        let mut value = value;
        for upcast in &self.upcasts {
            value = upcast(value)?;
        }
        (self.getter)(value)
    }
}

impl core::fmt::Debug for ContractMember {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContractMember")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("origin", &self.origin)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Contract

/// The resolved serialization contract of one concrete type.
///
/// Lists the members that participate in serialization, in order: default
/// members first (declaration order), force-included members appended after
/// (registration order), force-excluded members removed entirely.
#[derive(Debug)]
pub struct Contract {
    ty: Type,
    governed: bool,
    members: Box<[ContractMember]>,
}

impl Contract {
    pub(crate) fn new(ty: Type, governed: bool, members: Box<[ContractMember]>) -> Self {
        Self {
            ty,
            governed,
            members,
        }
    }

    /// Returns the identity of the contracted type.
    #[inline(always)]
    pub const fn ty(&self) -> Type {
        self.ty
    }

    /// Returns `true` if a registered rule set applied to this type.
    #[inline]
    pub const fn is_governed(&self) -> bool {
        self.governed
    }

    /// Returns the members in serialization order.
    #[inline]
    pub fn members(&self) -> &[ContractMember] {
        &self.members
    }

    /// Returns the member with the given output name, if present.
    pub fn member(&self, name: &str) -> Option<&ContractMember> {
        self.members.iter().find(|member| member.name() == name)
    }

    /// Returns the output names in serialization order.
    pub fn member_names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.members.iter().map(ContractMember::name)
    }
}
