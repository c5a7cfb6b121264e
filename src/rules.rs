//! Per-type serialization rules and the fluent builder that produces them.

use core::marker::PhantomData;

use crate::desc::Described;
use crate::error::ContractError;

// -----------------------------------------------------------------------------
// TypeRules

/// The rules registered for one governed type: names to force-exclude and
/// names to force-include.
///
/// Immutable once built. Excluded names are an unordered, deduplicated set;
/// included names keep their registration order, which becomes the append
/// order of the force-included members in the resolved contract.
#[derive(Debug, Default)]
pub struct TypeRules {
    ignored: Vec<Box<str>>,
    included: Vec<Box<str>>,
}

impl TypeRules {
    /// Creates an empty rule set.
    #[inline]
    pub const fn new() -> Self {
        Self {
            ignored: Vec::new(),
            included: Vec::new(),
        }
    }

    /// Returns `true` if neither list contains an entry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ignored.is_empty() && self.included.is_empty()
    }

    /// Returns the excluded names.
    pub fn ignored(&self) -> impl Iterator<Item = &str> {
        self.ignored.iter().map(|name| &**name)
    }

    /// Returns the included names in registration order.
    pub fn included(&self) -> impl Iterator<Item = &str> {
        self.included.iter().map(|name| &**name)
    }

    /// Returns `true` if `declared` matches an excluded name.
    ///
    /// The match is case-insensitive, so an exclusion registered against one
    /// casing convention still removes the member under another.
    pub fn is_ignored(&self, declared: &str) -> bool {
        self.ignored
            .iter()
            .any(|name| name.eq_ignore_ascii_case(declared))
    }

    fn push_ignored(&mut self, name: &str) {
        if !self.ignored.iter().any(|n| **n == *name) {
            self.ignored.push(name.into());
        }
    }

    fn push_included(&mut self, name: &str) {
        if !self.included.iter().any(|n| **n == *name) {
            self.included.push(name.into());
        }
    }
}

// -----------------------------------------------------------------------------
// RulesBuilder

/// Fluent, type-scoped builder over a [`TypeRules`].
///
/// Obtained through
/// [`ContractResolver::register_with`](crate::ContractResolver::register_with).
/// Calls chain; the first invalid member name poisons the builder and is
/// surfaced as [`ContractError::InvalidMemberName`] when the registration
/// completes.
///
/// ```
/// use serde_contract::{ContractResolver, impl_describe};
///
/// struct Session {
///     user: String,
///     token: String,
/// }
///
/// impl_describe! {
///     impl Session {
///         path = "auth::Session";
///         members = [user, token];
///     }
/// }
///
/// let mut resolver = ContractResolver::new();
/// resolver
///     .register_with::<Session, _>(|rules| rules.ignore("token"))
///     .unwrap();
/// ```
pub struct RulesBuilder<T: Described> {
    rules: TypeRules,
    defect: Option<ContractError>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Described> RulesBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            rules: TypeRules::new(),
            defect: None,
            _marker: PhantomData,
        }
    }

    /// Excludes a member from serialization, idempotently.
    ///
    /// `name` is matched against declared member names, case-insensitively,
    /// when the contract is resolved.
    pub fn ignore(mut self, name: &str) -> Self {
        if self.accept(name) {
            self.rules.push_ignored(name);
        }
        self
    }

    /// Includes a hidden member into serialization, idempotently.
    ///
    /// `name` must match an entry of the resolved type's hidden member
    /// table; a miss fails the first resolution with
    /// [`ContractError::MemberNotFound`].
    pub fn include(mut self, name: &str) -> Self {
        if self.accept(name) {
            self.rules.push_included(name);
        }
        self
    }

    fn accept(&mut self, name: &str) -> bool {
        if self.defect.is_some() {
            return false;
        }
        if !is_member_name(name) {
            self.defect = Some(ContractError::InvalidMemberName { name: name.into() });
            return false;
        }
        true
    }

    pub(crate) fn finish(self) -> Result<TypeRules, ContractError> {
        match self.defect {
            Some(defect) => Err(defect),
            None => Ok(self.rules),
        }
    }
}

/// A direct member name: an ASCII identifier, no paths or projections.
fn is_member_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

// -----------------------------------------------------------------------------
// Tests
