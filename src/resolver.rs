//! The contract resolver: rule registry, contract cache, member enumeration.

use core::any::TypeId;
use std::sync::{Arc, PoisonError, RwLock};

use crate::contract::{Contract, ContractMember};
use crate::desc::{Described, TypeDesc};
use crate::error::ContractError;
use crate::hash::{HashMap, TypeIdMap};
use crate::naming::{CamelCase, NamingPolicy};
use crate::rules::{RulesBuilder, TypeRules};

// -----------------------------------------------------------------------------
// Registration

/// A registered rule set, coupled with the descriptor it was registered for.
struct Registration {
    rules: TypeRules,
    desc: fn() -> &'static TypeDesc,
}

// -----------------------------------------------------------------------------
// ContractResolver

/// Resolves serialization contracts for described types, by rule.
///
/// The resolver is an explicit, owned configuration object: build it once at
/// startup, register every rule set, then share it immutably with the
/// serialization path. Registration takes `&mut self` and resolution takes
/// `&self`, so the borrow checker enforces the register-then-resolve
/// lifecycle.
///
/// # Rule lookup
///
/// A type is *governed* when it, or an ancestor reachable through its
/// descriptor's parent links, has a registered rule set. The walk starts at
/// the concrete type, so the nearest registered ancestor deterministically
/// supplies the rules.
///
/// # Caching
///
/// Contracts of governed types are cached per concrete type and never
/// evicted; rules are read-only after startup, so cached contracts cannot go
/// stale. Resolving the same type twice returns the same `Arc`. Ungoverned
/// types pass through to a plain default contract and are not cached here.
///
/// # Examples
///
/// ```
/// use serde_contract::{ContractResolver, impl_describe};
///
/// struct Account {
///     id: u32,
///     balance: f64,
///     hidden: bool,
/// }
///
/// impl_describe! {
///     impl Account {
///         path = "bank::Account";
///         members = [id, balance, hidden];
///     }
/// }
///
/// let mut resolver = ContractResolver::new();
/// resolver
///     .register_with::<Account, _>(|rules| rules.ignore("hidden"))
///     .unwrap();
///
/// let contract = resolver.resolve::<Account>().unwrap();
/// let names: Vec<_> = contract.member_names().collect();
/// assert_eq!(names, ["id", "balance"]);
/// ```
pub struct ContractResolver {
    registry: TypeIdMap<Registration>,
    path_to_id: HashMap<&'static str, TypeId>,
    cache: RwLock<TypeIdMap<Arc<Contract>>>,
    policy: Box<dyn NamingPolicy + Send + Sync>,
}

impl ContractResolver {
    /// Creates a resolver with the camelCase naming policy.
    pub fn new() -> Self {
        Self::with_policy(CamelCase)
    }

    /// Creates a resolver with the given naming policy.
    pub fn with_policy(policy: impl NamingPolicy + Send + Sync + 'static) -> Self {
        Self {
            registry: TypeIdMap::new(),
            path_to_id: HashMap::default(),
            cache: RwLock::new(TypeIdMap::new()),
            policy: Box::new(policy),
        }
    }

    // -------------------------------------------------------------------------
    // Registration

    /// Registers `T` with an empty rule set.
    ///
    /// This forces `T` to be treated as a governed type even with zero
    /// overrides, which pins its contract into the cache. First registration
    /// wins: returns `false` and changes nothing if `T` is already
    /// registered.
    pub fn register<T: Described>(&mut self) -> bool {
        self.insert_registration::<T>(TypeRules::new())
    }

    /// Registers `T` with the rules produced by `configure`.
    ///
    /// `configure` receives a fresh builder scoped to `T`; an invalid member
    /// name given to the builder surfaces here. Registering an already
    /// registered type is a silent no-op (`Ok(false)`): the first
    /// registration wins, later ones are dropped, not merged.
    ///
    /// ```
    /// use serde_contract::{ContractResolver, impl_describe};
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
    /// let contract = resolver.resolve::<Point>().unwrap();
    /// let names: Vec<_> = contract.member_names().collect();
    /// assert_eq!(names, ["x", "y", "cachedHash"]);
    /// ```
    pub fn register_with<T, F>(&mut self, configure: F) -> Result<bool, ContractError>
    where
        T: Described,
        F: FnOnce(RulesBuilder<T>) -> RulesBuilder<T>,
    {
        let rules = configure(RulesBuilder::new()).finish()?;
        Ok(self.insert_registration::<T>(rules))
    }

    fn insert_registration<T: Described>(&mut self, rules: TypeRules) -> bool {
        let desc = T::type_desc();
        let inserted = self.registry.try_insert(desc.ty().id(), || Registration {
            rules,
            desc: T::type_desc,
        });
        if inserted {
            self.path_to_id.insert(desc.ty().path(), desc.ty().id());
        }
        inserted
    }

    /// Returns `true` if `T` itself carries a registered rule set.
    pub fn is_registered<T: Described>(&self) -> bool {
        self.registry.contains(&TypeId::of::<T>())
    }

    /// Returns the number of registered rule sets.
    pub fn registered_len(&self) -> usize {
        self.registry.len()
    }

    // -------------------------------------------------------------------------
    // Resolution

    /// Resolves the contract for `T`.
    ///
    /// See [`resolve_desc`](Self::resolve_desc).
    pub fn resolve<T: Described>(&self) -> Result<Arc<Contract>, ContractError> {
        self.resolve_desc(T::type_desc())
    }

    /// Resolves the contract for the type registered under `path`.
    ///
    /// Only registered types are reachable by path; an absent path fails
    /// with [`ContractError::UnknownTypePath`].
    pub fn resolve_path(&self, path: &str) -> Result<Arc<Contract>, ContractError> {
        let id = self
            .path_to_id
            .get(path)
            .ok_or_else(|| ContractError::UnknownTypePath { path: path.into() })?;
        // The path index only holds registered ids.
        let registration = self.registry.get(id).expect("indexed registration");
        self.resolve_desc((registration.desc)())
    }

    /// Resolves the contract for the type described by `desc`.
    ///
    /// Governed types get their member list rebuilt from the rules of the
    /// nearest registered ancestor, exactly once; later calls return the
    /// cached contract. Ungoverned types produce a fresh pass-through
    /// contract of the default members under the naming policy.
    pub fn resolve_desc(&self, desc: &'static TypeDesc) -> Result<Arc<Contract>, ContractError> {
        let id = desc.ty().id();

        if let Some(contract) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Ok(contract.clone());
        }

        let Some(rules) = self.governing_rules(desc) else {
            return Ok(Arc::new(self.default_contract(desc)));
        };

        let members = self.enumerate_members(desc, rules)?;
        let contract = Arc::new(Contract::new(desc.ty(), true, members));

        // First writer wins: a contract built concurrently for the same type
        // is identical, the loser is simply dropped.
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.get_or_insert(id, || contract).clone())
    }

    /// Returns `true` if a contract for `T` is already cached.
    pub fn is_cached<T: Described>(&self) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&TypeId::of::<T>())
    }

    // -------------------------------------------------------------------------
    // Member enumeration

    /// Finds the rule set of the nearest registered ancestor, if any.
    fn governing_rules(&self, desc: &'static TypeDesc) -> Option<&TypeRules> {
        let mut current = Some(desc);
        while let Some(d) = current {
            if let Some(registration) = self.registry.get(&d.ty().id()) {
                return Some(&registration.rules);
            }
            current = d.parent().map(|parent| parent.desc());
        }
        None
    }

    /// The contract an ungoverned type passes through to: the default
    /// members under the naming policy, nothing added, nothing removed.
    fn default_contract(&self, desc: &'static TypeDesc) -> Contract {
        let members = desc
            .members()
            .iter()
            .map(|member| {
                let output = self.policy.transform(member.name()).into_owned();
                ContractMember::declared(output.into_boxed_str(), member)
            })
            .collect();
        Contract::new(desc.ty(), false, members)
    }

    /// Builds the member list of a governed type.
    ///
    /// Default members keep their declaration order; included members are
    /// located in the hidden tables of `desc` and its ancestors and appended
    /// in registration order, after an output-name conflict check; the
    /// ignore filter runs last, so an exclusion beats an inclusion of the
    /// same name.
    fn enumerate_members(
        &self,
        desc: &'static TypeDesc,
        rules: &TypeRules,
    ) -> Result<Box<[ContractMember]>, ContractError> {
        let mut members: Vec<ContractMember> = desc
            .members()
            .iter()
            .map(|member| {
                let output = self.policy.transform(member.name()).into_owned();
                ContractMember::declared(output.into_boxed_str(), member)
            })
            .collect();

        for name in rules.included() {
            let Some((member, upcasts)) = desc.find_hidden(name) else {
                return Err(ContractError::MemberNotFound {
                    type_path: desc.ty().path(),
                    name: name.into(),
                });
            };
            let output = self.policy.transform(name).into_owned();
            if members.iter().any(|existing| existing.name() == output) {
                return Err(ContractError::DuplicateMember {
                    type_path: desc.ty().path(),
                    name: output.into_boxed_str(),
                });
            }
            members.push(ContractMember::included(
                output.into_boxed_str(),
                member,
                upcasts,
            ));
        }

        members.retain(|member| !rules.is_ignored(member.declared_name()));
        Ok(members.into_boxed_slice())
    }
}

impl Default for ContractResolver {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ContractResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContractResolver")
            .field("registered", &self.registry.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::any::Any;

    use super::*;
    use crate::contract::MemberOrigin;
    use crate::desc::{DescCell, ErasedSerialize, MemberDesc, TypePath};
    use crate::impl_describe;
    use crate::naming::Preserve;

    struct Point {
        x: i32,
        y: i32,
        cached_hash: u64,
    }

    impl_describe! {
        impl Point {
            path = "geometry::Point";
            members = [x, y];
            hidden = [cached_hash];
        }
    }

    struct Account {
        id: u32,
        balance: f64,
        hidden: bool,
    }

    impl_describe! {
        impl Account {
            path = "bank::Account";
            members = [id, balance, hidden];
        }
    }

    struct Creds {
        user: String,
        secret: String,
        token: String,
    }

    impl_describe! {
        impl Creds {
            path = "auth::Creds";
            members = [user, secret];
            hidden = [token];
        }
    }

    // Inherits the rules of `Creds` through its parent link; never
    // registered itself in any test below.
    struct AdminCreds {
        base: Creds,
        level: u8,
    }

    impl TypePath for AdminCreds {
        fn type_path() -> &'static str {
            "auth::AdminCreds"
        }

        fn type_name() -> &'static str {
            "AdminCreds"
        }
    }

    impl Described for AdminCreds {
        fn type_desc() -> &'static TypeDesc {
            static CELL: DescCell = DescCell::new();
            CELL.get_or_init(|| {
                fn get_user(value: &dyn Any) -> Option<&(dyn ErasedSerialize + '_)> {
                    value
                        .downcast_ref::<AdminCreds>()
                        .map(|v| &v.base.user as &dyn ErasedSerialize)
                }
                fn get_secret(value: &dyn Any) -> Option<&(dyn ErasedSerialize + '_)> {
                    value
                        .downcast_ref::<AdminCreds>()
                        .map(|v| &v.base.secret as &dyn ErasedSerialize)
                }
                fn get_level(value: &dyn Any) -> Option<&(dyn ErasedSerialize + '_)> {
                    value
                        .downcast_ref::<AdminCreds>()
                        .map(|v| &v.level as &dyn ErasedSerialize)
                }
                fn upcast(value: &dyn Any) -> Option<&dyn Any> {
                    value
                        .downcast_ref::<AdminCreds>()
                        .map(|v| &v.base as &dyn Any)
                }
                TypeDesc::new::<AdminCreds>(
                    &[
                        MemberDesc::new("user", get_user),
                        MemberDesc::new("secret", get_secret),
                        MemberDesc::new("level", get_level),
                    ],
                    &[],
                )
                .with_parent::<Creds>(upcast)
            })
        }
    }

    // Declared member and hidden member that collide after the camelCase
    // transform, despite different declared names.
    struct Clash {
        cached_hash: u64,
    }

    impl TypePath for Clash {
        fn type_path() -> &'static str {
            "tests::Clash"
        }

        fn type_name() -> &'static str {
            "Clash"
        }
    }

    impl Described for Clash {
        fn type_desc() -> &'static TypeDesc {
            static CELL: DescCell = DescCell::new();
            CELL.get_or_init(|| {
                fn get(value: &dyn Any) -> Option<&(dyn ErasedSerialize + '_)> {
                    value
                        .downcast_ref::<Clash>()
                        .map(|v| &v.cached_hash as &dyn ErasedSerialize)
                }
                TypeDesc::new::<Clash>(
                    &[MemberDesc::new("cached_hash", get)],
                    &[MemberDesc::new("cachedHash", get)],
                )
            })
        }
    }

    #[test]
    fn unregistered_type_passes_through() {
        let resolver = ContractResolver::new();
        let contract = resolver.resolve::<Account>().unwrap();

        assert!(!contract.is_governed());
        let names: Vec<_> = contract.member_names().collect();
        assert_eq!(names, ["id", "balance", "hidden"]);
        assert!(!resolver.is_cached::<Account>());
    }

    #[test]
    fn include_appends_readable_member() {
        let mut resolver = ContractResolver::new();
        resolver
            .register_with::<Point, _>(|rules| rules.include("cached_hash"))
            .unwrap();

        let contract = resolver.resolve::<Point>().unwrap();
        assert!(contract.is_governed());

        let names: Vec<_> = contract.member_names().collect();
        assert_eq!(names, ["x", "y", "cachedHash"]);

        let member = contract.member("cachedHash").unwrap();
        assert!(member.is_readable());
        assert_eq!(member.origin(), MemberOrigin::Included);
        assert_eq!(member.declared_name(), "cached_hash");
    }

    #[test]
    fn ignore_removes_member_entirely() {
        let mut resolver = ContractResolver::new();
        resolver
            .register_with::<Account, _>(|rules| rules.ignore("Hidden"))
            .unwrap();

        let contract = resolver.resolve::<Account>().unwrap();
        let names: Vec<_> = contract.member_names().collect();
        assert_eq!(names, ["id", "balance"]);
    }

    #[test]
    fn resolve_is_idempotent_and_cached() {
        let mut resolver = ContractResolver::new();
        resolver
            .register_with::<Point, _>(|rules| rules.include("cached_hash"))
            .unwrap();

        let first = resolver.resolve::<Point>().unwrap();
        assert!(resolver.is_cached::<Point>());

        // Same `Arc`, so no member list was rebuilt.
        let second = resolver.resolve::<Point>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            first.member_names().collect::<Vec<_>>(),
            second.member_names().collect::<Vec<_>>(),
        );
    }

    #[test]
    fn registering_without_rules_governs_and_caches() {
        let mut resolver = ContractResolver::new();
        assert!(resolver.register::<Account>());

        let contract = resolver.resolve::<Account>().unwrap();
        assert!(contract.is_governed());
        assert!(resolver.is_cached::<Account>());
    }

    #[test]
    fn first_registration_wins() {
        let mut resolver = ContractResolver::new();
        assert!(
            resolver
                .register_with::<Account, _>(|rules| rules.ignore("hidden"))
                .unwrap()
        );
        // Dropped, not merged.
        assert!(
            !resolver
                .register_with::<Account, _>(|rules| rules.ignore("balance"))
                .unwrap()
        );

        let contract = resolver.resolve::<Account>().unwrap();
        let names: Vec<_> = contract.member_names().collect();
        assert_eq!(names, ["id", "balance"]);
    }

    #[test]
    fn subtype_inherits_ancestor_rules() {
        let mut resolver = ContractResolver::new();
        resolver
            .register_with::<Creds, _>(|rules| rules.ignore("secret"))
            .unwrap();

        let contract = resolver.resolve::<AdminCreds>().unwrap();
        assert!(contract.is_governed());

        let names: Vec<_> = contract.member_names().collect();
        assert_eq!(names, ["user", "level"]);

        // Cached under the concrete type, not the governing ancestor.
        assert!(resolver.is_cached::<AdminCreds>());
        assert!(!resolver.is_cached::<Creds>());
    }

    #[test]
    fn inherited_include_reaches_ancestor_hidden_member() {
        let mut resolver = ContractResolver::new();
        resolver
            .register_with::<Creds, _>(|rules| rules.include("token"))
            .unwrap();

        let contract = resolver.resolve::<AdminCreds>().unwrap();
        let member = contract.member("token").unwrap();

        let admin = AdminCreds {
            base: Creds {
                user: "root".into(),
                secret: "s".into(),
                token: "t0k".into(),
            },
            level: 9,
        };
        assert!(member.read(&admin).is_some());
    }

    #[test]
    fn missing_hidden_member_fails_on_first_resolution() {
        let mut resolver = ContractResolver::new();
        // Registration itself succeeds; resolution is lazy.
        resolver
            .register_with::<Point, _>(|rules| rules.include("nope"))
            .unwrap();

        let err = resolver.resolve::<Point>().unwrap_err();
        assert_eq!(
            err,
            ContractError::MemberNotFound {
                type_path: "geometry::Point",
                name: "nope".into(),
            }
        );
        assert!(!resolver.is_cached::<Point>());
    }

    #[test]
    fn colliding_output_names_fail() {
        let mut resolver = ContractResolver::new();
        resolver
            .register_with::<Clash, _>(|rules| rules.include("cachedHash"))
            .unwrap();

        let err = resolver.resolve::<Clash>().unwrap_err();
        assert_eq!(
            err,
            ContractError::DuplicateMember {
                type_path: "tests::Clash",
                name: "cachedHash".into(),
            }
        );
    }

    #[test]
    fn exclude_wins_over_include() {
        let mut resolver = ContractResolver::new();
        resolver
            .register_with::<Point, _>(|rules| {
                rules.include("cached_hash").ignore("cached_hash")
            })
            .unwrap();

        let contract = resolver.resolve::<Point>().unwrap();
        let names: Vec<_> = contract.member_names().collect();
        assert_eq!(names, ["x", "y"]);
    }

    #[test]
    fn invalid_member_name_fails_registration() {
        let mut resolver = ContractResolver::new();
        let err = resolver
            .register_with::<Point, _>(|rules| rules.ignore("x.y"))
            .unwrap_err();
        assert_eq!(err, ContractError::InvalidMemberName { name: "x.y".into() });
        assert!(!resolver.is_registered::<Point>());
    }

    #[test]
    fn resolve_path_finds_registered_types() {
        let mut resolver = ContractResolver::new();
        resolver.register::<Point>();

        let contract = resolver.resolve_path("geometry::Point").unwrap();
        assert!(contract.ty().is::<Point>());

        let err = resolver.resolve_path("no::Such").unwrap_err();
        assert_eq!(
            err,
            ContractError::UnknownTypePath {
                path: "no::Such".into(),
            }
        );
    }

    #[test]
    fn preserve_policy_keeps_declared_names() {
        let mut resolver = ContractResolver::with_policy(Preserve);
        resolver
            .register_with::<Point, _>(|rules| rules.include("cached_hash"))
            .unwrap();

        let contract = resolver.resolve::<Point>().unwrap();
        let names: Vec<_> = contract.member_names().collect();
        assert_eq!(names, ["x", "y", "cached_hash"]);
    }

    #[test]
    fn concurrent_first_resolution_converges() {
        let mut resolver = ContractResolver::new();
        resolver
            .register_with::<Point, _>(|rules| rules.include("cached_hash"))
            .unwrap();
        let resolver = Arc::new(resolver);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                std::thread::spawn(move || resolver.resolve::<Point>().unwrap())
            })
            .collect();

        let contracts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let cached = resolver.resolve::<Point>().unwrap();
        for contract in &contracts {
            assert!(Arc::ptr_eq(contract, &cached));
        }
    }
}
