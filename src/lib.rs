#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Modules

mod error;

pub mod contract;
pub mod desc;
pub mod hash;
pub mod naming;
pub mod resolver;
pub mod rules;
pub mod ser;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use contract::{Contract, ContractMember, MemberOrigin};
pub use desc::{Describe, Described, MemberDesc, TypeDesc, TypePath};
pub use error::ContractError;
pub use naming::{CamelCase, NamingPolicy, Preserve};
pub use resolver::ContractResolver;
pub use rules::{RulesBuilder, TypeRules};
pub use ser::ContractSerializer;
