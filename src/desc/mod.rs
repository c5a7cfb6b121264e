//! Static type descriptions: the member tables the resolver works from.
//!
//! A described type carries a [`TypeDesc`]: its identity ([`Type`]), the
//! default member table (what serializes when no rules apply), a hidden
//! member table (non-public storage that only serializes when a rule
//! includes it), and an optional parent link for rule inheritance.

// -----------------------------------------------------------------------------
// Modules

mod member;
mod type_desc;
mod type_path;

// -----------------------------------------------------------------------------
// Exports

pub use member::{ErasedSerialize, Getter, MemberDesc, SerializePredicate, Upcast};
pub use type_desc::{Describe, Described, DescCell, ParentDesc, TypeDesc};
pub use type_path::{Type, TypePath, TypePathTable};
