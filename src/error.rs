use core::{error, fmt};

/// An enumeration of all error outcomes of rule registration and
/// contract resolution.
///
/// Every variant is an unrecoverable configuration mistake: the inputs are
/// static and deterministic, so a failing call fails identically forever.
/// The fix is always to correct the registration, never to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Resolution was requested through a type path that no registered
    /// descriptor carries.
    UnknownTypePath { path: Box<str> },
    /// A rule was given a name that is not a direct member name.
    InvalidMemberName { name: Box<str> },
    /// An included name does not match any hidden member of the resolved
    /// type or its ancestors.
    MemberNotFound {
        type_path: &'static str,
        name: Box<str>,
    },
    /// The output name of an included member collides with a member that is
    /// already part of the contract.
    DuplicateMember {
        type_path: &'static str,
        name: Box<str>,
    },
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTypePath { path } => {
                write!(f, "no type registered under path `{path}`")
            }
            Self::InvalidMemberName { name } => {
                write!(f, "`{name}` is not a direct member name")
            }
            Self::MemberNotFound { type_path, name } => {
                write!(f, "type `{type_path}` has no hidden member named `{name}`")
            }
            Self::DuplicateMember { type_path, name } => {
                write!(
                    f,
                    "type `{type_path}` already contains a member with the output name `{name}`"
                )
            }
        }
    }
}

impl error::Error for ContractError {}
