//! Naming policies: the transform from declared member names to output names.

use std::borrow::Cow;

// -----------------------------------------------------------------------------
// NamingPolicy

/// A convention applied to declared member names to produce output names.
///
/// The resolver runs every member name through the policy of the resolver
/// instance, and conflict detection between members compares the transformed
/// names, not the declared ones.
pub trait NamingPolicy {
    /// Transforms a declared member name into its output name.
    fn transform<'a>(&self, declared: &'a str) -> Cow<'a, str>;
}

// -----------------------------------------------------------------------------
// CamelCase

/// Transforms declared names to camelCase.
///
/// Underscores are treated as word separators and dropped, the character
/// after each separator is uppercased, and a leading uppercase character is
/// lowered. Leading underscores are stripped without capitalizing.
///
/// # Examples
///
/// ```
/// use serde_contract::naming::{CamelCase, NamingPolicy};
///
/// assert_eq!(CamelCase.transform("x"), "x");
/// assert_eq!(CamelCase.transform("cached_hash"), "cachedHash");
/// assert_eq!(CamelCase.transform("_cached_hash"), "cachedHash");
/// assert_eq!(CamelCase.transform("Hidden"), "hidden");
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct CamelCase;

impl NamingPolicy for CamelCase {
    fn transform<'a>(&self, declared: &'a str) -> Cow<'a, str> {
        let unchanged = !declared.contains('_')
            && declared.chars().next().is_none_or(|c| !c.is_uppercase());
        if unchanged {
            return Cow::Borrowed(declared);
        }

        let mut output = String::with_capacity(declared.len());
        let mut at_start = true;
        let mut upper_next = false;
        for ch in declared.chars() {
            if ch == '_' {
                // A separator before the first letter must not capitalize it.
                upper_next = !at_start;
                continue;
            }
            if at_start {
                output.extend(ch.to_lowercase());
                at_start = false;
            } else if upper_next {
                output.extend(ch.to_uppercase());
                upper_next = false;
            } else {
                output.push(ch);
            }
        }
        Cow::Owned(output)
    }
}

// -----------------------------------------------------------------------------
// Preserve

/// Passes declared names through untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct Preserve;

impl NamingPolicy for Preserve {
    #[inline]
    fn transform<'a>(&self, declared: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(declared)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_leaves_single_words() {
        assert!(matches!(CamelCase.transform("balance"), Cow::Borrowed(_)));
    }

    #[test]
    fn camel_case_joins_words() {
        assert_eq!(CamelCase.transform("cached_hash_value"), "cachedHashValue");
    }

    #[test]
    fn camel_case_lowers_leading_upper() {
        assert_eq!(CamelCase.transform("Hidden"), "hidden");
    }

    #[test]
    fn camel_case_strips_leading_underscores() {
        assert_eq!(CamelCase.transform("__secret"), "secret");
        assert_eq!(CamelCase.transform("_cached_hash"), "cachedHash");
    }

    #[test]
    fn camel_case_handles_empty() {
        assert_eq!(CamelCase.transform(""), "");
    }

    #[test]
    fn preserve_is_identity() {
        assert_eq!(Preserve.transform("Hidden"), "Hidden");
    }
}
