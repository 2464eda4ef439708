//! Boolean "same entity" predicates over free-text labels.
//!
//! Nothing here scores or ranks: a label either denotes the same state,
//! district, market or commodity, or it doesn't.

use std::collections::HashSet;

use crate::matching::normalize;

/// Loose match between two raw labels.
///
/// Both sides are normalized first, then, in order:
/// 1. empty on either side never matches
/// 2. equal strings match
/// 3. substring containment in either direction matches
/// 4. the smaller token set being a subset of the larger one matches
///
/// Every step is symmetric, so `loose_match(a, b) == loose_match(b, a)`.
///
/// Step 4 has no minimum token count: a one-word label matches any label that
/// contains that word as a token.
pub fn loose_match(a: &str, b: &str) -> bool {
    loose_match_normalized(&normalize(a), &normalize(b))
}

/// [`loose_match`] for inputs that are already normalized.
pub fn loose_match_normalized(a: &str, b: &str) -> bool {
    if contains_match(a, b) {
        return true;
    }
    if a.is_empty() || b.is_empty() {
        return false;
    }

    let a_tokens: HashSet<&str> = a.split(' ').collect();
    let b_tokens: HashSet<&str> = b.split(' ').collect();
    let (small, large) = if a_tokens.len() <= b_tokens.len() {
        (a_tokens, b_tokens)
    } else {
        (b_tokens, a_tokens)
    };
    small.is_subset(&large)
}

/// Equality-or-containment between two normalized labels.
///
/// This is the commodity predicate used by price resolution, where dataset
/// names are near-duplicates like "Rice" vs "Paddy(Dhan)(Common)" after
/// synonym mapping. Empty labels never match.
pub fn contains_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(b) || b.contains(a)
}
