//! # Filter Algebra
//!
//! Stateless set operations over identifier lists, used to compose queries
//! such as "tagged A and in collection C".
//!
//! Inputs are treated as sets. Results hold no duplicates and keep the order
//! in which items first appear in the inputs, so the output is deterministic.

use crate::SatchelError;
use std::collections::BTreeSet;

fn dedup<T: Ord + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Items of either list.
pub fn union<T: Ord + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    dedup(a.iter().chain(b).cloned())
}

/// Items of any list.
pub fn union_all<T: Ord + Clone>(lists: &[Vec<T>]) -> Vec<T> {
    dedup(lists.iter().flatten().cloned())
}

/// Items present in both lists.
pub fn intersect<T: Ord + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let right: BTreeSet<&T> = b.iter().collect();
    dedup(a.iter().filter(|item| right.contains(item)).cloned())
}

/// Items present in every list.
///
/// No lists give an empty result; a single list gives that list.
pub fn intersect_all<T: Ord + Clone>(lists: &[Vec<T>]) -> Vec<T> {
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };
    rest.iter()
        .fold(dedup(first.iter().cloned()), |acc, list| intersect(&acc, list))
}

/// Items present in exactly one of the two lists.
pub fn symmetric_difference<T: Ord + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let left: BTreeSet<&T> = a.iter().collect();
    let right: BTreeSet<&T> = b.iter().collect();
    dedup(
        a.iter()
            .filter(|item| !right.contains(item))
            .chain(b.iter().filter(|item| !left.contains(item)))
            .cloned(),
    )
}

/// `superset` without the items of `subset`.
///
/// Fails if `superset` is empty or `subset` holds an item `superset` lacks.
pub fn invert<T: Ord + Clone>(superset: &[T], subset: &[T]) -> Result<Vec<T>, SatchelError> {
    if superset.is_empty() {
        return Err(SatchelError::InvalidArgument(
            "cannot invert against an empty superset".to_string(),
        ));
    }
    let outer: BTreeSet<&T> = superset.iter().collect();
    if let Some(stray) = subset.iter().position(|item| !outer.contains(item)) {
        return Err(SatchelError::InvalidArgument(format!(
            "subset item at position {} is not in the superset",
            stray
        )));
    }
    let inner: BTreeSet<&T> = subset.iter().collect();
    Ok(dedup(
        superset.iter().filter(|item| !inner.contains(item)).cloned(),
    ))
}
