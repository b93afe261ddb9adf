//! Owner-chosen display order for categories and products.
//!
//! A sequence is the literal list of IDs the owner arranged. Reorders replace
//! the whole list, so the only checks needed are that the new list is a
//! permutation of the IDs currently in scope.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::hash::Hash;

use thiserror::Error;

/// A proposed sequence does not match the IDs it orders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError<T: Display> {
    /// The same ID appears more than once.
    #[error("id {0} appears more than once in the sequence")]
    Duplicate(T),
    /// The sequence names an ID that does not exist in this scope.
    #[error("id {0} does not exist")]
    Unknown(T),
    /// An existing ID is absent from the sequence.
    #[error("id {0} is missing from the sequence")]
    Missing(T),
}

/// Check that `proposed` contains every ID in `existing` exactly once.
///
/// # Errors
///
/// Returns the first problem found, checking duplicates and unknown IDs in
/// `proposed` order, then missing IDs in ascending order.
///
/// ```
/// use mobile_order_core::{CategoryId, SequenceError, validate_permutation};
///
/// let existing = [CategoryId::new(1), CategoryId::new(2)];
/// assert!(validate_permutation(&[CategoryId::new(2), CategoryId::new(1)], &existing).is_ok());
/// assert_eq!(
///     validate_permutation(&[CategoryId::new(2)], &existing),
///     Err(SequenceError::Missing(CategoryId::new(1)))
/// );
/// ```
pub fn validate_permutation<T>(proposed: &[T], existing: &[T]) -> Result<(), SequenceError<T>>
where
    T: Copy + Ord + Display,
{
    let existing: BTreeSet<T> = existing.iter().copied().collect();
    let mut seen = BTreeSet::new();

    for &id in proposed {
        if !existing.contains(&id) {
            return Err(SequenceError::Unknown(id));
        }
        if !seen.insert(id) {
            return Err(SequenceError::Duplicate(id));
        }
    }

    match existing.difference(&seen).next() {
        Some(&missing) => Err(SequenceError::Missing(missing)),
        None => Ok(()),
    }
}

/// Sort `items` by their position in `sequence`.
///
/// Items whose ID is not in the sequence keep a stable place after the
/// sequenced ones, ordered by ascending ID. Sequence entries with no matching
/// item are ignored.
pub fn order_by_sequence<T, I, F>(items: Vec<T>, sequence: &[I], key: F) -> Vec<T>
where
    I: Copy + Ord + Hash,
    F: Fn(&T) -> I,
{
    let positions: HashMap<I, usize> = sequence
        .iter()
        .enumerate()
        .map(|(position, &id)| (id, position))
        .collect();

    let mut items = items;
    items.sort_by(|a, b| {
        let (ka, kb) = (key(a), key(b));
        match (positions.get(&ka), positions.get(&kb)) {
            (Some(pa), Some(pb)) => pa.cmp(pb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => ka.cmp(&kb),
        }
    });
    items
}
