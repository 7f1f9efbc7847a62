//! Value comparers used by change detection.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Equality and hashing used to decide whether a property changed.
pub trait ValueComparer<T>: Send + Sync {
    fn equals(&self, left: &T, right: &T) -> bool;

    fn hash_code(&self, value: &T) -> u64;
}

/// Structural equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultComparer;

impl<T: PartialEq + Hash> ValueComparer<T> for DefaultComparer {
    fn equals(&self, left: &T, right: &T) -> bool {
        left == right
    }

    fn hash_code(&self, value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }
}

/// Treats two lists as equal when they hold the same multiset of elements.
///
/// `[Chest, Triceps]` and `[Triceps, Chest]` are equal; `[Chest, Chest]` and
/// `[Chest]` are not.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnorderedListComparer;

impl<E: Ord + Hash> ValueComparer<Vec<E>> for UnorderedListComparer {
    fn equals(&self, left: &Vec<E>, right: &Vec<E>) -> bool {
        if left.len() != right.len() {
            return false;
        }
        let mut left: Vec<&E> = left.iter().collect();
        let mut right: Vec<&E> = right.iter().collect();
        left.sort();
        right.sort();
        left == right
    }

    fn hash_code(&self, value: &Vec<E>) -> u64 {
        // Summing element hashes is order-independent but keeps multiplicity.
        value.iter().fold(value.len() as u64, |acc, element| {
            let mut hasher = DefaultHasher::new();
            element.hash(&mut hasher);
            acc.wrapping_add(hasher.finish())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum Muscle {
        Chest,
        Triceps,
        Back,
    }

    #[test]
    fn reordered_lists_are_equal() {
        let comparer = UnorderedListComparer;
        let a = vec![Muscle::Chest, Muscle::Triceps];
        let b = vec![Muscle::Triceps, Muscle::Chest];
        assert!(comparer.equals(&a, &b));
        assert_eq!(comparer.hash_code(&a), comparer.hash_code(&b));
    }

    #[test]
    fn multiplicity_matters() {
        let comparer = UnorderedListComparer;
        let a = vec![Muscle::Chest, Muscle::Chest];
        let b = vec![Muscle::Chest];
        let c = vec![Muscle::Chest, Muscle::Back];
        assert!(!comparer.equals(&a, &b));
        assert!(!comparer.equals(&a, &c));
    }

    #[test]
    fn empty_lists_are_equal() {
        let comparer = UnorderedListComparer;
        let empty: Vec<Muscle> = Vec::new();
        assert!(comparer.equals(&empty, &Vec::new()));
    }

    #[test]
    fn default_comparer_respects_order() {
        let comparer = DefaultComparer;
        let a = vec![Muscle::Chest, Muscle::Triceps];
        let b = vec![Muscle::Triceps, Muscle::Chest];
        assert!(!comparer.equals(&a, &b));
        assert!(comparer.equals(&a, &a.clone()));
    }
}
