use bit_set::BitSet;
use itertools::Itertools;

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// A set of acceptance set indices, used to mark transitions of an automaton as well as nodes and
/// edges of a [`crate::Graph`]. A Büchi graph has a single acceptance set with index `0`.
#[derive(Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct AcceptanceMask(BitSet);

impl AcceptanceMask {
    /// Creates an empty mask.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the mask containing all indices in `0..sets`.
    pub fn full(sets: usize) -> Self {
        Self((0..sets).collect())
    }

    /// Returns an iterator over the contained indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter()
    }

    /// Returns true if `index` is contained in the mask.
    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(index)
    }

    /// Adds `index`, returns true if it was not present before.
    pub fn insert(&mut self, index: usize) -> bool {
        self.0.insert(index)
    }

    /// Removes `index`, returns true if it was present before.
    pub fn remove(&mut self, index: usize) -> bool {
        self.0.remove(index)
    }

    /// Number of contained indices.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no index is contained.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Removes all indices.
    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Adds all indices of `other` to `self`.
    pub fn union_with(&mut self, other: &AcceptanceMask) {
        self.0.union_with(&other.0)
    }

    /// Returns the mask of all indices in `0..sets` that are *not* contained in `self`.
    pub fn complement(&self, sets: usize) -> Self {
        Self((0..sets).filter(|i| !self.contains(*i)).collect())
    }

    /// Returns true if every index in `0..sets` is contained.
    pub fn covers(&self, sets: usize) -> bool {
        (0..sets).all(|i| self.contains(i))
    }
}

impl FromIterator<usize> for AcceptanceMask {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Debug for AcceptanceMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.iter().join(", "))
    }
}

impl std::fmt::Display for AcceptanceMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::AcceptanceMask;

    #[test]
    fn complement_and_cover() {
        let mask = AcceptanceMask::from_iter([0, 2]);
        assert_eq!(mask.complement(4), AcceptanceMask::from_iter([1, 3]));
        assert!(!mask.covers(3));
        assert!(AcceptanceMask::full(3).covers(3));
        assert!(AcceptanceMask::new().covers(0));
        assert_eq!(format!("{mask}"), "{0, 2}");
    }
}
