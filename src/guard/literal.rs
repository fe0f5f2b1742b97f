use std::{cmp::Ordering, fmt::Display};

use crate::{
    formula::{Atom, Formula, Kind},
    Error, Result,
};

/// A literal of a [`super::Guard`]: the constant true, an atomic proposition or a negated one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal<A> {
    /// Holds in every valuation.
    True,
    /// Holds if the atom is true.
    Positive(A),
    /// Holds if the atom is false.
    Negative(A),
}

impl<A> Literal<A> {
    /// The atom, if this is not [`Literal::True`].
    pub fn atom(&self) -> Option<&A> {
        match self {
            Literal::True => None,
            Literal::Positive(a) | Literal::Negative(a) => Some(a),
        }
    }

    /// Returns true for [`Literal::Negative`].
    pub fn is_negated(&self) -> bool {
        matches!(self, Literal::Negative(_))
    }
}

impl<A: Atom> Literal<A> {
    /// Converts a literal formula. The constant `false` has no counterpart and is rejected just
    /// like formulas which are not literals at all.
    pub fn from_formula(formula: &Formula<A>) -> Result<Self> {
        match formula.kind() {
            Kind::True => Ok(Literal::True),
            Kind::Proposition => formula
                .atom()
                .map(|atom| Literal::Positive(atom.clone()))
                .ok_or_else(|| Error::NotALiteral(formula.to_string())),
            Kind::Not => formula
                .sub1()
                .and_then(Formula::atom)
                .map(|atom| Literal::Negative(atom.clone()))
                .ok_or_else(|| Error::NotALiteral(formula.to_string())),
            _ => Err(Error::NotALiteral(formula.to_string())),
        }
    }

    /// Evaluates the literal, atoms that are not assigned by `valuation` are false.
    pub fn holds(&self, valuation: impl Fn(&A) -> Option<bool>) -> bool {
        match self {
            Literal::True => true,
            Literal::Positive(a) => valuation(a).unwrap_or(false),
            Literal::Negative(a) => !valuation(a).unwrap_or(false),
        }
    }
}

impl<A: Display> Display for Literal<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::True => write!(f, "TRUE"),
            Literal::Positive(a) => write!(f, "{a}"),
            Literal::Negative(a) => write!(f, "!{a}"),
        }
    }
}

impl<A: Ord> PartialOrd for Literal<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders [`Literal::True`] first, then by atom, where the negated literal directly follows its
/// positive counterpart.
impl<A: Ord> Ord for Literal<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.atom(), other.atom()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a
                .cmp(b)
                .then_with(|| self.is_negated().cmp(&other.is_negated())),
        }
    }
}

/// Orders literals over atom types without a native order. The first time an atom is seen, it is
/// assigned the next free slot, atoms are then compared by their slot. The resulting order is
/// stable for the lifetime of the ranking but carries no meaning beyond it.
#[derive(Debug, Clone)]
pub struct AtomRanking<A> {
    slots: Vec<A>,
}

impl<A> Default for AtomRanking<A> {
    fn default() -> Self {
        Self { slots: vec![] }
    }
}

impl<A: Atom> AtomRanking<A> {
    /// Creates a ranking in which no atom has been seen yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot of `atom`, assigning a fresh one if the atom is new. Fails if the atom is
    /// equal to atoms in two different slots, which can only happen if its equality is not
    /// transitive.
    pub fn rank(&mut self, atom: &A) -> Result<usize> {
        let mut matching = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| *slot == atom)
            .map(|(i, _)| i);
        match (matching.next(), matching.next()) {
            (Some(i), None) => Ok(i),
            (Some(_), Some(_)) => Err(Error::NonTransitiveAtom(atom.to_string())),
            (None, _) => {
                self.slots.push(atom.clone());
                Ok(self.slots.len() - 1)
            }
        }
    }

    /// Compares two literals in the same way as the [`Ord`] implementation of [`Literal`] does for
    /// ordered atoms, using the slots in place of the atoms.
    pub fn compare(&mut self, l: &Literal<A>, r: &Literal<A>) -> Result<Ordering> {
        Ok(match (l.atom(), r.atom()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => self
                .rank(a)?
                .cmp(&self.rank(b)?)
                .then_with(|| l.is_negated().cmp(&r.is_negated())),
        })
    }

    /// Sorts `literals` according to [`AtomRanking::compare`].
    pub fn sort(&mut self, literals: &mut [Literal<A>]) -> Result<()> {
        for literal in literals.iter() {
            if let Some(atom) = literal.atom() {
                self.rank(atom)?;
            }
        }
        let mut failure = None;
        literals.sort_by(|l, r| match self.compare(l, r) {
            Ok(ordering) => ordering,
            Err(e) => {
                failure.get_or_insert(e);
                Ordering::Equal
            }
        });
        failure.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use std::{cmp::Ordering, fmt::Display, hash::Hash};

    use super::{AtomRanking, Literal};
    use crate::{formula::Session, Error};

    #[test]
    fn literal_order() {
        let mut literals = vec![
            Literal::Negative("b"),
            Literal::Positive("b"),
            Literal::True,
            Literal::Negative("a"),
        ];
        literals.sort();
        assert_eq!(
            literals,
            vec![
                Literal::True,
                Literal::Negative("a"),
                Literal::Positive("b"),
                Literal::Negative("b")
            ]
        );
    }

    /// Ordered, but neither printable nor hashable.
    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
    struct Slot(u8);

    #[test]
    fn literals_over_plain_ordered_atoms() {
        let mut literals = vec![
            Literal::Positive(Slot(2)),
            Literal::Negative(Slot(1)),
            Literal::True,
            Literal::Positive(Slot(1)),
        ];
        literals.sort();
        assert_eq!(literals[0], Literal::True);
        assert_eq!(literals[1].atom(), Some(&Slot(1)));
        assert!(!literals[1].is_negated());
        assert!(literals[2].is_negated());
        assert_eq!(literals[3], Literal::Positive(Slot(2)));
    }

    #[test]
    fn from_formulas() {
        let s = Session::new();
        let a = s.prop("a");
        assert_eq!(Literal::from_formula(&a).unwrap(), Literal::Positive("a"));
        assert_eq!(
            Literal::from_formula(&s.not(&a)).unwrap(),
            Literal::Negative("a")
        );
        assert!(matches!(
            Literal::from_formula(&s.next(&a)),
            Err(Error::NotALiteral(_))
        ));
        assert!(Literal::from_formula(&s.ff()).is_err());
    }

    #[test]
    fn ranking_is_first_seen() {
        let mut ranking = AtomRanking::new();
        let (x, y) = (Literal::Positive("x"), Literal::Negative("y"));
        assert_eq!(ranking.compare(&y, &x).unwrap(), Ordering::Less);
        assert_eq!(ranking.compare(&x, &y).unwrap(), Ordering::Greater);
        assert_eq!(
            ranking.compare(&Literal::Positive("y"), &y).unwrap(),
            Ordering::Less
        );
        assert_eq!(ranking.compare(&Literal::True, &x).unwrap(), Ordering::Less);
    }

    /// An atom that equals everything within distance one, which is not transitive.
    #[derive(Debug, Clone, Copy)]
    struct Near(i32);
    impl PartialEq for Near {
        fn eq(&self, other: &Self) -> bool {
            (self.0 - other.0).abs() <= 1
        }
    }
    impl Eq for Near {}
    impl Hash for Near {
        fn hash<H: std::hash::Hasher>(&self, _state: &mut H) {}
    }
    impl Display for Near {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "near {}", self.0)
        }
    }

    #[test]
    fn non_transitive_atoms_are_detected() {
        let mut ranking = AtomRanking::new();
        assert_eq!(ranking.rank(&Near(0)).unwrap(), 0);
        assert_eq!(ranking.rank(&Near(2)).unwrap(), 1);
        assert!(matches!(
            ranking.rank(&Near(1)),
            Err(Error::NonTransitiveAtom(_))
        ));
    }
}
