use std::{fmt::Display, str::FromStr};

use itertools::Itertools;

use crate::{
    formula::{Atom, Formula, Kind},
    Error, Map, Result,
};

mod literal;
pub use literal::{AtomRanking, Literal};

/// A conjunction of [`Literal`]s labelling a transition. The empty guard is true.
///
/// Two guards are equal if each one's literals are contained in the other one, which means order
/// and duplicates do not matter.
///
/// ```
/// use ltl2buchi::prelude::*;
///
/// let (a, b) = (Literal::Positive("a"), Literal::Negative("b"));
/// let ab = Guard::from_iter([a.clone(), b.clone()]);
/// assert_eq!(ab, Guard::from_iter([b.clone(), a.clone(), b.clone()]));
/// assert_ne!(ab, Guard::from_iter([a]));
/// ```
#[derive(Debug, Clone)]
pub struct Guard<A>(Vec<Literal<A>>);

impl<A> Default for Guard<A> {
    fn default() -> Self {
        Self(vec![])
    }
}

impl<A: Atom> Guard<A> {
    /// Creates the empty, i.e. always enabled, guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the guard from the literals among `formulas`, every other formula is skipped. Fails
    /// if `false` is among them, as such a guard could never be enabled.
    pub fn from_formulas<'a, I>(formulas: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Formula<A>>,
        A: 'a,
    {
        let mut guard = Self::new();
        for formula in formulas.into_iter().filter(|f| f.is_literal()) {
            if formula.kind() != Kind::True {
                guard.push(Literal::from_formula(formula)?);
            }
        }
        Ok(guard)
    }

    /// Adds a literal to the conjunction.
    pub fn push(&mut self, literal: Literal<A>) {
        self.0.push(literal)
    }

    /// Iterates over the literals in insertion order.
    pub fn literals(&self) -> impl Iterator<Item = &Literal<A>> + '_ {
        self.0.iter()
    }

    /// The number of stored literals, duplicates included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no literal is stored.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if every literal of `self` also occurs in `other`.
    pub fn subterm_of(&self, other: &Guard<A>) -> bool {
        self.0.iter().all(|l| other.0.contains(l))
    }

    /// Returns true if all literals hold under `valuation`. Unassigned atoms are false.
    pub fn enabled(&self, valuation: &Map<A, bool>) -> bool {
        self.0
            .iter()
            .all(|literal| literal.holds(|atom| valuation.get(atom).copied()))
    }

    /// Returns true if the guard contains an atom together with its negation.
    pub fn is_contradictory(&self) -> bool {
        self.0.iter().any(|l| match l {
            Literal::Positive(a) => self.0.contains(&Literal::Negative(a.clone())),
            _ => false,
        })
    }

    /// Returns a copy whose literals are sorted with `ranking` and deduplicated.
    pub fn normalized(&self, ranking: &mut AtomRanking<A>) -> Result<Self> {
        let mut literals = self.0.clone();
        ranking.sort(&mut literals)?;
        literals.dedup();
        Ok(Self(literals))
    }
}

impl<A: Atom> PartialEq for Guard<A> {
    fn eq(&self, other: &Self) -> bool {
        self.subterm_of(other) && other.subterm_of(self)
    }
}
impl<A: Atom> Eq for Guard<A> {}

impl<A> FromIterator<Literal<A>> for Guard<A> {
    fn from_iter<T: IntoIterator<Item = Literal<A>>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Writes the literals joined by `&`, the empty guard is written as `TRUE`.
impl<A: Display> Display for Guard<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "TRUE")
        } else {
            write!(f, "{}", self.0.iter().join("&"))
        }
    }
}

impl FromStr for Guard<String> {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.split('&')
            .map(str::trim)
            .map(|token| match token {
                "" => Err(format!("empty literal in guard \"{s}\"")),
                "TRUE" => Ok(Literal::True),
                _ => match token.strip_prefix('!').map(str::trim) {
                    Some("") => Err(format!("negation without atom in guard \"{s}\"")),
                    Some(atom) => Ok(Literal::Negative(atom.to_string())),
                    None => Ok(Literal::Positive(token.to_string())),
                },
            })
            .collect()
    }
}

impl<A: Atom> TryFrom<&[Formula<A>]> for Guard<A> {
    type Error = Error;

    fn try_from(value: &[Formula<A>]) -> std::result::Result<Self, Self::Error> {
        Self::from_formulas(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Guard, Literal};
    use crate::{formula::Session, guard::AtomRanking, Map};

    #[test]
    fn set_semantics() {
        let (a, b) = (Literal::Positive("a"), Literal::Positive("b"));
        let ab = Guard::from_iter([a.clone(), b.clone()]);
        let ba = Guard::from_iter([b.clone(), a.clone()]);
        let aba = Guard::from_iter([a.clone(), b.clone(), a.clone()]);
        assert_eq!(ab, ba);
        assert_eq!(ba, aba);
        assert_ne!(Guard::from_iter([a.clone()]), ab);
        assert!(Guard::from_iter([a]).subterm_of(&ab));
    }

    #[test]
    fn parse_and_display() {
        let guard: Guard<String> = "a & !b&TRUE".parse().unwrap();
        assert_eq!(guard.len(), 3);
        assert_eq!(guard.to_string(), "a&!b&TRUE");
        assert_eq!(Guard::<String>::new().to_string(), "TRUE");
        assert!("a&&b".parse::<Guard<String>>().is_err());
        assert!("!".parse::<Guard<String>>().is_err());
    }

    #[test]
    fn enabledness() {
        let guard = Guard::from_iter([Literal::Positive("a"), Literal::Negative("b")]);
        let mut valuation = Map::default();
        valuation.insert("a", true);
        assert!(guard.enabled(&valuation));
        valuation.insert("b", true);
        assert!(!guard.enabled(&valuation));
        assert!(Guard::new().enabled(&valuation));
    }

    #[test]
    fn built_from_literal_formulas() {
        let s = Session::new();
        let (a, b) = (s.prop("a"), s.prop("b"));
        let formulas = [s.tt(), a.clone(), s.not(&b), s.until(&a, &b)];
        let guard = Guard::from_formulas(&formulas).unwrap();
        assert_eq!(
            guard,
            Guard::from_iter([Literal::Negative("b"), Literal::Positive("a")])
        );
        assert!(Guard::from_formulas(&[s.ff()]).is_err());
    }

    #[test]
    fn normalization() {
        let guard = Guard::from_iter([
            Literal::Negative("b"),
            Literal::Positive("a"),
            Literal::Negative("b"),
        ]);
        let mut ranking = AtomRanking::new();
        ranking.rank(&"a").unwrap();
        let normal = guard.normalized(&mut ranking).unwrap();
        assert_eq!(normal.to_string(), "a&!b");
        assert!(!normal.is_contradictory());
        assert!(Guard::from_iter([Literal::Positive("a"), Literal::Negative("a")]).is_contradictory());
    }
}
