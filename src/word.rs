use itertools::Itertools;

use crate::{
    formula::{Atom, Formula, Kind},
    Map,
};

/// An ultimately periodic infinite word over valuations, given by a finite spoke followed by a
/// non-empty cycle that repeats forever. Atoms a valuation does not assign are false.
///
/// Formulas are evaluated on the positions of `spoke · cycle`, where the successor of the last
/// position is the first position of the cycle.
///
/// ```
/// use ltl2buchi::prelude::*;
///
/// let s = Session::new();
/// let a = s.prop("a");
/// let on = Map::from_iter([("a", true)]);
/// let word = LassoWord::ultimately_periodic(vec![Map::default()], vec![on]);
/// assert!(word.satisfies(&s.eventually(&s.always(&a))));
/// assert!(!word.satisfies(&a));
/// ```
#[derive(Debug, Clone)]
pub struct LassoWord<A> {
    word: Vec<Map<A, bool>>,
    loop_index: usize,
}

impl<A: Atom> LassoWord<A> {
    /// Creates the word `spoke · cycle^ω`. Panics if `cycle` is empty.
    pub fn ultimately_periodic(spoke: Vec<Map<A, bool>>, cycle: Vec<Map<A, bool>>) -> Self {
        assert!(!cycle.is_empty(), "the cycle of an infinite word can not be empty");
        let loop_index = spoke.len();
        let mut word = spoke;
        word.extend(cycle);
        Self { word, loop_index }
    }

    /// Creates the word `cycle^ω`. Panics if `cycle` is empty.
    pub fn periodic(cycle: Vec<Map<A, bool>>) -> Self {
        Self::ultimately_periodic(vec![], cycle)
    }

    /// The valuations that are read once.
    pub fn spoke(&self) -> &[Map<A, bool>] {
        &self.word[..self.loop_index]
    }

    /// The valuations that repeat.
    pub fn cycle(&self) -> &[Map<A, bool>] {
        &self.word[self.loop_index..]
    }

    /// The spoke followed by one copy of the cycle.
    pub fn raw_word(&self) -> &[Map<A, bool>] {
        &self.word
    }

    /// The position following `position` in [`LassoWord::raw_word`].
    pub fn successor(&self, position: usize) -> usize {
        if position + 1 < self.word.len() {
            position + 1
        } else {
            self.loop_index
        }
    }

    /// The valuation at an arbitrary position of the infinite word.
    pub fn nth(&self, position: usize) -> &Map<A, bool> {
        if position < self.word.len() {
            &self.word[position]
        } else {
            let cycle = self.word.len() - self.loop_index;
            &self.word[self.loop_index + (position - self.loop_index) % cycle]
        }
    }

    /// Decides whether the word is a model of `formula`.
    pub fn satisfies(&self, formula: &Formula<A>) -> bool {
        let mut done = Map::default();
        self.truth_values(formula, &mut done)[0]
    }

    /// The truth value of `formula` at every position of the raw word.
    fn truth_values(&self, formula: &Formula<A>, done: &mut Map<usize, Vec<bool>>) -> Vec<bool> {
        if let Some(values) = done.get(&formula.id()) {
            return values.clone();
        }

        let n = self.word.len();
        let values = match (formula.kind(), formula.left(), formula.right()) {
            (Kind::True, _, _) => vec![true; n],
            (Kind::False, _, _) => vec![false; n],
            (Kind::Proposition, _, _) => self
                .word
                .iter()
                .map(|valuation| {
                    formula
                        .atom()
                        .and_then(|atom| valuation.get(atom).copied())
                        .unwrap_or(false)
                })
                .collect(),
            (Kind::Not, Some(sub), _) => self
                .truth_values(sub, done)
                .into_iter()
                .map(|value| !value)
                .collect(),
            (Kind::Next, Some(sub), _) => {
                let sub = self.truth_values(sub, done);
                (0..n).map(|i| sub[self.successor(i)]).collect()
            }
            (kind, Some(l), Some(r)) => {
                let (l, r) = (self.truth_values(l, done), self.truth_values(r, done));
                match kind {
                    Kind::And => l.iter().zip_eq(&r).map(|(x, y)| *x && *y).collect(),
                    Kind::Or => l.iter().zip_eq(&r).map(|(x, y)| *x || *y).collect(),
                    Kind::Until => self.fixpoint(false, |i, later| r[i] || (l[i] && later)),
                    Kind::Release => self.fixpoint(true, |i, later| r[i] && (l[i] || later)),
                    _ => self.fixpoint(true, |i, later| r[i] || (l[i] && later)),
                }
            }
            _ => unreachable!("formula {} is missing operands", formula.id()),
        };

        done.insert(formula.id(), values.clone());
        values
    }

    /// Iterates `step` from all positions set to `start` until nothing changes. Starting from
    /// `false` yields the least and from `true` the greatest fixpoint.
    fn fixpoint(&self, start: bool, step: impl Fn(usize, bool) -> bool) -> Vec<bool> {
        let mut values = vec![start; self.word.len()];
        loop {
            let next = (0..values.len())
                .map(|i| step(i, values[self.successor(i)]))
                .collect::<Vec<_>>();
            if next == values {
                return values;
            }
            values = next;
        }
    }
}

impl<A: std::fmt::Display> std::fmt::Display for LassoWord<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = |valuation: &Map<A, bool>| {
            let set = valuation
                .iter()
                .filter(|(_, value)| **value)
                .map(|(atom, _)| atom.to_string())
                .sorted()
                .join(",");
            format!("{{{set}}}")
        };
        write!(
            f,
            "{}({})^w",
            self.word[..self.loop_index].iter().map(letter).join(""),
            self.word[self.loop_index..].iter().map(letter).join("")
        )
    }
}
