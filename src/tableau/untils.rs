use crate::{
    formula::{Atom, Formula, FormulaSet, Kind},
    math::AcceptanceMask,
    Map,
};

/// Bookkeeping of the until subformulas of the formula being translated. Each until receives an
/// index in preorder, which is the index of the acceptance set it gives rise to. Additionally, every
/// subformula that is the right operand of some untils knows the indices of those untils.
pub(crate) struct Untils<A> {
    untils: Vec<Formula<A>>,
    right_of: Map<Formula<A>, AcceptanceMask>,
}

impl<A: Atom> Untils<A> {
    pub fn collect(root: &Formula<A>) -> Self {
        let untils: Vec<_> = root
            .subformulas()
            .filter(|f| f.kind() == Kind::Until)
            .collect();

        let mut right_of: Map<Formula<A>, AcceptanceMask> = Map::default();
        for (i, until) in untils.iter().enumerate() {
            if let Some(right) = until.sub2() {
                right_of.entry(right.clone()).or_default().insert(i);
            }
        }

        Self { untils, right_of }
    }

    pub fn len(&self) -> usize {
        self.untils.len()
    }

    /// The number of acceptance sets of the automaton, which is at least one.
    pub fn sets(&self) -> usize {
        self.len().max(1)
    }

    /// Computes which untils are pending for a completed branch, i.e. occur in `old` without their
    /// right operand being established.
    pub fn pending(&self, old: &FormulaSet<A>, next: &FormulaSet<A>) -> AcceptanceMask {
        let mut fulfilled = AcceptanceMask::new();
        for f in old {
            if let Some(mask) = self.right_of.get(f) {
                fulfilled.union_with(mask);
            }
        }

        self.untils
            .iter()
            .enumerate()
            .filter(|(i, until)| {
                old.contains(*until)
                    && !fulfilled.contains(*i)
                    && !until
                        .sub2()
                        .is_some_and(|right| right.is_synt_implied(old, next))
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Translates pending untils into the acceptance sets a transition belongs to. Without any
    /// until, every transition is in the single acceptance set.
    pub fn acceptance(&self, pending: &AcceptanceMask) -> AcceptanceMask {
        if self.untils.is_empty() {
            AcceptanceMask::full(1)
        } else {
            pending.complement(self.len())
        }
    }

    /// A branch is a safety branch if no until is relevant for it.
    pub fn is_safety(&self, old: &FormulaSet<A>, next: &FormulaSet<A>) -> bool {
        self.untils.is_empty()
            || !old
                .iter()
                .chain(next.iter())
                .any(|f| f.kind() == Kind::Until)
    }
}
