use std::collections::BTreeSet;

use crate::{
    formula::{Atom, Formula, FormulaSet, Kind},
    math::AcceptanceMask,
};

/// A tableau node under construction. `origin` is the index of the completed node whose `next`
/// formulas this branch expands, the formulas in `todo` still have to be processed.
#[derive(Clone)]
pub(crate) struct Branch<A> {
    pub origin: usize,
    pub todo: FormulaSet<A>,
    pub old: FormulaSet<A>,
    pub next: FormulaSet<A>,
}

impl<A: Atom> Branch<A> {
    /// The branch expanding the obligations `next` of the completed node `origin`.
    pub fn successor(origin: usize, next: &FormulaSet<A>) -> Self {
        Self {
            origin,
            todo: next.clone(),
            old: FormulaSet::new(),
            next: FormulaSet::new(),
        }
    }

    /// Schedules `f` for processing unless it has been processed already.
    pub fn schedule(&mut self, f: Option<&Formula<A>>) {
        if let Some(f) = f {
            if !self.old.contains(f) {
                self.todo.insert(f.clone());
            }
        }
    }

    /// Returns true if a proposition and its negation, or `false`, would end up in `old`.
    pub fn contradicts(&self, literal: &Formula<A>) -> bool {
        literal.kind() == Kind::False || self.old.iter().any(|f| f.contradicts(literal))
    }
}

/// A way of entering a completed node: the formulas that hold while doing so and the nodes from
/// which it is entered.
#[derive(Clone)]
pub(crate) struct Label<A> {
    pub old: FormulaSet<A>,
    pub incoming: BTreeSet<usize>,
}

/// A completed tableau node that has been kept as representative of all equivalent ones.
pub(crate) struct Representative<A> {
    pub next: FormulaSet<A>,
    pub pending: AcceptanceMask,
    pub labels: Vec<Label<A>>,
}

impl<A: Atom> Representative<A> {
    /// The initial node, which only carries the obligation to satisfy `root` and is never entered.
    pub fn initial(root: &Formula<A>) -> Self {
        Self {
            next: FormulaSet::from_iter([root.clone()]),
            pending: AcceptanceMask::new(),
            labels: vec![Label {
                old: FormulaSet::new(),
                incoming: BTreeSet::new(),
            }],
        }
    }

    pub fn from_branch(branch: Branch<A>, pending: AcceptanceMask) -> Self {
        Self {
            next: branch.next,
            pending,
            labels: vec![Label {
                old: branch.old,
                incoming: BTreeSet::from_iter([branch.origin]),
            }],
        }
    }

    /// Finds the label that is entered with exactly the formulas `old`.
    pub fn label_mut(&mut self, old: &FormulaSet<A>) -> Option<&mut Label<A>> {
        self.labels.iter_mut().find(|label| &label.old == old)
    }
}
