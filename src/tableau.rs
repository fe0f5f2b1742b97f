use tracing::{debug, trace};

use crate::{
    formula::{Atom, Formula, FormulaSet, Kind},
    guard::Guard,
    Result,
};

mod untils;
use untils::Untils;

mod node;
use node::{Branch, Representative};

mod automaton;
pub use automaton::{Automaton, State, Transition};

/// Decides when a completed tableau node is merged into an existing one. Both relations yield
/// automata for the same language, they differ in size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergeStrategy {
    /// Nodes are merged if they agree on the formulas that hold now, those that have to hold next
    /// and the pending untils.
    Exact,
    /// Nodes are merged if they agree on the formulas that have to hold next and on the pending
    /// untils. Differing current formulas become distinct ways of entering the same state.
    #[default]
    NextAndAcceptance,
}

/// Expands `root` into a generalized Büchi automaton.
///
/// The expansion maintains a work list of branches. A branch repeatedly takes the smallest
/// unprocessed formula and either discards itself, because it became contradictory, moves the
/// formula to its `old` set, or splits into two branches for the two ways of satisfying a
/// disjunction or temporal operator. Once nothing is left to process, the branch is compared with
/// the completed nodes according to `strategy`. If no equivalent node exists, the branch becomes a
/// new node and a branch for its successors is scheduled.
///
/// The number of nodes is exponential in the size of `root` in the worst case.
pub fn expand<A: Atom>(root: &Formula<A>, strategy: MergeStrategy) -> Result<Automaton<A>> {
    let untils = Untils::collect(root);
    let mut tableau = Tableau {
        untils,
        strategy,
        nodes: vec![Representative::initial(root)],
        work: vec![Branch::successor(0, &FormulaSet::from_iter([root.clone()]))],
    };
    tableau.run();
    tableau.finish()
}

struct Tableau<A> {
    untils: Untils<A>,
    strategy: MergeStrategy,
    nodes: Vec<Representative<A>>,
    work: Vec<Branch<A>>,
}

impl<A: Atom> Tableau<A> {
    fn run(&mut self) {
        let mut expansions = 0usize;
        'branches: while let Some(mut branch) = self.work.pop() {
            while let Some(f) = branch.todo.pop_first() {
                expansions += 1;
                if !self.expand_formula(f, &mut branch) {
                    continue 'branches;
                }
            }
            self.complete(branch);
        }
        debug!(
            "tableau expansion took {expansions} steps and produced {} nodes",
            self.nodes.len()
        );
    }

    /// Processes `f` on `branch`, returns false if the branch turned out to be contradictory.
    fn expand_formula(&mut self, f: Formula<A>, branch: &mut Branch<A>) -> bool {
        trace!("expanding {f} on branch from node {}", branch.origin);

        if f.is_literal() {
            if branch.contradicts(&f) {
                trace!("discarding branch, {f} contradicts {} formulas", branch.old.len());
                return false;
            }
            branch.old.insert(f);
            return true;
        }

        if f.is_synt_implied(&branch.old, &branch.next) {
            branch.old.insert(f);
            return true;
        }

        match f.kind() {
            Kind::And => {
                branch.old.insert(f.clone());
                branch.schedule(f.sub1());
                branch.schedule(f.sub2());
            }
            Kind::Next => {
                branch.old.insert(f.clone());
                if let Some(sub) = f.sub1() {
                    branch.next.insert(sub.clone());
                }
            }
            Kind::Or | Kind::Until | Kind::Release | Kind::WeakUntil => {
                let mut other = branch.clone();
                other.old.insert(f.clone());
                other.schedule(f.sub1());
                if f.kind() != Kind::Or {
                    other.next.insert(f.clone());
                }
                self.work.push(other);

                branch.old.insert(f.clone());
                branch.schedule(f.sub2());
                if f.kind() == Kind::Release {
                    branch.schedule(f.sub1());
                }
            }
            Kind::Proposition | Kind::True | Kind::False | Kind::Not => {
                unreachable!("literals are handled above")
            }
        }
        true
    }

    /// Merges a fully expanded branch into the completed nodes.
    fn complete(&mut self, branch: Branch<A>) {
        let pending = self.untils.pending(&branch.old, &branch.next);

        let existing = self.nodes.iter().position(|node| {
            node.next == branch.next
                && node.pending == pending
                && (self.strategy == MergeStrategy::NextAndAcceptance
                    || node.labels.iter().any(|label| label.old == branch.old))
        });

        if let Some(i) = existing {
            let node = &mut self.nodes[i];
            match node.label_mut(&branch.old) {
                Some(label) => {
                    label.incoming.insert(branch.origin);
                }
                None => node.labels.push(node::Label {
                    old: branch.old,
                    incoming: [branch.origin].into_iter().collect(),
                }),
            }
            trace!("merged completed branch into node {i}");
            return;
        }

        let index = self.nodes.len();
        trace!(
            "new node {index} with {} formulas now and {} next, pending {pending}",
            branch.old.len(),
            branch.next.len()
        );
        self.work.push(Branch::successor(index, &branch.next));
        self.nodes.push(Representative::from_branch(branch, pending));
    }

    /// Numbers the states and materializes their transitions.
    fn finish(self) -> Result<Automaton<A>> {
        let mut classes: Vec<usize> = vec![];
        let mut class_of = Vec::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            let class = match self.strategy {
                MergeStrategy::Exact => None,
                MergeStrategy::NextAndAcceptance => classes
                    .iter()
                    .position(|&c| self.nodes[c].next == node.next),
            };
            class_of.push(class.unwrap_or_else(|| {
                classes.push(i);
                classes.len() - 1
            }));
        }

        let mut states = classes
            .iter()
            .enumerate()
            .map(|(id, &representative)| State::new(id, representative))
            .collect::<Vec<_>>();

        for (i, node) in self.nodes.iter().enumerate() {
            let accepting = self.untils.acceptance(&node.pending);
            for label in &node.labels {
                let guard = Guard::from_formulas(&label.old)?;
                let safety = self.untils.is_safety(&label.old, &node.next);
                for &origin in &label.incoming {
                    states[class_of[origin]].add_transition(Transition::new(
                        guard.clone(),
                        class_of[i],
                        accepting.clone(),
                        safety,
                    ));
                }
            }
        }

        let automaton = Automaton::new(states, self.untils.sets());
        debug!(
            "tableau nodes collapsed into {} states with {} transitions and {} acceptance sets",
            automaton.size(),
            automaton.transition_count(),
            automaton.acceptance_sets()
        );
        Ok(automaton)
    }
}
