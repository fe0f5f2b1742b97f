use std::collections::BTreeSet;

use itertools::Itertools;

use crate::{
    formula::Atom,
    graph::{AcceptancePlacement, ElementAttributes, Graph, GraphAttributes, GraphType},
    guard::Guard,
    math::AcceptanceMask,
    word::LassoWord,
    Map, Set,
};

/// A transition of an [`Automaton`]. It is taken when its guard is enabled and belongs to the
/// acceptance sets in `accepting`.
#[derive(Debug, Clone)]
pub struct Transition<A> {
    guard: Guard<A>,
    target: usize,
    accepting: AcceptanceMask,
    safety: bool,
}

impl<A: Atom> Transition<A> {
    pub(crate) fn new(guard: Guard<A>, target: usize, accepting: AcceptanceMask, safety: bool) -> Self {
        Self {
            guard,
            target,
            accepting,
            safety,
        }
    }

    /// The conjunction of literals that has to hold for the transition to be taken.
    pub fn guard(&self) -> &Guard<A> {
        &self.guard
    }

    /// The id of the target state.
    pub fn target(&self) -> usize {
        self.target
    }

    /// The acceptance sets this transition is a member of.
    pub fn accepting(&self) -> &AcceptanceMask {
        &self.accepting
    }

    /// Returns true if no until obligation is relevant when taking this transition.
    pub fn is_safety(&self) -> bool {
        self.safety
    }

    /// Returns true if the guard is satisfied by `valuation`, unassigned atoms are false.
    pub fn enabled(&self, valuation: &Map<A, bool>) -> bool {
        self.guard.enabled(valuation)
    }
}

impl<A: Atom> PartialEq for Transition<A> {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
            && self.accepting == other.accepting
            && self.safety == other.safety
            && self.guard == other.guard
    }
}

/// A state of an [`Automaton`] with its outgoing transitions.
#[derive(Debug, Clone)]
pub struct State<A> {
    id: usize,
    representative: usize,
    transitions: Vec<Transition<A>>,
}

impl<A: Atom> State<A> {
    pub(crate) fn new(id: usize, representative: usize) -> Self {
        Self {
            id,
            representative,
            transitions: vec![],
        }
    }

    /// The dense id of the state, which is its position in [`Automaton::states`].
    pub fn id(&self) -> usize {
        self.id
    }

    /// The index of the tableau node this state was created for.
    pub fn representative(&self) -> usize {
        self.representative
    }

    /// The outgoing transitions.
    pub fn transitions(&self) -> &[Transition<A>] {
        &self.transitions
    }

    /// Adds `transition` unless an equal one exists already. Returns true if it was added.
    pub(crate) fn add_transition(&mut self, transition: Transition<A>) -> bool {
        if self.transitions.contains(&transition) {
            false
        } else {
            self.transitions.push(transition);
            true
        }
    }
}

/// A generalized Büchi automaton with acceptance on transitions, as produced by the tableau
/// construction. State `0` is the initial state. A run is accepting if it takes transitions of each
/// of the acceptance sets infinitely often.
#[derive(Debug, Clone)]
pub struct Automaton<A> {
    states: Vec<State<A>>,
    acceptance_sets: usize,
}

impl<A: Atom> Automaton<A> {
    pub(crate) fn new(states: Vec<State<A>>, acceptance_sets: usize) -> Self {
        debug_assert!(states.iter().enumerate().all(|(i, q)| q.id == i));
        Self {
            states,
            acceptance_sets,
        }
    }

    /// The states, indexed by their id.
    pub fn states(&self) -> &[State<A>] {
        &self.states
    }

    /// The id of the initial state.
    pub fn initial(&self) -> usize {
        0
    }

    /// The number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// The total number of transitions.
    pub fn transition_count(&self) -> usize {
        self.states.iter().map(|q| q.transitions.len()).sum()
    }

    /// The number of acceptance sets, which is at least one.
    pub fn acceptance_sets(&self) -> usize {
        self.acceptance_sets
    }

    /// Computes the states that are reached from `states` by taking every transition whose guard
    /// is enabled by `valuation`.
    pub fn step<'a, I>(&self, states: I, valuation: &Map<A, bool>) -> BTreeSet<usize>
    where
        I: IntoIterator<Item = &'a usize>,
    {
        states
            .into_iter()
            .filter_map(|q| self.states.get(*q))
            .flat_map(|q| q.transitions.iter())
            .filter(|t| t.enabled(valuation))
            .map(|t| t.target)
            .collect()
    }

    /// Decides whether the automaton accepts `word`. This builds the product of the automaton with
    /// the positions of the word and looks for a reachable component whose interior edges visit
    /// every acceptance set.
    pub fn accepts(&self, word: &LassoWord<A>) -> bool {
        let positions = word.raw_word().len();
        let node = |state: usize, position: usize| state * positions + position;

        let mut product: Graph<A> = Graph::new(GraphAttributes::new(
            GraphType::Generalized {
                sets: self.acceptance_sets,
            },
            AcceptancePlacement::Edges,
        ));
        for _ in 0..self.states.len() * positions {
            product.add_node(ElementAttributes::new());
        }
        for state in &self.states {
            for (position, valuation) in word.raw_word().iter().enumerate() {
                for t in state.transitions.iter().filter(|t| t.enabled(valuation)) {
                    product.add_edge(
                        node(state.id, position),
                        node(t.target, word.successor(position)),
                        Guard::new(),
                        "-".to_string(),
                        ElementAttributes::marked(t.accepting.clone()),
                    );
                }
            }
        }

        let mut reachable = Set::default();
        let mut stack = vec![node(self.initial(), 0)];
        while let Some(q) = stack.pop() {
            if product.contains_node(q) && reachable.insert(q) {
                stack.extend(product.edges_from(q).map(|(_, edge)| edge.target()));
            }
        }

        let sccs = product.sccs();
        sccs.iter()
            .filter(|scc| scc.iter().any(|q| reachable.contains(q)))
            .any(|scc| {
                let mut visited = AcceptanceMask::new();
                for (_, edge) in scc.interior_edges() {
                    visited.union_with(edge.attributes().marks());
                }
                !scc.is_transient() && visited.covers(self.acceptance_sets)
            })
    }

    /// Converts the automaton into a generalized Büchi [`Graph`] with acceptance on edges. Nodes are
    /// labelled `S<id>`, the action of every edge is `-`.
    pub fn to_graph(&self) -> Graph<A> {
        let mut graph = Graph::new(GraphAttributes::new(
            GraphType::Generalized {
                sets: self.acceptance_sets,
            },
            AcceptancePlacement::Edges,
        ));
        for state in &self.states {
            graph.add_node(ElementAttributes::labelled(format!("S{}", state.id)));
        }
        for state in &self.states {
            for t in &state.transitions {
                graph.add_edge(
                    state.id,
                    t.target,
                    t.guard.clone(),
                    "-".to_string(),
                    ElementAttributes::marked(t.accepting.clone()),
                );
            }
        }
        graph
    }
}

/// Prints the transition table of the automaton, one row per transition.
impl<A: Atom> std::fmt::Display for Automaton<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(["State", "Guard", "Target", "Accepting"]);
        for state in &self.states {
            if state.transitions.is_empty() {
                builder.push_record([state.id.to_string(), "-".into(), "-".into(), "-".into()]);
            }
            for t in &state.transitions {
                builder.push_record([
                    state.id.to_string(),
                    t.guard.to_string(),
                    t.target.to_string(),
                    t.accepting.iter().map(|i| format!("acc{i}")).join(","),
                ]);
            }
        }
        write!(
            f,
            "{}",
            builder
                .build()
                .with(tabled::settings::Style::rounded())
        )
    }
}
