use itertools::Itertools;

use super::{Graph, GraphEdge};
use crate::formula::Atom;

mod tarjan;
pub use tarjan::tarjan_scc_iterative;

/// A strongly connected component of a [`Graph`], given by the sorted indices of its nodes.
#[derive(Clone)]
pub struct Scc<'a, A> {
    graph: &'a Graph<A>,
    nodes: Vec<usize>,
}

impl<'a, A> std::ops::Deref for Scc<'a, A> {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.nodes
    }
}

impl<'a, A> PartialEq for Scc<'a, A> {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}
impl<'a, A> Eq for Scc<'a, A> {}

impl<'a, A: Atom> Scc<'a, A> {
    /// Creates the component of `graph` consisting of `nodes`.
    pub fn new<I: IntoIterator<Item = usize>>(graph: &'a Graph<A>, nodes: I) -> Self {
        let nodes = nodes.into_iter().sorted().dedup().collect();
        Self { graph, nodes }
    }

    /// The graph the component belongs to.
    pub fn graph(&self) -> &'a Graph<A> {
        self.graph
    }

    /// Returns true if `node` belongs to the component.
    pub fn contains_node(&self, node: usize) -> bool {
        self.nodes.binary_search(&node).is_ok()
    }

    /// All edges whose source lies in the component.
    pub fn edges(&self) -> impl Iterator<Item = (usize, &'a GraphEdge<A>)> + '_ {
        self.nodes
            .iter()
            .flat_map(|&q| self.graph.edges_from(q))
    }

    /// The edges that start and end in the component.
    pub fn interior_edges(&self) -> impl Iterator<Item = (usize, &'a GraphEdge<A>)> + '_ {
        self.edges()
            .filter(|(_, edge)| self.contains_node(edge.target()))
    }

    /// The edges that leave the component.
    pub fn exit_edges(&self) -> impl Iterator<Item = (usize, &'a GraphEdge<A>)> + '_ {
        self.edges()
            .filter(|(_, edge)| !self.contains_node(edge.target()))
    }

    /// A component is transient if no infinite run can stay in it, i.e. it is a single node
    /// without a self loop.
    pub fn is_transient(&self) -> bool {
        self.nodes.len() == 1 && self.interior_edges().next().is_none()
    }

    /// A component is terminal if no edge leaves it.
    pub fn is_terminal(&self) -> bool {
        self.exit_edges().next().is_none()
    }
}

impl<'a, A> std::fmt::Debug for Scc<'a, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.nodes.iter().join(", "))
    }
}

/// Represents a decomposition of a graph into strongly connected components. The components are
/// stored in reverse topological order, i.e. every edge between two components leads to one that
/// appears earlier.
#[derive(Clone)]
pub struct SccDecomposition<'a, A>(&'a Graph<A>, Vec<Scc<'a, A>>);

impl<'a, A> std::ops::Deref for SccDecomposition<'a, A> {
    type Target = Vec<Scc<'a, A>>;

    fn deref(&self) -> &Self::Target {
        &self.1
    }
}

impl<'a, A: Atom> SccDecomposition<'a, A> {
    /// Creates a new SCC decomposition from a graph and a vector of SCCs.
    pub fn new(graph: &'a Graph<A>, sccs: Vec<Scc<'a, A>>) -> Self {
        Self(graph, sccs)
    }

    /// The decomposed graph.
    pub fn graph(&self) -> &'a Graph<A> {
        self.0
    }

    /// Attempts to find the index of the SCC containing the given `node`.
    pub fn scc_of(&self, node: usize) -> Option<usize> {
        self.1.iter().position(|scc| scc.contains_node(node))
    }
}

impl<'a, A> std::fmt::Debug for SccDecomposition<'a, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.1.iter().map(|scc| format!("{scc:?}")).join(", "))
    }
}
