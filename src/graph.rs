use std::fmt::Display;

use tracing::trace;

use crate::{formula::Atom, guard::Guard};

mod attributes;
pub use attributes::{
    AcceptancePlacement, ElementAttributes, ElementKey, GraphAttributes, GraphType,
};

/// Strongly connected components of a [`Graph`].
pub mod connected_components;
use connected_components::SccDecomposition;

/// Reading and writing graphs in the line based interchange format.
pub mod io;

/// A node of a [`Graph`]. It stores its attributes and the index of its first outgoing edge.
#[derive(Debug, Clone)]
pub struct GraphNode {
    attributes: ElementAttributes,
    first_edge: Option<usize>,
}

impl GraphNode {
    /// The attributes of the node.
    pub fn attributes(&self) -> &ElementAttributes {
        &self.attributes
    }
}

/// An edge of a [`Graph`]. Besides source, target, guard, action and attributes, it stores the
/// indices of the previous and next edge in the list of edges leaving the source node.
#[derive(Debug, Clone)]
pub struct GraphEdge<A> {
    prev: Option<usize>,
    source: usize,
    target: usize,
    guard: Guard<A>,
    action: String,
    attributes: ElementAttributes,
    next: Option<usize>,
}

impl<A> GraphEdge<A> {
    /// The index of the source node.
    pub fn source(&self) -> usize {
        self.source
    }

    /// The index of the target node.
    pub fn target(&self) -> usize {
        self.target
    }

    /// The guard labelling the edge.
    pub fn guard(&self) -> &Guard<A> {
        &self.guard
    }

    /// The opaque action class of the edge.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The attributes of the edge.
    pub fn attributes(&self) -> &ElementAttributes {
        &self.attributes
    }
}

/// An attributed graph, which is the form in which automata are exchanged and reduced. Node `0`
/// is the initial node.
///
/// Nodes and edges are kept in vectors and addressed by their position. Removing a node or an edge
/// leaves a hole, so indices stay valid for the lifetime of the graph. The edges leaving a node form
/// a doubly linked list, which makes removing a single edge a constant time operation.
#[derive(Debug, Clone)]
pub struct Graph<A = String> {
    attributes: GraphAttributes,
    nodes: Vec<Option<GraphNode>>,
    edges: Vec<Option<GraphEdge<A>>>,
}

impl<A: Atom> Graph<A> {
    /// Creates a graph without nodes.
    pub fn new(attributes: GraphAttributes) -> Self {
        Self {
            attributes,
            nodes: vec![],
            edges: vec![],
        }
    }

    /// The graph attributes.
    pub fn attributes(&self) -> &GraphAttributes {
        &self.attributes
    }

    /// Adds a node and returns its index.
    pub fn add_node(&mut self, attributes: ElementAttributes) -> usize {
        self.nodes.push(Some(GraphNode {
            attributes,
            first_edge: None,
        }));
        self.nodes.len() - 1
    }

    fn last_edge(&self, node: usize) -> Option<usize> {
        let mut current = self.node(node)?.first_edge?;
        while let Some(next) = self.edge(current).and_then(|e| e.next) {
            current = next;
        }
        Some(current)
    }

    /// Adds an edge from `source` to `target` and returns its index. Returns `None` if one of the
    /// nodes does not exist.
    pub fn add_edge(
        &mut self,
        source: usize,
        target: usize,
        guard: Guard<A>,
        action: String,
        attributes: ElementAttributes,
    ) -> Option<usize> {
        if !self.contains_node(source) || !self.contains_node(target) {
            return None;
        }

        let index = self.edges.len();
        let prev = self.last_edge(source);
        match prev {
            Some(last) => {
                let last = self.edges[last].as_mut()?;
                debug_assert!(last.next.is_none());
                last.next = Some(index);
            }
            None => {
                self.nodes[source].as_mut()?.first_edge = Some(index);
            }
        }
        self.edges.push(Some(GraphEdge {
            prev,
            source,
            target,
            guard,
            action,
            attributes,
            next: None,
        }));
        Some(index)
    }

    /// Removes the edge with the given index and returns it.
    pub fn remove_edge(&mut self, index: usize) -> Option<GraphEdge<A>> {
        let edge = self.edges.get_mut(index)?.take()?;
        match edge.prev {
            Some(prev) => {
                if let Some(prev) = self.edges[prev].as_mut() {
                    prev.next = edge.next;
                }
            }
            None => {
                if let Some(node) = self.nodes[edge.source].as_mut() {
                    node.first_edge = edge.next;
                }
            }
        }
        if let Some(next) = edge.next {
            if let Some(next) = self.edges[next].as_mut() {
                next.prev = edge.prev;
            }
        }
        Some(edge)
    }

    /// Removes the node together with all edges leaving or entering it. Returns the number of
    /// removed edges, or `None` if the node did not exist.
    pub fn remove_node(&mut self, index: usize) -> Option<usize> {
        if !self.contains_node(index) {
            return None;
        }
        let incident = self
            .edge_indices()
            .filter(|&e| {
                self.edge(e)
                    .is_some_and(|edge| edge.source == index || edge.target == index)
            })
            .collect::<Vec<_>>();
        for &e in &incident {
            self.remove_edge(e);
        }
        self.nodes[index] = None;
        trace!("removed node {index} with {} edges", incident.len());
        Some(incident.len())
    }

    /// Removes all nodes and edges.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// Returns true if a node with the given index exists.
    pub fn contains_node(&self, index: usize) -> bool {
        self.node(index).is_some()
    }

    /// The node with the given index.
    pub fn node(&self, index: usize) -> Option<&GraphNode> {
        self.nodes.get(index)?.as_ref()
    }

    /// Mutable access to the attributes of a node.
    pub fn node_attributes_mut(&mut self, index: usize) -> Option<&mut ElementAttributes> {
        Some(&mut self.nodes.get_mut(index)?.as_mut()?.attributes)
    }

    /// The edge with the given index.
    pub fn edge(&self, index: usize) -> Option<&GraphEdge<A>> {
        self.edges.get(index)?.as_ref()
    }

    /// Mutable access to the attributes of an edge.
    pub fn edge_attributes_mut(&mut self, index: usize) -> Option<&mut ElementAttributes> {
        Some(&mut self.edges.get_mut(index)?.as_mut()?.attributes)
    }

    /// Iterates over the indices of all nodes in ascending order.
    pub fn node_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|_| i))
    }

    /// Iterates over the indices of all edges in ascending order.
    pub fn edge_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|_| i))
    }

    /// Iterates over the edges leaving `node` in insertion order, together with their indices.
    pub fn edges_from(&self, node: usize) -> EdgesFrom<'_, A> {
        EdgesFrom {
            graph: self,
            current: self.node(node).and_then(|n| n.first_edge),
        }
    }

    /// The number of nodes.
    pub fn size(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// The number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The initial node, which is node `0` if it exists.
    pub fn initial(&self) -> Option<usize> {
        self.contains_node(0).then_some(0)
    }

    /// Computes the strongly connected components.
    pub fn sccs(&self) -> SccDecomposition<'_, A> {
        connected_components::tarjan_scc_iterative(self)
    }
}

/// Iterator over the edges leaving a node, see [`Graph::edges_from`].
pub struct EdgesFrom<'a, A> {
    graph: &'a Graph<A>,
    current: Option<usize>,
}

impl<'a, A> Iterator for EdgesFrom<'a, A> {
    type Item = (usize, &'a GraphEdge<A>);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        let edge = self.graph.edges.get(index)?.as_ref()?;
        self.current = edge.next;
        Some((index, edge))
    }
}

/// Writes the graph in the interchange format, see [`io::write_graph`].
impl<A: Atom> Display for Graph<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buffer = Vec::new();
        io::write_graph(self, &mut buffer).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", String::from_utf8_lossy(&buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::{AcceptancePlacement, ElementAttributes, Graph, GraphAttributes, GraphType};
    use crate::guard::Guard;

    fn graph() -> Graph {
        let mut g = Graph::new(GraphAttributes::new(
            GraphType::Buchi,
            AcceptancePlacement::Edges,
        ));
        for _ in 0..3 {
            g.add_node(ElementAttributes::new());
        }
        for (s, t) in [(0, 1), (0, 2), (1, 2), (0, 0), (2, 0)] {
            g.add_edge(s, t, Guard::new(), "-".into(), ElementAttributes::new())
                .unwrap();
        }
        g
    }

    fn targets(g: &Graph, node: usize) -> Vec<usize> {
        g.edges_from(node).map(|(_, e)| e.target()).collect()
    }

    #[test]
    fn linked_edges() {
        let mut g = graph();
        assert_eq!(targets(&g, 0), vec![1, 2, 0]);
        assert!(g.add_edge(0, 7, Guard::new(), "-".into(), ElementAttributes::new()).is_none());

        let removed = g.remove_edge(1).unwrap();
        assert_eq!(removed.target(), 2);
        assert_eq!(targets(&g, 0), vec![1, 0]);
        g.remove_edge(0);
        assert_eq!(targets(&g, 0), vec![0]);
        g.add_edge(0, 2, Guard::new(), "-".into(), ElementAttributes::new());
        assert_eq!(targets(&g, 0), vec![0, 2]);
        assert!(g.remove_edge(1).is_none());
    }

    #[test]
    fn removing_nodes() {
        let mut g = graph();
        assert_eq!(g.remove_node(2), Some(3));
        assert_eq!(g.size(), 2);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(targets(&g, 0), vec![1, 0]);
        assert_eq!(g.node_indices().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(g.remove_node(2), None);
        assert_eq!(g.initial(), Some(0));
        g.remove_node(0);
        assert_eq!(g.initial(), None);
    }
}
