use std::fmt::Display;

use tracing::{debug, trace, warn};

use crate::{
    formula::Atom,
    graph::{connected_components::Scc, AcceptancePlacement, ElementAttributes, Graph},
    math::AcceptanceMask,
};

/// What a call to [`reduce`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ReductionSummary {
    /// The number of passes, including the final one that changed nothing.
    pub passes: usize,
    /// The number of removed nodes.
    pub removed_nodes: usize,
    /// The number of removed edges.
    pub removed_edges: usize,
    /// The number of acceptance marks that were cleared.
    pub cleared_marks: usize,
}

impl Display for ReductionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "passes: {}, removed nodes: {}, removed edges: {}, cleared marks: {}",
            self.passes, self.removed_nodes, self.removed_edges, self.cleared_marks
        )
    }
}

enum Verdict {
    Remove(Vec<usize>),
    Clear { nodes: Vec<usize>, edges: Vec<usize> },
}

/// The acceptance sets that are visited by a cycle staying in `scc`.
fn witnessed<A: Atom>(scc: &Scc<'_, A>, placement: AcceptancePlacement) -> AcceptanceMask {
    let mut found = AcceptanceMask::new();
    match placement {
        AcceptancePlacement::Nodes => {
            for &q in scc.iter() {
                if let Some(node) = scc.graph().node(q) {
                    found.union_with(node.attributes().marks());
                }
            }
        }
        AcceptancePlacement::Edges => {
            for (_, edge) in scc.interior_edges() {
                found.union_with(edge.attributes().marks());
            }
        }
    }
    found
}

fn clear_marks(attributes: Option<&mut ElementAttributes>) -> usize {
    match attributes {
        Some(attributes) if !attributes.marks().is_empty() => {
            let cleared = attributes.marks().len();
            attributes.marks_mut().clear();
            cleared
        }
        _ => 0,
    }
}

/// Shrinks `graph` without changing the language it accepts, by removing nodes and acceptance
/// marks that can not take part in an accepting run. Each pass
///
/// 1. clears the marks of edges that leave their strongly connected component, since such an edge
///    is taken at most once on every run,
/// 2. removes every component that is not accepting and that no edge leaves, and
/// 3. clears all marks in components which are not accepting or which are transient, i.e. consist
///    of a single node without a self loop.
///
/// A component is accepting if the marks on its nodes or interior edges, depending on the
/// [`AcceptancePlacement`] of the graph, cover all acceptance sets. Passes are repeated until one
/// of them changes nothing. Since nodes and marks are only ever removed, this terminates after at
/// most as many passes as there are nodes and marks. If the initial node `0` is removed, the
/// accepted language is empty and the whole graph is cleared.
///
/// ```
/// use ltl2buchi::prelude::*;
///
/// let mut graph = ltl2buchi::graph::io::read_graph_str(
///     "2\ntype=ba,ac=nodes\n1\naccepting\n1\nTRUE\n-\n-\n1\n-\n1\nTRUE\n-\n-\n",
/// )
/// .unwrap();
/// let summary = reduce(&mut graph);
/// assert_eq!(summary.removed_nodes, 2);
/// assert!(graph.is_empty());
/// ```
pub fn reduce<A: Atom>(graph: &mut Graph<A>) -> ReductionSummary {
    let mut summary = ReductionSummary::default();
    if graph.is_empty() {
        warn!("reducing a graph without nodes");
        return summary;
    }
    let placement = graph.attributes().placement();
    let sets = graph.attributes().sets();

    loop {
        summary.passes += 1;
        let mut changed = false;

        if placement == AcceptancePlacement::Edges {
            let exits = graph
                .sccs()
                .iter()
                .flat_map(|scc| scc.exit_edges().map(|(e, _)| e).collect::<Vec<_>>())
                .collect::<Vec<_>>();
            for e in exits {
                let cleared = clear_marks(graph.edge_attributes_mut(e));
                summary.cleared_marks += cleared;
                changed |= cleared > 0;
            }
        }

        let verdicts = graph
            .sccs()
            .iter()
            .filter_map(|scc| {
                let accepting = witnessed(scc, placement).covers(sets);
                trace!(
                    "scc {scc:?} is {}accepting, {}terminal and {}transient",
                    if accepting { "" } else { "not " },
                    if scc.is_terminal() { "" } else { "not " },
                    if scc.is_transient() { "" } else { "not " },
                );
                if !accepting && scc.is_terminal() {
                    Some(Verdict::Remove(scc.to_vec()))
                } else if !accepting || scc.is_transient() {
                    Some(Verdict::Clear {
                        nodes: scc.to_vec(),
                        edges: scc.edges().map(|(e, _)| e).collect(),
                    })
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        for verdict in verdicts {
            match verdict {
                Verdict::Remove(nodes) => {
                    for q in nodes {
                        if let Some(edges) = graph.remove_node(q) {
                            summary.removed_nodes += 1;
                            summary.removed_edges += edges;
                            changed = true;
                        }
                    }
                }
                Verdict::Clear { nodes, edges } => {
                    let mut cleared = 0;
                    for q in nodes {
                        cleared += clear_marks(graph.node_attributes_mut(q));
                    }
                    for e in edges {
                        cleared += clear_marks(graph.edge_attributes_mut(e));
                    }
                    summary.cleared_marks += cleared;
                    changed |= cleared > 0;
                }
            }
        }

        if !changed {
            break;
        }
    }

    if graph.initial().is_none() && !graph.is_empty() {
        debug!("initial node was removed, clearing the graph");
        summary.removed_nodes += graph.size();
        summary.removed_edges += graph.edge_count();
        graph.clear();
    }

    debug!("reduced graph, {summary}");
    summary
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{reduce, ReductionSummary};
    use crate::graph::io::read_graph_str;

    #[test_log::test]
    fn terminal_rejecting_component_is_removed() {
        let mut graph = read_graph_str(
            "4
            type=ba,ac=edges
            1\n-\n1\nTRUE\n-\n-
            1\n-\n2\nTRUE\n-\naccepting
            1\n-\n1\nTRUE\n-\n-
            1\n-\n3\nTRUE\n-\n-",
        )
        .unwrap();
        let summary = reduce(&mut graph);
        assert_eq!(
            summary,
            ReductionSummary {
                passes: 2,
                removed_nodes: 1,
                removed_edges: 1,
                cleared_marks: 0,
            }
        );
        assert_eq!(
            graph.to_string(),
            "3\ntype=ba,ac=edges\n1\n-\n1\nTRUE\n-\n-\n1\n-\n2\nTRUE\n-\naccepting\n1\n-\n1\nTRUE\n-\n-\n"
        );
    }

    #[test_log::test]
    fn exit_edges_and_transient_nodes_lose_their_marks() {
        let mut graph = read_graph_str(
            "2
            type=gba,ac=edges,nsets=2
            2\n-\n0\na\n-\nacc0\n1\nb\n-\nacc1
            1\n-\n1\nTRUE\n-\nacc0,acc1",
        )
        .unwrap();
        let summary = reduce(&mut graph);
        // the self loop on 0 only sees acc0, so the component is not accepting
        assert_eq!(summary.cleared_marks, 2);
        assert_eq!(summary.removed_nodes, 0);
        assert_eq!(
            graph.to_string(),
            "2\ntype=gba,ac=edges,nsets=2\n2\n-\n0\na\n-\n-\n1\nb\n-\n-\n1\n-\n1\nTRUE\n-\nacc0,acc1\n"
        );

        let mut graph = read_graph_str(
            "2
            type=ba,ac=nodes
            1\naccepting\n1\nTRUE\n-\n-
            1\naccepting\n1\nTRUE\n-\n-",
        )
        .unwrap();
        let summary = reduce(&mut graph);
        assert_eq!(summary.cleared_marks, 1);
        assert!(graph.node(0).unwrap().attributes().marks().is_empty());
        assert!(!graph.node(1).unwrap().attributes().marks().is_empty());
    }

    #[test_log::test]
    fn removal_propagates_backwards() {
        // 2 becomes terminal once 3 is gone, then 1, and finally the initial node
        let mut graph = read_graph_str(
            "4
            type=ba,ac=nodes
            1\n-\n1\nTRUE\n-\n-
            1\n-\n2\nTRUE\n-\n-
            1\n-\n3\nTRUE\n-\n-
            1\n-\n3\nTRUE\n-\n-",
        )
        .unwrap();
        let summary = reduce(&mut graph);
        assert!(graph.is_empty());
        assert_eq!(summary.removed_nodes, 4);
        assert_eq!(summary.removed_edges, 4);
        assert_eq!(summary.passes, 5);
    }

    #[test_log::test]
    fn empty_graph_is_left_alone() {
        let mut graph = read_graph_str("0\ntype=ba,ac=nodes\n").unwrap();
        assert_eq!(reduce(&mut graph), ReductionSummary::default());
    }

    #[cfg(feature = "random")]
    #[test]
    fn reduction_is_idempotent_and_shrinks() {
        use crate::random::random_graph;

        let mut rng = fastrand::Rng::with_seed(0x5cc);
        for _ in 0..200 {
            let mut graph = random_graph(&mut rng, 8, 3, 2);
            let (nodes, edges) = (graph.size(), graph.edge_count());
            reduce(&mut graph);
            assert!(graph.size() <= nodes);
            assert!(graph.edge_count() <= edges);

            let reduced = graph.to_string();
            let again = reduce(&mut graph);
            assert_eq!(again.removed_nodes, 0);
            assert_eq!(again.cleared_marks, 0);
            assert_eq!(graph.to_string(), reduced);
        }
    }
}
