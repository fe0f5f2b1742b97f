use tracing::trace;

use super::{Scc, SccDecomposition};
use crate::{formula::Atom, graph::Graph};

/// Iterative application of Tarjan's algorithm for computing the SCC decomposition. Instead of
/// recursing, the search keeps a stack of nodes together with the iterator over their remaining
/// outgoing edges, so the depth of the graph is not limited by the call stack.
///
/// The components are produced in reverse topological order.
pub fn tarjan_scc_iterative<A: Atom>(graph: &Graph<A>) -> SccDecomposition<'_, A> {
    let bound = graph.nodes.len();
    let mut indices: Vec<Option<usize>> = vec![None; bound];
    let mut low = vec![0; bound];
    let mut on_stack = vec![false; bound];
    let mut stack = vec![];
    let mut current = 0;
    let mut sccs = vec![];

    for root in graph.node_indices() {
        if indices[root].is_some() {
            continue;
        }

        indices[root] = Some(current);
        low[root] = current;
        current += 1;
        stack.push(root);
        on_stack[root] = true;
        let mut queue = vec![(root, graph.edges_from(root))];

        'outer: while let Some((q, mut edges)) = queue.pop() {
            if let Some((_, edge)) = edges.next() {
                let target = edge.target();
                queue.push((q, edges));
                match indices[target] {
                    None => {
                        // descend into the successor
                        indices[target] = Some(current);
                        low[target] = current;
                        current += 1;
                        stack.push(target);
                        on_stack[target] = true;
                        queue.push((target, graph.edges_from(target)));
                    }
                    Some(index) if on_stack[target] => {
                        low[q] = low[q].min(index);
                    }
                    Some(_) => {}
                }
                continue 'outer;
            }

            // all edges of q have been explored
            if let Some((parent, _)) = queue.last() {
                low[*parent] = low[*parent].min(low[q]);
            }
            if indices[q] == Some(low[q]) {
                let mut scc = vec![];
                while let Some(top) = stack.pop() {
                    on_stack[top] = false;
                    scc.push(top);
                    if top == q {
                        break;
                    }
                }
                trace!("identified scc {scc:?} rooted in {q}");
                sccs.push(Scc::new(graph, scc));
            }
        }
    }
    debug_assert!(stack.is_empty());

    SccDecomposition::new(graph, sccs)
}
