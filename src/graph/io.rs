//! The interchange format is line based. Everything after a `#` is a comment, blank lines are
//! skipped. A graph is written as
//!
//! ```text
//! <number of nodes>
//! <graph attributes>
//! ```
//!
//! followed, for each node, by
//!
//! ```text
//! <number of outgoing edges>
//! <node attributes>
//! ```
//!
//! and, for each of its outgoing edges, by
//!
//! ```text
//! <target node>
//! <guard>
//! <action>
//! <edge attributes>
//! ```
//!
//! Attribute lines are comma separated lists of `key=value` or bare `key` entries, a single `-`
//! stands for no attributes. In `label` values, separators, `#`, `%` and whitespace are written
//! as `%XX` escapes of their UTF-8 bytes. Guards are literals joined by `&`, where `!x` negates `x` and `TRUE`
//! is the true literal. Node `0` is the initial node.
//!
//! ```
//! use ltl2buchi::prelude::*;
//!
//! let text = "2\ntype=ba,ac=edges\n1\n-\n1\na&!b\n-\naccepting\n1\nlabel=sink\n1\nTRUE\n-\n-\n";
//! let graph = ltl2buchi::graph::io::read_graph_str(text).unwrap();
//! assert_eq!(graph.size(), 2);
//! assert_eq!(graph.to_string(), text);
//! ```

use std::{
    io::{BufRead, BufReader, Write},
    path::Path,
};

use tracing::debug;

use super::{
    attributes::unescape_label, AcceptancePlacement, ElementAttributes, ElementKey, Graph,
    GraphAttributes, GraphType,
};
use crate::{formula::Atom, guard::Guard, Error, Map, Result};

/// The content lines of the input, with comments removed and blank lines skipped.
struct ContentLines<R> {
    inner: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> ContentLines<R> {
    fn new(reader: R) -> Self {
        Self {
            inner: reader.lines(),
            line: 0,
        }
    }

    /// Returns the next non-empty line together with its number.
    fn next_content(&mut self) -> Result<(usize, String)> {
        loop {
            let Some(raw) = self.inner.next() else {
                return Err(Error::UnexpectedEnd { line: self.line });
            };
            let raw = raw?;
            self.line += 1;
            let content = raw.split('#').next().unwrap_or_default().trim();
            if !content.is_empty() {
                return Ok((self.line, content.to_string()));
            }
        }
    }

    fn next_number(&mut self, what: &str) -> Result<(usize, usize)> {
        let (line, content) = self.next_content()?;
        content
            .parse::<usize>()
            .map(|n| (line, n))
            .map_err(|e| Error::Parse {
                line,
                message: format!("expected {what}, found \"{content}\": {e}"),
            })
    }
}

fn parse_entries(line: usize, content: &str) -> Result<Vec<(String, Option<String>)>> {
    if content == "-" {
        return Ok(vec![]);
    }
    content
        .split(',')
        .map(str::trim)
        .map(|entry| match entry.split_once('=') {
            _ if entry.is_empty() => Err(Error::Parse {
                line,
                message: format!("empty attribute in \"{content}\""),
            }),
            Some((key, value)) => Ok((key.trim().to_string(), Some(value.trim().to_string()))),
            None => Ok((entry.to_string(), None)),
        })
        .collect()
}

fn parse_flag(line: usize, key: &str, value: Option<&str>) -> Result<bool> {
    match value {
        None | Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(Error::Parse {
            line,
            message: format!("attribute {key} expects a boolean, found \"{other}\""),
        }),
    }
}

fn parse_graph_attributes(line: usize, content: &str) -> Result<GraphAttributes> {
    let (mut ty, mut ac, mut nsets) = (None, None, None);
    for (key, value) in parse_entries(line, content)? {
        match key.as_str() {
            "type" => ty = value,
            "ac" => ac = value,
            "nsets" => nsets = value,
            _ => {
                return Err(Error::Parse {
                    line,
                    message: format!("unknown graph attribute {key}"),
                })
            }
        }
    }
    let ty = GraphType::parse(ty.as_deref(), nsets.as_deref())?;
    let placement = ac.as_deref().unwrap_or_default().parse::<AcceptancePlacement>()?;
    Ok(GraphAttributes::new(ty, placement))
}

fn parse_element_attributes(
    attributes: &GraphAttributes,
    carrier: AcceptancePlacement,
    line: usize,
    content: &str,
) -> Result<ElementAttributes> {
    let mut parsed = ElementAttributes::new();
    for (key, value) in parse_entries(line, content)? {
        match attributes
            .element_key(&key, carrier)
            .map_err(|message| Error::Parse { line, message })?
        {
            ElementKey::Mark(i) => {
                if parse_flag(line, &key, value.as_deref())? {
                    parsed.marks_mut().insert(i);
                }
            }
            ElementKey::Label => parsed.set_label(
                unescape_label(value.as_deref().unwrap_or_default())
                    .map_err(|message| Error::Parse { line, message })?,
            ),
        }
    }
    Ok(parsed)
}

/// Reads a graph from `reader`. Fails with [`Error::UnexpectedEnd`] if the input ends early, with
/// [`Error::Parse`] on malformed lines and with the configuration errors of [`GraphType::parse`]
/// and [`AcceptancePlacement`] on unsupported graph attributes.
pub fn read_graph<R: BufRead>(reader: R) -> Result<Graph> {
    let mut lines = ContentLines::new(reader);

    let (_, count) = lines.next_number("the number of nodes")?;
    let (line, content) = lines.next_content()?;
    let attributes = parse_graph_attributes(line, &content)?;

    // nodes are only created for blocks that are present, edges once all nodes exist
    let mut graph = Graph::new(attributes);
    let mut edges = vec![];
    for node in 0..count {
        let (_, transitions) = lines.next_number("the number of transitions")?;
        let (line, content) = lines.next_content()?;
        let parsed =
            parse_element_attributes(&attributes, AcceptancePlacement::Nodes, line, &content)?;
        graph.add_node(parsed);

        for _ in 0..transitions {
            let (line, target) = lines.next_number("a target node")?;
            if target >= count {
                return Err(Error::Parse {
                    line,
                    message: format!("target {target} exceeds the {count} nodes"),
                });
            }
            let (line, guard) = lines.next_content()?;
            let guard = guard
                .parse::<Guard<String>>()
                .map_err(|message| Error::Parse { line, message })?;
            let (_, action) = lines.next_content()?;
            let (line, content) = lines.next_content()?;
            let parsed =
                parse_element_attributes(&attributes, AcceptancePlacement::Edges, line, &content)?;
            edges.push((node, target, guard, action, parsed));
        }
    }
    for (source, target, guard, action, parsed) in edges {
        graph.add_edge(source, target, guard, action, parsed);
    }

    debug!(
        "read graph with {} nodes and {} edges",
        graph.size(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Reads a graph from a string, see [`read_graph`].
pub fn read_graph_str(input: &str) -> Result<Graph> {
    read_graph(input.as_bytes())
}

/// Reads a graph from the file at `path`, see [`read_graph`].
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Graph> {
    let file = std::fs::File::open(path)?;
    read_graph(BufReader::new(file))
}

/// Writes `graph` to `writer`. Nodes are renumbered densely in the order of their indices, edges
/// into removed nodes are skipped and only set acceptance marks are written.
pub fn write_graph<A: Atom, W: Write>(graph: &Graph<A>, writer: &mut W) -> Result<()> {
    let ty = graph.attributes().ty();
    let renumber: Map<usize, usize> = graph
        .node_indices()
        .enumerate()
        .map(|(new, old)| (old, new))
        .collect();

    writeln!(writer, "{}", renumber.len())?;
    writeln!(writer, "{}", graph.attributes())?;
    for node in graph.node_indices() {
        let edges = graph
            .edges_from(node)
            .filter_map(|(_, edge)| renumber.get(&edge.target()).map(|&t| (t, edge)))
            .collect::<Vec<_>>();
        writeln!(writer, "{}", edges.len())?;
        let attributes = graph
            .node(node)
            .map(|n| n.attributes().to_line(ty))
            .unwrap_or_else(|| "-".to_string());
        writeln!(writer, "{attributes}")?;

        for (target, edge) in edges {
            writeln!(writer, "{target}")?;
            writeln!(writer, "{}", edge.guard())?;
            let action = match edge.action().trim() {
                "" => "-",
                action => action,
            };
            writeln!(writer, "{action}")?;
            writeln!(writer, "{}", edge.attributes().to_line(ty))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{read_graph_str, write_graph};
    use crate::{
        graph::{AcceptancePlacement, GraphType},
        guard::{Guard, Literal},
        Error,
    };

    const SAMPLE: &str = "
        # a small generalized Büchi graph
        3
        type=gba, ac=edges, nsets=2   # graph attributes

        2          # node 0
        label=init
        1
        a & !b
        step
        acc0
        2
        TRUE
        -
        acc0=false,acc1
        0
        -
        1
        -
        0
        p
        -
        acc0,acc1,label=back
    ";

    #[test]
    fn reads_sample() {
        let graph = read_graph_str(SAMPLE).unwrap();
        assert_eq!(graph.size(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.attributes().ty(), GraphType::Generalized { sets: 2 });
        assert_eq!(graph.attributes().placement(), AcceptancePlacement::Edges);
        assert_eq!(graph.node(0).unwrap().attributes().label(), Some("init"));

        let edges = graph.edges_from(0).map(|(_, e)| e).collect::<Vec<_>>();
        assert_eq!(edges[0].target(), 1);
        assert_eq!(
            edges[0].guard(),
            &Guard::from_iter([
                Literal::Negative("b".to_string()),
                Literal::Positive("a".to_string())
            ])
        );
        assert_eq!(edges[0].action(), "step");
        assert_eq!(edges[0].attributes().marks().iter().collect::<Vec<_>>(), vec![0]);
        assert_eq!(edges[1].attributes().marks().iter().collect::<Vec<_>>(), vec![1]);

        let back = graph.edges_from(2).next().unwrap().1;
        assert_eq!(back.attributes().label(), Some("back"));
        assert_eq!(back.attributes().marks().len(), 2);
    }

    #[test]
    fn written_graph_reads_back() {
        let graph = read_graph_str(SAMPLE).unwrap();
        let mut buffer = vec![];
        write_graph(&graph, &mut buffer).unwrap();
        let written = String::from_utf8(buffer).unwrap();
        assert_eq!(
            written,
            "3\ntype=gba,ac=edges,nsets=2\n2\nlabel=init\n1\na&!b\nstep\nacc0\n2\nTRUE\n-\nacc1\n0\n-\n1\n-\n0\np\n-\nacc0,acc1,label=back\n"
        );
        assert_eq!(read_graph_str(&written).unwrap().to_string(), written);
    }

    #[test]
    fn removed_nodes_are_renumbered() {
        let mut graph = read_graph_str(SAMPLE).unwrap();
        graph.remove_node(1);
        let reread = read_graph_str(&graph.to_string()).unwrap();
        assert_eq!(reread.size(), 2);
        assert_eq!(reread.edges_from(1).next().unwrap().1.target(), 0);
    }

    #[test]
    fn configuration_errors() {
        assert!(matches!(
            read_graph_str("1\ntype=xba,ac=edges\n0\n-\n"),
            Err(Error::UnknownGraphType(t)) if t == "xba"
        ));
        assert!(matches!(
            read_graph_str("1\ntype=ba,ac=states\n0\n-\n"),
            Err(Error::UnknownAcceptancePlacement(_))
        ));
        assert!(matches!(
            read_graph_str("1\ntype=gba,ac=edges\n0\n-\n"),
            Err(Error::InvalidSetCount(_))
        ));
    }

    #[test]
    fn labels_with_separators_read_back() {
        let mut graph = read_graph_str("1\ntype=ba,ac=nodes\n0\naccepting\n").unwrap();
        if let Some(attributes) = graph.node_attributes_mut(0) {
            attributes.set_label("q0, init=yes # start");
        }
        let written = graph.to_string();
        let reread = read_graph_str(&written).unwrap();
        let node = reread.node(0).unwrap().attributes();
        assert_eq!(node.label(), Some("q0, init=yes # start"));
        assert_eq!(node.marks().len(), 1);
        assert_eq!(reread.to_string(), written);

        assert!(matches!(
            read_graph_str("1\ntype=ba,ac=nodes\n0\nlabel=%4\n"),
            Err(Error::Parse { line: 4, .. })
        ));
    }

    #[test]
    fn node_count_is_not_trusted() {
        assert!(matches!(
            read_graph_str("100000000000\ntype=ba,ac=nodes\n"),
            Err(Error::UnexpectedEnd { line: 2 })
        ));
        assert!(matches!(
            read_graph_str(&format!("{}\ntype=ba,ac=nodes\n0\n-\n", usize::MAX)),
            Err(Error::UnexpectedEnd { line: 4 })
        ));
    }

    #[test]
    fn edges_may_point_forward() {
        let graph = read_graph_str("2\ntype=ba,ac=nodes\n1\n-\n1\nTRUE\n-\n-\n0\naccepting\n")
            .unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges_from(0).next().unwrap().1.target(), 1);
    }

    #[test]
    fn malformed_input() {
        assert!(matches!(
            read_graph_str("2\ntype=ba,ac=nodes\n0\n-\n"),
            Err(Error::UnexpectedEnd { line: 4 })
        ));
        assert!(matches!(
            read_graph_str("x\n"),
            Err(Error::Parse { line: 1, .. })
        ));
        assert!(matches!(
            read_graph_str("1\ntype=ba,ac=nodes,color=red\n0\n-\n"),
            Err(Error::Parse { line: 2, .. })
        ));
        assert!(matches!(
            read_graph_str("1\ntype=ba,ac=nodes\n1\n-\n3\nTRUE\n-\n-\n"),
            Err(Error::Parse { line: 5, .. })
        ));
        assert!(matches!(
            read_graph_str("1\ntype=ba,ac=nodes\n1\n-\n0\nTRUE\n-\naccepting\n"),
            Err(Error::Parse { line: 8, .. })
        ));
        assert!(matches!(
            read_graph_str("1\ntype=ba,ac=nodes\n0\naccepting=maybe\n"),
            Err(Error::Parse { line: 4, .. })
        ));
    }
}
