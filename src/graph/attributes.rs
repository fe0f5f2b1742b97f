use std::{fmt::Display, str::FromStr};

use crate::{math::AcceptanceMask, Error, Result};

/// The acceptance condition of a [`super::Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphType {
    /// Büchi acceptance with a single acceptance set, written as `type=ba`.
    Buchi,
    /// Generalized Büchi acceptance with `sets` acceptance sets, written as `type=gba,nsets=..`.
    Generalized {
        /// The number of acceptance sets, at least one.
        sets: usize,
    },
}

impl GraphType {
    /// The number of acceptance sets.
    pub fn sets(&self) -> usize {
        match self {
            GraphType::Buchi => 1,
            GraphType::Generalized { sets } => *sets,
        }
    }

    /// Parses the values of the `type` and `nsets` attributes.
    pub fn parse(ty: Option<&str>, nsets: Option<&str>) -> Result<Self> {
        match (ty, nsets) {
            (Some("ba"), None) => Ok(GraphType::Buchi),
            (Some("ba"), Some(n)) => Err(Error::InvalidSetCount(format!(
                "{n} given for a Büchi graph"
            ))),
            (Some("gba"), None) => Err(Error::InvalidSetCount(
                "missing for a generalized Büchi graph".to_string(),
            )),
            (Some("gba"), Some(n)) => match n.parse::<usize>() {
                Ok(sets) if sets > 0 => Ok(GraphType::Generalized { sets }),
                _ => Err(Error::InvalidSetCount(n.to_string())),
            },
            (other, _) => Err(Error::UnknownGraphType(other.unwrap_or_default().to_string())),
        }
    }

    /// The name of the attribute that marks membership in acceptance set `index`.
    pub fn mark_key(&self, index: usize) -> String {
        match self {
            GraphType::Buchi => "accepting".to_string(),
            GraphType::Generalized { .. } => format!("acc{index}"),
        }
    }

    /// Recognizes the attribute naming membership in an acceptance set and returns the index.
    pub fn parse_mark_key(&self, key: &str) -> Option<usize> {
        match self {
            GraphType::Buchi => (key == "accepting").then_some(0),
            GraphType::Generalized { sets } => key
                .strip_prefix("acc")
                .and_then(|i| i.parse::<usize>().ok())
                .filter(|i| i < sets),
        }
    }
}

/// Where the acceptance marks of a [`super::Graph`] are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcceptancePlacement {
    /// On nodes, written as `ac=nodes`.
    Nodes,
    /// On edges, written as `ac=edges`.
    Edges,
}

impl FromStr for AcceptancePlacement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nodes" => Ok(AcceptancePlacement::Nodes),
            "edges" => Ok(AcceptancePlacement::Edges),
            other => Err(Error::UnknownAcceptancePlacement(other.to_string())),
        }
    }
}

impl Display for AcceptancePlacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcceptancePlacement::Nodes => write!(f, "nodes"),
            AcceptancePlacement::Edges => write!(f, "edges"),
        }
    }
}

/// The graph-level attributes, which determine the acceptance condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphAttributes {
    ty: GraphType,
    placement: AcceptancePlacement,
}

impl GraphAttributes {
    /// Combines acceptance type and placement.
    pub fn new(ty: GraphType, placement: AcceptancePlacement) -> Self {
        Self { ty, placement }
    }

    /// The acceptance condition.
    pub fn ty(&self) -> GraphType {
        self.ty
    }

    /// Where acceptance marks live.
    pub fn placement(&self) -> AcceptancePlacement {
        self.placement
    }

    /// The number of acceptance sets.
    pub fn sets(&self) -> usize {
        self.ty.sets()
    }

    /// Decides what an attribute `key` on a node or edge, as given by `carrier`, refers to. The
    /// error explains why the key is not allowed there.
    pub fn element_key(
        &self,
        key: &str,
        carrier: AcceptancePlacement,
    ) -> std::result::Result<ElementKey, String> {
        if key == "label" {
            return Ok(ElementKey::Label);
        }
        match self.ty.parse_mark_key(key) {
            Some(_) if carrier != self.placement => Err(format!(
                "acceptance attribute {key} on {carrier} while acceptance is on {}",
                self.placement
            )),
            Some(i) => Ok(ElementKey::Mark(i)),
            None => Err(format!("unknown attribute {key}")),
        }
    }
}

impl Default for GraphAttributes {
    fn default() -> Self {
        Self::new(GraphType::Buchi, AcceptancePlacement::Nodes)
    }
}

/// Writes the attribute line of the graph, e.g. `type=gba,ac=edges,nsets=2`.
impl Display for GraphAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ty {
            GraphType::Buchi => write!(f, "type=ba,ac={}", self.placement),
            GraphType::Generalized { sets } => {
                write!(f, "type=gba,ac={},nsets={sets}", self.placement)
            }
        }
    }
}

/// The recognized attributes of nodes and edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKey {
    /// Membership in the acceptance set with the given index.
    Mark(usize),
    /// The display label.
    Label,
}

/// Attributes of a node or an edge: its acceptance marks and an opaque label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ElementAttributes {
    marks: AcceptanceMask,
    label: Option<String>,
}

impl ElementAttributes {
    /// No marks and no label.
    pub fn new() -> Self {
        Self::default()
    }

    /// No marks and the given label.
    pub fn labelled<S: Into<String>>(label: S) -> Self {
        Self {
            marks: AcceptanceMask::new(),
            label: Some(label.into()),
        }
    }

    /// The given marks and no label.
    pub fn marked(marks: AcceptanceMask) -> Self {
        Self { marks, label: None }
    }

    /// The acceptance sets the element belongs to.
    pub fn marks(&self) -> &AcceptanceMask {
        &self.marks
    }

    /// Mutable access to the acceptance marks.
    pub fn marks_mut(&mut self) -> &mut AcceptanceMask {
        &mut self.marks
    }

    /// The display label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets the display label.
    pub fn set_label<S: Into<String>>(&mut self, label: S) {
        self.label = Some(label.into())
    }

    /// Writes the attributes as a line of the interchange format, `-` if there are none.
    pub fn to_line(&self, ty: GraphType) -> String {
        let mut entries: Vec<String> = self.marks.iter().map(|i| ty.mark_key(i)).collect();
        entries.dedup();
        if let Some(label) = &self.label {
            entries.push(format!("label={}", escape_label(label)));
        }
        if entries.is_empty() {
            "-".to_string()
        } else {
            entries.join(",")
        }
    }
}

fn needs_escape(c: char) -> bool {
    matches!(c, '%' | ',' | '=' | '#') || c.is_whitespace() || c.is_control()
}

/// Percent-encodes the bytes of every character that would end or change an attribute entry.
pub(crate) fn escape_label(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        if needs_escape(c) {
            let mut buffer = [0; 4];
            for byte in c.encode_utf8(&mut buffer).bytes() {
                escaped.push_str(&format!("%{byte:02X}"));
            }
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Inverse of [`escape_label`].
pub(crate) fn unescape_label(escaped: &str) -> std::result::Result<String, String> {
    let mut bytes = Vec::with_capacity(escaped.len());
    let mut rest = escaped.as_bytes();
    while let Some((&byte, tail)) = rest.split_first() {
        if byte != b'%' {
            bytes.push(byte);
            rest = tail;
            continue;
        }
        let code = tail
            .get(..2)
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .ok_or_else(|| format!("invalid escape in label \"{escaped}\""))?;
        bytes.push(code);
        rest = &tail[2..];
    }
    String::from_utf8(bytes).map_err(|e| format!("label \"{escaped}\" is not UTF-8: {e}"))
}
