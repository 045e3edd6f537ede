//! Packed semantic graph.
//!
//! Nodes live in a flat arena indexed by [`NodeId`]. The parser shares one
//! arena across all of its paths: a path's stack is a list of ids, so
//! branching a path never copies nodes. Once a parse completes, the nodes
//! reachable from the surviving derivations are extracted into a compact
//! graph that is immutable from then on.
//!
//! # Node kinds
//!
//! - `Terminal`: a shifted token. `value` holds the token text.
//! - `NonTerminal`: a reduction. `children` are the popped stack entries.
//! - `Packed`: wraps one complete derivation of an ambiguous span.
//! - `AmbiguousRoot`: the root returned when several derivations
//!   completed. Its `packed` list holds one `Packed` node per derivation.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::ops::Index;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{Name, Span};

mod builder;

pub use builder::{ActionError, GraphBuilder, GraphCommand};

/// Index of a node inside a [`SemanticGraph`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Terminal,
    NonTerminal,
    AmbiguousRoot,
    Packed,
}

/// Value stored in a node's property bag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Str(Arc::from(v))
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Str(Arc::from(v))
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// A node in the semantic graph.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphNode {
    /// Position in the owning arena. Assigned by [`SemanticGraph::add`].
    pub id: NodeId,
    /// Grammar symbol this node stands for.
    pub symbol: Name,
    pub kind: NodeKind,
    /// Token or rule name, resolved for display.
    pub name: Arc<str>,
    /// Token text for terminals.
    pub value: Option<Arc<str>>,
    pub span: Span,
    pub properties: BTreeMap<Arc<str>, PropertyValue>,
    pub children: SmallVec<[NodeId; 4]>,
    /// Alternative derivations (`AmbiguousRoot` only).
    pub packed: Vec<NodeId>,
}

impl GraphNode {
    /// Leaf node for a shifted token.
    pub fn terminal(symbol: Name, name: Arc<str>, value: Arc<str>, span: Span) -> Self {
        GraphNode {
            id: NodeId(0),
            symbol,
            kind: NodeKind::Terminal,
            name,
            value: Some(value),
            span,
            properties: BTreeMap::new(),
            children: SmallVec::new(),
            packed: Vec::new(),
        }
    }

    /// Interior node for a reduction.
    pub fn non_terminal(
        symbol: Name,
        name: Arc<str>,
        span: Span,
        children: SmallVec<[NodeId; 4]>,
    ) -> Self {
        GraphNode {
            id: NodeId(0),
            symbol,
            kind: NodeKind::NonTerminal,
            name,
            value: None,
            span,
            properties: BTreeMap::new(),
            children,
            packed: Vec::new(),
        }
    }

    /// Wrapper for one complete derivation of an ambiguous span.
    pub fn packed(symbol: Name, name: Arc<str>, span: Span, derivation: NodeId) -> Self {
        let mut node = GraphNode::non_terminal(symbol, name, span, smallvec::smallvec![derivation]);
        node.kind = NodeKind::Packed;
        node
    }

    /// Root standing for several derivations, one [`NodeKind::Packed`]
    /// wrapper each.
    pub fn ambiguous_root(symbol: Name, name: Arc<str>, span: Span, packed: Vec<NodeId>) -> Self {
        let mut node = GraphNode::non_terminal(symbol, name, span, SmallVec::new());
        node.kind = NodeKind::AmbiguousRoot;
        node.packed = packed;
        node
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.kind == NodeKind::Terminal
    }
}

/// Arena of graph nodes plus an optional root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SemanticGraph {
    nodes: Vec<GraphNode>,
    root: Option<NodeId>,
}

impl SemanticGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, assigning its id.
    pub fn add(&mut self, mut node: GraphNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.id = id;
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.get_mut(id.index())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root(&self) -> Option<&GraphNode> {
        self.root.and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    /// Direct children of `id`, in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &GraphNode> {
        self.get(id)
            .into_iter()
            .flat_map(|n| n.children.iter())
            .filter_map(|&c| self.get(c))
    }

    /// Does the root stand for more than one derivation?
    pub fn is_ambiguous(&self) -> bool {
        self.root()
            .is_some_and(|n| n.kind == NodeKind::AmbiguousRoot)
    }

    /// Root node of every derivation the graph represents.
    ///
    /// For an ambiguous root this unwraps each packed wrapper; otherwise it is
    /// just the root.
    pub fn derivations(&self) -> Vec<NodeId> {
        let Some(root) = self.root() else {
            return Vec::new();
        };
        if root.kind != NodeKind::AmbiguousRoot {
            return vec![root.id];
        }
        root.packed
            .iter()
            .filter_map(|&p| self.get(p))
            .filter_map(|wrapper| wrapper.children.first().copied())
            .collect()
    }

    /// Copy the nodes reachable from `roots` into a fresh, compact graph.
    ///
    /// Ids are remapped; relative order is preserved, so children still
    /// precede their parents. Returns the new graph and the remapped roots.
    pub fn extract(&self, roots: &[NodeId]) -> (SemanticGraph, Vec<NodeId>) {
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = roots.to_vec();
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            if reachable[id.index()] {
                continue;
            }
            reachable[id.index()] = true;
            stack.extend(node.children.iter().copied());
            stack.extend(node.packed.iter().copied());
        }

        let mut remap: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        let mut out = SemanticGraph::new();
        for node in self.nodes.iter().filter(|n| reachable[n.id.index()]) {
            let new_id = NodeId(out.nodes.len() as u32);
            remap.insert(node.id, new_id);
            let mut copy = node.clone();
            copy.id = new_id;
            out.nodes.push(copy);
        }
        for node in &mut out.nodes {
            for child in node.children.iter_mut().chain(node.packed.iter_mut()) {
                if let Some(&mapped) = remap.get(child) {
                    *child = mapped;
                }
            }
        }
        let new_roots = roots
            .iter()
            .filter_map(|r| remap.get(r).copied())
            .collect();
        (out, new_roots)
    }

    /// S-expression rendering of the subtree at `id`.
    ///
    /// Terminals print as `name:"text"`, packed alternatives as
    /// `(amb name [..] [..])`. Walks with an explicit work list, so
    /// derivation depth is bounded only by memory.
    pub fn to_sexpr(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut work = vec![Piece::Node(id)];
        while let Some(piece) = work.pop() {
            let id = match piece {
                Piece::Text(text) => {
                    out.push_str(text);
                    continue;
                }
                Piece::Node(id) => id,
            };
            let Some(node) = self.get(id) else {
                out.push('?');
                continue;
            };
            match node.kind {
                NodeKind::Terminal => {
                    let _ = write!(out, "{}:{:?}", node.name, node.value.as_deref().unwrap_or(""));
                }
                NodeKind::NonTerminal => {
                    out.push('(');
                    out.push_str(&node.name);
                    work.push(Piece::Text(")"));
                    for &child in node.children.iter().rev() {
                        work.push(Piece::Node(child));
                        work.push(Piece::Text(" "));
                    }
                }
                NodeKind::Packed => {
                    out.push('[');
                    work.push(Piece::Text("]"));
                    for (i, &child) in node.children.iter().enumerate().rev() {
                        work.push(Piece::Node(child));
                        if i > 0 {
                            work.push(Piece::Text(" "));
                        }
                    }
                }
                NodeKind::AmbiguousRoot => {
                    out.push_str("(amb ");
                    out.push_str(&node.name);
                    work.push(Piece::Text(")"));
                    for &alt in node.packed.iter().rev() {
                        work.push(Piece::Node(alt));
                        work.push(Piece::Text(" "));
                    }
                }
            }
        }
        out
    }
}

/// Pending output of [`SemanticGraph::to_sexpr`].
enum Piece {
    Node(NodeId),
    Text(&'static str),
}

impl Index<NodeId> for SemanticGraph {
    type Output = GraphNode;

    fn index(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id.index()]
    }
}

#[cfg(test)]
mod tests;
