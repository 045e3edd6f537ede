#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use super::*;
use crate::NameInterner;

struct Fixture {
    names: NameInterner,
    graph: SemanticGraph,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            names: NameInterner::new(),
            graph: SemanticGraph::new(),
        }
    }

    fn leaf(&mut self, name: &str, text: &str, start: u32) -> NodeId {
        let sym = self.names.intern(name);
        let span = Span::new(start, start + text.len() as u32);
        self.graph.add(GraphNode::terminal(
            sym,
            Arc::from(name),
            Arc::from(text),
            span,
        ))
    }

    fn node(&mut self, name: &str, children: &[NodeId]) -> NodeId {
        let sym = self.names.intern(name);
        let span = children
            .iter()
            .map(|&c| self.graph[c].span)
            .reduce(Span::merge)
            .unwrap_or(Span::DUMMY);
        self.graph.add(GraphNode::non_terminal(
            sym,
            Arc::from(name),
            span,
            children.iter().copied().collect(),
        ))
    }
}

// === Arena ===

#[test]
fn add_assigns_sequential_ids() {
    let mut f = Fixture::new();
    let a = f.leaf("a", "a", 0);
    let b = f.leaf("b", "b", 1);
    assert_eq!(a, NodeId::new(0));
    assert_eq!(b, NodeId::new(1));
    assert_eq!(f.graph[b].id, b);
    assert!(f.graph.get(NodeId::new(2)).is_none());
    assert_eq!(f.graph.len(), 2);
}

#[test]
fn children_resolve_in_order() {
    let mut f = Fixture::new();
    let a = f.leaf("a", "x", 0);
    let b = f.leaf("b", "yy", 1);
    let s = f.node("S", &[a, b]);
    let names: Vec<_> = f.graph.children(s).map(|n| n.name.to_string()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(f.graph[s].span, Span::new(0, 3));
    assert_eq!(f.graph.to_sexpr(s), r#"(S a:"x" b:"yy")"#);
}

// === Derivations ===

#[test]
fn single_root_is_its_own_derivation() {
    let mut f = Fixture::new();
    let a = f.leaf("a", "a", 0);
    let s = f.node("S", &[a]);
    f.graph.set_root(s);
    assert!(!f.graph.is_ambiguous());
    assert_eq!(f.graph.derivations(), vec![s]);
}

#[test]
fn ambiguous_root_unwraps_packed_wrappers() {
    let mut f = Fixture::new();
    let a = f.leaf("a", "a", 0);
    let x = f.leaf("x", "x", 1);
    let b = f.node("B", &[x]);
    let c = f.node("C", &[x]);
    let s1 = f.node("S", &[a, b]);
    let s2 = f.node("S", &[a, c]);

    let sym = f.names.intern("S");
    let mut wrappers = Vec::new();
    for root in [s1, s2] {
        let packed = GraphNode::packed(sym, Arc::from("S"), f.graph[root].span, root);
        wrappers.push(f.graph.add(packed));
    }
    let amb = GraphNode::ambiguous_root(sym, Arc::from("S"), Span::new(0, 2), wrappers);
    let root = f.graph.add(amb);
    f.graph.set_root(root);

    assert!(f.graph.is_ambiguous());
    assert_eq!(f.graph.derivations(), vec![s1, s2]);
    assert_eq!(
        f.graph.to_sexpr(root),
        r#"(amb S [(S a:"a" (B x:"x"))] [(S a:"a" (C x:"x"))])"#
    );
}

// === Extraction ===

#[test]
fn extract_keeps_only_reachable_nodes() {
    let mut f = Fixture::new();
    let a = f.leaf("a", "a", 0);
    let _dead = f.leaf("dead", "zz", 5);
    let b = f.leaf("b", "b", 1);
    let s = f.node("S", &[a, b]);
    let _orphan = f.node("T", &[a]);

    let (compact, roots) = f.graph.extract(&[s]);
    assert_eq!(compact.len(), 3);
    assert_eq!(roots.len(), 1);
    let root = roots[0];
    assert_eq!(compact[root].name.as_ref(), "S");
    for (i, node) in compact.iter().enumerate() {
        assert_eq!(node.id.index(), i);
        for &child in &node.children {
            assert!(child < node.id, "children precede parents");
        }
    }
    assert_eq!(compact.to_sexpr(root), f.graph.to_sexpr(s));
}

#[test]
fn extract_shares_common_subtrees() {
    let mut f = Fixture::new();
    let x = f.leaf("x", "x", 0);
    let p = f.node("P", &[x]);
    let q = f.node("Q", &[x]);
    let (compact, roots) = f.graph.extract(&[p, q]);
    assert_eq!(compact.len(), 3);
    assert_eq!(compact[roots[0]].children[0], compact[roots[1]].children[0]);
}

// === Builder ===

#[test]
fn builder_records_commands_in_order() {
    let mut f = Fixture::new();
    let a = f.leaf("a", "a", 0);
    let target = f.node("S", &[a]);
    let mut builder = GraphBuilder::new(&f.graph, target, Span::new(0, 1));
    assert_eq!(builder.target(), target);
    builder.set_property("const", true);
    builder.add_child(a).unwrap();
    builder.declare("x", "var");
    builder.declare_in("fn", "y", "param");
    builder.reference("x");
    builder.push_context("block");
    builder.pop_context();
    assert_eq!(builder.node(a).map(|n| n.span), Some(Span::new(0, 1)));

    let cmds = builder.into_commands();
    assert_eq!(cmds.len(), 7);
    assert_eq!(
        cmds[0],
        GraphCommand::SetProperty {
            key: "const".into(),
            value: PropertyValue::Bool(true),
        }
    );
    assert_eq!(
        cmds[3],
        GraphCommand::Declare {
            name: "y".into(),
            kind: "param".into(),
            scope: Some("fn".into()),
        }
    );
    assert_eq!(cmds[6], GraphCommand::PopContext);
}

#[test]
fn builder_rejects_unknown_child() {
    let mut f = Fixture::new();
    let a = f.leaf("a", "a", 0);
    let target = f.node("S", &[a]);
    let mut builder = GraphBuilder::new(&f.graph, target, Span::DUMMY);
    let err = builder.add_child(NodeId::new(9)).unwrap_err();
    assert!(err.message.contains("#9"));
    assert!(builder.into_commands().is_empty());
}

#[test]
fn builder_rejects_children_that_would_close_a_cycle() {
    let mut f = Fixture::new();
    let a = f.leaf("a", "a", 0);
    let s = f.node("S", &[a]);
    let later = f.leaf("b", "b", 1);
    let mut builder = GraphBuilder::new(&f.graph, s, Span::new(0, 1));

    let own = builder.add_child(s).unwrap_err();
    assert!(own.message.contains("not older"), "{own}");
    assert!(builder.add_child(later).is_err());
    builder.add_child(a).unwrap();
    assert_eq!(builder.into_commands(), vec![GraphCommand::AddChild(a)]);
}

// === Rendering ===

#[test]
fn deep_derivations_render_without_recursion() {
    let mut f = Fixture::new();
    let mut list = {
        let w = f.leaf("word", "w", 0);
        f.node("List", &[w])
    };
    for i in 1..200_000 {
        let w = f.leaf("word", "w", i);
        list = f.node("List", &[list, w]);
    }
    let text = f.graph.to_sexpr(list);
    assert!(text.starts_with("(List (List (List "));
    assert!(text.ends_with(r#" word:"w") word:"w"))"#));
    assert_eq!(text.matches("(List").count(), 200_000);
}

#[test]
fn property_value_conversions() {
    assert_eq!(PropertyValue::from(3_i64), PropertyValue::Int(3));
    assert_eq!(PropertyValue::from("s").to_string(), "\"s\"");
    assert_eq!(PropertyValue::from(String::from("t")), PropertyValue::Str("t".into()));
}
