#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tangle_ir::{
    ActionError, Associativity, ContextStack, Grammar, GrammarBuilder, NodeKind, ProductionSpec,
    PropertyValue, Token, TokenSpec, View,
};
use tangle_lexer::{CompiledLexer, LexerConfig};

use crate::path::ParsePath;
use crate::{ParseErrorKind, ParseOutput, Parser, ParserConfig, StuckReason};

fn grammar(builder: GrammarBuilder) -> Grammar {
    builder.build().unwrap()
}

fn parse_with(grammar: &Grammar, text: &str, config: ParserConfig) -> ParseOutput {
    let lexer = CompiledLexer::new(grammar).unwrap();
    let lexed = lexer.tokenize(View::from_str_bytes(text), &LexerConfig::default());
    assert!(lexed.success, "lexing {text:?} failed: {:?}", lexed.errors);
    Parser::new(grammar, &lexed.tokens, config).parse()
}

fn parse(grammar: &Grammar, text: &str) -> ParseOutput {
    parse_with(grammar, text, ParserConfig::default())
}

fn sexpr(out: &ParseOutput) -> String {
    out.graph.to_sexpr(out.graph.root_id().unwrap())
}

fn arithmetic(plus: Option<Associativity>) -> Grammar {
    let mut sum = ProductionSpec::new("E", &["E", "plus", "E"]);
    if let Some(assoc) = plus {
        sum = sum.precedence(1, assoc);
    }
    grammar(
        Grammar::builder()
            .regex("num", "[0-9]+")
            .literal("plus", "+")
            .literal("times", "*")
            .literal("pow", "^")
            .token(TokenSpec::regex("ws", "[ ]+").skip())
            .production(sum)
            .production(
                ProductionSpec::new("E", &["E", "times", "E"]).precedence(2, Associativity::Left),
            )
            .production(
                ProductionSpec::new("E", &["E", "pow", "E"]).precedence(3, Associativity::Right),
            )
            .rule("E", &["num"])
            .start("E"),
    )
}

// === Derivations ===

#[test]
fn single_derivation_has_a_plain_root() {
    let g = arithmetic(Some(Associativity::Left));
    let out = parse(&g, "1 + 2");
    assert!(out.success);
    assert!(!out.graph.is_ambiguous());
    assert_eq!(
        sexpr(&out),
        r#"(E (E num:"1") plus:"+" (E num:"2"))"#
    );
    assert_eq!(out.stats.completed, 1);
    assert_eq!(out.graph.root().unwrap().span, tangle_ir::Span::new(0, 5));
}

#[test]
fn ambiguous_completion_packs_every_derivation() {
    let g = grammar(
        Grammar::builder()
            .literal("a", "a")
            .literal("b", "b")
            .rule("S", &["A", "B"])
            .rule("S", &["A", "C"])
            .rule("A", &["a"])
            .rule("B", &["b"])
            .rule("C", &["b"])
            .start("S"),
    );
    let out = parse(&g, "ab");
    assert!(out.success);
    assert!(out.graph.is_ambiguous());
    let root = out.graph.root().unwrap();
    assert_eq!(root.kind, NodeKind::AmbiguousRoot);
    assert_eq!(root.packed.len(), 2);
    assert_eq!(out.graph.derivations().len(), 2);
    assert_eq!(
        sexpr(&out),
        r#"(amb S [(S (A a:"a") (B b:"b"))] [(S (A a:"a") (C b:"b"))])"#
    );
}

#[test]
fn unresolved_operators_stay_ambiguous() {
    let g = arithmetic(None);
    let out = parse(&g, "1+2+3");
    assert!(out.success);
    assert!(out.graph.is_ambiguous());
    assert_eq!(out.stats.completed, 2);
}

#[test]
fn derivations_are_unmodified_path_results() {
    let g = arithmetic(None);
    let out = parse(&g, "1+2+3");
    let rendered: Vec<String> = out
        .graph
        .derivations()
        .into_iter()
        .map(|id| out.graph.to_sexpr(id))
        .collect();
    assert!(rendered.contains(
        &r#"(E (E (E num:"1") plus:"+" (E num:"2")) plus:"+" (E num:"3"))"#.to_owned()
    ));
    assert!(rendered.contains(
        &r#"(E (E num:"1") plus:"+" (E (E num:"2") plus:"+" (E num:"3")))"#.to_owned()
    ));
}

// === Precedence ===

#[test]
fn higher_precedence_binds_tighter() {
    let g = arithmetic(Some(Associativity::Left));
    let out = parse(&g, "1+2*3");
    assert_eq!(
        sexpr(&out),
        r#"(E (E num:"1") plus:"+" (E (E num:"2") times:"*" (E num:"3")))"#
    );
    let out = parse(&g, "1*2+3");
    assert_eq!(
        sexpr(&out),
        r#"(E (E (E num:"1") times:"*" (E num:"2")) plus:"+" (E num:"3"))"#
    );
}

#[test]
fn associativity_breaks_ties() {
    let g = arithmetic(Some(Associativity::Left));
    assert_eq!(
        sexpr(&parse(&g, "1+2+3")),
        r#"(E (E (E num:"1") plus:"+" (E num:"2")) plus:"+" (E num:"3"))"#
    );
    assert_eq!(
        sexpr(&parse(&g, "1^2^3")),
        r#"(E (E num:"1") pow:"^" (E (E num:"2") pow:"^" (E num:"3")))"#
    );
}

// === Failures ===

#[test]
fn starved_paths_report_the_last_point_of_progress() {
    let g = grammar(
        Grammar::builder()
            .literal("a", "a")
            .literal("b", "b")
            .literal("c", "c")
            .token(TokenSpec::regex("ws", "[ ]+").skip())
            .rule("S", &["a", "b"])
            .start("S"),
    );
    let out = parse(&g, "a c b");
    assert!(!out.success);
    assert_eq!(out.errors.len(), 1);
    let error = &out.errors[0];
    assert_eq!(error.kind, ParseErrorKind::NoDerivation);
    assert_eq!(error.token_index, 1);
    assert_eq!(error.offset, 2);
    assert!(!error.is_stuck());
    // The surviving prefix is still inspectable.
    assert_eq!(out.graph.len(), 1);
    assert!(out.graph.root().is_none());
}

#[test]
fn input_ending_early_is_reported_at_the_end() {
    let g = grammar(
        Grammar::builder()
            .literal("a", "a")
            .literal("b", "b")
            .rule("S", &["a", "b"]),
    );
    let out = parse(&g, "a");
    assert!(!out.success);
    assert_eq!(out.errors[0].kind, ParseErrorKind::NoDerivation);
    assert_eq!(out.errors[0].token_index, 1);
    assert_eq!(out.errors[0].offset, 1);
}

#[test]
fn empty_input_is_an_error() {
    let g = arithmetic(None);
    let out = Parser::new(&g, &[], ParserConfig::default()).parse();
    assert!(!out.success);
    assert_eq!(out.errors[0].kind, ParseErrorKind::EmptyInput);
}

#[test]
fn step_limit_is_a_stuck_error() {
    let g = arithmetic(None);
    let out = parse_with(&g, "1+2", ParserConfig::default().with_step_limit_factor(0));
    assert!(!out.success);
    assert_eq!(
        out.errors[0].kind,
        ParseErrorKind::Stuck(StuckReason::StepLimit)
    );
    assert!(out.errors[0].is_stuck());
}

#[test]
fn unit_reductions_alone_are_not_progress() {
    let g = grammar(
        Grammar::builder()
            .literal("x", "x")
            .rule("S", &["A"])
            .rule("A", &["x"])
            .start("S"),
    );
    assert!(parse(&g, "x").success);
    let out = parse_with(&g, "x", ParserConfig::default().with_stall_limit(1));
    assert_eq!(
        out.errors[0].kind,
        ParseErrorKind::Stuck(StuckReason::NoProgress)
    );
}

#[test]
fn unit_cycles_terminate() {
    let g = grammar(
        Grammar::builder()
            .literal("x", "x")
            .rule("A", &["B"])
            .rule("B", &["A"])
            .rule("A", &["x"])
            .start("A"),
    );
    let out = parse(&g, "x");
    assert!(out.success);
    assert!(!out.graph.is_ambiguous());
    assert_eq!(sexpr(&out), r#"(A x:"x")"#);
}

#[test]
fn path_ceiling_bounds_highly_ambiguous_input() {
    let g = grammar(
        Grammar::builder()
            .literal("a", "a")
            .rule("E", &["E", "E"])
            .rule("E", &["a"])
            .start("E"),
    );
    let config = ParserConfig::default();
    let out = parse_with(&g, "aaaaaa", config);
    assert!(out.success);
    assert!(out.stats.peak_paths <= config.max_paths);
    assert!(out.stats.completed >= 2);
}

// === Long inputs ===

#[test]
fn right_recursion_costs_a_bounded_number_of_steps_per_token() {
    let g = grammar(
        Grammar::builder()
            .literal("a", "a")
            .rule("L", &["a", "L"])
            .rule("L", &["a"])
            .start("L"),
    );
    let a = g.symbol("a").unwrap();
    let text = "a".repeat(10_000);
    let view = View::from_str_bytes(&text);
    let tokens: Vec<Token<'_>> = (0..text.len())
        .map(|i| Token::new(a, view.slice(i, 1).unwrap()))
        .collect();

    let out = Parser::new(&g, &tokens, ParserConfig::default()).parse();
    assert!(out.success, "{:?}", out.errors);
    assert!(!out.graph.is_ambiguous());
    // One shift per token, then one reduction per token at the end.
    assert!(
        out.stats.steps <= 3 * (tokens.len() + 1),
        "{} steps",
        out.stats.steps
    );
    assert_eq!(out.graph.len(), 2 * tokens.len());
    assert!(sexpr(&out).starts_with(r#"(L a:"a" (L a:"a" (L "#));
}

#[test]
fn reductions_wait_for_a_lookahead_that_can_follow() {
    // `A ::= x` only reduces before `y`; before `z` the longer rule wins.
    let g = grammar(
        Grammar::builder()
            .literal("x", "x")
            .literal("y", "y")
            .literal("z", "z")
            .rule("S", &["A", "y"])
            .rule("S", &["x", "z"])
            .rule("A", &["x"])
            .start("S"),
    );
    let out = parse(&g, "xz");
    assert!(out.success, "{:?}", out.errors);
    assert_eq!(sexpr(&out), r#"(S x:"x" z:"z")"#);
    // Shift x, shift z, reduce S, then the finished path: no `A` detour.
    assert_eq!(out.stats.steps, 4);
    let out = parse(&g, "xy");
    assert!(out.success, "{:?}", out.errors);
    assert_eq!(sexpr(&out), r#"(S (A x:"x") y:"y")"#);
}

// === Semantic actions ===

#[test]
fn actions_set_properties() {
    let g = grammar(
        Grammar::builder().regex("num", "[0-9]+").production(
            ProductionSpec::new("N", &["num"]).action(|_node, children, builder| {
                let text = children[0].value.as_deref().unwrap_or("0");
                let value: i64 = text
                    .parse()
                    .map_err(|_| ActionError::new("not a number"))?;
                builder.set_property("value", value);
                Ok(())
            }),
        ),
    );
    let out = parse(&g, "42");
    assert!(out.success);
    let root = out.graph.root().unwrap();
    assert_eq!(root.property("value"), Some(&PropertyValue::Int(42)));
}

#[test]
fn failing_action_is_a_no_op() {
    let g = grammar(
        Grammar::builder().regex("num", "[0-9]+").production(
            ProductionSpec::new("N", &["num"]).action(|_node, _children, builder| {
                builder.set_property("seen", true);
                Err(ActionError::new("boom"))
            }),
        ),
    );
    let out = parse(&g, "7");
    assert!(out.success);
    assert_eq!(out.stats.action_failures, 1);
    assert!(out.graph.root().unwrap().properties.is_empty());
}

#[test]
fn actions_cannot_adopt_their_own_node() {
    let g = grammar(
        Grammar::builder().literal("a", "a").production(
            ProductionSpec::new("S", &["a"])
                .action(|node, _children, builder| builder.add_child(node.id)),
        ),
    );
    let out = parse(&g, "a");
    assert!(out.success);
    assert_eq!(out.stats.action_failures, 1);
    assert_eq!(out.graph.root().unwrap().children.len(), 1);
    assert_eq!(sexpr(&out), r#"(S a:"a")"#);
}

fn declarations() -> Grammar {
    grammar(
        Grammar::builder()
            .token(TokenSpec::literal("let", "let").priority(1))
            .token(TokenSpec::literal("use", "use").priority(1))
            .token(TokenSpec::regex("ident", "[a-z]+"))
            .token(TokenSpec::regex("ws", "[ ]+").skip())
            .rule("Prog", &["Stmt"])
            .rule("Prog", &["Prog", "Stmt"])
            .production(ProductionSpec::new("Stmt", &["let", "ident"]).action(
                |_node, children, builder| {
                    let name = children[1].value.as_deref().unwrap_or_default();
                    builder.declare(name, "var");
                    Ok(())
                },
            ))
            .production(ProductionSpec::new("Stmt", &["use", "ident"]).action(
                |_node, children, builder| {
                    let name = children[1].value.as_deref().unwrap_or_default();
                    builder.reference(name);
                    Ok(())
                },
            ))
            .start("Prog"),
    )
}

#[test]
fn actions_feed_the_symbol_table() {
    let g = declarations();
    let out = parse(&g, "let x use x use y");
    assert!(out.success, "{:?}", out.errors);
    let decl = out.symbols.lookup("global", "x").unwrap();
    assert_eq!(&*decl.kind, "var");
    assert_eq!(decl.span, tangle_ir::Span::new(0, 5));
    assert_eq!(out.symbols.references("x").len(), 1);
    assert_eq!(out.symbols.references("y").len(), 1);
    assert!(out.symbols.lookup("global", "y").is_none());
}

// === Contexts and preconditions ===

fn blocks(with_action: bool) -> Grammar {
    let mut open = ProductionSpec::new("Open", &["lbrace"]);
    if with_action {
        open = open.action(|_node, _children, builder| {
            builder.push_context("block");
            Ok(())
        });
    }
    grammar(
        Grammar::builder()
            .literal("lbrace", "{")
            .literal("rbrace", "}")
            .regex("ident", "[a-z]+")
            .rule("S", &["Open", "Item", "rbrace"])
            .production(open)
            .production(ProductionSpec::new("Item", &["ident"]).in_context("block"))
            .start("S"),
    )
}

#[test]
fn actions_open_contexts_for_later_rules() {
    let out = parse(&blocks(true), "{x}");
    assert!(out.success, "{:?}", out.errors);
    assert_eq!(out.contexts.path(), "block");

    let out = parse(&blocks(false), "{x}");
    assert!(!out.success);
    assert_eq!(out.errors[0].token_index, 1);
}

#[test]
fn initial_contexts_enable_rules() {
    let g = blocks(false);
    let lexer = CompiledLexer::new(&g).unwrap();
    let lexed = lexer.tokenize(View::from_str_bytes("{x}"), &LexerConfig::default());
    let mut contexts = ContextStack::new();
    contexts.push("block");
    let out = Parser::new(&g, &lexed.tokens, ParserConfig::default())
        .with_contexts(contexts)
        .parse();
    assert!(out.success);
}

#[test]
fn preconditions_gate_productions() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let g = grammar(
        Grammar::builder().literal("a", "a").production(
            ProductionSpec::new("S", &["a"]).precondition(move |input| {
                seen.fetch_add(1, Ordering::Relaxed);
                input.lookahead.is_some()
            }),
        ),
    );
    // Shifting has a lookahead; the end-of-input reduction does not.
    let out = parse(&g, "a");
    assert!(!out.success);
    assert!(calls.load(Ordering::Relaxed) >= 2);
}

proptest! {
    /// The merge survivor always carries the larger score.
    #[test]
    fn merge_survivor_has_the_max_score(a in 0.0f64..10.0, b in 0.0f64..10.0, ids in (0u32..4, 4u32..8)) {
        let mut first = ParsePath::root();
        first.score = a;
        first.id = ids.0;
        let mut second = ParsePath::root();
        second.score = b;
        second.id = ids.1;
        let survivor = if second.outranks(&first) { &second } else { &first };
        prop_assert_eq!(survivor.score, a.max(b));
    }
}
