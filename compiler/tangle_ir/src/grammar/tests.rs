#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;

fn expr_grammar() -> Grammar {
    Grammar::builder()
        .regex("num", "[0-9]+")
        .literal("plus", "+")
        .token(TokenSpec::regex("ws", "[ ]+").skip())
        .production(ProductionSpec::new("E", &["E", "plus", "E"]).precedence(1, Associativity::Left))
        .rule("E", &["num"])
        .start("E")
        .build()
        .unwrap()
}

// === Building ===

#[test]
fn builds_and_interns_symbols() {
    let g = expr_grammar();
    assert_eq!(g.token_rules().len(), 3);
    assert_eq!(g.productions().len(), 2);

    let e = g.symbol("E").unwrap();
    let num = g.symbol("num").unwrap();
    assert_eq!(g.start(), Some(e));
    assert_eq!(g.name(num), "num");
    assert!(g.is_token(num));
    assert!(!g.is_token(e));
    assert!(g.token_rules()[2].skip);

    let p0 = g.production(0).unwrap();
    assert_eq!(p0.lhs, e);
    assert_eq!(p0.rhs.len(), 3);
    assert_eq!(p0.precedence, Some(1));
    assert_eq!(p0.associativity, Associativity::Left);
}

#[test]
fn rule_indexes_by_rhs_symbol() {
    let g = expr_grammar();
    let e = g.symbol("E").unwrap();
    let num = g.symbol("num").unwrap();
    let plus = g.symbol("plus").unwrap();

    // `E` appears twice in production 0 but is indexed once.
    assert_eq!(g.productions_containing(e), &[0]);
    assert_eq!(g.productions_containing(num), &[1]);
    assert_eq!(g.productions_containing(plus), &[0]);
    assert_eq!(g.productions_ending_with(e), &[0]);
    assert_eq!(g.productions_ending_with(num), &[1]);
    assert!(g.productions_ending_with(plus).is_empty());
}

#[test]
fn follow_sets_track_what_comes_next() {
    let g = Grammar::builder()
        .literal("a", "a")
        .literal("b", "b")
        .literal("c", "c")
        .rule("S", &["A", "B"])
        .rule("A", &["a"])
        .rule("B", &["b"])
        .rule("B", &["B", "c"])
        .build()
        .unwrap();
    let [s, a_rule, b_rule] = ["S", "A", "B"].map(|n| g.symbol(n).unwrap());
    let [a, b, c] = ["a", "b", "c"].map(|n| g.symbol(n).unwrap());

    // No start: the first production's left-hand side is the goal.
    assert_eq!(g.start(), None);
    assert_eq!(g.goal(), Some(s));
    assert!(g.can_follow(s, None));
    assert!(!g.can_follow(s, Some(b)));

    assert!(g.can_follow(a_rule, Some(b)));
    assert!(!g.can_follow(a_rule, Some(c)));
    assert!(!g.can_follow(a_rule, None));

    // `B` ends `S` and is followed by `c` inside its own recursion.
    assert!(g.can_follow(b_rule, Some(c)));
    assert!(g.can_follow(b_rule, None));
    assert!(!g.can_follow(b_rule, Some(a)));

    assert!(!g.can_follow(a, Some(b)));
}

#[test]
fn follow_sets_see_through_leading_rules() {
    let g = expr_grammar();
    let e = g.symbol("E").unwrap();
    let plus = g.symbol("plus").unwrap();
    let num = g.symbol("num").unwrap();
    assert!(g.can_follow(e, Some(plus)));
    assert!(g.can_follow(e, None));
    assert!(!g.can_follow(e, Some(num)));
}

#[test]
fn token_spec_modifiers() {
    let g = Grammar::builder()
        .token(
            TokenSpec::literal("open", "${")
                .pushes("expr")
                .priority(5),
        )
        .token(TokenSpec::literal("close", "}").in_context("expr").pops())
        .rule("S", &["open", "close"])
        .build()
        .unwrap();
    let open = &g.token_rules()[0];
    assert_eq!(open.push_context.as_deref(), Some("expr"));
    assert_eq!(open.priority, 5);
    let close = &g.token_rules()[1];
    assert_eq!(close.context.as_deref(), Some("expr"));
    assert!(close.pop_context);
    assert_eq!(g.start(), None);
}

#[test]
fn action_and_precondition_are_stored() {
    let g = Grammar::builder()
        .literal("a", "a")
        .production(
            ProductionSpec::new("S", &["a"])
                .action(|_, _, b| {
                    b.set_property("seen", true);
                    Ok(())
                })
                .precondition(|input| input.action == ActionKind::Reduce),
        )
        .build()
        .unwrap();
    let p = g.production(0).unwrap();
    assert!(p.action.is_some());
    let pre = p.precondition.as_ref().unwrap();
    let contexts = ContextStack::new();
    let input = PreconditionInput {
        action: ActionKind::Shift,
        stack: &[],
        lookahead: None,
        contexts: &contexts,
    };
    assert!(!pre(&input));
    assert!(format!("{p:?}").contains("action: true"));
}

// === Validation ===

#[test]
fn rejects_empty_rhs() {
    let err = Grammar::builder()
        .literal("a", "a")
        .rule("S", &[])
        .build()
        .unwrap_err();
    assert_eq!(err, GrammarError::EmptyRightHandSide { lhs: "S".into() });
}

#[test]
fn rejects_duplicate_token() {
    let err = Grammar::builder()
        .literal("a", "a")
        .regex("a", "a+")
        .build()
        .unwrap_err();
    assert_eq!(err, GrammarError::DuplicateToken { name: "a".into() });
}

#[test]
fn rejects_empty_pattern() {
    let err = Grammar::builder().literal("nothing", "").build().unwrap_err();
    assert_eq!(
        err,
        GrammarError::EmptyPattern {
            name: "nothing".into()
        }
    );
}

#[test]
fn rejects_token_as_lhs() {
    let err = Grammar::builder()
        .literal("a", "a")
        .rule("a", &["a"])
        .build()
        .unwrap_err();
    assert_eq!(err, GrammarError::TokenAsRule { name: "a".into() });
}

#[test]
fn rejects_undefined_symbol() {
    let err = Grammar::builder()
        .literal("a", "a")
        .rule("S", &["a", "B"])
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        GrammarError::UndefinedSymbol {
            symbol: "B".into(),
            lhs: "S".into()
        }
    );
}

#[test]
fn rejects_unknown_start() {
    let err = Grammar::builder()
        .literal("a", "a")
        .rule("S", &["a"])
        .start("a")
        .build()
        .unwrap_err();
    assert_eq!(err, GrammarError::UnknownStart { name: "a".into() });
}
