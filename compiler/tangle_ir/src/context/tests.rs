use super::*;

#[test]
fn push_pop_depth_top() {
    let mut stack = ContextStack::new();
    assert!(stack.is_empty());
    assert_eq!(stack.top(), None);
    assert_eq!(stack.pop(), None);

    stack.push("module");
    stack.push("function");
    assert_eq!(stack.depth(), 2);
    assert_eq!(stack.top(), Some("function"));

    assert_eq!(stack.pop().as_deref(), Some("function"));
    assert_eq!(stack.top(), Some("module"));
    assert_eq!(stack.depth(), 1);
}

#[test]
fn path_is_dot_joined_outermost_first() {
    let mut stack = ContextStack::new();
    assert_eq!(stack.path(), "");
    stack.push("a");
    stack.push("b");
    stack.push("c");
    assert_eq!(stack.path(), "a.b.c");
    assert_eq!(stack.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

#[test]
fn contains_checks_every_frame() {
    let mut stack = ContextStack::new();
    stack.push("template");
    stack.push("expr");
    assert!(stack.contains("template"));
    assert!(stack.contains("expr"));
    assert!(!stack.contains("string"));
}

#[test]
fn ancestor_match_versus_top_only() {
    let mut stack = ContextStack::new();
    stack.push("template");
    stack.push("expr");

    assert!(stack.is_active(None, ContextMatch::TopOnly));
    assert!(stack.is_active(Some("template"), ContextMatch::Anywhere));
    assert!(!stack.is_active(Some("template"), ContextMatch::TopOnly));
    assert!(stack.is_active(Some("expr"), ContextMatch::TopOnly));
    assert!(!stack.is_active(Some("string"), ContextMatch::Anywhere));
}
