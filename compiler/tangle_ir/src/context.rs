//! Named-scope context stack.
//!
//! Pushed contexts gate which token rules and productions are in scope.
//! The lexer clones a stack per path; the parser shares one per parse call.

use std::sync::Arc;

/// How a rule's declared context is matched against the active stack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContextMatch {
    /// The context may appear anywhere in the stack (ancestor match).
    #[default]
    Anywhere,
    /// The context must be the top of the stack.
    TopOnly,
}

/// Ordered push/pop stack of named scopes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextStack {
    frames: Vec<Arc<str>>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<Arc<str>>) {
        self.frames.push(name.into());
    }

    /// Pop the innermost context. Returns `None` on an empty stack.
    pub fn pop(&mut self) -> Option<Arc<str>> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn top(&self) -> Option<&str> {
        self.frames.last().map(|s| &**s)
    }

    /// Full path from outermost to innermost, dot-joined.
    ///
    /// An empty stack yields an empty string.
    pub fn path(&self) -> String {
        let mut out = String::new();
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(frame);
        }
        out
    }

    /// Does `name` appear anywhere in the stack?
    pub fn contains(&self, name: &str) -> bool {
        self.frames.iter().any(|f| &**f == name)
    }

    /// Is a rule declaring `required` applicable under `mode`?
    ///
    /// Rules without a declared context are always applicable.
    pub fn is_active(&self, required: Option<&str>, mode: ContextMatch) -> bool {
        match required {
            None => true,
            Some(name) => match mode {
                ContextMatch::Anywhere => self.contains(name),
                ContextMatch::TopOnly => self.top() == Some(name),
            },
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|s| &**s)
    }
}

#[cfg(test)]
mod tests;
