//! One candidate token stream.

use std::cmp::Ordering;
use std::hash::Hasher;
use std::sync::Arc;

use rustc_hash::FxHasher;
use tangle_ir::{ContextStack, Name, Token, TokenFlags, View, ViewError};

use crate::rules::CompiledRule;

/// Paths with equal keys will produce the same future; one is enough.
pub(crate) type MergeKey = (usize, ContextStack, u64);

/// A path through the input: its own position, context stack and tokens.
#[derive(Clone, Debug)]
pub(crate) struct LexPath<'src> {
    pub id: u32,
    pub pos: usize,
    pub contexts: ContextStack,
    pub tokens: Vec<Token<'src>>,
    /// Rule priority of each entry in `tokens`.
    pub priorities: Vec<i32>,
    /// Sum of `priorities`.
    pub score: i64,
    /// Running hash of the emitted token types.
    pub signature: u64,
    /// A skipped rule matched since the last emitted token.
    pub trivia_pending: bool,
}

impl<'src> LexPath<'src> {
    pub fn root() -> Self {
        LexPath {
            id: 0,
            pos: 0,
            contexts: ContextStack::new(),
            tokens: Vec::new(),
            priorities: Vec::new(),
            score: 0,
            signature: 0,
            trivia_pending: false,
        }
    }

    pub fn fork(&self, id: u32) -> Self {
        LexPath { id, ..self.clone() }
    }

    pub fn merge_key(&self) -> MergeKey {
        (self.pos, self.contexts.clone(), self.signature)
    }

    /// Consume `len` bytes with `rule`.
    pub fn advance(
        &mut self,
        rule: &CompiledRule,
        len: usize,
        view: View<'src>,
    ) -> Result<(), ViewError> {
        let text = view.slice(self.pos, len)?;
        let mut flags = TokenFlags::empty();
        if rule.pop_context && self.contexts.pop().is_some() {
            flags |= TokenFlags::POPPED_CONTEXT;
        }
        if let Some(context) = &rule.push_context {
            self.contexts.push(Arc::clone(context));
            flags |= TokenFlags::PUSHED_CONTEXT;
        }
        self.pos += len;

        if rule.skip {
            self.trivia_pending = true;
            return Ok(());
        }
        if std::mem::take(&mut self.trivia_pending) {
            flags |= TokenFlags::TRIVIA_BEFORE;
        }
        self.tokens.push(Token::new(rule.name, text).with_flags(flags));
        self.priorities.push(rule.priority);
        self.score += i64::from(rule.priority);
        self.signature = extend_signature(self.signature, rule.name);
        Ok(())
    }

    /// Should `self` replace `other` as the representative of a merge key?
    pub fn outranks(&self, other: &Self) -> bool {
        self.score > other.score || (self.score == other.score && self.id < other.id)
    }

    /// Order completed streams best first.
    ///
    /// At the first token where two streams differ, the longer token wins,
    /// then the higher priority. A stream that ends there wins over one that
    /// continues. Remaining ties go to score, then age.
    pub fn cmp_preference(&self, other: &Self) -> Ordering {
        let mine = self.tokens.iter().zip(&self.priorities);
        let theirs = other.tokens.iter().zip(&other.priorities);
        for ((a, pa), (b, pb)) in mine.zip(theirs) {
            let order = b.text.len().cmp(&a.text.len()).then(pb.cmp(pa));
            if order != Ordering::Equal {
                return order;
            }
        }
        self.tokens
            .len()
            .cmp(&other.tokens.len())
            .then(other.score.cmp(&self.score))
            .then(self.id.cmp(&other.id))
    }
}

fn extend_signature(signature: u64, kind: Name) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u64(signature);
    hasher.write_usize(kind.index());
    hasher.finish()
}
