//! One candidate derivation.
//!
//! Path stacks are persistent: every entry is an immutable [`Frame`] that
//! points at the frame below it, so shifting or reducing pushes one frame
//! and never copies the stack. Paths that branch from the same prefix share
//! its frames.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use smallvec::SmallVec;
use tangle_ir::{Name, NodeId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum PathState {
    Valid,
    /// Covered the whole input with a single goal node.
    Complete,
}

/// Paths with equal keys differ only in score; the better one survives.
///
/// Stacks are compared by depth and prefix signature.
pub(crate) type MergeKey = (usize, PathState, usize, u64);

/// Index of a [`Frame`] in [`Frames`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FrameId(u32);

/// One stack entry.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Frame {
    pub node: NodeId,
    pub symbol: Name,
    pub below: Option<FrameId>,
    pub depth: usize,
    /// Hash of every symbol from the bottom of the stack up to this one.
    pub signature: u64,
}

const EMPTY_SIGNATURE: u64 = 0;

/// Append-only store of stack frames for one parse.
#[derive(Debug, Default)]
pub(crate) struct Frames {
    frames: Vec<Frame>,
}

impl Frames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, below: Option<FrameId>, node: NodeId, symbol: Name) -> FrameId {
        let id = FrameId(self.frames.len() as u32);
        self.frames.push(Frame {
            node,
            symbol,
            below,
            depth: self.depth(below) + 1,
            signature: extend(self.signature(below), symbol),
        });
        id
    }

    pub fn get(&self, id: FrameId) -> &Frame {
        &self.frames[id.0 as usize]
    }

    pub fn depth(&self, top: Option<FrameId>) -> usize {
        top.map_or(0, |id| self.get(id).depth)
    }

    pub fn signature(&self, top: Option<FrameId>) -> u64 {
        top.map_or(EMPTY_SIGNATURE, |id| self.get(id).signature)
    }

    pub fn symbol(&self, top: Option<FrameId>) -> Option<Name> {
        top.map(|id| self.get(id).symbol)
    }

    /// The stack left after removing `n` entries from `top`.
    pub fn pop(&self, top: Option<FrameId>, n: usize) -> Option<FrameId> {
        let mut current = top;
        for _ in 0..n {
            current = current.and_then(|id| self.get(id).below);
        }
        current
    }

    /// Do the top entries of the stack spell `symbols`?
    pub fn ends_with(&self, top: Option<FrameId>, symbols: &[Name]) -> bool {
        if self.depth(top) < symbols.len() {
            return false;
        }
        let mut current = top;
        for &symbol in symbols.iter().rev() {
            let Some(id) = current else {
                return false;
            };
            let frame = self.get(id);
            if frame.symbol != symbol {
                return false;
            }
            current = frame.below;
        }
        true
    }

    /// Nodes of the top `n` entries, bottom first.
    pub fn top_nodes(&self, top: Option<FrameId>, n: usize) -> SmallVec<[NodeId; 4]> {
        let mut nodes: SmallVec<[NodeId; 4]> = SmallVec::with_capacity(n);
        let mut current = top;
        while nodes.len() < n {
            let Some(id) = current else {
                break;
            };
            let frame = self.get(id);
            nodes.push(frame.node);
            current = frame.below;
        }
        nodes.reverse();
        nodes
    }

    /// Every node on the stack, bottom first.
    pub fn nodes(&self, top: Option<FrameId>) -> Vec<NodeId> {
        self.top_nodes(top, self.depth(top)).into_vec()
    }

    /// Every symbol on the stack, bottom first.
    pub fn symbols(&self, top: Option<FrameId>) -> Vec<Name> {
        let mut symbols = Vec::with_capacity(self.depth(top));
        let mut current = top;
        while let Some(id) = current {
            let frame = self.get(id);
            symbols.push(frame.symbol);
            current = frame.below;
        }
        symbols.reverse();
        symbols
    }
}

/// Signature of a stack after pushing `symbol` onto one with `signature`.
fn extend(signature: u64, symbol: Name) -> u64 {
    let mut hasher = FxHasher::default();
    signature.hash(&mut hasher);
    symbol.hash(&mut hasher);
    hasher.finish()
}

/// A parser path: the top of a frame stack plus its score.
#[derive(Clone, Debug)]
pub(crate) struct ParsePath {
    pub id: u32,
    pub state: PathState,
    pub top: Option<FrameId>,
    pub score: f64,
    /// Stack signatures reached since the last shift.
    pub history: SmallVec<[u64; 4]>,
}

impl ParsePath {
    pub fn root() -> Self {
        ParsePath {
            id: 0,
            state: PathState::Valid,
            top: None,
            score: 1.0,
            history: SmallVec::new(),
        }
    }

    pub fn merge_key(&self, frames: &Frames, cursor: usize) -> MergeKey {
        (
            cursor,
            self.state,
            frames.depth(self.top),
            frames.signature(self.top),
        )
    }

    /// Should `self` replace `other` as the representative of a merge key?
    pub fn outranks(&self, other: &Self) -> bool {
        match self.score.total_cmp(&other.score) {
            Ordering::Greater => true,
            Ordering::Equal => self.id < other.id,
            Ordering::Less => false,
        }
    }

    pub fn is_complete(&self, frames: &Frames, goal: Option<Name>) -> bool {
        frames.depth(self.top) == 1 && goal.is_some() && frames.symbol(self.top) == goal
    }

    /// Would replacing the top `len` entries with `symbol` return the stack
    /// to a shape it already had since the last shift?
    pub fn revisits(&self, frames: &Frames, len: usize, symbol: Name) -> bool {
        let below = frames.pop(self.top, len);
        self.history
            .contains(&extend(frames.signature(below), symbol))
    }

    /// Push a shifted terminal.
    pub fn shifted(
        &self,
        frames: &mut Frames,
        id: u32,
        node: NodeId,
        symbol: Name,
        factor: f64,
    ) -> Self {
        let top = frames.push(self.top, node, symbol);
        let mut history = SmallVec::new();
        history.push(frames.get(top).signature);
        ParsePath {
            id,
            state: PathState::Valid,
            top: Some(top),
            score: self.score * factor,
            history,
        }
    }

    /// Replace the top `len` entries with `node`.
    pub fn reduced(
        &self,
        frames: &mut Frames,
        id: u32,
        len: usize,
        node: NodeId,
        symbol: Name,
        factor: f64,
    ) -> Self {
        let below = frames.pop(self.top, len);
        let top = frames.push(below, node, symbol);
        // Depth never grows between shifts, so once the stack shrinks no
        // earlier shape can come back.
        let mut history = if len > 1 {
            SmallVec::new()
        } else {
            self.history.clone()
        };
        history.push(frames.get(top).signature);
        ParsePath {
            id,
            state: PathState::Valid,
            top: Some(top),
            score: self.score * factor,
            history,
        }
    }
}
