//! Command-recording handle passed to semantic actions.
//!
//! Actions never touch the graph directly. They queue [`GraphCommand`]s,
//! and the parser applies the queue only when the action returns `Ok`, so a
//! failing action leaves no partial edits behind.

use std::sync::Arc;

use super::{GraphNode, NodeId, PropertyValue, SemanticGraph};
use crate::Span;

/// Failure reported by a semantic action. Logged and otherwise ignored.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("semantic action failed: {message}")]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        ActionError {
            message: message.into(),
        }
    }
}

/// A deferred edit queued by a semantic action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphCommand {
    /// Set a property on the node being reduced.
    SetProperty { key: Arc<str>, value: PropertyValue },
    /// Append an already-committed node as an extra child.
    AddChild(NodeId),
    /// Declare a symbol spanning the reduced node. `scope: None` means the
    /// current context path.
    Declare {
        name: Arc<str>,
        kind: Arc<str>,
        scope: Option<Arc<str>>,
    },
    /// Record a reference to `name` at the reduced node's span.
    Reference { name: Arc<str> },
    PushContext(Arc<str>),
    PopContext,
}

/// Handle given to a semantic action for one reduction.
pub struct GraphBuilder<'g> {
    graph: &'g SemanticGraph,
    target: NodeId,
    span: Span,
    commands: Vec<GraphCommand>,
}

impl<'g> GraphBuilder<'g> {
    /// Builder for edits to `target`, the node just reduced.
    pub fn new(graph: &'g SemanticGraph, target: NodeId, span: Span) -> Self {
        GraphBuilder {
            graph,
            target,
            span,
            commands: Vec::new(),
        }
    }

    /// Id of the node being reduced.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Span of the node being reduced.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Read a committed node.
    pub fn node(&self, id: NodeId) -> Option<&'g GraphNode> {
        self.graph.get(id)
    }

    pub fn set_property(&mut self, key: &str, value: impl Into<PropertyValue>) {
        self.commands.push(GraphCommand::SetProperty {
            key: Arc::from(key),
            value: value.into(),
        });
    }

    /// Attach a committed node as an extra child.
    ///
    /// Children are always older than their parent, which keeps the graph
    /// acyclic. Fails for ids that are not in the graph and for the target
    /// itself or anything created after it.
    pub fn add_child(&mut self, child: NodeId) -> Result<(), ActionError> {
        if !self.graph.contains(child) {
            return Err(ActionError::new(format!("unknown node {child:?}")));
        }
        if child.index() >= self.target.index() {
            return Err(ActionError::new(format!(
                "node {child:?} is not older than {:?}",
                self.target
            )));
        }
        self.commands.push(GraphCommand::AddChild(child));
        Ok(())
    }

    /// Declare `name` in the current context scope.
    pub fn declare(&mut self, name: &str, kind: &str) {
        self.commands.push(GraphCommand::Declare {
            name: Arc::from(name),
            kind: Arc::from(kind),
            scope: None,
        });
    }

    /// Declare `name` in an explicit scope.
    pub fn declare_in(&mut self, scope: &str, name: &str, kind: &str) {
        self.commands.push(GraphCommand::Declare {
            name: Arc::from(name),
            kind: Arc::from(kind),
            scope: Some(Arc::from(scope)),
        });
    }

    pub fn reference(&mut self, name: &str) {
        self.commands.push(GraphCommand::Reference {
            name: Arc::from(name),
        });
    }

    pub fn push_context(&mut self, name: &str) {
        self.commands.push(GraphCommand::PushContext(Arc::from(name)));
    }

    pub fn pop_context(&mut self) {
        self.commands.push(GraphCommand::PopContext);
    }

    /// Queued commands, in the order the action issued them.
    pub fn into_commands(self) -> Vec<GraphCommand> {
        self.commands
    }
}
