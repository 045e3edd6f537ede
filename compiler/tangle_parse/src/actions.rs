//! Semantic action dispatch.
//!
//! An action sees the freshly reduced node and its children and queues
//! [`GraphCommand`]s on a [`GraphBuilder`]. The queue is applied only when
//! the action returns `Ok`; an `Err` is logged and leaves the path intact.

use std::sync::Arc;

use tangle_ir::{
    GraphBuilder, GraphCommand, GraphNode, Name, NodeId, Reference, SemanticAction, GLOBAL_SCOPE,
};

use crate::parser::Run;

impl Run<'_, '_, '_> {
    pub(crate) fn run_action(&mut self, action: &SemanticAction, rule: Name, node: NodeId) {
        let Some(reduced) = self.arena.get(node) else {
            return;
        };
        let span = reduced.span;
        let children: Vec<&GraphNode> = reduced
            .children
            .iter()
            .filter_map(|&c| self.arena.get(c))
            .collect();
        let mut builder = GraphBuilder::new(&self.arena, node, span);
        let result = action(reduced, &children, &mut builder);
        let commands = builder.into_commands();

        match result {
            Ok(()) => self.apply_commands(node, commands),
            Err(error) => {
                self.stats.action_failures += 1;
                tracing::warn!(
                    rule = self.grammar.name(rule),
                    %error,
                    dropped = commands.len(),
                    "semantic action failed"
                );
            }
        }
    }

    fn apply_commands(&mut self, node: NodeId, commands: Vec<GraphCommand>) {
        let span = self.arena.get(node).map(|n| n.span).unwrap_or_default();
        for command in commands {
            match command {
                GraphCommand::SetProperty { key, value } => {
                    if let Some(target) = self.arena.get_mut(node) {
                        target.properties.insert(key, value);
                    }
                }
                GraphCommand::AddChild(child) => {
                    if let Some(target) = self.arena.get_mut(node) {
                        target.children.push(child);
                    }
                }
                GraphCommand::Declare { name, kind, scope } => {
                    let scope = scope.unwrap_or_else(|| self.scope());
                    if let Err(error) =
                        self.symbols
                            .declare(&scope, &name, &kind, span, Some(node))
                    {
                        tracing::debug!(%error, "declaration skipped");
                    }
                }
                GraphCommand::Reference { name } => {
                    let reference = Reference {
                        scope: self.scope(),
                        span,
                        node: Some(node),
                    };
                    self.symbols.add_reference(&name, reference);
                }
                GraphCommand::PushContext(context) => self.contexts.push(context),
                GraphCommand::PopContext => {
                    if self.contexts.pop().is_none() {
                        tracing::debug!("semantic action popped an empty context stack");
                    }
                }
            }
        }
    }

    /// Scope for declarations and references: the current context path.
    fn scope(&self) -> Arc<str> {
        if self.contexts.is_empty() {
            Arc::from(GLOBAL_SCOPE)
        } else {
            Arc::from(self.contexts.path())
        }
    }
}
