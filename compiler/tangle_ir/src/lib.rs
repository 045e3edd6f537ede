//! Tangle IR - shared data model
//!
//! This crate holds the types every pipeline stage agrees on:
//! - Spans and the owned source buffer
//! - Zero-copy [`View`]s over that buffer
//! - Interned [`Name`]s for grammar symbols
//! - Source [`Token`]s handed from the lexer to the parser
//! - The [`ContextStack`] and scope-aware [`SymbolTable`]
//! - Grammar rule tables ([`Grammar`], [`GrammarBuilder`])
//! - The packed [`SemanticGraph`] the parser produces
//!
//! # Design Philosophy
//!
//! - **Borrow, don't copy**: token text is a `View` into the input buffer
//! - **Intern symbols**: token types and rule names are `Name(u32)`
//! - **Flatten graphs**: nodes live in an arena and refer to each other by
//!   `NodeId(u32)`

mod context;
pub mod grammar;
pub mod graph;
mod name;
mod source_buffer;
mod span;
mod symbol_table;
mod token;
mod view;

pub use context::{ContextMatch, ContextStack};
pub use grammar::{
    ActionKind, Associativity, Grammar, GrammarBuilder, GrammarError, Precondition,
    PreconditionInput, Production, ProductionSpec, SemanticAction, TokenPattern, TokenRule,
    TokenSpec,
};
pub use graph::{
    ActionError, GraphBuilder, GraphCommand, GraphNode, NodeId, NodeKind, PropertyValue,
    SemanticGraph,
};
pub use name::{Name, NameInterner};
pub use source_buffer::{EncodingIssue, EncodingIssueKind, SourceBuffer};
pub use span::Span;
pub use symbol_table::{
    parent_scope, Declaration, Reference, SymbolError, SymbolTable, GLOBAL_SCOPE,
};
pub use token::{Token, TokenFlags};
pub use view::{View, ViewError};
