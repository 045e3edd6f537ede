//! Engine construction errors.

use tangle_enfa::BuildError;
use tangle_ir::GrammarError;

/// Failure to set up an [`Engine`](crate::Engine).
///
/// Only construction can fail; problems with an input are reported in
/// [`EngineOutput`](crate::EngineOutput).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid grammar: {0}")]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Pattern(#[from] BuildError),
}
