//! Evaluation errors.

use thiserror::Error;

/// Failure of a sandboxed expression.
///
/// The two variants stay distinct all the way to the client: a syntax error
/// means the text never parsed, a runtime error means it parsed but could not
/// be evaluated against the supplied context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The expression does not parse.
    #[error("Syntax error: {0}")]
    Syntax(String),
    /// The expression parsed but failed while evaluating.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl EvalError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        EvalError::Syntax(message.into())
    }

    pub(crate) fn runtime(message: impl Into<String>) -> Self {
        EvalError::Runtime(message.into())
    }

    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(self, EvalError::Syntax(_))
    }
}
