//! Sandboxed expression evaluation for story debugging.
//!
//! Expressions are parsed into an [`Expr`] tree and evaluated against an
//! explicit [`Context`]; there is no access to engine internals beyond the
//! values placed in that context.
//!
//! ```
//! use tale_eval::{context, evaluate, Value};
//!
//! let ctx = context([("visits", 3.0)]);
//! assert_eq!(evaluate("visits * 2", &ctx), Ok(Value::Number(6.0)));
//! ```

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;
mod value;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use error::EvalError;
pub use eval::{eval_expr, BUILTINS};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use parser::parse;
pub use value::{context, format_number, Context, Value, FUNCTION_MARKER};

/// Parses and evaluates `source` in one step.
pub fn evaluate(source: &str, context: &Context) -> Result<Value, EvalError> {
    let expr = parse(source)?;
    eval_expr(&expr, context)
}
