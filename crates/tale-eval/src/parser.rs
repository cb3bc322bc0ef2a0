//! Pratt parser for debugger expressions.

use smol_str::SmolStr;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::EvalError;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::value::Value;

const PREFIX_BP: u8 = 13;

/// Deepest tree the parser builds. Evaluation recurses once per level.
const MAX_DEPTH: u32 = 200;

/// Parses a complete expression.
pub fn parse(source: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(source);
    if tokens.is_empty() {
        return Err(EvalError::syntax("empty expression"));
    }
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr_bp(0)?;
    if let Some(token) = parser.peek() {
        return Err(parser.unexpected(token, " after expression"));
    }
    Ok(expr)
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    depth: u32,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn next_token(&mut self) -> Result<Token, EvalError> {
        self.bump()
            .ok_or_else(|| EvalError::syntax("unexpected end of expression"))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, EvalError> {
        let token = self.next_token()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.unexpected(token, &format!(" (expected {})", kind.describe())))
        }
    }

    /// Enters one more level of nesting.
    fn descend(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::syntax("expression nested too deeply"));
        }
        Ok(())
    }

    fn unexpected(&self, token: Token, context: &str) -> EvalError {
        let offset = u32::from(token.range.start());
        let what = match token.kind {
            TokenKind::Ident | TokenKind::Number | TokenKind::String | TokenKind::Error => {
                format!("{} '{}'", token.kind.describe(), token.text(self.source))
            }
            kind => kind.describe().to_string(),
        };
        EvalError::syntax(format!("unexpected {what} at offset {offset}{context}"))
    }

    fn expr_bp(&mut self, min_bp: u8) -> Result<Expr, EvalError> {
        let entry = self.depth;
        self.descend()?;
        let mut lhs = self.prefix()?;
        while let Some(token) = self.peek() {
            let Some((op, left_bp, right_bp)) = infix_binding(token.kind) else {
                break;
            };
            if left_bp < min_bp {
                break;
            }
            self.bump();
            // Left-associative chains deepen `lhs` without recursing.
            self.descend()?;
            let rhs = self.expr_bp(right_bp)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth = entry;
        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, EvalError> {
        let token = self
            .peek()
            .ok_or_else(|| EvalError::syntax("unexpected end of expression"))?;
        let op = match token.kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::KwNot | TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Hash => Some(UnaryOp::Len),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.expr_bp(PREFIX_BP)?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        let primary = self.primary()?;
        self.postfix(primary)
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        let token = self.next_token()?;
        let text = token.text(self.source);
        match token.kind {
            TokenKind::Number => text
                .parse::<f64>()
                .map(|value| Expr::Literal(Value::Number(value)))
                .map_err(|_| EvalError::syntax(format!("malformed number '{text}'"))),
            TokenKind::String => Ok(Expr::Literal(Value::String(unescape(text)))),
            TokenKind::KwTrue => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::KwFalse => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::KwNil => Ok(Expr::Literal(Value::Nil)),
            TokenKind::Ident => Ok(Expr::Name(SmolStr::new(text))),
            TokenKind::LParen => {
                let inner = self.expr_bp(0)?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(self.unexpected(token, "")),
        }
    }

    fn postfix(&mut self, mut base: Expr) -> Result<Expr, EvalError> {
        let entry = self.depth;
        while let Some(token) = self.peek() {
            if matches!(
                token.kind,
                TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen
            ) {
                self.descend()?;
            }
            match token.kind {
                TokenKind::Dot => {
                    self.bump();
                    let name = self.expect(TokenKind::Ident)?;
                    base = Expr::Field {
                        base: Box::new(base),
                        name: SmolStr::new(name.text(self.source)),
                    };
                }
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.expr_bp(0)?;
                    self.expect(TokenKind::RBracket)?;
                    base = Expr::Index {
                        base: Box::new(base),
                        index: Box::new(index),
                    };
                }
                TokenKind::LParen => {
                    let Expr::Name(name) = base else {
                        return Err(EvalError::syntax("only named functions can be called"));
                    };
                    self.bump();
                    let args = self.call_args()?;
                    base = Expr::Call { name, args };
                }
                _ => break,
            }
        }
        self.depth = entry;
        Ok(base)
    }

    fn call_args(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        if self.peek().map(|token| token.kind) == Some(TokenKind::RParen) {
            self.bump();
            return Ok(args);
        }
        loop {
            args.push(self.expr_bp(0)?);
            let token = self.next_token()?;
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::RParen => return Ok(args),
                _ => return Err(self.unexpected(token, " in argument list")),
            }
        }
    }
}

fn infix_binding(kind: TokenKind) -> Option<(BinaryOp, u8, u8)> {
    let binding = match kind {
        TokenKind::KwOr | TokenKind::PipePipe => (BinaryOp::Or, 1, 2),
        TokenKind::KwAnd | TokenKind::AmpAmp => (BinaryOp::And, 3, 4),
        TokenKind::EqEq => (BinaryOp::Eq, 5, 6),
        TokenKind::NotEq => (BinaryOp::NotEq, 5, 6),
        TokenKind::Lt => (BinaryOp::Lt, 5, 6),
        TokenKind::LtEq => (BinaryOp::LtEq, 5, 6),
        TokenKind::Gt => (BinaryOp::Gt, 5, 6),
        TokenKind::GtEq => (BinaryOp::GtEq, 5, 6),
        TokenKind::DotDot => (BinaryOp::Concat, 8, 7),
        TokenKind::Plus => (BinaryOp::Add, 9, 10),
        TokenKind::Minus => (BinaryOp::Sub, 9, 10),
        TokenKind::Star => (BinaryOp::Mul, 11, 12),
        TokenKind::Slash => (BinaryOp::Div, 11, 12),
        TokenKind::Percent => (BinaryOp::Mod, 11, 12),
        TokenKind::Caret => (BinaryOp::Pow, 16, 15),
        _ => return None,
    };
    Some(binding)
}

fn unescape(quoted: &str) -> SmolStr {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    SmolStr::from(out)
}
