//! Lexer for debugger expressions.
//!
//! Token kinds are generated by `logos`; whitespace is produced as a trivia
//! token and dropped by [`Lexer`] so the parser only sees significant tokens.

use logos::Logos;
use text_size::{TextRange, TextSize};

/// Token kinds of the expression language.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    // Punctuation and operators
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("..")]
    DotDot,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("#")]
    Hash,
    #[token("==")]
    EqEq,
    #[token("!=")]
    #[token("~=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("!")]
    Bang,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    // Keywords
    #[token("and")]
    KwAnd,
    #[token("or")]
    KwOr,
    #[token("not")]
    KwNot,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,
    #[token("nil")]
    KwNil,

    // Literals
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#)]
    String,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// Unrecognized input.
    Error,
}

impl TokenKind {
    /// Human-readable description for syntax errors.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::DotDot => "'..'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Caret => "'^'",
            TokenKind::Hash => "'#'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::Bang => "'!'",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::PipePipe => "'||'",
            TokenKind::KwAnd => "'and'",
            TokenKind::KwOr => "'or'",
            TokenKind::KwNot => "'not'",
            TokenKind::KwTrue => "'true'",
            TokenKind::KwFalse => "'false'",
            TokenKind::KwNil => "'nil'",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Ident => "name",
            TokenKind::Error => "invalid character",
        }
    }
}

/// A significant token with its byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

impl Token {
    /// Source text covered by this token.
    #[must_use]
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.range]
    }
}

/// Iterator over significant tokens.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
}

impl<'src> Lexer<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let kind = self.inner.next()?.unwrap_or(TokenKind::Error);
            if kind == TokenKind::Whitespace {
                continue;
            }
            let span = self.inner.span();
            let range = TextRange::new(
                TextSize::from(span.start as u32),
                TextSize::from(span.end as u32),
            );
            return Some(Token { kind, range });
        }
    }
}

/// Lexes `source` into significant tokens.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(
            kinds("not visited and nilly"),
            vec![
                TokenKind::KwNot,
                TokenKind::Ident,
                TokenKind::KwAnd,
                TokenKind::Ident
            ]
        );
    }

    #[test]
    fn numbers_and_concatenation() {
        assert_eq!(
            kinds("1.5 .. 2"),
            vec![TokenKind::Number, TokenKind::DotDot, TokenKind::Number]
        );
        assert_eq!(
            kinds("a.b"),
            vec![TokenKind::Ident, TokenKind::Dot, TokenKind::Ident]
        );
    }

    #[test]
    fn both_inequality_spellings_lex_the_same() {
        assert_eq!(kinds("a ~= b"), kinds("a != b"));
    }

    #[test]
    fn unterminated_string_is_an_error_token() {
        assert!(kinds("\"open").contains(&TokenKind::Error));
    }

    #[test]
    fn token_text_uses_ranges() {
        let source = "gold >= 10";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].text(source), "gold");
        assert_eq!(tokens[2].text(source), "10");
    }
}
