//! Logpoint message templates.

use tale_eval::{eval_expr, parse, Context, EvalError, Expr};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LogFragment {
    Text(String),
    /// Placeholder compiled when the breakpoint was set. A parse failure is
    /// kept so it can be rendered in place.
    Expr(Result<Expr, EvalError>),
}

/// Splits a template such as `"gold={gold} {{raw}}"` into fragments.
///
/// `{{` and `}}` are literal braces. An unterminated `{` and a stray `}` are
/// kept as text.
pub(crate) fn parse_log_message(template: &str) -> Vec<LogFragment> {
    let mut fragments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(ch) = rest.chars().next() {
        rest = &rest[ch.len_utf8()..];
        match ch {
            '{' if rest.starts_with('{') => {
                rest = &rest[1..];
                literal.push('{');
            }
            '{' => {
                let Some(end) = rest.find('}') else {
                    literal.push('{');
                    literal.push_str(rest);
                    rest = "";
                    continue;
                };
                if !literal.is_empty() {
                    fragments.push(LogFragment::Text(std::mem::take(&mut literal)));
                }
                fragments.push(LogFragment::Expr(parse(rest[..end].trim())));
                rest = &rest[end + 1..];
            }
            '}' if rest.starts_with('}') => {
                rest = &rest[1..];
                literal.push('}');
            }
            _ => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        fragments.push(LogFragment::Text(literal));
    }
    fragments
}

/// Renders fragments against `context`; failures become `<error: ...>`.
pub(crate) fn format_log_message(fragments: &[LogFragment], context: &Context) -> String {
    let mut output = String::new();
    for fragment in fragments {
        match fragment {
            LogFragment::Text(text) => output.push_str(text),
            LogFragment::Expr(compiled) => {
                let result = match compiled {
                    Ok(expr) => eval_expr(expr, context),
                    Err(err) => Err(err.clone()),
                };
                match result {
                    Ok(value) => output.push_str(&value.to_string()),
                    Err(err) => output.push_str(&format!("<error: {err}>")),
                }
            }
        }
    }
    output
}
