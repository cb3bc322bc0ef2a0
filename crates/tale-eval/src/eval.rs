//! Evaluator for parsed expressions.
//!
//! The only bindings visible to an expression are the entries of the supplied
//! [`Context`] plus the builtin table below. Unknown names read as `nil`.

use smol_str::SmolStr;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::EvalError;
use crate::value::{format_number, Context, Value};

/// Names callable from debugger expressions.
pub const BUILTINS: &[&str] = &[
    "abs", "ceil", "floor", "len", "lower", "max", "min", "round", "tonumber", "tostring", "type",
    "upper",
];

/// Evaluates a parsed expression against `context`.
pub fn eval_expr(expr: &Expr, context: &Context) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Name(name) => Ok(context.get(name).cloned().unwrap_or(Value::Nil)),
        Expr::Unary { op, operand } => {
            let value = eval_expr(operand, context)?;
            eval_unary(*op, value)
        }
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, context),
        Expr::Field { base, name } => {
            let target = eval_expr(base, context)?;
            index_value(&target, &Value::String(name.clone()), base)
        }
        Expr::Index { base, index } => {
            let target = eval_expr(base, context)?;
            let key = eval_expr(index, context)?;
            index_value(&target, &key, base)
        }
        Expr::Call { name, args } => {
            let args = args
                .iter()
                .map(|arg| eval_expr(arg, context))
                .collect::<Result<Vec<_>, _>>()?;
            call_builtin(name, &args)
        }
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => match value {
            Value::Number(number) => Ok(Value::Number(-number)),
            other => Err(EvalError::runtime(format!(
                "attempt to perform arithmetic on a {} value",
                other.type_name()
            ))),
        },
        UnaryOp::Len => length_of(&value).map(|len| Value::Number(len as f64)),
    }
}

fn eval_binary(op: BinaryOp, lhs: &Expr, rhs: &Expr, context: &Context) -> Result<Value, EvalError> {
    let left = eval_expr(lhs, context)?;
    match op {
        BinaryOp::And => {
            if !left.is_truthy() {
                return Ok(left);
            }
            return eval_expr(rhs, context);
        }
        BinaryOp::Or => {
            if left.is_truthy() {
                return Ok(left);
            }
            return eval_expr(rhs, context);
        }
        _ => {}
    }
    let right = eval_expr(rhs, context)?;
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => compare(op, &left, &right),
        BinaryOp::Concat => concat(&left, &right),
        BinaryOp::Add => {
            if let (Value::String(a), Value::String(b)) = (&left, &right) {
                return Ok(Value::String(SmolStr::from(format!("{a}{b}"))));
            }
            arithmetic(op, &left, &right)
        }
        _ => arithmetic(op, &left, &right),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        let offender = if left.as_number().is_none() { left } else { right };
        return Err(EvalError::runtime(format!(
            "attempt to perform arithmetic on a {} value",
            offender.type_name()
        )));
    };
    let (a, b) = (*a, *b);
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::runtime("division by zero"));
            }
            a / b
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::runtime("modulo by zero"));
            }
            a - (a / b).floor() * b
        }
        BinaryOp::Pow => a.powf(b),
        _ => unreachable!("non-arithmetic operator {}", op.symbol()),
    };
    Ok(Value::Number(result))
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => {
            return Err(EvalError::runtime(format!(
                "attempt to compare {} with {}",
                left.type_name(),
                right.type_name()
            )))
        }
    };
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    let result = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::LtEq => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::GtEq => ordering.is_ge(),
        _ => unreachable!("non-comparison operator {}", op.symbol()),
    };
    Ok(Value::Bool(result))
}

fn concat(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let piece = |value: &Value| -> Result<String, EvalError> {
        match value {
            Value::String(text) => Ok(text.to_string()),
            Value::Number(number) => Ok(format_number(*number)),
            other => Err(EvalError::runtime(format!(
                "attempt to concatenate a {} value",
                other.type_name()
            ))),
        }
    };
    Ok(Value::String(SmolStr::from(piece(left)? + &piece(right)?)))
}

fn index_value(target: &Value, key: &Value, base: &Expr) -> Result<Value, EvalError> {
    match target {
        Value::Map(fields) => Ok(match key {
            Value::String(name) => fields.get(name).cloned().unwrap_or(Value::Nil),
            _ => Value::Nil,
        }),
        Value::Array(items) => Ok(match key {
            Value::Number(index) if index.fract() == 0.0 && *index >= 1.0 => items
                .get(*index as usize - 1)
                .cloned()
                .unwrap_or(Value::Nil),
            _ => Value::Nil,
        }),
        other => {
            let what = base
                .describe()
                .map(|described| format!(" ({described})"))
                .unwrap_or_default();
            Err(EvalError::runtime(format!(
                "attempt to index a {} value{what}",
                other.type_name()
            )))
        }
    }
}

fn length_of(value: &Value) -> Result<usize, EvalError> {
    match value {
        Value::String(text) => Ok(text.chars().count()),
        Value::Array(items) => Ok(items.len()),
        Value::Map(fields) => Ok(fields.len()),
        other => Err(EvalError::runtime(format!(
            "attempt to get length of a {} value",
            other.type_name()
        ))),
    }
}

fn call_builtin(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match name {
        "len" => {
            let [value] = expect_args::<1>(name, args)?;
            length_of(value).map(|len| Value::Number(len as f64))
        }
        "abs" => number_fn(name, args, f64::abs),
        "floor" => number_fn(name, args, f64::floor),
        "ceil" => number_fn(name, args, f64::ceil),
        "round" => number_fn(name, args, f64::round),
        "min" | "max" => {
            if args.is_empty() {
                return Err(EvalError::runtime(format!(
                    "bad argument to '{name}' (number expected, got no value)"
                )));
            }
            let mut best: Option<f64> = None;
            for arg in args {
                let number = number_arg(name, arg)?;
                best = Some(match best {
                    None => number,
                    Some(current) if name == "min" => current.min(number),
                    Some(current) => current.max(number),
                });
            }
            Ok(best.map(Value::Number).unwrap_or(Value::Nil))
        }
        "tostring" => {
            let [value] = expect_args::<1>(name, args)?;
            Ok(Value::String(SmolStr::from(value.to_string())))
        }
        "tonumber" => {
            let [value] = expect_args::<1>(name, args)?;
            Ok(match value {
                Value::Number(number) => Value::Number(*number),
                Value::String(text) => text
                    .trim()
                    .parse::<f64>()
                    .map(Value::Number)
                    .unwrap_or(Value::Nil),
                _ => Value::Nil,
            })
        }
        "type" => {
            let [value] = expect_args::<1>(name, args)?;
            Ok(Value::from(value.type_name()))
        }
        "upper" | "lower" => {
            let [value] = expect_args::<1>(name, args)?;
            let Value::String(text) = value else {
                return Err(EvalError::runtime(format!(
                    "bad argument to '{name}' (string expected, got {})",
                    value.type_name()
                )));
            };
            let converted = if name == "upper" {
                text.to_uppercase()
            } else {
                text.to_lowercase()
            };
            Ok(Value::String(SmolStr::from(converted)))
        }
        _ => Err(EvalError::runtime(format!(
            "function '{name}' is not available in the debugger"
        ))),
    }
}

fn expect_args<'a, const N: usize>(
    name: &str,
    args: &'a [Value],
) -> Result<&'a [Value; N], EvalError> {
    <&[Value; N]>::try_from(args).map_err(|_| {
        EvalError::runtime(format!(
            "'{name}' expects {N} argument(s), got {}",
            args.len()
        ))
    })
}

fn number_arg(name: &str, value: &Value) -> Result<f64, EvalError> {
    value.as_number().ok_or_else(|| {
        EvalError::runtime(format!(
            "bad argument to '{name}' (number expected, got {})",
            value.type_name()
        ))
    })
}

fn number_fn(name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, EvalError> {
    let [value] = expect_args::<1>(name, args)?;
    number_arg(name, value).map(|number| Value::Number(f(number)))
}
