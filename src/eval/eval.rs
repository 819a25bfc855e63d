//! Expression evaluation
//!
//! This module evaluates an expression tree against a row environment (a
//! mapping from column name to value). Logical operators short-circuit:
//! `false and X` never evaluates `X`, so an ill-typed right operand does not
//! produce an error.

use std::collections::HashMap;

use super::expr::{Expr, Operator};
use super::value::Value;
use crate::error::{Error, Result};

/// A row environment: column name to value
pub type Env = HashMap<String, Value>;

/// Evaluate an expression against an environment
pub fn evaluate(expr: &Expr, env: &Env) -> Result<Value> {
    match expr {
        Expr::Identifier(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownIdentifier(name.clone())),
        Expr::Constant(value) => Ok(value.clone()),
        Expr::Operator { op, left, right } => match op {
            Operator::And => evaluate_and(left, right, env),
            Operator::Or => evaluate_or(left, right, env),
            Operator::Equal => {
                let (l, r) = evaluate_both(left, right, env)?;
                Ok(Value::Bool(l == r))
            }
            Operator::NotEqual => {
                let (l, r) = evaluate_both(left, right, env)?;
                Ok(Value::Bool(l != r))
            }
            Operator::Greater => evaluate_comparison(left, right, env, |l, r| l > r),
            Operator::GreaterEqual => evaluate_comparison(left, right, env, |l, r| l >= r),
            Operator::Less => evaluate_comparison(left, right, env, |l, r| l < r),
            Operator::LessEqual => evaluate_comparison(left, right, env, |l, r| l <= r),
        },
    }
}

fn evaluate_and(left: &Expr, right: &Expr, env: &Env) -> Result<Value> {
    let l = evaluate(left, env)?
        .as_bool()
        .ok_or(Error::LogicalOperandNotBoolean)?;

    if !l {
        return Ok(Value::Bool(false));
    }

    let r = evaluate(right, env)?
        .as_bool()
        .ok_or(Error::LogicalOperandNotBoolean)?;

    Ok(Value::Bool(l && r))
}

fn evaluate_or(left: &Expr, right: &Expr, env: &Env) -> Result<Value> {
    let l = evaluate(left, env)?
        .as_bool()
        .ok_or(Error::LogicalOperandNotBoolean)?;

    if l {
        return Ok(Value::Bool(true));
    }

    let r = evaluate(right, env)?
        .as_bool()
        .ok_or(Error::LogicalOperandNotBoolean)?;

    Ok(Value::Bool(l || r))
}

fn evaluate_both(left: &Expr, right: &Expr, env: &Env) -> Result<(Value, Value)> {
    Ok((evaluate(left, env)?, evaluate(right, env)?))
}

fn evaluate_comparison(
    left: &Expr,
    right: &Expr,
    env: &Env,
    cmp: fn(f64, f64) -> bool,
) -> Result<Value> {
    let (l, r) = evaluate_both(left, right, env)?;

    let l = l.as_number().ok_or(Error::ComparisonOperandNotNumber)?;
    let r = r.as_number().ok_or(Error::ComparisonOperandNotNumber)?;

    Ok(Value::Bool(cmp(l, r)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, Value)]) -> Env {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn ident(name: &str) -> Expr {
        Expr::Identifier(name.to_string())
    }

    #[test]
    fn test_operand_lookup() {
        let env = env(&[("a", Value::Number(5.0))]);
        assert_eq!(evaluate(&ident("a"), &env).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn test_unknown_identifier() {
        let result = evaluate(&ident("missing"), &Env::new());
        assert!(matches!(result, Err(Error::UnknownIdentifier(name)) if name == "missing"));
    }

    #[test]
    fn test_equality_is_reflexive() {
        let env = env(&[
            ("b", Value::Bool(true)),
            ("n", Value::Number(42.0)),
            ("s", Value::from("hello")),
        ]);
        for name in ["b", "n", "s"] {
            let expr = Expr::operator(Operator::Equal, ident(name), ident(name));
            assert_eq!(evaluate(&expr, &env).unwrap(), Value::Bool(true));
        }
    }

    #[test]
    fn test_equality_does_not_coerce() {
        let expr = Expr::operator(
            Operator::Equal,
            Expr::Constant(Value::Number(1.0)),
            Expr::Constant(Value::from("1")),
        );
        assert_eq!(evaluate(&expr, &Env::new()).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_and_short_circuit() {
        // Right operand is ill-typed and must never be touched.
        let expr = Expr::operator(
            Operator::And,
            Expr::Constant(Value::Bool(false)),
            Expr::Constant(Value::from("not a bool")),
        );
        assert_eq!(evaluate(&expr, &Env::new()).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_or_short_circuit() {
        // Right operand references a missing column and must never be touched.
        let expr = Expr::operator(Operator::Or, Expr::Constant(Value::Bool(true)), ident("nope"));
        assert_eq!(evaluate(&expr, &Env::new()).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_logical_requires_booleans() {
        let expr = Expr::operator(
            Operator::And,
            Expr::Constant(Value::Number(1.0)),
            Expr::Constant(Value::Bool(true)),
        );
        assert!(matches!(
            evaluate(&expr, &Env::new()),
            Err(Error::LogicalOperandNotBoolean)
        ));

        // True left side forces evaluation of an ill-typed right side.
        let expr = Expr::operator(
            Operator::And,
            Expr::Constant(Value::Bool(true)),
            Expr::Constant(Value::from("oops")),
        );
        assert!(matches!(
            evaluate(&expr, &Env::new()),
            Err(Error::LogicalOperandNotBoolean)
        ));
    }

    #[test]
    fn test_comparisons() {
        let env = env(&[("x", Value::Number(10.0))]);

        let cases = [
            (Operator::Greater, 5.0, true),
            (Operator::Greater, 10.0, false),
            (Operator::GreaterEqual, 10.0, true),
            (Operator::Less, 20.0, true),
            (Operator::LessEqual, 9.0, false),
        ];

        for (op, rhs, expected) in cases {
            let expr = Expr::operator(op, ident("x"), Expr::Constant(Value::Number(rhs)));
            assert_eq!(evaluate(&expr, &env).unwrap(), Value::Bool(expected));
        }
    }

    #[test]
    fn test_comparison_requires_numbers() {
        let expr = Expr::operator(
            Operator::Greater,
            Expr::Constant(Value::from("a")),
            Expr::Constant(Value::from("b")),
        );
        assert!(matches!(
            evaluate(&expr, &Env::new()),
            Err(Error::ComparisonOperandNotNumber)
        ));
    }

    #[test]
    fn test_nested_expression() {
        // a or (b and (c == d))
        let env = env(&[
            ("a", Value::Bool(false)),
            ("b", Value::Bool(true)),
            ("c", Value::Number(3.0)),
            ("d", Value::Number(3.0)),
        ]);
        let expr = Expr::operator(
            Operator::Or,
            ident("a"),
            Expr::operator(
                Operator::And,
                ident("b"),
                Expr::operator(Operator::Equal, ident("c"), ident("d")),
            ),
        );
        assert_eq!(evaluate(&expr, &env).unwrap(), Value::Bool(true));
    }
}
