//! Native operation registry: the built-in primitives consulted as a
//! rule of last resort, after user rules and the Prelude.
//!
//! Natives are stateless and dispatch eagerly by function name plus
//! argument shape. A shape mismatch *declines* (`Ok(None)`) rather than
//! erroring, so rule resolution can report the usual "no matching rule"
//! for the whole call. The one hard failure is `charAt` with an index
//! outside the string, which raises `NativeArgumentError`.
//!
//! Binary numeric operations promote to Float if either operand is Float.
//! Integer division never truncates: an inexact `div` promotes its result
//! to Float silently. `mod` stays integer.

use std::collections::HashMap;

use crate::ast::{Literal, Term};
use crate::errors::{RedexError, Result};

/// A native primitive. `Ok(None)` means "this shape is not mine" and
/// lets resolution continue.
pub type NativeFn = fn(&[Term]) -> Result<Option<Term>>;

/// Fixed catalog of built-in operations, keyed by function name.
pub struct NativeRegistry {
    natives: HashMap<String, NativeFn>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            natives: HashMap::new(),
        };
        register_string_natives(&mut registry);
        register_char_natives(&mut registry);
        register_numeric_natives(&mut registry);
        registry
    }

    fn register(&mut self, name: &str, func: NativeFn) {
        self.natives.insert(name.to_string(), func);
    }

    /// Evaluates `function(args)` if a native of that name accepts the
    /// argument shapes.
    pub fn eval(&self, function: &str, args: &[Term]) -> Result<Option<Term>> {
        match self.natives.get(function) {
            Some(native) => native(args),
            None => Ok(None),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.natives.contains_key(name)
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.natives.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for NativeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn register_string_natives(registry: &mut NativeRegistry) {
    registry.register("concat", native_concat);
    registry.register("length", native_length);
    registry.register("charAt", native_char_at);
    registry.register("explode", native_explode);
}

fn register_char_natives(registry: &mut NativeRegistry) {
    registry.register("toInt", native_to_int);
}

fn register_numeric_natives(registry: &mut NativeRegistry) {
    registry.register("add", native_add);
    registry.register("sub", native_sub);
    registry.register("mul", native_mul);
    registry.register("div", native_div);
    registry.register("mod", native_mod);
    registry.register("eq", native_eq);
    registry.register("nq", native_nq);
    registry.register("lt", native_lt);
    registry.register("le", native_le);
    registry.register("gt", native_gt);
    registry.register("ge", native_ge);
}

// ----- string and char operations -----------------------------------------

/// `concat` joins the raw text of any two literals into a String.
fn native_concat(args: &[Term]) -> Result<Option<Term>> {
    let [Term::Literal(a), Term::Literal(b)] = args else {
        return Ok(None);
    };
    Ok(Some(Term::str(format!(
        "{}{}",
        a.as_raw_string(),
        b.as_raw_string()
    ))))
}

fn native_length(args: &[Term]) -> Result<Option<Term>> {
    let [Term::Literal(Literal::Str(s))] = args else {
        return Ok(None);
    };
    Ok(Some(Term::int(s.chars().count() as i64)))
}

fn native_char_at(args: &[Term]) -> Result<Option<Term>> {
    let [Term::Literal(Literal::Str(s)), Term::Literal(Literal::Int(idx))] = args else {
        return Ok(None);
    };
    let length = s.chars().count();
    if *idx < 0 || *idx as usize >= length {
        return Err(RedexError::NativeArgumentError {
            function: "charAt".into(),
            message: format!("index {idx} out of bounds (length {length})"),
        });
    }
    match s.chars().nth(*idx as usize) {
        Some(c) => Ok(Some(Term::char(c))),
        None => Ok(None),
    }
}

/// `explode` converts a host string into the language's own list
/// representation: a right fold of `Cons(char, rest)` ending in `Nil()`.
fn native_explode(args: &[Term]) -> Result<Option<Term>> {
    let [Term::Literal(Literal::Str(s))] = args else {
        return Ok(None);
    };
    let mut list = Term::call("Nil", vec![]);
    for c in s.chars().rev() {
        list = Term::call("Cons", vec![Term::char(c), list]);
    }
    Ok(Some(list))
}

fn native_to_int(args: &[Term]) -> Result<Option<Term>> {
    let [Term::Literal(Literal::Char(c))] = args else {
        return Ok(None);
    };
    Ok(Some(Term::int(*c as i64)))
}

// ----- equality over arbitrary literals ------------------------------------

/// Generic value equality: fires for any two literals, so `eq(1, 1.0)`
/// is `false` (kind-sensitive), never promoted.
fn native_eq(args: &[Term]) -> Result<Option<Term>> {
    let [Term::Literal(a), Term::Literal(b)] = args else {
        return Ok(None);
    };
    Ok(Some(Term::bool(a == b)))
}

fn native_nq(args: &[Term]) -> Result<Option<Term>> {
    let [Term::Literal(a), Term::Literal(b)] = args else {
        return Ok(None);
    };
    Ok(Some(Term::bool(a != b)))
}

// ----- binary numeric operations -------------------------------------------

enum NumericArgs {
    Ints(i64, i64),
    Floats(f64, f64),
}

/// Extracts two numeric operands, promoting both to Float if either is.
fn numeric_args(args: &[Term]) -> Option<NumericArgs> {
    let [Term::Literal(a), Term::Literal(b)] = args else {
        return None;
    };
    match (a, b) {
        (Literal::Int(x), Literal::Int(y)) => Some(NumericArgs::Ints(*x, *y)),
        (Literal::Int(x), Literal::Float(y)) => Some(NumericArgs::Floats(*x as f64, *y)),
        (Literal::Float(x), Literal::Int(y)) => Some(NumericArgs::Floats(*x, *y as f64)),
        (Literal::Float(x), Literal::Float(y)) => Some(NumericArgs::Floats(*x, *y)),
        _ => None,
    }
}

fn native_add(args: &[Term]) -> Result<Option<Term>> {
    Ok(numeric_args(args).map(|ops| match ops {
        NumericArgs::Ints(a, b) => Term::int(a.wrapping_add(b)),
        NumericArgs::Floats(a, b) => Term::float(a + b),
    }))
}

fn native_sub(args: &[Term]) -> Result<Option<Term>> {
    Ok(numeric_args(args).map(|ops| match ops {
        NumericArgs::Ints(a, b) => Term::int(a.wrapping_sub(b)),
        NumericArgs::Floats(a, b) => Term::float(a - b),
    }))
}

fn native_mul(args: &[Term]) -> Result<Option<Term>> {
    Ok(numeric_args(args).map(|ops| match ops {
        NumericArgs::Ints(a, b) => Term::int(a.wrapping_mul(b)),
        NumericArgs::Floats(a, b) => Term::float(a * b),
    }))
}

/// Division never truncates: an inexact integer division promotes to
/// Float.
fn native_div(args: &[Term]) -> Result<Option<Term>> {
    match numeric_args(args) {
        Some(NumericArgs::Ints(a, b)) => {
            if b == 0 {
                return Err(division_by_zero("div"));
            }
            if a % b != 0 {
                Ok(Some(Term::float(a as f64 / b as f64)))
            } else {
                Ok(Some(Term::int(a / b)))
            }
        }
        Some(NumericArgs::Floats(a, b)) => Ok(Some(Term::float(a / b))),
        None => Ok(None),
    }
}

fn native_mod(args: &[Term]) -> Result<Option<Term>> {
    match numeric_args(args) {
        Some(NumericArgs::Ints(a, b)) => {
            if b == 0 {
                return Err(division_by_zero("mod"));
            }
            Ok(Some(Term::int(a % b)))
        }
        Some(NumericArgs::Floats(a, b)) => Ok(Some(Term::float(a % b))),
        None => Ok(None),
    }
}

fn native_lt(args: &[Term]) -> Result<Option<Term>> {
    Ok(numeric_args(args).map(|ops| match ops {
        NumericArgs::Ints(a, b) => Term::bool(a < b),
        NumericArgs::Floats(a, b) => Term::bool(a < b),
    }))
}

fn native_le(args: &[Term]) -> Result<Option<Term>> {
    Ok(numeric_args(args).map(|ops| match ops {
        NumericArgs::Ints(a, b) => Term::bool(a <= b),
        NumericArgs::Floats(a, b) => Term::bool(a <= b),
    }))
}

fn native_gt(args: &[Term]) -> Result<Option<Term>> {
    Ok(numeric_args(args).map(|ops| match ops {
        NumericArgs::Ints(a, b) => Term::bool(a > b),
        NumericArgs::Floats(a, b) => Term::bool(a > b),
    }))
}

fn native_ge(args: &[Term]) -> Result<Option<Term>> {
    Ok(numeric_args(args).map(|ops| match ops {
        NumericArgs::Ints(a, b) => Term::bool(a >= b),
        NumericArgs::Floats(a, b) => Term::bool(a >= b),
    }))
}

fn division_by_zero(function: &str) -> RedexError {
    RedexError::NativeArgumentError {
        function: function.into(),
        message: "division by zero".into(),
    }
}
