//! AST for the redex language.
//!
//! The parser produces three families of nodes: top-level items
//! ([`TopLevelItem`]), expression terms ([`Term`]) and rule patterns
//! ([`Pattern`]). The rewriting core only ever consumes `Call`, `Var` and
//! `Literal` terms; infix [`Term::Binary`] nodes exist purely as parser
//! output and are desugared to named calls before any rewriting happens
//! (see `eval::desugar`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A literal value. Kind is part of equality: `Int(1)` and `Float(1.0)`
/// are different literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Char(char),
}

impl Literal {
    /// The literal's text without any quoting, used by `concat`.
    pub fn as_raw_string(&self) -> String {
        match self {
            Literal::Int(v) => v.to_string(),
            Literal::Float(v) => format!("{v:?}"),
            Literal::Bool(v) => v.to_string(),
            Literal::Str(v) => v.clone(),
            Literal::Char(v) => v.to_string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v:?}"),
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Str(v) => write!(f, "\"{v}\""),
            Literal::Char(v) => write!(f, "'{v}'"),
        }
    }
}

/// Infix operators recognised by the parser. Each one desugars to the
/// named call returned by [`BinOp::function_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Nq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// The function name the operator desugars to.
    pub fn function_name(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::Mod => "mod",
            BinOp::Eq => "eq",
            BinOp::Nq => "nq",
            BinOp::Lt => "lt",
            BinOp::Le => "le",
            BinOp::Gt => "gt",
            BinOp::Ge => "ge",
        }
    }
}

/// An expression term. Immutable and structurally comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    /// A variable reference. Unbound variables are fixed points of
    /// evaluation.
    Var(String),
    Literal(Literal),
    /// A function call, optionally qualified with the namespace the rule
    /// should be looked up in.
    Call {
        namespace: Option<String>,
        function: String,
        args: Vec<Term>,
    },
    /// Parser-level infix node; never reaches the rewrite engine.
    Binary {
        left: Box<Term>,
        op: BinOp,
        right: Box<Term>,
    },
}

impl Term {
    /// Unqualified call constructor; the common case in rule bodies and
    /// tests.
    pub fn call(function: impl Into<String>, args: Vec<Term>) -> Term {
        Term::Call {
            namespace: None,
            function: function.into(),
            args,
        }
    }

    pub fn int(v: i64) -> Term {
        Term::Literal(Literal::Int(v))
    }

    pub fn float(v: f64) -> Term {
        Term::Literal(Literal::Float(v))
    }

    pub fn bool(v: bool) -> Term {
        Term::Literal(Literal::Bool(v))
    }

    pub fn str(v: impl Into<String>) -> Term {
        Term::Literal(Literal::Str(v.into()))
    }

    pub fn char(v: char) -> Term {
        Term::Literal(Literal::Char(v))
    }

    pub fn var(name: impl Into<String>) -> Term {
        Term::Var(name.into())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => write!(f, "{name}"),
            Term::Literal(lit) => write!(f, "{lit}"),
            Term::Call {
                namespace,
                function,
                args,
            } => {
                if let Some(ns) = namespace {
                    write!(f, "{ns}.")?;
                }
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Term::Binary { left, op, right } => {
                write!(f, "{}({left}, {right})", op.function_name())
            }
        }
    }
}

/// One argument position of a rule pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatternArg {
    /// Binds the argument on first occurrence; repeated occurrences
    /// require structural equality with the prior binding.
    Var(String),
    /// Exact value-and-kind match.
    Literal(Literal),
    /// Recursive destructuring of a call argument.
    Nested(Term),
    /// Accepts this and every following position without inspection.
    Wildcard,
}

impl fmt::Display for PatternArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternArg::Var(name) => write!(f, "{name}"),
            PatternArg::Literal(lit) => write!(f, "{lit}"),
            PatternArg::Nested(term) => write!(f, "{term}"),
            PatternArg::Wildcard => write!(f, "_"),
        }
    }
}

/// The left-hand shape a call must match for a rule to fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    pub args: Vec<PatternArg>,
}

impl Pattern {
    pub fn new(name: impl Into<String>, args: Vec<PatternArg>) -> Pattern {
        Pattern {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// A pattern→replacement rewrite definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub pattern: Pattern,
    pub replacement: Term,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.pattern, self.replacement)
    }
}

/// A module import edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub module: String,
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "import {}", self.module)
    }
}

/// Anything that may appear at the top level of a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopLevelItem {
    Rule(Rule),
    Import(Import),
    Expr(Term),
}
