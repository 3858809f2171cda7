//! The batch pipeline: source text in, per-expression outcomes out.
//!
//! A program file is parsed into rules, imports, and bare expressions.
//! Rules and imports become the `Main` namespace, the loader resolves
//! the transitive import graph, the validator rejects duplicate rules,
//! and then every bare expression is evaluated independently under
//! `Main`. Load-time and validation errors abort the whole run; an
//! evaluation error in one expression does not block the others.

use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::{Term, TopLevelItem};
use crate::engine::RewriteEngine;
use crate::errors::{RedexError, Result};
use crate::eval::{Evaluator, TraceEntry};
use crate::modules::{ModuleLoader, MAIN};
use crate::syntax::parse_source;
use crate::tester::{test_namespaces, TestReport};
use crate::validate::check_namespaces;

/// Outcome of one top-level expression of the program.
#[derive(Debug)]
pub struct Evaluation {
    pub expression: Term,
    pub outcome: Result<Term>,
    /// Present when the run was traced and evaluation succeeded.
    pub trace: Option<Vec<TraceEntry>>,
}

/// Everything a batch run produces.
#[derive(Debug)]
pub struct RunReport {
    pub evaluations: Vec<Evaluation>,
    /// Present only when the run collected and executed module tests.
    pub tests: Option<TestReport>,
}

#[derive(Debug, Clone)]
pub struct Interpreter {
    modules_dir: PathBuf,
    trace: bool,
    run_tests: bool,
}

impl Interpreter {
    pub fn new(modules_dir: impl Into<PathBuf>) -> Interpreter {
        Interpreter {
            modules_dir: modules_dir.into(),
            trace: false,
            run_tests: false,
        }
    }

    /// Records a step-by-step trace for every evaluated expression.
    pub fn with_trace(mut self, trace: bool) -> Interpreter {
        self.trace = trace;
        self
    }

    /// Collects bare expressions in imported modules as unit tests and
    /// runs them before evaluating the program.
    pub fn with_tests(mut self, run_tests: bool) -> Interpreter {
        self.run_tests = run_tests;
        self
    }

    pub fn run_file(&self, path: &Path) -> Result<RunReport> {
        let source = fs::read_to_string(path)?;
        self.run_source(&source)
    }

    pub fn run_source(&self, source: &str) -> Result<RunReport> {
        let mut rules = Vec::new();
        let mut imports = Vec::new();
        let mut expressions = Vec::new();
        for item in parse_source(source)? {
            match item {
                TopLevelItem::Rule(rule) => rules.push(rule),
                TopLevelItem::Import(import) => imports.push(import),
                TopLevelItem::Expr(expr) => expressions.push(expr),
            }
        }

        let loader = ModuleLoader::new(&self.modules_dir, self.run_tests);
        let namespaces = loader.load_all(rules, imports)?;
        check_namespaces(&namespaces)?;

        let evaluator = Evaluator::new(RewriteEngine::new(namespaces));
        let tests = if self.run_tests {
            Some(test_namespaces(&evaluator)?)
        } else {
            None
        };

        let evaluations = expressions
            .into_iter()
            .map(|expression| self.evaluate_one(&evaluator, expression))
            .collect();
        Ok(RunReport { evaluations, tests })
    }

    fn evaluate_one(&self, evaluator: &Evaluator, expression: Term) -> Evaluation {
        if self.trace {
            match evaluator.evaluate_with_trace(&expression, MAIN) {
                Ok((result, trace)) => Evaluation {
                    expression,
                    outcome: Ok(result),
                    trace: Some(trace),
                },
                Err(err) => Evaluation {
                    expression,
                    outcome: Err(err),
                    trace: None,
                },
            }
        } else {
            let outcome = evaluator.evaluate(&expression, MAIN);
            Evaluation {
                expression,
                outcome,
                trace: None,
            }
        }
    }
}

impl RunReport {
    pub fn first_error(&self) -> Option<&RedexError> {
        self.evaluations
            .iter()
            .find_map(|eval| eval.outcome.as_ref().err())
    }
}
