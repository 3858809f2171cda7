//! Unit tests embedded in modules.
//!
//! When the loader runs in test-collection mode, bare top-level
//! expressions become the module's unit tests. Each test is evaluated
//! under its own namespace and must normalize to a string literal
//! beginning with `[Success]` or `[Failed]`; any other normal form is a
//! malformed test and aborts the run.

use std::fmt;

use crate::ast::{Literal, Term};
use crate::errors::{RedexError, Result};
use crate::eval::Evaluator;

pub const SUCCESS_PREFIX: &str = "[Success]";
pub const FAILED_PREFIX: &str = "[Failed]";

#[derive(Debug, Clone)]
pub struct TestCase {
    pub expression: Term,
    /// The string the test normalized to, prefix included.
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct NamespaceReport {
    pub namespace: String,
    pub passes: Vec<TestCase>,
    pub failures: Vec<TestCase>,
}

/// Per-namespace outcomes, namespaces without tests omitted.
#[derive(Debug, Clone, Default)]
pub struct TestReport {
    pub namespaces: Vec<NamespaceReport>,
}

impl TestReport {
    pub fn total_passed(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.passes.len()).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.failures.len()).sum()
    }

    pub fn all_passed(&self) -> bool {
        self.total_failed() == 0
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ns in &self.namespaces {
            writeln!(
                f,
                "{}: {} passed, {} failed",
                ns.namespace,
                ns.passes.len(),
                ns.failures.len()
            )?;
            for failure in &ns.failures {
                writeln!(f, "  {} => {}", failure.expression, failure.message)?;
            }
        }
        write!(
            f,
            "total: {} passed, {} failed",
            self.total_passed(),
            self.total_failed()
        )
    }
}

/// Runs every loaded namespace's unit tests under that namespace's own
/// context. Evaluation errors inside a test abort the whole run.
pub fn test_namespaces(evaluator: &Evaluator) -> Result<TestReport> {
    let mut reports = Vec::new();
    for (name, namespace) in evaluator.engine().namespaces() {
        if namespace.unit_tests.is_empty() {
            continue;
        }
        let mut report = NamespaceReport {
            namespace: name.clone(),
            passes: Vec::new(),
            failures: Vec::new(),
        };
        for test in &namespace.unit_tests {
            let result = evaluator.evaluate(test, name)?;
            let message = match &result {
                Term::Literal(Literal::Str(s)) => s.clone(),
                _ => {
                    return Err(malformed(name, test, &result));
                }
            };
            let case = TestCase {
                expression: test.clone(),
                message: message.clone(),
            };
            if message.starts_with(SUCCESS_PREFIX) {
                report.passes.push(case);
            } else if message.starts_with(FAILED_PREFIX) {
                report.failures.push(case);
            } else {
                return Err(malformed(name, test, &result));
            }
        }
        reports.push(report);
    }
    // im::HashMap iteration order is arbitrary; keep output stable.
    reports.sort_by(|a, b| a.namespace.cmp(&b.namespace));
    Ok(TestReport { namespaces: reports })
}

fn malformed(namespace: &str, expression: &Term, result: &Term) -> RedexError {
    RedexError::MalformedUnitTest {
        namespace: namespace.to_string(),
        expression: expression.to_string(),
        result: result.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TopLevelItem;
    use crate::engine::RewriteEngine;
    use crate::modules::{Namespace, NamespaceMap, MAIN, PRELUDE, PRELUDE_SRC};
    use crate::syntax::parse_source;

    /// Builds an evaluator whose "Checks" namespace carries the bare
    /// expressions of `source` as unit tests.
    fn evaluator_with_tests(source: &str) -> Evaluator {
        let mut rules = Vec::new();
        let mut tests = Vec::new();
        for item in parse_source(source).unwrap() {
            match item {
                TopLevelItem::Rule(rule) => rules.push(rule),
                TopLevelItem::Expr(expr) => tests.push(expr),
                TopLevelItem::Import(_) => {}
            }
        }
        let mut checks = Namespace::new("Checks", rules, vec![]);
        checks.unit_tests = tests;

        let prelude_rules = parse_source(PRELUDE_SRC)
            .unwrap()
            .into_iter()
            .filter_map(|item| match item {
                TopLevelItem::Rule(rule) => Some(rule),
                _ => None,
            })
            .collect();
        let mut map = NamespaceMap::new();
        map.insert(
            PRELUDE.to_string(),
            Namespace::new(PRELUDE, prelude_rules, vec![]),
        );
        map.insert(MAIN.to_string(), Namespace::new(MAIN, vec![], vec![]));
        map.insert("Checks".to_string(), checks);
        Evaluator::new(RewriteEngine::new(map))
    }

    #[test]
    fn passing_and_failing_tests_are_bucketed() {
        let ev = evaluator_with_tests(
            "def check(x, x) = \"[Success] equal\"\n\
             def check(_, _) = \"[Failed] not equal\"\n\
             check(add(1, 1), 2)\n\
             check(add(1, 1), 3)",
        );
        let report = test_namespaces(&ev).unwrap();
        assert_eq!(report.namespaces.len(), 1);
        assert_eq!(report.namespaces[0].namespace, "Checks");
        assert_eq!(report.total_passed(), 1);
        assert_eq!(report.total_failed(), 1);
        assert!(!report.all_passed());
        assert_eq!(
            report.namespaces[0].failures[0].message,
            "[Failed] not equal"
        );
    }

    #[test]
    fn namespaces_without_tests_are_omitted() {
        let ev = evaluator_with_tests("def check(x, x) = \"[Success] ok\"");
        let report = test_namespaces(&ev).unwrap();
        assert!(report.namespaces.is_empty());
        assert!(report.all_passed());
    }

    #[test]
    fn non_string_test_result_is_malformed() {
        let ev = evaluator_with_tests("add(1, 2)");
        let err = test_namespaces(&ev).unwrap_err();
        assert!(matches!(err, RedexError::MalformedUnitTest { namespace, .. }
            if namespace == "Checks"));
    }

    #[test]
    fn unprefixed_string_result_is_malformed() {
        let ev = evaluator_with_tests("\"just a string\"");
        let err = test_namespaces(&ev).unwrap_err();
        assert!(matches!(err, RedexError::MalformedUnitTest { result, .. }
            if result.contains("just a string")));
    }
}
