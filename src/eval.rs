//! The evaluator: innermost (arguments-first) reduction to normal form.
//!
//! Infix operators are desugared to named calls before any rewriting, so
//! the engine only ever sees Call/Var/Literal. For a call, every argument
//! is reduced to normal form first, the call is rebuilt, and exactly one
//! rewrite step is attempted. A step whose result differs from its input
//! is recursed on; a step that returns its input unchanged (constructor
//! identity rules) is a normal form. A reduced call with no applicable
//! step at all is a `NoMatchingRule` error — not a silently returned
//! term.
//!
//! When a namespace-qualified call fires, the evaluation context switches
//! to the rule's defining namespace, so the replacement's own unqualified
//! calls resolve relative to where the rule lives.
//!
//! There is no step budget and no termination guarantee: self-referential
//! rules recurse without bound by design.

use std::fmt;

use crate::ast::{Rule, Term};
use crate::engine::{RewriteEngine, RewriteResult};
use crate::errors::{RedexError, Result};

/// One recorded rewrite step of a traced evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub step: usize,
    /// The fully reduced call the step fired on.
    pub expression: Term,
    /// Namespace the step was resolved in.
    pub context: String,
    /// The firing rule; native hits appear as their synthesized
    /// `[native rule]` pseudo-rule.
    pub rule: Rule,
    pub result: Term,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] Expression: {}\n     Context: {}\n     Rule: {}\n     Result: {}",
            self.step, self.expression, self.context, self.rule, self.result
        )
    }
}

/// Rewrites infix `Binary` nodes into their named calls, recursively.
pub fn desugar(term: &Term) -> Term {
    match term {
        Term::Binary { left, op, right } => Term::call(
            op.function_name(),
            vec![desugar(left), desugar(right)],
        ),
        Term::Call {
            namespace,
            function,
            args,
        } => Term::Call {
            namespace: namespace.clone(),
            function: function.clone(),
            args: args.iter().map(desugar).collect(),
        },
        Term::Var(_) | Term::Literal(_) => term.clone(),
    }
}

pub struct Evaluator {
    engine: RewriteEngine,
}

impl Evaluator {
    pub fn new(engine: RewriteEngine) -> Evaluator {
        Evaluator { engine }
    }

    pub fn engine(&self) -> &RewriteEngine {
        &self.engine
    }

    /// Reduces `term` to normal form under `context`.
    pub fn evaluate(&self, term: &Term, context: &str) -> Result<Term> {
        self.eval_term(&desugar(term), context, &mut None)
    }

    /// Like [`Evaluator::evaluate`], additionally recording one ordered
    /// [`TraceEntry`] per successful step.
    pub fn evaluate_with_trace(
        &self,
        term: &Term,
        context: &str,
    ) -> Result<(Term, Vec<TraceEntry>)> {
        let mut trace = Vec::new();
        let result = self.eval_term(&desugar(term), context, &mut Some(&mut trace))?;
        Ok((result, trace))
    }

    fn eval_term(
        &self,
        term: &Term,
        context: &str,
        trace: &mut Option<&mut Vec<TraceEntry>>,
    ) -> Result<Term> {
        let Term::Call {
            namespace,
            function,
            args,
        } = term
        else {
            // Var and Literal terms are fixed points; a leftover Binary
            // cannot occur after desugaring.
            return Ok(term.clone());
        };

        // Innermost strategy: arguments first, then rebuild.
        let reduced_args = args
            .iter()
            .map(|arg| self.eval_term(arg, context, trace))
            .collect::<Result<Vec<Term>>>()?;
        let reduced = Term::Call {
            namespace: namespace.clone(),
            function: function.clone(),
            args: reduced_args,
        };

        let Some(hit) = self.engine.rewrite_with_rule(&reduced, context)? else {
            return Err(RedexError::NoMatchingRule {
                call: reduced.to_string(),
            });
        };

        if let Some(sink) = trace.as_deref_mut() {
            sink.push(TraceEntry {
                step: sink.len() + 1,
                expression: reduced.clone(),
                context: context.to_string(),
                rule: hit.rule.clone(),
                result: hit.result.clone(),
            });
        }

        let next_context = next_context(&reduced, &hit, context);
        if hit.result != reduced {
            // Replacement bodies parsed from source can carry infix
            // operators; desugar before descending.
            self.eval_term(&desugar(&hit.result), next_context, trace)
        } else {
            Ok(hit.result)
        }
    }
}

/// The replacement body of a qualified hit resolves relative to the
/// rule's defining namespace; everything else keeps the current context.
fn next_context<'a>(reduced: &Term, hit: &'a RewriteResult, context: &'a str) -> &'a str {
    let qualified = matches!(reduced, Term::Call { namespace: Some(_), .. });
    if qualified && hit.namespace != "native" {
        hit.namespace.as_str()
    } else {
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Import, TopLevelItem};
    use crate::modules::{ModuleLoader, Namespace, NamespaceMap, MAIN, PRELUDE};
    use crate::syntax::{parse_expression, parse_source};

    fn rules(source: &str) -> Vec<crate::ast::Rule> {
        parse_source(source)
            .unwrap()
            .into_iter()
            .filter_map(|item| match item {
                TopLevelItem::Rule(rule) => Some(rule),
                _ => None,
            })
            .collect()
    }

    /// Evaluator over the real loaded Prelude plus the given Main rules.
    fn evaluator(main_rules: &str) -> Evaluator {
        let map = ModuleLoader::new("/nonexistent", false)
            .load_all(rules(main_rules), Vec::new())
            .unwrap();
        Evaluator::new(RewriteEngine::new(map))
    }

    fn eval(evaluator: &Evaluator, source: &str) -> Term {
        evaluator
            .evaluate(&parse_expression(source).unwrap(), MAIN)
            .unwrap()
    }

    #[test]
    fn desugar_rewrites_operators_to_calls() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            desugar(&expr),
            Term::call(
                "add",
                vec![
                    Term::int(1),
                    Term::call("mul", vec![Term::int(2), Term::int(3)]),
                ]
            )
        );
    }

    #[test]
    fn literals_and_vars_are_fixed_points() {
        let ev = evaluator("");
        assert_eq!(eval(&ev, "42"), Term::int(42));
        assert_eq!(eval(&ev, "someFreeVar"), Term::var("someFreeVar"));
    }

    #[test]
    fn nested_arithmetic_under_prelude_alone() {
        let ev = evaluator("");
        assert_eq!(eval(&ev, "add(mul(2, 3), 4)"), Term::int(10));
        assert_eq!(eval(&ev, "2 * 3 + 4"), Term::int(10));
    }

    #[test]
    fn division_promotion() {
        let ev = evaluator("");
        assert_eq!(eval(&ev, "div(10, 4)"), Term::float(2.5));
        assert_eq!(eval(&ev, "div(10, 5)"), Term::int(2));
    }

    #[test]
    fn factorial_reduces_to_normal_form() {
        let ev = evaluator("def fact(0) = 1\ndef fact(n) = mul(n, fact(sub(n, 1)))");
        assert_eq!(eval(&ev, "fact(5)"), Term::int(120));
    }

    #[test]
    fn fibonacci_through_infix_rules() {
        let ev = evaluator(
            "def fib(0) = 0\ndef fib(1) = 1\ndef fib(n) = fib(n - 1) + fib(n - 2)",
        );
        assert_eq!(eval(&ev, "fib(6)"), Term::int(8));
    }

    #[test]
    fn prelude_if_selects_branches() {
        let ev = evaluator("");
        assert_eq!(eval(&ev, "if(true, 42, 0)"), Term::int(42));
        assert_eq!(eval(&ev, "if(false, 42, 0)"), Term::int(0));
        assert_eq!(eval(&ev, "if(1 < 2, 42, 0)"), Term::int(42));
    }

    #[test]
    fn explode_reaches_constructor_normal_form() {
        let ev = evaluator("");
        let expected = Term::call(
            "Cons",
            vec![
                Term::char('h'),
                Term::call(
                    "Cons",
                    vec![Term::char('i'), Term::call("Nil", vec![])],
                ),
            ],
        );
        assert_eq!(eval(&ev, "explode(\"hi\")"), expected);
    }

    #[test]
    fn undefined_call_is_an_error_not_a_normal_form() {
        let ev = evaluator("");
        let err = ev
            .evaluate(&parse_expression("definitelyMissing(1)").unwrap(), MAIN)
            .unwrap_err();
        assert!(matches!(err, RedexError::NoMatchingRule { call }
            if call == "definitelyMissing(1)"));
    }

    #[test]
    fn qualified_call_switches_context_for_the_rule_body() {
        // Strings.greet calls helper(), which only exists in Strings: the
        // body must resolve in the rule's defining namespace.
        let strings = Namespace::new(
            "Strings",
            rules("def greet(name) = concat(helper(), name)\ndef helper() = \"hi \""),
            vec![],
        );
        let main = Namespace::new(
            MAIN,
            vec![],
            vec![Import { module: "Strings".into() }],
        );
        let mut map = NamespaceMap::new();
        map.insert(PRELUDE.to_string(), Namespace::new(PRELUDE, vec![], vec![]));
        map.insert(strings.name.clone(), strings);
        map.insert(MAIN.to_string(), main);

        let ev = Evaluator::new(RewriteEngine::new(map));
        let expr = parse_expression("Strings.greet(\"you\")").unwrap();
        assert_eq!(ev.evaluate(&expr, MAIN).unwrap(), Term::str("hi you"));
    }

    #[test]
    fn trace_records_ordered_steps_with_provenance() {
        let ev = evaluator("def double(n) = n * 2");
        let expr = parse_expression("double(3)").unwrap();
        let (result, trace) = ev.evaluate_with_trace(&expr, MAIN).unwrap();

        assert_eq!(result, Term::int(6));
        assert_eq!(trace.len(), 2);

        assert_eq!(trace[0].step, 1);
        assert_eq!(trace[0].expression, Term::call("double", vec![Term::int(3)]));
        assert_eq!(trace[0].context, MAIN);
        assert_eq!(trace[0].rule.pattern.name, "double");

        assert_eq!(trace[1].step, 2);
        assert_eq!(trace[1].rule.pattern.name, "[native rule] mul");
        assert_eq!(trace[1].context, MAIN);
        assert_eq!(trace[1].result, Term::int(6));
    }

    #[test]
    fn trace_and_plain_evaluation_agree() {
        let ev = evaluator("def fact(0) = 1\ndef fact(n) = mul(n, fact(sub(n, 1)))");
        let expr = parse_expression("fact(4)").unwrap();
        let plain = ev.evaluate(&expr, MAIN).unwrap();
        let (traced, trace) = ev.evaluate_with_trace(&expr, MAIN).unwrap();
        assert_eq!(plain, traced);
        assert!(!trace.is_empty());
        for (i, entry) in trace.iter().enumerate() {
            assert_eq!(entry.step, i + 1);
        }
    }

    #[test]
    fn non_linear_rule_matches_only_equal_arguments() {
        let ev = evaluator("def eq2(x, x) = true\ndef eq2(_, _) = false");
        assert_eq!(eval(&ev, "eq2(5, 5)"), Term::bool(true));
        assert_eq!(eval(&ev, "eq2(5, 6)"), Term::bool(false));
    }
}
