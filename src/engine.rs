//! The rewrite engine: one rewrite step with provenance.
//!
//! Given a call and the namespace it is being evaluated in, the engine
//! finds the first applicable rule, in this order:
//!
//! 1. the qualified namespace's rules (only if the qualifier is among
//!    the context namespace's declared imports), or the context
//!    namespace's own rules for an unqualified call;
//! 2. the Prelude's rules (always visible, no import needed);
//! 3. the native operation registry.
//!
//! First success wins; rules are scanned in definition order. A native
//! hit synthesizes a pseudo-rule whose pattern mirrors the call's own
//! argument shapes, so traces display user rules and primitives
//! uniformly.

use crate::ast::{Pattern, PatternArg, Rule, Term};
use crate::errors::Result;
use crate::matcher::match_call;
use crate::modules::{NamespaceMap, PRELUDE};
use crate::natives::NativeRegistry;
use crate::subst::substitute;

/// One rewrite step: the resulting term plus which rule fired, and in
/// which namespace it lives.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteResult {
    pub result: Term,
    pub rule: Rule,
    /// Defining namespace of the firing rule; `"native"` for primitives.
    pub namespace: String,
}

pub struct RewriteEngine {
    namespaces: NamespaceMap,
    natives: NativeRegistry,
}

impl RewriteEngine {
    pub fn new(namespaces: NamespaceMap) -> RewriteEngine {
        RewriteEngine {
            namespaces,
            natives: NativeRegistry::new(),
        }
    }

    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    /// Attempts a single rewrite of `term` in `context`. `Ok(None)`
    /// means no rule and no native applies; the caller decides whether
    /// that is a normal form or an error.
    pub fn rewrite_with_rule(
        &self,
        term: &Term,
        context: &str,
    ) -> Result<Option<RewriteResult>> {
        let Term::Call {
            namespace,
            function,
            args,
        } = term
        else {
            return Ok(None);
        };

        // 1. Qualified namespace (if imported by the context), or the
        //    context's own rules.
        let scan_target = match namespace {
            Some(qualifier) => {
                let imported = self
                    .namespaces
                    .get(context)
                    .is_some_and(|ns| ns.imports_module(qualifier));
                if imported {
                    Some(qualifier.as_str())
                } else {
                    None
                }
            }
            None => Some(context),
        };
        if let Some(target) = scan_target {
            if let Some(hit) = self.scan_rules(target, function, args)? {
                return Ok(Some(hit));
            }
        }

        // 2. Prelude is visible regardless of imports.
        if scan_target != Some(PRELUDE) {
            if let Some(hit) = self.scan_rules(PRELUDE, function, args)? {
                return Ok(Some(hit));
            }
        }

        // 3. Rule of last resort: native primitives.
        if let Some(result) = self.natives.eval(function, args)? {
            let rule = make_native_rule(function, args, &result);
            return Ok(Some(RewriteResult {
                result,
                rule,
                namespace: "native".to_string(),
            }));
        }

        Ok(None)
    }

    /// Convenience single step without provenance; the input is its own
    /// result when nothing applies.
    pub fn rewrite(&self, term: &Term, context: &str) -> Result<Term> {
        Ok(self
            .rewrite_with_rule(term, context)?
            .map(|hit| hit.result)
            .unwrap_or_else(|| term.clone()))
    }

    fn scan_rules(
        &self,
        namespace: &str,
        function: &str,
        args: &[Term],
    ) -> Result<Option<RewriteResult>> {
        let Some(ns) = self.namespaces.get(namespace) else {
            return Ok(None);
        };
        for rule in &ns.rules {
            if let Some(bindings) = match_call(function, args, &rule.pattern) {
                return Ok(Some(RewriteResult {
                    result: substitute(&rule.replacement, &bindings),
                    rule: rule.clone(),
                    namespace: namespace.to_string(),
                }));
            }
        }
        Ok(None)
    }
}

/// Synthesizes the pseudo-rule a native hit is reported as, mirroring
/// the call's own argument shapes.
fn make_native_rule(function: &str, args: &[Term], result: &Term) -> Rule {
    let pattern_args = args
        .iter()
        .map(|arg| match arg {
            Term::Literal(lit) => PatternArg::Literal(lit.clone()),
            Term::Var(name) => PatternArg::Var(name.clone()),
            other => PatternArg::Nested(other.clone()),
        })
        .collect();
    Rule {
        pattern: Pattern::new(format!("[native rule] {function}"), pattern_args),
        replacement: result.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Import, Literal};
    use crate::modules::{Namespace, MAIN};
    use crate::syntax::parse_source;
    use crate::ast::TopLevelItem;

    fn rules(source: &str) -> Vec<Rule> {
        parse_source(source)
            .unwrap()
            .into_iter()
            .map(|item| match item {
                TopLevelItem::Rule(rule) => rule,
                other => panic!("expected rule, got {other:?}"),
            })
            .collect()
    }

    fn engine_with(namespaces: Vec<Namespace>) -> RewriteEngine {
        let mut map = NamespaceMap::new();
        for ns in namespaces {
            map.insert(ns.name.clone(), ns);
        }
        RewriteEngine::new(map)
    }

    #[test]
    fn context_rules_win_over_prelude_and_natives() {
        let engine = engine_with(vec![
            Namespace::new(PRELUDE, rules("def add(x, y) = 99"), vec![]),
            Namespace::new(MAIN, rules("def add(x, y) = 42"), vec![]),
        ]);
        let call = Term::call("add", vec![Term::int(1), Term::int(2)]);
        let hit = engine.rewrite_with_rule(&call, MAIN).unwrap().unwrap();
        assert_eq!(hit.result, Term::int(42));
        assert_eq!(hit.namespace, MAIN);
    }

    #[test]
    fn prelude_rules_win_over_natives() {
        let engine = engine_with(vec![
            Namespace::new(PRELUDE, rules("def add(x, y) = 99"), vec![]),
            Namespace::new(MAIN, vec![], vec![]),
        ]);
        let call = Term::call("add", vec![Term::int(1), Term::int(2)]);
        let hit = engine.rewrite_with_rule(&call, MAIN).unwrap().unwrap();
        assert_eq!(hit.result, Term::int(99));
        assert_eq!(hit.namespace, PRELUDE);
    }

    #[test]
    fn natives_fire_when_no_rule_matches() {
        let engine = engine_with(vec![
            Namespace::new(PRELUDE, vec![], vec![]),
            Namespace::new(MAIN, vec![], vec![]),
        ]);
        let call = Term::call("add", vec![Term::int(1), Term::int(2)]);
        let hit = engine.rewrite_with_rule(&call, MAIN).unwrap().unwrap();
        assert_eq!(hit.result, Term::int(3));
        assert_eq!(hit.namespace, "native");
        assert_eq!(hit.rule.pattern.name, "[native rule] add");
        assert_eq!(
            hit.rule.pattern.args,
            vec![
                PatternArg::Literal(Literal::Int(1)),
                PatternArg::Literal(Literal::Int(2)),
            ]
        );
    }

    #[test]
    fn no_rule_and_no_native_yields_none() {
        let engine = engine_with(vec![
            Namespace::new(PRELUDE, vec![], vec![]),
            Namespace::new(MAIN, vec![], vec![]),
        ]);
        let call = Term::call("undefinedFn", vec![Term::int(1)]);
        assert!(engine.rewrite_with_rule(&call, MAIN).unwrap().is_none());
    }

    #[test]
    fn rules_are_scanned_in_definition_order() {
        let engine = engine_with(vec![
            Namespace::new(PRELUDE, vec![], vec![]),
            Namespace::new(MAIN, rules("def f(0) = 10\ndef f(n) = 20"), vec![]),
        ]);
        let zero = Term::call("f", vec![Term::int(0)]);
        let one = Term::call("f", vec![Term::int(1)]);
        assert_eq!(engine.rewrite(&zero, MAIN).unwrap(), Term::int(10));
        assert_eq!(engine.rewrite(&one, MAIN).unwrap(), Term::int(20));
    }

    #[test]
    fn qualified_call_requires_the_import() {
        let lists = Namespace::new("Lists", rules("def len(Nil()) = 0"), vec![]);
        let importing = Namespace::new(
            MAIN,
            vec![],
            vec![Import { module: "Lists".into() }],
        );
        let engine = engine_with(vec![
            Namespace::new(PRELUDE, vec![], vec![]),
            lists.clone(),
            importing,
        ]);

        let call = Term::Call {
            namespace: Some("Lists".into()),
            function: "len".into(),
            args: vec![Term::call("Nil", vec![])],
        };
        let hit = engine.rewrite_with_rule(&call, MAIN).unwrap().unwrap();
        assert_eq!(hit.result, Term::int(0));
        assert_eq!(hit.namespace, "Lists");

        // Same call from a context that does not import Lists: step 1
        // contributes nothing, and neither Prelude nor natives know
        // `len`, so the call is irreducible.
        let engine = engine_with(vec![
            Namespace::new(PRELUDE, vec![], vec![]),
            lists,
            Namespace::new(MAIN, vec![], vec![]),
        ]);
        assert!(engine.rewrite_with_rule(&call, MAIN).unwrap().is_none());
    }

    #[test]
    fn non_call_terms_never_rewrite() {
        let engine = engine_with(vec![
            Namespace::new(PRELUDE, vec![], vec![]),
            Namespace::new(MAIN, vec![], vec![]),
        ]);
        assert!(engine
            .rewrite_with_rule(&Term::var("x"), MAIN)
            .unwrap()
            .is_none());
        assert!(engine
            .rewrite_with_rule(&Term::int(3), MAIN)
            .unwrap()
            .is_none());
    }
}
