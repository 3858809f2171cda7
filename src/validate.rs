//! Duplicate-rule detection over loaded namespaces.
//!
//! Two rules collide when their patterns have the same function name,
//! the same arity, and position-wise structurally equal arguments.
//! Variable names do not distinguish patterns: `f(x)` and `f(y)` bind
//! the same shape and are duplicates. Literals compare by exact value
//! and kind, nested calls recursively by name, arity, and argument
//! structure. Replacements are irrelevant; only the matchable surface
//! counts.

use crate::ast::{Pattern, PatternArg, Rule};
use crate::errors::{RedexError, Result};
use crate::modules::NamespaceMap;

/// Checks one namespace's rule list, failing on the first collision.
pub fn check_rules(rules: &[Rule], namespace: &str) -> Result<()> {
    for (i, earlier) in rules.iter().enumerate() {
        for later in &rules[i + 1..] {
            if same_matchable_shape(&earlier.pattern, &later.pattern) {
                return Err(RedexError::DuplicateRule {
                    namespace: namespace.to_string(),
                    first: earlier.to_string(),
                    second: later.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Runs [`check_rules`] over every namespace in the map.
pub fn check_namespaces(namespaces: &NamespaceMap) -> Result<()> {
    for (name, namespace) in namespaces {
        check_rules(&namespace.rules, name)?;
    }
    Ok(())
}

fn same_matchable_shape(a: &Pattern, b: &Pattern) -> bool {
    a.name == b.name
        && a.args.len() == b.args.len()
        && a.args
            .iter()
            .zip(&b.args)
            .all(|(x, y)| same_arg_shape(x, y))
}

fn same_arg_shape(a: &PatternArg, b: &PatternArg) -> bool {
    match (a, b) {
        (PatternArg::Var(_), PatternArg::Var(_)) => true,
        (PatternArg::Wildcard, PatternArg::Wildcard) => true,
        (PatternArg::Literal(x), PatternArg::Literal(y)) => x == y,
        (PatternArg::Nested(x), PatternArg::Nested(y)) => same_nested_shape(x, y),
        _ => false,
    }
}

fn same_nested_shape(a: &crate::ast::Term, b: &crate::ast::Term) -> bool {
    use crate::ast::Term;
    match (a, b) {
        (Term::Var(_), Term::Var(_)) => true,
        (Term::Literal(x), Term::Literal(y)) => x == y,
        (
            Term::Call {
                function: fa,
                args: xa,
                ..
            },
            Term::Call {
                function: fb,
                args: xb,
                ..
            },
        ) => {
            fa == fb
                && xa.len() == xb.len()
                && xa.iter().zip(xb).all(|(x, y)| same_nested_shape(x, y))
        }
        _ => false,
    }
}
