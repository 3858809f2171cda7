//! Pattern matching: does a call fit a rule's left-hand shape, and if so,
//! what do the pattern variables bind to?
//!
//! Patterns are matched position by position against the call's arguments.
//! A `Wildcard` terminates the loop: every remaining position is accepted
//! without inspection or binding. Variables are non-linear — a repeated
//! variable name requires the new argument to be structurally equal to the
//! existing binding, so `eq2(x, x)` matches `eq2(5, 5)` but not
//! `eq2(5, 6)`.

use std::collections::HashMap;

use crate::ast::{Pattern, PatternArg, Term};

/// Pattern-variable bindings from one successful match attempt.
pub type Bindings = HashMap<String, Term>;

/// Matches a call against a pattern, returning the bindings on success.
///
/// The call and pattern must agree on function name and arity before any
/// positional matching happens.
pub fn match_call(
    function: &str,
    args: &[Term],
    pattern: &Pattern,
) -> Option<Bindings> {
    if function != pattern.name || args.len() != pattern.args.len() {
        return None;
    }

    let mut bindings = Bindings::new();
    for (pat_arg, arg) in pattern.args.iter().zip(args) {
        if matches!(pat_arg, PatternArg::Wildcard) {
            break;
        }
        if !match_arg(pat_arg, arg, &mut bindings) {
            return None;
        }
    }
    Some(bindings)
}

fn match_arg(pat_arg: &PatternArg, arg: &Term, bindings: &mut Bindings) -> bool {
    match pat_arg {
        PatternArg::Var(name) => match bindings.get(name) {
            Some(bound) => bound == arg,
            None => {
                bindings.insert(name.clone(), arg.clone());
                true
            }
        },
        PatternArg::Literal(lit) => matches!(arg, Term::Literal(l) if l == lit),
        PatternArg::Nested(template) => match_nested(template, arg, bindings),
        // Handled by the caller's loop; a wildcard never reaches here.
        PatternArg::Wildcard => true,
    }
}

/// Destructures a call argument against a nested call template, merging
/// the inner bindings into the outer map. A name already bound to a
/// conflicting term fails the whole match.
fn match_nested(template: &Term, arg: &Term, bindings: &mut Bindings) -> bool {
    let (Term::Call {
        function: pat_fn,
        args: pat_args,
        ..
    }, Term::Call {
        function: arg_fn,
        args: arg_args,
        ..
    }) = (template, arg)
    else {
        return false;
    };

    let Some(projected) = project_pattern_args(pat_args) else {
        return false;
    };
    let inner_pattern = Pattern::new(pat_fn.clone(), projected);
    let Some(inner) = match_call(arg_fn, arg_args, &inner_pattern) else {
        return false;
    };

    for (name, term) in inner {
        match bindings.get(&name) {
            Some(existing) if *existing != term => return false,
            _ => {
                bindings.insert(name, term);
            }
        }
    }
    true
}

/// Projects the argument terms of a nested call template into pattern
/// positions: Var→Var, Literal→Literal, Call→Nested. Any other shape is
/// unsupported and fails the match.
fn project_pattern_args(args: &[Term]) -> Option<Vec<PatternArg>> {
    args.iter()
        .map(|arg| match arg {
            Term::Var(name) => Some(PatternArg::Var(name.clone())),
            Term::Literal(lit) => Some(PatternArg::Literal(lit.clone())),
            Term::Call { .. } => Some(PatternArg::Nested(arg.clone())),
            Term::Binary { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;

    fn pat(name: &str, args: Vec<PatternArg>) -> Pattern {
        Pattern::new(name, args)
    }

    #[test]
    fn name_and_arity_must_agree() {
        let pattern = pat("f", vec![PatternArg::Var("x".into())]);
        assert!(match_call("g", &[Term::int(1)], &pattern).is_none());
        assert!(match_call("f", &[Term::int(1), Term::int(2)], &pattern).is_none());
        assert!(match_call("f", &[Term::int(1)], &pattern).is_some());
    }

    #[test]
    fn variable_binds_first_occurrence() {
        let pattern = pat("f", vec![PatternArg::Var("x".into())]);
        let bindings = match_call("f", &[Term::int(7)], &pattern).unwrap();
        assert_eq!(bindings["x"], Term::int(7));
    }

    #[test]
    fn non_linear_variable_requires_equal_terms() {
        let pattern = pat(
            "eq2",
            vec![PatternArg::Var("x".into()), PatternArg::Var("x".into())],
        );
        let ok = match_call("eq2", &[Term::int(5), Term::int(5)], &pattern).unwrap();
        assert_eq!(ok.len(), 1);
        assert!(match_call("eq2", &[Term::int(5), Term::int(6)], &pattern).is_none());
    }

    #[test]
    fn literal_requires_exact_value_and_kind() {
        let pattern = pat("f", vec![PatternArg::Literal(Literal::Int(1))]);
        assert!(match_call("f", &[Term::int(1)], &pattern).is_some());
        assert!(match_call("f", &[Term::float(1.0)], &pattern).is_none());
        assert!(match_call("f", &[Term::var("x")], &pattern).is_none());
    }

    #[test]
    fn wildcard_accepts_remaining_positions_unbound() {
        let pattern = pat(
            "if",
            vec![
                PatternArg::Literal(Literal::Bool(true)),
                PatternArg::Var("then".into()),
                PatternArg::Wildcard,
            ],
        );
        let bindings = match_call(
            "if",
            &[Term::bool(true), Term::int(1), Term::int(2)],
            &pattern,
        )
        .unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings["then"], Term::int(1));
    }

    #[test]
    fn wildcard_before_last_position_accepts_everything_after() {
        // Preserved behavior: the loop terminates at the first wildcard,
        // so positions after it are never inspected at all.
        let pattern = pat(
            "f",
            vec![
                PatternArg::Wildcard,
                PatternArg::Literal(Literal::Int(99)),
            ],
        );
        let bindings =
            match_call("f", &[Term::int(1), Term::int(2)], &pattern).unwrap();
        assert!(bindings.is_empty());
    }

    #[test]
    fn nested_pattern_destructures_call_argument() {
        let pattern = pat(
            "head",
            vec![PatternArg::Nested(Term::call(
                "Cons",
                vec![Term::var("x"), Term::var("rest")],
            ))],
        );
        let arg = Term::call("Cons", vec![Term::char('h'), Term::call("Nil", vec![])]);
        let bindings = match_call("head", &[arg], &pattern).unwrap();
        assert_eq!(bindings["x"], Term::char('h'));
        assert_eq!(bindings["rest"], Term::call("Nil", vec![]));
    }

    #[test]
    fn nested_pattern_rejects_non_call_argument() {
        let pattern = pat(
            "head",
            vec![PatternArg::Nested(Term::call("Cons", vec![Term::var("x")]))],
        );
        assert!(match_call("head", &[Term::int(1)], &pattern).is_none());
    }

    #[test]
    fn nested_binding_conflict_fails_the_match() {
        // f(x, Pair(x, y)) against f(1, Pair(2, 3)): inner x=2 conflicts
        // with outer x=1.
        let pattern = pat(
            "f",
            vec![
                PatternArg::Var("x".into()),
                PatternArg::Nested(Term::call(
                    "Pair",
                    vec![Term::var("x"), Term::var("y")],
                )),
            ],
        );
        let pair = Term::call("Pair", vec![Term::int(2), Term::int(3)]);
        assert!(match_call("f", &[Term::int(1), pair.clone()], &pattern).is_none());

        let pair_agreeing = Term::call("Pair", vec![Term::int(1), Term::int(3)]);
        let bindings = match_call("f", &[Term::int(1), pair_agreeing], &pattern).unwrap();
        assert_eq!(bindings["y"], Term::int(3));
    }

    #[test]
    fn deeply_nested_patterns_recurse() {
        let pattern = pat(
            "second",
            vec![PatternArg::Nested(Term::call(
                "Cons",
                vec![
                    Term::var("a"),
                    Term::call("Cons", vec![Term::var("b"), Term::var("rest")]),
                ],
            ))],
        );
        let list = Term::call(
            "Cons",
            vec![
                Term::int(1),
                Term::call(
                    "Cons",
                    vec![Term::int(2), Term::call("Nil", vec![])],
                ),
            ],
        );
        let bindings = match_call("second", &[list], &pattern).unwrap();
        assert_eq!(bindings["b"], Term::int(2));
    }
}
