//! Template substitution: instantiates a rule's replacement with the
//! bindings from a successful match.
//!
//! Free variables pass through unchanged — replacement templates may
//! reference variables not bound by every pattern instance.

use crate::ast::Term;
use crate::matcher::Bindings;

/// Replaces bound variables in `term` by their bindings.
///
/// Laws: `substitute(Var(x), {x: T}) = T` and
/// `substitute(Literal(v), _) = Literal(v)`.
pub fn substitute(term: &Term, bindings: &Bindings) -> Term {
    match term {
        Term::Var(name) => bindings
            .get(name)
            .cloned()
            .unwrap_or_else(|| term.clone()),
        Term::Literal(_) => term.clone(),
        Term::Call {
            namespace,
            function,
            args,
        } => Term::Call {
            namespace: namespace.clone(),
            function: function.clone(),
            args: args.iter().map(|arg| substitute(arg, bindings)).collect(),
        },
        Term::Binary { left, op, right } => Term::Binary {
            left: Box::new(substitute(left, bindings)),
            op: *op,
            right: Box::new(substitute(right, bindings)),
        },
    }
}
