//! Unified error type for every failure mode of the interpreter.
//!
//! All fallible operations in this crate return [`Result`]. Errors are
//! fatal to the operation that raised them and are never retried: a
//! load-time error aborts the whole load, an evaluation error aborts that
//! expression only.

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedexError>;

#[derive(Debug, Error, Diagnostic)]
pub enum RedexError {
    #[error("parse error: {message}")]
    #[diagnostic(code(redex::parse))]
    Parse { message: String },

    #[error("module not found: {module}")]
    #[diagnostic(
        code(redex::module_not_found),
        help("modules are resolved as bundled modules first, then as <modules-dir>/<Name>.rx")
    )]
    ModuleNotFound { module: String },

    #[error("duplicate module name (bundled and user): {module}")]
    #[diagnostic(code(redex::duplicate_module))]
    DuplicateModule { module: String },

    #[error("invalid item in module '{module}': only imports and rules allowed")]
    #[diagnostic(code(redex::invalid_module_content))]
    InvalidModuleContent { module: String },

    #[error("import cycle detected while loading module: {module}")]
    #[diagnostic(code(redex::import_cycle))]
    ImportCycle { module: String },

    #[error("duplicate rule in namespace '{namespace}':\n  {first}\n  {second}")]
    #[diagnostic(
        code(redex::duplicate_rule),
        help("two rules in one namespace may not share a structurally identical pattern")
    )]
    DuplicateRule {
        namespace: String,
        first: String,
        second: String,
    },

    #[error("no rule matches call: {call}")]
    #[diagnostic(code(redex::no_matching_rule))]
    NoMatchingRule { call: String },

    #[error("native {function}: {message}")]
    #[diagnostic(code(redex::native_argument))]
    NativeArgumentError { function: String, message: String },

    #[error("invalid unit test in namespace '{namespace}': {expression} -> {result}")]
    #[diagnostic(
        code(redex::malformed_unit_test),
        help("a unit test must reduce to a string literal starting with \"[Success]\" or \"[Failed]\"")
    )]
    MalformedUnitTest {
        namespace: String,
        expression: String,
        result: String,
    },

    #[error("io error: {0}")]
    #[diagnostic(code(redex::io))]
    Io(#[from] std::io::Error),
}
