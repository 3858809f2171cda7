//! Text → AST: scanner and recursive-descent parser for `.rx` sources.

pub mod lexer;
pub mod parser;

pub use parser::{parse_expression, parse_source};
