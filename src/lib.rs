pub use crate::errors::{RedexError, Result};

pub mod ast;
pub mod engine;
pub mod errors;
pub mod eval;
pub mod interpreter;
pub mod matcher;
pub mod modules;
pub mod natives;
pub mod subst;
pub mod syntax;
pub mod tester;
pub mod validate;
