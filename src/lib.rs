//! rlc: semantic core of a compiler for a small Rust-like language
//!
//! Source text goes through the [`frontend`] (tokens, AST) and is then
//! annotated in place by the [`semantic::Checker`].

pub mod feedback;
pub mod frontend;
pub mod semantic;
pub mod types;
pub mod utils;

use frontend::ast::Crate;
use semantic::Checker;
use utils::Result;

/// Parse and check `source`, returning the annotated tree and the checker
/// holding the closed symbol tables.
pub fn check_source(source: &str) -> Result<(Crate, Checker)> {
    let mut krate = frontend::parser::parse_source(source)?;
    let mut checker = Checker::new();
    checker.check(&mut krate)?;
    Ok((krate, checker))
}
