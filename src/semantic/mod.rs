//! Semantic analysis: symbol tables, local renaming, constant evaluation
//! and the checker passes.

pub mod block_ctx;
mod check_body;
pub mod checker;
pub mod const_solver;
pub mod scope;
pub mod symbols;

pub use checker::{Checker, Receiver};
pub use const_solver::{ConstSolver, Evaluation};
pub use symbols::{ConstEntry, SymbolTables};
