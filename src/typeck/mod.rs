pub mod env;
pub mod resolve;

mod check;
mod infer;

use tracing::debug;

use crate::diagnostics::CompileError;
use crate::parser::ast::Program;

pub use env::ClassTable;
pub use resolve::identify;

/// Type check a program that has already passed identification. Never stops
/// early: every type error in the program is returned.
pub fn type_check(program: &Program) -> Vec<CompileError> {
    let table = match ClassTable::build(program) {
        Ok(table) => table,
        Err(err) => return vec![err],
    };
    type_check_with(program, &table)
}

pub fn type_check_with(program: &Program, table: &ClassTable) -> Vec<CompileError> {
    let mut checker = check::Checker::new(table);
    checker.check_program(program);
    debug!(errors = checker.errors.len(), "type checking complete");
    checker.errors
}
