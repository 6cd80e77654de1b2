//! Native code generation: lowering to x86-64, the syscall runtime, and
//! the ELF writer.

pub mod elf;
pub mod lower;
pub mod runtime;
pub mod x64;

use tracing::debug;

use crate::diagnostics::CompileError;
use crate::parser::ast::{MethodDecl, Program, TypeDenoter};
use crate::typeck::env::{ClassTable, STRING_CLASS};

/// Generate a complete executable image for a checked program.
pub fn codegen(program: &Program) -> Result<Vec<u8>, CompileError> {
    let table = ClassTable::build(program)?;
    codegen_with(program, &table)
}

pub fn codegen_with(program: &Program, table: &ClassTable) -> Result<Vec<u8>, CompileError> {
    let main = find_main(program)?;
    let code = lower::lower_program(program, table, &main)?;
    debug!(class = %main.0, code_bytes = code.len(), "code generation complete");
    Ok(elf::write_elf(&code))
}

/// `public static void main(String[] args)`, exactly once in the program.
fn is_main(method: &MethodDecl) -> bool {
    let string_array = TypeDenoter::array_of(TypeDenoter::Class(STRING_CLASS.to_string()));
    method.name.node == "main"
        && !method.is_private
        && method.is_static
        && method.return_type.node == TypeDenoter::Void
        && method.params.len() == 1
        && method.params[0].node.ty.node == string_array
}

/// Locate the unique main method, as (class, method).
pub fn find_main(program: &Program) -> Result<(String, String), CompileError> {
    let mut found = program.classes.iter().flat_map(|class| {
        class
            .node
            .methods
            .iter()
            .filter(|m| is_main(&m.node))
            .map(move |m| (class.node.name.node.clone(), m))
    });
    let Some((class, method)) = found.next() else {
        return Err(CompileError::codegen("no valid main method found"));
    };
    if let Some((_, dup)) = found.next() {
        return Err(CompileError::codegen_at("duplicate main methods found", dup.node.name.span));
    }
    Ok((class, method.node.name.node.clone()))
}
