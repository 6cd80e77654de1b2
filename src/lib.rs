pub mod codegen;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod typeck;

use std::path::Path;

use tracing::info;

use diagnostics::{CompileError, Reporter};

/// Compile a source string to an executable image (scan → parse → identify →
/// type check → codegen). Stops at the first phase that reports errors.
pub fn compile(source: &str) -> Result<Vec<u8>, Reporter> {
    let program = parser::parse(source).map_err(Reporter::from_iter)?;
    let table = typeck::identify(&program)?;

    let type_errors = typeck::type_check_with(&program, &table);
    if !type_errors.is_empty() {
        return Err(Reporter::from_iter(type_errors));
    }

    Ok(codegen::codegen_with(&program, &table)?)
}

/// Compile `input` and write the executable to `output`. Nothing is written
/// unless compilation succeeds.
pub fn compile_file(input: &Path, output: &Path) -> Result<(), Reporter> {
    let source = std::fs::read_to_string(input)
        .map_err(|e| CompileError::io(format!("failed to read {}: {e}", input.display())))?;
    let image = compile(&source)?;
    write_executable(output, &image)
        .map_err(|e| CompileError::io(format!("failed to write {}: {e}", output.display())))?;
    info!(output = %output.display(), bytes = image.len(), "wrote executable");
    Ok(())
}

fn write_executable(path: &Path, image: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, image)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}
