pub mod analyzer;
pub mod backend;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod visualize;

use std::path::Path;

use tracing::debug;

use analyzer::SemanticVisitor;
use backend::{Backend, ObjectBackend};
use codegen::Codegen;
use error::CompileError;
use ir::Module;
use parser::Node;

/// Checks `program` and lowers it to IR. Generation only runs when the
/// checker found nothing.
pub fn compile_ast(program: &Node) -> Result<Module, CompileError> {
    let mut visitor = SemanticVisitor::new();
    let report = visitor.check(program);
    debug!(errors = report.error_count(), "checked program");
    report.into_result().map_err(CompileError::Semantic)?;

    let mut codegen = Codegen::new();
    codegen.generate(program).map_err(CompileError::Codegen)
}

pub fn compile(source: &str) -> Result<Module, CompileError> {
    let program = parser::parse_source(source)?;
    compile_ast(&program)
}

/// Checks and lowers `program`, then writes a native object file to `output`.
/// Nothing is written unless both phases succeed.
pub fn generate_object(program: &Node, output: &Path) -> Result<(), CompileError> {
    let module = compile_ast(program)?;
    let backend = ObjectBackend::new()?;
    backend.emit_to_file(&module, output)?;
    Ok(())
}

pub fn compile_to_object(source: &str, output: &Path) -> Result<(), CompileError> {
    let program = parser::parse_source(source)?;
    generate_object(&program, output)
}
