mod ast;
mod parser;

pub use ast::*;
pub use parser::*;

use crate::error::CompileError;
use crate::lexer::Lexer;

/// Tokenize and parse a whole source file into a `Program` tree.
pub fn parse_source(source: &str) -> Result<Node, CompileError> {
    let tokens = Lexer::tokenize(source)?;
    let mut parser = Parser::new(tokens);
    Ok(parser.parse()?)
}
