use std::io;

use thiserror::Error;

use crate::ir::Type;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum LexError {
    #[error("line {line}: can't tokenize {found:?}")]
    UnexpectedChar { line: usize, found: char },

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("line {line}: invalid number literal {text:?}")]
    InvalidNumber { line: usize, text: String },
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("line {line}: unexpected token {found} (was expecting {expected})")]
    UnexpectedToken {
        line: usize,
        found: String,
        expected: String,
    },

    #[error("unexpected end of input (was expecting {expected})")]
    UnexpectedEof { expected: String },
}

/// A violation found by the semantic checker. Never fatal on its own; the
/// checker keeps going and reports every one of them.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SemanticError {
    #[error("redeclared var {0}")]
    Redeclared(String),

    #[error("undeclared var {0}")]
    Undeclared(String),

    #[error("type mismatch: incorrect type assigned to {name} (declared {declared}, got {found})")]
    IncorrectType {
        name: String,
        declared: String,
        found: String,
    },
}

impl SemanticError {
    pub fn name(&self) -> &str {
        match self {
            SemanticError::Redeclared(name) | SemanticError::Undeclared(name) => name,
            SemanticError::IncorrectType { name, .. } => name,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum IrError {
    #[error("no insertion point set")]
    NoInsertionPoint,

    #[error("block {0} already has a terminator")]
    BlockTerminated(String),

    #[error("block {0} has no terminator")]
    MissingTerminator(String),

    #[error("unknown block #{0}")]
    UnknownBlock(usize),

    #[error("unknown stack slot #{0}")]
    UnknownSlot(usize),

    #[error("{op}: expected operand of type {expected}, found {found}")]
    TypeMismatch {
        op: &'static str,
        expected: Type,
        found: Type,
    },
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum CodegenError {
    #[error("undeclared var {0}")]
    UndeclaredSymbol(String),

    #[error("node `{label}` expects {expected} children, found {found}")]
    Arity {
        label: String,
        expected: usize,
        found: usize,
    },

    #[error("unable to print value of type {0}")]
    Unprintable(Type),

    #[error("`{0}` does not produce a value")]
    NoValue(String),

    #[error(transparent)]
    Ir(#[from] IrError),
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("host machine is not supported: {0}")]
    UnsupportedHost(String),

    #[error("code generation failed: {0}")]
    Codegen(String),

    #[error("invalid IR: {0}")]
    InvalidIr(String),

    #[error("failed to write object file: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum InterpError {
    #[error("step limit of {0} exceeded")]
    StepLimit(usize),

    #[error("read of uninitialized value v{0}")]
    UndefinedValue(u32),

    #[error("read of uninitialized stack slot #{0}")]
    UninitializedSlot(usize),

    #[error("invalid IR: {0}")]
    InvalidIr(String),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{} semantic error(s)", .0.len())]
    Semantic(Vec<SemanticError>),

    #[error("{} code generation error(s)", .0.len())]
    Codegen(Vec<CodegenError>),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CompileError {
    /// Individual one-line diagnostics, in the order they were found.
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            CompileError::Semantic(errors) => errors.iter().map(ToString::to_string).collect(),
            CompileError::Codegen(errors) => errors.iter().map(ToString::to_string).collect(),
            e => vec![e.to_string()],
        }
    }
}
