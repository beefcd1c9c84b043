//! The error types for the whole pipeline.

use thiserror::Error;

use crate::compiler::codegen::CompileError;
use crate::compiler::parser::ParseError;
use crate::vm::RuntimeError;

pub type Result<T> = std::result::Result<T, Error>;

/// Any error raised while parsing, compiling or running a program.
///
/// Each phase either produces a complete artifact or aborts the pipeline
/// with the first error it hits.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
