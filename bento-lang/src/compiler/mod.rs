//! The bento compiler.

pub mod ast;
pub mod code;
pub mod codegen;
pub mod lexer;
pub mod parser;
pub mod token;

use crate::errors::Error;

/// Compile source text into an executable program.
pub fn compile(input: &str) -> Result<code::CompiledProgram, Error> {
    let program = parser::parse(input)?;
    log::debug!("parsed {} functions", program.functions.len());
    Ok(codegen::gen_program(&program)?)
}
