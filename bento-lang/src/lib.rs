//! Bento language compiler and virtual machine.
//!
//! ```txt
//!        +-----------+             +--------+                +---------+
//! str -> | tokenizer | - Tokens -> | parser | - Program ---> | codegen |
//!        +-----------+             +--------+                +---------+
//!                                                                 |
//!              +--------------- CompiledProgram -----------------+
//!              |
//!              v
//!          +------+
//!          |  VM  | -> output
//!          +------+
//! ```
//!
//! # Examples
//!
//! ```
//! use bento_lang::{compiler::code::CompiledProgram, vm::VirtualMachine};
//!
//! let input = r#"start: display "Hello, World!""#;
//! let program = CompiledProgram::try_from(input).unwrap();
//! let mut vm = VirtualMachine::with_output(program, Vec::new());
//! vm.run().unwrap();
//! assert_eq!(vm.into_output(), b"Hello, World!\n");
//! ```

pub mod compiler;
pub mod errors;
mod library;
pub mod number;
pub mod value;
pub mod vm;

use compiler::code::CompiledProgram;
use errors::Error;

impl TryFrom<&str> for CompiledProgram {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Error> {
        compiler::compile(value)
    }
}
