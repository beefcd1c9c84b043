//! The code generator.
//!
//! Lowers a parsed [`Program`] into flat instruction lists over value slots.
//! A function's slots start with a default value per declared variable, and
//! every literal constant is appended behind them as it is visited.

use std::mem;

use thiserror::Error;

use crate::number::Number;
use crate::value::Value;

use super::ast::*;
use super::code::{CompiledFunction, CompiledProgram, Instruction, Slot};

/// The code generator error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("function is defined more than once: {syntax}")]
    DuplicateFunction { syntax: String },
    #[error("unknown variable: {name}")]
    UnknownVariable { name: String },
}

/// Lower every function in the program.
pub fn gen_program(program: &Program) -> Result<CompiledProgram, CompileError> {
    let mut compiled = CompiledProgram::default();
    for (syntax, function) in &program.functions {
        compiled
            .functions
            .insert(syntax.clone(), gen_function(function)?);
    }
    Ok(compiled)
}

/// Lower one function.
pub fn gen_function(function: &Function) -> Result<CompiledFunction, CompileError> {
    let mut cf = CompiledFunction::default();

    // Slots for the arguments and locally declared variables come first.
    // The virtual machine fills in the caller's values when the function is
    // invoked.
    for variable in &function.variables {
        cf.variables.push(match variable.ty {
            VariableType::Text => Value::Text(String::new()),
            VariableType::Number => Value::Number(Number::zero(variable.precision)),
        });
    }

    for statement in &function.statements {
        match statement {
            Statement::Sentence(sentence) => {
                let call = gen_sentence(&mut cf, function, sentence)?;
                cf.instructions.push(call);
            }
            Statement::If(if_stmt) => gen_if(&mut cf, function, if_stmt)?,
            Statement::While(while_stmt) => gen_while(&mut cf, function, while_stmt)?,
            Statement::Answer(answer) => cf.instructions.push(Instruction::Answer { yes: answer.yes }),
        }
    }

    Ok(cf)
}

fn gen_sentence(
    cf: &mut CompiledFunction,
    function: &Function,
    sentence: &Sentence,
) -> Result<Instruction, CompileError> {
    let mut args = Vec::new();
    for word in sentence.args() {
        args.push(resolve_word(cf, function, word)?);
    }
    Ok(Instruction::Call {
        syntax: sentence.syntax(),
        args,
    })
}

fn gen_simple(
    cf: &mut CompiledFunction,
    function: &Function,
    statement: &SimpleStatement,
) -> Result<Instruction, CompileError> {
    match statement {
        SimpleStatement::Sentence(sentence) => gen_sentence(cf, function, sentence),
        SimpleStatement::Answer(answer) => Ok(Instruction::Answer { yes: answer.yes }),
    }
}

fn gen_if(
    cf: &mut CompiledFunction,
    function: &Function,
    if_stmt: &If,
) -> Result<(), CompileError> {
    let mut on_true = 1;
    let mut on_false = 2;
    if if_stmt.alternate.is_some() {
        // Step over the jump that protects the otherwise branch.
        on_false += 1;
    }
    if if_stmt.unless {
        mem::swap(&mut on_true, &mut on_false);
    }

    gen_test(cf, function, &if_stmt.test, on_true, on_false)?;

    let consequent = gen_simple(cf, function, &if_stmt.consequent)?;
    cf.instructions.push(consequent);

    if let Some(alternate) = &if_stmt.alternate {
        let alternate = gen_simple(cf, function, alternate)?;
        // This prevents the consequent from also running the otherwise
        // branch.
        cf.instructions.push(Instruction::Jump { forward: 2 });
        cf.instructions.push(alternate);
    }

    Ok(())
}

fn gen_while(
    cf: &mut CompiledFunction,
    function: &Function,
    while_stmt: &While,
) -> Result<(), CompileError> {
    let mut on_true = 1;
    let mut on_false = 3;
    if while_stmt.until {
        mem::swap(&mut on_true, &mut on_false);
    }

    // After the body, jump back to the test unconditionally. Leaving the
    // loop lands immediately after the back-jump.
    let test_len = gen_test(cf, function, &while_stmt.test, on_true, on_false)?;
    let body = gen_sentence(cf, function, &while_stmt.body)?;
    cf.instructions.push(body);
    cf.instructions.push(Instruction::Jump {
        forward: -(test_len as isize) - 1,
    });

    Ok(())
}

/// Emit the instructions that evaluate a test, returning how many were
/// emitted. A comparison is a single conditional jump; a question is the
/// asking call followed by a jump on its answer.
fn gen_test(
    cf: &mut CompiledFunction,
    function: &Function,
    test: &Test,
    on_true: isize,
    on_false: isize,
) -> Result<usize, CompileError> {
    match test {
        Test::Condition(condition) => {
            let left = resolve_word(cf, function, &condition.left)?;
            let right = resolve_word(cf, function, &condition.right)?;
            cf.instructions.push(Instruction::ConditionJump {
                left,
                right,
                operator: condition.operator,
                on_true,
                on_false,
            });
            Ok(1)
        }
        Test::Question(sentence) => {
            let ask = gen_sentence(cf, function, sentence)?;
            cf.instructions.push(ask);
            cf.instructions.push(Instruction::QuestionJump { on_true, on_false });
            Ok(2)
        }
    }
}

/// Resolve a sentence argument to a slot: variable references by their
/// position in the function's variable list, literals by appending a new
/// constant slot, the blackhole to its reserved index.
fn resolve_word(
    cf: &mut CompiledFunction,
    function: &Function,
    word: &Word,
) -> Result<Slot, CompileError> {
    match word {
        Word::Variable(name) if name == BLACKHOLE => Ok(Slot::BLACKHOLE),
        Word::Variable(name) => function
            .variables
            .iter()
            .position(|variable| variable.name == *name)
            .map(|index| Slot(index as i32))
            .ok_or_else(|| CompileError::UnknownVariable { name: name.clone() }),
        Word::Text(text) => Ok(append_constant(cf, Value::Text(text.clone()))),
        Word::Number(number) => Ok(append_constant(cf, Value::Number(number.clone()))),
        Word::Bare(_) => unreachable!("a bare word is never a sentence argument"),
    }
}

fn append_constant(cf: &mut CompiledFunction, value: Value) -> Slot {
    cf.variables.push(value);
    Slot(cf.variables.len() as i32 - 1)
}
