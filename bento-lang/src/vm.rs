//! The virtual machine.
//!
//! Executes a [`CompiledProgram`] over a single contiguous value memory and
//! a stack of frame base offsets. Entering a function appends its slots to
//! the memory; the new frame's base is the prior end of memory. Slots are
//! boxed, and argument passing shares the box, so a write through an
//! argument slot is visible to the caller. That is how `into x` output
//! arguments work across user functions.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::io::{self, Write};
use std::rc::Rc;

use thiserror::Error;

use crate::compiler::ast::{ComparisonOp, Program};
use crate::compiler::code::{CompiledProgram, Instruction, Slot};
use crate::library;
use crate::number::{Number, DEFAULT_PRECISION};
use crate::value::{Value, ValueKind};

/// A boxed memory slot.
pub(crate) type Boxed = Rc<RefCell<Value>>;

/// The virtual machine error type.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("no such function: {syntax}")]
    NoSuchFunction { syntax: String },
    #[error("cannot compare: {left} {operator} {right}")]
    CannotCompare {
        left: ValueKind,
        operator: ComparisonOp,
        right: ValueKind,
    },
    #[error("cannot set: {to} to {from}")]
    CannotSet { to: ValueKind, from: ValueKind },
    #[error("expected {expected}, but found {found}")]
    WrongType {
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("wrong number of arguments calling {syntax}: expected {expected}, got {got}")]
    WrongArity {
        syntax: String,
        expected: usize,
        got: usize,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Executes a compiled program.
pub struct VirtualMachine<W: Write> {
    program: Rc<CompiledProgram>,
    /// All live value slots, every frame back to back.
    memory: Vec<Boxed>,
    /// The base offset of each active frame; the executing frame is on top.
    offsets: Vec<usize>,
    /// Set by a question's yes/no, cleared by every call, read by question
    /// jumps.
    answer: bool,
    pub(crate) out: W,
}

impl VirtualMachine<io::Stdout> {
    pub fn new(program: CompiledProgram) -> VirtualMachine<io::Stdout> {
        VirtualMachine::with_output(program, io::stdout())
    }
}

impl<W: Write> VirtualMachine<W> {
    pub fn with_output(program: CompiledProgram, out: W) -> VirtualMachine<W> {
        VirtualMachine {
            program: Rc::new(program),
            memory: Vec::new(),
            offsets: Vec::new(),
            answer: false,
            out,
        }
    }

    /// Run the program from its `start` function.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        self.call(Program::START, &[])
    }

    /// Consume the machine and return its output writer.
    pub fn into_output(self) -> W {
        self.out
    }

    fn call(&mut self, syntax: &str, args: &[Slot]) -> Result<(), RuntimeError> {
        let program = Rc::clone(&self.program);
        let function = program
            .functions
            .get(syntax)
            .ok_or_else(|| RuntimeError::NoSuchFunction {
                syntax: syntax.to_string(),
            })?;
        if args.len() > function.variables.len() {
            return Err(RuntimeError::WrongArity {
                syntax: syntax.to_string(),
                expected: function.variables.len(),
                got: args.len(),
            });
        }
        log::trace!("call {syntax}");

        // Expand the memory with fresh boxes for the declared defaults and
        // literal constants, then share the caller's boxes for the
        // arguments.
        let caller_base = self.base();
        let base = self.memory.len();
        self.memory.extend(
            function
                .variables
                .iter()
                .map(|value| Rc::new(RefCell::new(value.clone()))),
        );
        for (i, arg) in args.iter().enumerate() {
            if let Some(index) = arg.index() {
                self.memory[base + i] = Rc::clone(&self.memory[caller_base + index]);
            }
            // A blackhole argument keeps the fresh default box: it reads as
            // zero/empty and its writes die with the frame.
        }
        self.offsets.push(base);

        // The program counter is reset on entry; the frame is finished once
        // it runs off the end of the instructions.
        let mut pc = 0;
        while pc < function.instructions.len() {
            let moved = self.execute(&function.instructions[pc])?;
            pc = pc.checked_add_signed(moved).unwrap_or(usize::MAX);
        }

        self.offsets.pop();
        self.memory.truncate(base);
        Ok(())
    }

    /// Execute one instruction and return how far to move the program
    /// counter.
    fn execute(&mut self, instruction: &Instruction) -> Result<isize, RuntimeError> {
        match instruction {
            Instruction::Call { syntax, args } => {
                // Every call starts with a clean answer; a question sets it
                // on the way out.
                self.answer = false;
                if !library::call(self, syntax, args)? {
                    self.call(syntax, args)?;
                }
                Ok(1)
            }
            Instruction::ConditionJump {
                left,
                right,
                operator,
                on_true,
                on_false,
            } => {
                let ordering = self.compare(*left, *right, *operator)?;
                Ok(if operator.evaluate(ordering) {
                    *on_true
                } else {
                    *on_false
                })
            }
            Instruction::QuestionJump { on_true, on_false } => {
                Ok(if self.answer { *on_true } else { *on_false })
            }
            Instruction::Jump { forward } => Ok(*forward),
            Instruction::Answer { yes } => {
                self.answer = *yes;
                Ok(1)
            }
        }
    }

    fn compare(
        &self,
        left: Slot,
        right: Slot,
        operator: ComparisonOp,
    ) -> Result<Ordering, RuntimeError> {
        let left = self.get(left).map(|cell| cell.borrow().clone());
        let right = self.get(right).map(|cell| cell.borrow().clone());
        // A blackhole operand reads as the other side's zero/empty default.
        let (left, right) = match (left, right) {
            (Some(left), Some(right)) => (left, right),
            (Some(left), None) => {
                let default = Value::default_of(left.kind());
                (left, default)
            }
            (None, Some(right)) => (Value::default_of(right.kind()), right),
            (None, None) => (Value::Text(String::new()), Value::Text(String::new())),
        };
        match (&left, &right) {
            (Value::Text(left), Value::Text(right)) => Ok(left.cmp(right)),
            (Value::Number(left), Value::Number(right)) => Ok(left.cmp(right)),
            _ => Err(RuntimeError::CannotCompare {
                left: left.kind(),
                operator,
                right: right.kind(),
            }),
        }
    }

    /// The executing frame's base offset. Built-in handlers run without a
    /// frame of their own, so for them this is the caller's base.
    fn base(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// The box behind a slot, or `None` for the blackhole.
    pub(crate) fn get(&self, slot: Slot) -> Option<Boxed> {
        slot.index()
            .map(|index| Rc::clone(&self.memory[self.base() + index]))
    }

    /// Replace the value behind a slot. Writes to the blackhole are
    /// discarded.
    pub(crate) fn set(&mut self, slot: Slot, value: Value) {
        if let Some(index) = slot.index() {
            *self.memory[self.base() + index].borrow_mut() = value;
        }
    }

    /// Read a slot as a number. The blackhole reads as zero.
    pub(crate) fn get_number(&self, slot: Slot) -> Result<Number, RuntimeError> {
        match self.get(slot) {
            None => Ok(Number::zero(DEFAULT_PRECISION)),
            Some(cell) => match &*cell.borrow() {
                Value::Number(number) => Ok(number.clone()),
                value => Err(RuntimeError::WrongType {
                    expected: ValueKind::Number,
                    found: value.kind(),
                }),
            },
        }
    }

    /// Read a slot as text. The blackhole reads as the empty text.
    pub(crate) fn get_text(&self, slot: Slot) -> Result<String, RuntimeError> {
        match self.get(slot) {
            None => Ok(String::new()),
            Some(cell) => match &*cell.borrow() {
                Value::Text(text) => Ok(text.clone()),
                value => Err(RuntimeError::WrongType {
                    expected: ValueKind::Text,
                    found: value.kind(),
                }),
            },
        }
    }
}
