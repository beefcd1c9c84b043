//! Compiled code: flat instruction streams over value slots.

use indexmap::IndexMap;

use crate::value::Value;

use super::ast::ComparisonOp;

/// Index of a value slot in the executing function's frame.
///
/// Slot −1 is the blackhole: reads yield zero/empty defaults and writes are
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(pub i32);

impl Slot {
    /// The reserved blackhole slot.
    pub const BLACKHOLE: Slot = Slot(-1);

    /// The frame-relative index, or `None` for the blackhole.
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

/// A single virtual machine instruction.
///
/// All jump offsets are relative to the jump instruction's own position.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Invoke the sentence named by `syntax`, passing the resolved slots.
    /// Dispatches to a built-in handler if one matches, otherwise to a user
    /// function.
    Call { syntax: String, args: Vec<Slot> },
    /// Compare two slots and advance the program counter by `on_true` or
    /// `on_false`.
    ConditionJump {
        left: Slot,
        right: Slot,
        operator: ComparisonOp,
        on_true: isize,
        on_false: isize,
    },
    /// Advance by `on_true` or `on_false` depending on the answer recorded
    /// by the question asked immediately before.
    QuestionJump { on_true: isize, on_false: isize },
    /// Advance by `forward` unconditionally. Negative offsets form loop
    /// back-edges.
    Jump { forward: isize },
    /// Record `yes` in the answer flag.
    Answer { yes: bool },
}

/// A function lowered to a flat instruction list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledFunction {
    /// The initial frame: defaults for the declared variables, then every
    /// literal constant referenced by the instructions, in the order the
    /// compiler visited them.
    pub variables: Vec<Value>,
    pub instructions: Vec<Instruction>,
}

/// A compiled program: compiled functions keyed by syntax.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledProgram {
    pub functions: IndexMap<String, CompiledFunction>,
}
