//! The bento Abstract Syntax Tree (AST).
//!
//! A program is a map from syntax keys to functions. The program may not be
//! valid; it has to be compiled before it can be executed.

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::number::Number;

/// The name of the blackhole variable, a discard sink for output arguments
/// and a zero/empty source for input arguments.
pub const BLACKHOLE: &str = "_";

/// A variable's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    Text,
    Number,
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VariableType::Text => "text",
            VariableType::Number => "number",
        })
    }
}

/// A named variable of a function: an argument or a local declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    pub ty: VariableType,
    /// True if the variable was declared within the function body rather
    /// than bound in the header.
    pub local_scope: bool,
    /// Decimal places kept for number variables.
    pub precision: u32,
}

/// One word of a sentence: either part of the syntactic pattern or an
/// argument placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Word {
    /// A literal pattern word.
    Bare(String),
    /// A reference to an in-scope variable, or the blackhole `_`.
    Variable(String),
    /// A text literal argument.
    Text(String),
    /// A number literal argument.
    Number(Number),
}

impl Word {
    /// Pattern words form the syntax; everything else is an argument.
    pub fn is_argument(&self) -> bool {
        !matches!(self, Word::Bare(_))
    }
}

/// A sentence: an ordered list of words. Sentences are both function
/// definitions and calls, identified by their syntax key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sentence {
    pub words: Vec<Word>,
}

impl Sentence {
    /// The syntax key: every argument replaced with `?` and the words joined
    /// by single spaces, like `add ? and ? into ?`.
    pub fn syntax(&self) -> String {
        self.words
            .iter()
            .map(|word| match word {
                Word::Bare(word) => word.as_str(),
                _ => "?",
            })
            .join(" ")
    }

    /// The values of the placeholders, in order.
    pub fn args(&self) -> impl Iterator<Item = &Word> {
        self.words.iter().filter(|word| word.is_argument())
    }
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl ComparisonOp {
    pub(crate) fn parse(s: &str) -> Option<ComparisonOp> {
        Some(match s {
            "=" => ComparisonOp::Equal,
            "!=" => ComparisonOp::NotEqual,
            "<" => ComparisonOp::LessThan,
            "<=" => ComparisonOp::LessThanEqual,
            ">" => ComparisonOp::GreaterThan,
            ">=" => ComparisonOp::GreaterThanEqual,
            _ => return None,
        })
    }

    /// Whether an ordering between two operands satisfies the operator.
    pub fn evaluate(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equal => ordering.is_eq(),
            ComparisonOp::NotEqual => ordering.is_ne(),
            ComparisonOp::LessThan => ordering.is_lt(),
            ComparisonOp::LessThanEqual => ordering.is_le(),
            ComparisonOp::GreaterThan => ordering.is_gt(),
            ComparisonOp::GreaterThanEqual => ordering.is_ge(),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanEqual => ">=",
        })
    }
}

/// `left op right`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub left: Word,
    pub operator: ComparisonOp,
    pub right: Word,
}

/// What an `if` or `while` tests: an inline comparison, or a question whose
/// answer is read.
#[derive(Debug, Clone, PartialEq)]
pub enum Test {
    Condition(Condition),
    Question(Sentence),
}

/// `yes` or `no`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionAnswer {
    pub yes: bool,
}

/// The statements allowed in if branch position.
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleStatement {
    Sentence(Sentence),
    Answer(QuestionAnswer),
}

/// `if`/`unless` with an optional `otherwise` branch. `unless` inverts which
/// branch is taken.
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub unless: bool,
    pub test: Test,
    pub consequent: SimpleStatement,
    pub alternate: Option<SimpleStatement>,
}

/// `while`/`until` over a single-sentence body. `until` inverts the test.
#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub until: bool,
    pub test: Test,
    pub body: Sentence,
}

/// A statement in a function body.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Sentence(Sentence),
    If(If),
    While(While),
    Answer(QuestionAnswer),
}

/// A function: a definition sentence, its variables and its statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Function {
    pub definition: Sentence,
    /// True if the header ended with `?`. The body of a question answers
    /// with `yes` or `no`.
    pub is_question: bool,
    /// Arguments first, in the order they appear in the header, then local
    /// declarations. A variable's position here is its slot index.
    pub variables: Vec<VariableDefinition>,
    pub statements: Vec<Statement>,
}

/// A parsed program: functions keyed by the syntax of their definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub functions: IndexMap<String, Function>,
}

impl Program {
    /// The syntax key of the entry point.
    pub const START: &'static str = "start";
}
