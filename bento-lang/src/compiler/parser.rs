//! The parser.
//!
//! A backtracking recognizer over the token vector: every `consume_*` method
//! snapshots the current token offset and restores it on failure, so
//! alternatives can be tried from the same position. There is no global
//! parse state beyond the offset.

use itertools::Itertools;
use thiserror::Error;

use crate::errors::Error;
use crate::number::{InvalidNumberError, Number, DEFAULT_PRECISION, UNLIMITED_PRECISION};

use super::ast::*;
use super::codegen::CompileError;
use super::lexer::tokenize;
use super::token::{Token, TokenKind};

// These reserved words have special meaning when they are the first word of
// a statement. They are fine as ordinary words inside a sentence.
const WORD_DECLARE: &str = "declare";
const WORD_IF: &str = "if";
const WORD_NO: &str = "no";
const WORD_OTHERWISE: &str = "otherwise";
const WORD_UNLESS: &str = "unless";
const WORD_UNTIL: &str = "until";
const WORD_WHILE: &str = "while";
const WORD_YES: &str = "yes";

const TYPE_NUMBER: &str = "number";
const TYPE_TEXT: &str = "text";

/// The parser error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected}, but got {found}")]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
    },
    #[error("expected a token, but the file ended unexpectedly")]
    UnexpectedEof,
    #[error("expected one of {}, but got \"{found}\"", .expected.iter().map(|word| format!("\"{word}\"")).join(", "))]
    ExpectedWord {
        expected: Vec<String>,
        found: String,
    },
    #[error("expected sentence word, but found something else")]
    ExpectedSentenceWord,
    #[error("expected variable type")]
    ExpectedVariableType,
    #[error("unknown operator \"{operator}\"")]
    UnknownOperator { operator: String },
    #[error(transparent)]
    InvalidNumber(#[from] InvalidNumberError),
}

/// Parse source text into a program.
pub fn parse(input: &str) -> Result<Program, Error> {
    Parser::new(tokenize(input)).parse()
}

struct Parser {
    tokens: Vec<Token>,
    offset: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Parser {
        Parser { tokens, offset: 0 }
    }

    fn parse(&mut self) -> Result<Program, Error> {
        let mut program = Program::default();
        while !self.is_finished() {
            let function = self.consume_function()?;
            let syntax = function.definition.syntax();
            if program.functions.insert(syntax.clone(), function).is_some() {
                return Err(CompileError::DuplicateFunction { syntax }.into());
            }
        }
        Ok(program)
    }

    /// Runs a recognizer, restoring the token offset when it fails so that
    /// an alternative can be tried from the same position.
    fn attempt<T>(
        &mut self,
        recognize: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let checkpoint = self.offset;
        let result = recognize(self);
        if result.is_err() {
            self.offset = checkpoint;
        }
        result
    }

    fn is_finished(&self) -> bool {
        self.peek_kind() == TokenKind::EndOfFile
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens
            .get(self.offset)
            .map_or(TokenKind::EndOfFile, |token| token.kind)
    }

    fn consume_token(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let Some(token) = self.tokens.get(self.offset) else {
            return Err(ParseError::UnexpectedEof);
        };
        if token.kind != kind {
            return Err(ParseError::UnexpectedToken {
                expected: kind,
                found: token.kind,
            });
        }
        let token = token.clone();
        self.offset += 1;

        // An ellipsis immediately before an end of line splices the next
        // line into this one. Applying the rewrite here makes continuations
        // available anywhere a single token is consumed.
        if self
            .tokens
            .get(self.offset)
            .is_some_and(|token| token.kind == TokenKind::Ellipsis)
        {
            match self.tokens.get(self.offset + 1) {
                Some(next) if next.kind == TokenKind::EndOfLine => self.offset += 2,
                Some(next) => {
                    return Err(ParseError::UnexpectedToken {
                        expected: TokenKind::EndOfLine,
                        found: next.kind,
                    })
                }
                None => return Err(ParseError::UnexpectedEof),
            }
        }

        Ok(token)
    }

    fn consume_end_of_lines(&mut self) {
        while self.consume_token(TokenKind::EndOfLine).is_ok() {}
    }

    fn consume_word(&mut self) -> Result<String, ParseError> {
        Ok(self.consume_token(TokenKind::Word)?.value)
    }

    fn consume_specific_word(&mut self, expected: &[&str]) -> Result<String, ParseError> {
        self.attempt(|p| {
            let word = p.consume_word()?;
            if expected.contains(&word.as_str()) {
                Ok(word)
            } else {
                Err(ParseError::ExpectedWord {
                    expected: expected.iter().map(|word| word.to_string()).collect(),
                    found: word,
                })
            }
        })
    }

    /// A word is reclassified as a variable reference only if the name is
    /// already in scope. The blackhole `_` is always a variable reference.
    fn consume_sentence_word(
        &mut self,
        vars: &[VariableDefinition],
    ) -> Result<Word, ParseError> {
        self.attempt(|p| {
            if let Ok(token) = p.consume_token(TokenKind::Word) {
                if token.value == BLACKHOLE || vars.iter().any(|v| v.name == token.value) {
                    return Ok(Word::Variable(token.value));
                }
                return Ok(Word::Bare(token.value));
            }
            if let Ok(token) = p.consume_token(TokenKind::Text) {
                return Ok(Word::Text(token.value));
            }
            if let Ok(token) = p.consume_token(TokenKind::Number) {
                // Literal constants keep unlimited precision so that nothing
                // is lost before they are assigned into a destination.
                let number = Number::parse(&token.value, UNLIMITED_PRECISION)?;
                return Ok(Word::Number(number));
            }
            Err(ParseError::ExpectedSentenceWord)
        })
    }

    fn consume_integer(&mut self) -> Result<u32, ParseError> {
        self.attempt(|p| {
            let token = p.consume_token(TokenKind::Number)?;
            token
                .value
                .parse()
                .map_err(|_| InvalidNumberError(token.value.clone()).into())
        })
    }

    /// `number`, or `number with N decimal places`.
    fn consume_number_type(&mut self) -> Result<u32, ParseError> {
        self.attempt(|p| {
            p.consume_specific_word(&[TYPE_NUMBER])?;
            if p.consume_specific_word(&["with"]).is_err() {
                // No explicit precision. That is fine, bail out here.
                return Ok(DEFAULT_PRECISION);
            }
            let precision = p.consume_integer()?;
            p.consume_specific_word(&["decimal"])?;
            // Any number of decimal places may use "places" or "place", but
            // "1 decimal place" reads better.
            p.consume_specific_word(&["places", "place"])?;
            Ok(precision)
        })
    }

    fn consume_type(&mut self) -> Result<(VariableType, u32), ParseError> {
        self.attempt(|p| {
            // The "a" and "an" are optional so that declarations read
            // naturally: "is text", "is a number".
            let _ = p.consume_specific_word(&["a", "an"]);
            if p.consume_specific_word(&[TYPE_TEXT]).is_ok() {
                return Ok((VariableType::Text, 0));
            }
            if let Ok(precision) = p.consume_number_type() {
                return Ok((VariableType::Number, precision));
            }
            Err(ParseError::ExpectedVariableType)
        })
    }

    /// Examples:
    ///
    ///   some-variable is text
    ///   some-variable is a number
    ///   some-variable is a number with 2 decimal places
    fn consume_variable_is_type(&mut self) -> Result<VariableDefinition, ParseError> {
        self.attempt(|p| {
            let name = p.consume_word()?;
            p.consume_specific_word(&["is"])?;
            let (ty, precision) = p.consume_type()?;
            Ok(VariableDefinition {
                name,
                ty,
                local_scope: false,
                precision,
            })
        })
    }

    /// `foo is text, bar is number`
    fn consume_variable_is_type_list(&mut self) -> Result<Vec<VariableDefinition>, ParseError> {
        self.attempt(|p| {
            let mut list = Vec::new();
            while !p.is_finished() {
                list.push(p.consume_variable_is_type()?);
                if p.consume_comma().is_err() {
                    break;
                }
            }
            Ok(list)
        })
    }

    fn consume_comma(&mut self) -> Result<(), ParseError> {
        self.consume_token(TokenKind::Comma)?;
        // A single end of line may follow any comma.
        let _ = self.consume_token(TokenKind::EndOfLine);
        Ok(())
    }

    fn consume_operator(&mut self) -> Result<ComparisonOp, ParseError> {
        self.attempt(|p| {
            let token = p.consume_token(TokenKind::Operator)?;
            ComparisonOp::parse(&token.value).ok_or(ParseError::UnknownOperator {
                operator: token.value,
            })
        })
    }

    fn consume_sentence(&mut self, vars: &[VariableDefinition]) -> Result<Sentence, ParseError> {
        self.attempt(|p| {
            let mut sentence = Sentence::default();
            while let Ok(word) = p.consume_sentence_word(vars) {
                sentence.words.push(word);
            }
            if sentence.words.is_empty() {
                return Err(ParseError::ExpectedSentenceWord);
            }
            Ok(sentence)
        })
    }

    fn consume_sentence_call(
        &mut self,
        vars: &[VariableDefinition],
    ) -> Result<Sentence, ParseError> {
        self.attempt(|p| {
            let sentence = p.consume_sentence(vars)?;
            p.consume_token(TokenKind::EndOfLine)?;
            Ok(sentence)
        })
    }

    fn consume_question_answer(&mut self) -> Result<QuestionAnswer, ParseError> {
        let word = self.consume_specific_word(&[WORD_YES, WORD_NO])?;
        Ok(QuestionAnswer {
            yes: word == WORD_YES,
        })
    }

    fn consume_question_answer_call(&mut self) -> Result<QuestionAnswer, ParseError> {
        self.attempt(|p| {
            let answer = p.consume_question_answer()?;
            p.consume_token(TokenKind::EndOfLine)?;
            Ok(answer)
        })
    }

    fn consume_sentence_or_answer(
        &mut self,
        vars: &[VariableDefinition],
    ) -> Result<SimpleStatement, ParseError> {
        if let Ok(answer) = self.consume_question_answer() {
            return Ok(SimpleStatement::Answer(answer));
        }
        Ok(SimpleStatement::Sentence(self.consume_sentence(vars)?))
    }

    fn consume_sentence_call_or_answer_call(
        &mut self,
        vars: &[VariableDefinition],
    ) -> Result<Statement, ParseError> {
        if let Ok(answer) = self.consume_question_answer_call() {
            return Ok(Statement::Answer(answer));
        }
        Ok(Statement::Sentence(self.consume_sentence_call(vars)?))
    }

    fn consume_condition(&mut self, vars: &[VariableDefinition]) -> Result<Condition, ParseError> {
        self.attempt(|p| {
            let left = p.consume_sentence_word(vars)?;
            let operator = p.consume_operator()?;
            let right = p.consume_sentence_word(vars)?;
            Ok(Condition {
                left,
                operator,
                right,
            })
        })
    }

    fn consume_test(&mut self, vars: &[VariableDefinition]) -> Result<Test, ParseError> {
        if let Ok(condition) = self.consume_condition(vars) {
            return Ok(Test::Condition(condition));
        }
        // Not a comparison, so it must be a question.
        Ok(Test::Question(self.consume_sentence(vars)?))
    }

    fn consume_declare(&mut self) -> Result<VariableDefinition, ParseError> {
        self.attempt(|p| {
            p.consume_specific_word(&[WORD_DECLARE])?;
            let mut definition = p.consume_variable_is_type()?;
            p.consume_token(TokenKind::EndOfLine)?;
            definition.local_scope = true;
            Ok(definition)
        })
    }

    fn consume_if(&mut self, vars: &[VariableDefinition]) -> Result<If, ParseError> {
        self.attempt(|p| {
            let unless = p.consume_specific_word(&[WORD_IF, WORD_UNLESS])? == WORD_UNLESS;
            let test = p.consume_test(vars)?;
            p.consume_comma()?;
            let consequent = p.consume_sentence_or_answer(vars)?;

            // Bail out safely if there is no "otherwise".
            if p.consume_token(TokenKind::EndOfLine).is_ok() {
                return Ok(If {
                    unless,
                    test,
                    consequent,
                    alternate: None,
                });
            }

            p.consume_comma()?;
            p.consume_specific_word(&[WORD_OTHERWISE])?;
            let alternate = p.consume_sentence_or_answer(vars)?;
            p.consume_token(TokenKind::EndOfLine)?;
            Ok(If {
                unless,
                test,
                consequent,
                alternate: Some(alternate),
            })
        })
    }

    fn consume_while(&mut self, vars: &[VariableDefinition]) -> Result<While, ParseError> {
        self.attempt(|p| {
            let until = p.consume_specific_word(&[WORD_WHILE, WORD_UNTIL])? == WORD_UNTIL;
            let test = p.consume_test(vars)?;
            p.consume_comma()?;
            // Loops produce no answer, so the body is a plain sentence.
            let body = p.consume_sentence(vars)?;
            p.consume_token(TokenKind::EndOfLine)?;
            Ok(While { until, test, body })
        })
    }

    fn consume_function(&mut self) -> Result<Function, ParseError> {
        self.attempt(|p| {
            let mut function = p.consume_function_declaration()?;
            while !p.is_finished() {
                if let Ok(definition) = p.consume_declare() {
                    function.variables.push(definition);
                    continue;
                }
                if let Ok(if_stmt) = p.consume_if(&function.variables) {
                    function.statements.push(Statement::If(if_stmt));
                    continue;
                }
                if let Ok(while_stmt) = p.consume_while(&function.variables) {
                    function.statements.push(Statement::While(while_stmt));
                    continue;
                }
                if let Ok(statement) = p.consume_sentence_call_or_answer_call(&function.variables)
                {
                    function.statements.push(statement);
                    continue;
                }
                // Nothing recognizable; the next function header starts here.
                break;
            }
            Ok(function)
        })
    }

    fn consume_function_declaration(&mut self) -> Result<Function, ParseError> {
        self.attempt(|p| {
            let definition = p.consume_sentence(&[])?;
            let mut function = Function {
                definition,
                ..Function::default()
            };

            if p.consume_token(TokenKind::OpenBracket).is_ok() {
                let declared = p.consume_variable_is_type_list()?;
                p.consume_token(TokenKind::CloseBracket)?;

                for word in &mut function.definition.words {
                    let Word::Bare(name) = word else { continue };
                    let name = name.clone();
                    if let Some(definition) = declared.iter().find(|v| v.name == name) {
                        // Arguments take their slots in the order they appear
                        // in the header, not the order they are listed.
                        function.variables.push(definition.clone());
                        *word = Word::Variable(name);
                    }
                }
            }

            if p.consume_token(TokenKind::Question).is_ok() {
                function.is_question = true;
            } else {
                p.consume_token(TokenKind::Colon)?;
            }
            p.consume_end_of_lines();

            Ok(function)
        })
    }
}
