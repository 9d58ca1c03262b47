//! From words to instructions.
//!
//! ```text
//! program     = instruction*
//! instruction = primitive | literal | "[" instruction* "]"
//! ```
//!
//! A bracketed quotation folds the instructions inside it into one
//! [`Instruction::Quote`].

use thicket::grammar::expr::*;
use thicket::{Error, Grammar, GrammarBuilder};

use crate::lexer::Word;

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Push(i64),
    Dup,
    Drop,
    Swap,
    Over,
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Lt,
    Print,
    Call,
    If,
    /// A user word, resolved at run time.
    Word(String),
    Quote(Vec<Instruction>),
}

fn primitives() -> [(Word, Instruction); 13] {
    [
        (Word::Dup, Instruction::Dup),
        (Word::Drop, Instruction::Drop),
        (Word::Swap, Instruction::Swap),
        (Word::Over, Instruction::Over),
        (Word::Add, Instruction::Add),
        (Word::Sub, Instruction::Sub),
        (Word::Mul, Instruction::Mul),
        (Word::Div, Instruction::Div),
        (Word::Eq, Instruction::Eq),
        (Word::Lt, Instruction::Lt),
        (Word::Print, Instruction::Print),
        (Word::Call, Instruction::Call),
        (Word::If, Instruction::If),
    ]
}

pub fn program_grammar() -> Result<Grammar<Word, Instruction>, Error> {
    let mut builder = GrammarBuilder::new();
    let instruction = builder.declare("instruction");

    let reserved = primitives()
        .into_iter()
        .map(|(word, _)| word)
        .chain([Word::Open, Word::Close]);
    let literal = terminal_not(reserved).emit_with(literal_instruction);
    let primitive = disjunction(
        primitives()
            .into_iter()
            .map(|(word, op)| terminal_any([word]).emit(op)),
    );
    let quote = (terminal_any([Word::Open])
        + reference(instruction).many()
        + terminal_any([Word::Close]))
    .capture(Instruction::Quote);

    builder.define(instruction, primitive | literal | quote)?;
    builder.build(reference(instruction).many())
}

fn literal_instruction(words: &[Word]) -> Instruction {
    match words {
        [Word::Int(n)] => Instruction::Push(*n),
        [Word::Name(name)] => Instruction::Word(name.clone()),
        other => Instruction::Word(other.iter().map(Word::to_string).collect()),
    }
}
