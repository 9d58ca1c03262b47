//! Words of the language.

use core::fmt;

use logos::Logos;
use thiserror::Error;

#[derive(Error, Debug, Clone, Default, PartialEq)]
pub enum LexError {
    #[default]
    #[error("unrecognised input")]
    Unknown,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip(r"#[^\n]*", allow_greedy = true))]
pub enum Word {
    #[token("[")]
    Open,
    #[token("]")]
    Close,

    #[token("dup")]
    Dup,
    #[token("drop")]
    Drop,
    #[token("swap")]
    Swap,
    #[token("over")]
    Over,
    #[token("+")]
    Add,
    #[token("-")]
    Sub,
    #[token("*")]
    Mul,
    #[token("/")]
    Div,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(".")]
    Print,
    #[token("call")]
    Call,
    #[token("if")]
    If,

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse().ok())]
    Int(i64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_\-?!]*", |lex| lex.slice().to_owned())]
    Name(String),
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Word::Open => write!(f, "["),
            Word::Close => write!(f, "]"),
            Word::Dup => write!(f, "dup"),
            Word::Drop => write!(f, "drop"),
            Word::Swap => write!(f, "swap"),
            Word::Over => write!(f, "over"),
            Word::Add => write!(f, "+"),
            Word::Sub => write!(f, "-"),
            Word::Mul => write!(f, "*"),
            Word::Div => write!(f, "/"),
            Word::Eq => write!(f, "="),
            Word::Lt => write!(f, "<"),
            Word::Print => write!(f, "."),
            Word::Call => write!(f, "call"),
            Word::If => write!(f, "if"),
            Word::Int(n) => write!(f, "{n}"),
            Word::Name(name) => write!(f, "{name}"),
        }
    }
}
