use crate::compiler::Kind;

use std::fmt;

pub type Index = i32;
pub type N = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl From<Kind> for Segment {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Argument => Segment::Argument,
            Kind::Local => Segment::Local,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[rustfmt::skip]
        let mnemonic = match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local    => "local",
            Segment::Static   => "static",
            Segment::This     => "this",
            Segment::That     => "that",
            Segment::Pointer  => "pointer",
            Segment::Temp     => "temp",
        };

        write!(f, "{}", mnemonic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for Arithmetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[rustfmt::skip]
        let mnemonic = match self {
            Arithmetic::Add => "add",
            Arithmetic::Sub => "sub",
            Arithmetic::Neg => "neg",
            Arithmetic::Eq  => "eq",
            Arithmetic::Gt  => "gt",
            Arithmetic::Lt  => "lt",
            Arithmetic::And => "and",
            Arithmetic::Or  => "or",
            Arithmetic::Not => "not",
        };

        write!(f, "{}", mnemonic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Memory Access
    Push(Segment, Index),
    Pop(Segment, Index),

    // Arithmetic and Logic
    Arithmetic(Arithmetic),

    // Branching
    Label(String),
    Goto(String),
    IfGoto(String),

    // Functions
    Call(String, N),
    Function(String, N),
    Return,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Push(segment, index) => write!(f, "push {} {}", segment, index),
            Command::Pop(segment, index) => write!(f, "pop {} {}", segment, index),
            Command::Arithmetic(op) => write!(f, "{}", op),
            Command::Label(label) => write!(f, "label {}", label),
            Command::Goto(label) => write!(f, "goto {}", label),
            Command::IfGoto(label) => write!(f, "if-goto {}", label),
            Command::Call(name, args) => write!(f, "call {} {}", name, args),
            Command::Function(name, locals) => write!(f, "function {} {}", name, locals),
            Command::Return => write!(f, "return"),
        }
    }
}
