//! The VM instruction vocabulary emitted by the compiler.

use std::fmt;

/// A named VM memory region addressed by `push`/`pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    /// The current object's fields.
    This,
    /// The array element window set up through `Pointer` slot 1.
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        };
        write!(f, "{}", name)
    }
}

/// One stack-machine instruction.
///
/// `Display` renders the exact textual form consumed by the downstream
/// assembler/emulator: one instruction per line, tokens space-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Integer addition (binary).
    Add,
    /// Two's complement subtraction (binary).
    Sub,
    /// Two's complement negation (unary).
    Neg,
    /// Equality; leaves 0xFFFF for true, 0x0000 for false.
    Eq,
    /// Greater-than comparison.
    Gt,
    /// Less-than comparison.
    Lt,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise not (unary).
    Not,
    /// Push the value at `segment[index]` onto the stack.
    Push(Segment, u16),
    /// Pop the stack top into `segment[index]`.
    Pop(Segment, u16),
    /// Label the current location; local to the enclosing function.
    Label(String),
    /// Unconditional jump to a label.
    Goto(String),
    /// Pop a value and jump if it is non-zero.
    IfGoto(String),
    /// Function entry point with its local variable count.
    Function { name: String, locals: u16 },
    /// Call a function, `args` values already pushed.
    Call { name: String, args: u16 },
    /// Return the stack top to the caller.
    Return,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Add => write!(f, "add"),
            Instruction::Sub => write!(f, "sub"),
            Instruction::Neg => write!(f, "neg"),
            Instruction::Eq => write!(f, "eq"),
            Instruction::Gt => write!(f, "gt"),
            Instruction::Lt => write!(f, "lt"),
            Instruction::And => write!(f, "and"),
            Instruction::Or => write!(f, "or"),
            Instruction::Not => write!(f, "not"),
            Instruction::Push(segment, index) => write!(f, "push {} {}", segment, index),
            Instruction::Pop(segment, index) => write!(f, "pop {} {}", segment, index),
            Instruction::Label(name) => write!(f, "label {}", name),
            Instruction::Goto(name) => write!(f, "goto {}", name),
            Instruction::IfGoto(name) => write!(f, "if-goto {}", name),
            Instruction::Function { name, locals } => write!(f, "function {} {}", name, locals),
            Instruction::Call { name, args } => write!(f, "call {} {}", name, args),
            Instruction::Return => write!(f, "return"),
        }
    }
}
