//! Code emission: the instruction vocabulary and the sink the compilation
//! engine writes through.

mod instruction;

pub use self::instruction::{Instruction, Segment};

/// Where accepted instructions go, one at a time.
///
/// The engine is decoupled from the encoding: a different back end can be
/// substituted without touching the parser, and tests capture output in a
/// plain `Vec<Instruction>`.
pub trait CodeSink {
    fn emit(&mut self, instruction: Instruction);
}

impl CodeSink for Vec<Instruction> {
    fn emit(&mut self, instruction: Instruction) {
        self.push(instruction);
    }
}

/// Render instructions as VM text, one per line with a trailing newline.
pub fn render(instructions: &[Instruction]) -> String {
    let mut text = String::new();
    for instruction in instructions {
        text.push_str(&instruction.to_string());
        text.push('\n');
    }
    text
}
