//! Compiled OCP programs.
//!
//! A [`Program`] is produced once by the `ocp-lang` compiler (or built by
//! hand in tests) and never mutated afterwards.
//! Because it is read-only it can back any number of independent
//! [`Reader`](crate::reader::Reader) instances via `Rc` without
//! synchronization.

use crate::op;
use crate::op::{Arity, Op};

/// Default bound on how far the left-context scan may advance within one
/// logical line before the VM raises
/// [`Error::LineOverflow`](crate::reader::Error::LineOverflow).
pub const DEFAULT_SCAN_LIMIT: usize = 1000;

/// A compiled OCP program.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    /// Declared input channel width: how many characters one input unit
    /// spans. Buffering metadata only; instruction semantics ignore it.
    pub input: u32,
    /// Declared output channel width.
    pub output: u32,
    /// The states of the program, addressed by index.
    ///
    /// Execution begins at state 0.
    pub states: Vec<State>,
    /// Lookup tables consulted by [`Op::Lookup`].
    pub tables: Vec<Vec<u32>>,
    /// Maximum left-context scan per logical line.
    pub scan_limit: usize,
}

impl Default for Program {
    fn default() -> Program {
        Program {
            input: 1,
            output: 1,
            states: vec![],
            tables: vec![],
            scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }
}

/// One state of a compiled program: a flat sequence of instruction words.
///
/// Each state corresponds to one `pattern => action` rule of the source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    pub words: Vec<u32>,
}

impl State {
    /// Appends a packed instruction and returns its offset.
    pub fn push(&mut self, op: Op, operand: u32) -> usize {
        let offset = self.words.len();
        self.words.push(op::pack(op, operand));
        offset
    }

    /// Appends a raw word (a codeword, or a placeholder to backpatch)
    /// and returns its offset.
    pub fn push_word(&mut self, word: u32) -> usize {
        let offset = self.words.len();
        self.words.push(word);
        offset
    }
}

impl std::fmt::Display for Program {
    /// Renders a disassembly of the program.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "input: {}; output: {};", self.input, self.output)?;
        for (i, state) in self.states.iter().enumerate() {
            writeln!(f, "state {i}:")?;
            let mut offset = 0;
            while offset < state.words.len() {
                let word = state.words[offset];
                let (raw, operand) = op::unpack(word);
                let Some(op) = Op::from_code(raw) else {
                    writeln!(f, "  {offset:3}  ??? {word:#010x}")?;
                    offset += 1;
                    continue;
                };
                match op.arity() {
                    Arity::Zero => writeln!(f, "  {offset:3}  {}", op.name())?,
                    Arity::One => writeln!(f, "  {offset:3}  {} {operand}", op.name())?,
                    Arity::Two => {
                        let codeword = state.words.get(offset + 1).copied();
                        offset += 1;
                        match codeword {
                            Some(c) => {
                                writeln!(f, "  {offset2:3}  {} {operand}, {c}", op.name(), offset2 = offset - 1)?
                            }
                            None => writeln!(
                                f,
                                "  {offset2:3}  {} {operand}, <missing codeword>",
                                op.name(),
                                offset2 = offset - 1
                            )?,
                        }
                    }
                }
                offset += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disassembly() {
        let mut state = State::default();
        state.push(Op::LeftStart, 0);
        state.push(Op::GotoNe, 0x61);
        state.push_word(6);
        state.push(Op::RightChar, 0x58);
        state.push(Op::RightOutput, 0);
        state.push(Op::Stop, 0);
        state.push(Op::LeftReturn, 0);
        state.push(Op::Stop, 0);
        let program = Program {
            states: vec![state],
            ..Default::default()
        };
        let want = "input: 1; output: 1;
state 0:
    0  LEFT_START
    1  GOTO_NE 97, 6
    3  RIGHT_CHAR 88
    4  RIGHT_OUTPUT
    5  STOP
    6  LEFT_RETURN
    7  STOP
";
        assert_eq!(program.to_string(), want);
    }

    #[test]
    fn disassembly_of_unknown_opcode() {
        let program = Program {
            states: vec![State { words: vec![0] }],
            ..Default::default()
        };
        assert!(program.to_string().contains("???"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let mut state = State::default();
        state.push(Op::RightChar, 65);
        state.push(Op::Stop, 0);
        let program = Program {
            input: 2,
            output: 1,
            states: vec![state],
            tables: vec![vec![1, 2, 3]],
            scan_limit: 50,
        };
        let json = serde_json::to_string(&program).unwrap();
        let got: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(got, program);
    }
}
