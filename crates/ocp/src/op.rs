//! The OCP instruction catalog.
//!
//! Every instruction in a compiled OCP program is a single [`u32`] word.
//! The opcode lives in the bits at and above [`OPCODE_OFFSET`] and the
//!     immediate operand in the bits below it.
//! Instructions whose [arity](Op::arity) is [`Arity::Two`] are followed by a
//!     second full-width word, the codeword, which carries an additional
//!     literal or jump target.
//!
//! Numeric opcodes start at 1, so an all-zero word never decodes to a valid
//! instruction.

/// Bit position that splits an instruction word into opcode and operand.
pub const OPCODE_OFFSET: u32 = 24;

/// Mask selecting the operand bits of an instruction word.
pub const OPERAND_MASK: u32 = (1 << OPCODE_OFFSET) - 1;

/// Number of operands attached to an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    /// The operand bits of the instruction word are unused.
    Zero,
    /// The operand is carried in the low bits of the instruction word.
    One,
    /// The operand is carried in the instruction word and a codeword follows.
    Two,
}

/// An instruction in the OCP virtual machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    /// Flush the output queue to the caller of `read()`.
    ///
    /// This is the only instruction that yields control back to the caller.
    /// It also resets the left-context scan counter.
    RightOutput,
    /// Pop the top of the stack and append it to the output queue.
    RightNum,
    /// Append the operand to the output queue.
    RightChar,
    /// Append a slice of the matched input to the output queue.
    ///
    /// The operand is an offset from the start of the match;
    /// the codeword is the number of characters to drop from its end.
    RightSome,
    /// Pop b, pop a, push a+b.
    Add,
    /// Pop b, pop a, push a-b.
    Sub,
    /// Pop b, pop a, push a*b.
    Mult,
    /// Pop b, pop a, push a/b. A zero divisor is a division fault.
    Div,
    /// Pop b, pop a, push a%b. A zero divisor is a division fault.
    Mod,
    /// Pop a key and push the corresponding entry of the lookup table
    /// selected by the operand.
    Lookup,
    /// Push the operand.
    PushNum,
    /// Push the left-context character that is `operand` positions after the
    /// start of the current match, without moving the cursor.
    PushLchar,
    /// Arm a match attempt: move the cursor back to the search origin.
    LeftStart,
    /// Abandon the current match attempt: move the cursor back to the search
    /// origin.
    LeftReturn,
    /// Move the cursor back one character, clamped at the search origin.
    LeftBackup,
    /// Jump to the operand offset in the current state.
    Goto,
    /// Advance the cursor over the next input character, or jump to the
    /// operand offset if no character is available.
    GotoNoAdvance,
    /// Jump to the codeword offset if the next input character differs from
    /// the operand (or is unavailable); otherwise advance over it.
    GotoNe,
    /// Like [`Op::GotoNe`] with relation `==`.
    GotoEq,
    /// Like [`Op::GotoNe`] with relation `<`.
    GotoLt,
    /// Like [`Op::GotoNe`] with relation `<=`.
    GotoLe,
    /// Like [`Op::GotoNe`] with relation `>`.
    GotoGt,
    /// Like [`Op::GotoNe`] with relation `>=`.
    GotoGe,
    /// End the current rule attempt.
    ///
    /// If the cursor advanced past the search origin the match is committed;
    /// otherwise the VM moves on to the next state, or to the next input
    /// position once every state has failed.
    Stop,
}

macro_rules! catalog {
    ( $( ($variant: ident, $code: expr, $arity: ident, $name: expr), )+ ) => {
        impl Op {
            /// Every instruction in the catalog, ordered by numeric code.
            pub const ALL: &'static [Op] = &[ $( Op::$variant, )+ ];

            /// Returns the instruction with the provided numeric code, if any.
            pub fn from_code(code: u32) -> Option<Op> {
                match code {
                    $( $code => Some(Op::$variant), )+
                    _ => None,
                }
            }

            /// Returns the numeric code of this instruction.
            pub fn code(self) -> u32 {
                match self {
                    $( Op::$variant => $code, )+
                }
            }

            /// Returns the number of operands this instruction carries.
            pub fn arity(self) -> Arity {
                match self {
                    $( Op::$variant => Arity::$arity, )+
                }
            }

            /// Returns the canonical name of this instruction.
            pub fn name(self) -> &'static str {
                match self {
                    $( Op::$variant => $name, )+
                }
            }
        }
    };
}

catalog![
    (RightOutput, 1, Zero, "RIGHT_OUTPUT"),
    (RightNum, 2, Zero, "RIGHT_NUM"),
    (RightChar, 3, One, "RIGHT_CHAR"),
    (RightSome, 4, Two, "RIGHT_SOME"),
    (Add, 5, Zero, "ADD"),
    (Sub, 6, Zero, "SUB"),
    (Mult, 7, Zero, "MULT"),
    (Div, 8, Zero, "DIV"),
    (Mod, 9, Zero, "MOD"),
    (Lookup, 10, One, "LOOKUP"),
    (PushNum, 11, One, "PUSH_NUM"),
    (PushLchar, 12, One, "PUSH_LCHAR"),
    (LeftStart, 13, Zero, "LEFT_START"),
    (LeftReturn, 14, Zero, "LEFT_RETURN"),
    (LeftBackup, 15, Zero, "LEFT_BACKUP"),
    (Goto, 16, One, "GOTO"),
    (GotoNoAdvance, 17, One, "GOTO_NO_ADVANCE"),
    (GotoNe, 18, Two, "GOTO_NE"),
    (GotoEq, 19, Two, "GOTO_EQ"),
    (GotoLt, 20, Two, "GOTO_LT"),
    (GotoLe, 21, Two, "GOTO_LE"),
    (GotoGt, 22, Two, "GOTO_GT"),
    (GotoGe, 23, Two, "GOTO_GE"),
    (Stop, 24, Zero, "STOP"),
];

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Packs an instruction and its immediate operand into a word.
///
/// The operand must fit in the low [`OPCODE_OFFSET`] bits; excess bits are
/// discarded.
pub fn pack(op: Op, operand: u32) -> u32 {
    (op.code() << OPCODE_OFFSET) | (operand & OPERAND_MASK)
}

/// Splits a word into its raw opcode and its immediate operand.
///
/// The raw opcode is not checked against the catalog; dispatching an unknown
/// value is the VM's invalid-opcode fault.
pub fn unpack(word: u32) -> (u32, u32) {
    (word >> OPCODE_OFFSET, word & OPERAND_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for &op in Op::ALL {
            assert_eq!(Op::from_code(op.code()), Some(op));
        }
    }

    #[test]
    fn codes_are_dense_and_start_at_one() {
        for (i, &op) in Op::ALL.iter().enumerate() {
            assert_eq!(op.code() as usize, i + 1);
        }
        assert_eq!(Op::from_code(0), None);
        assert_eq!(Op::from_code(Op::ALL.len() as u32 + 1), None);
    }

    #[test]
    fn pack_unpack() {
        let word = pack(Op::GotoNe, 0x61);
        assert_eq!(word, (18 << 24) | 0x61);
        assert_eq!(unpack(word), (18, 0x61));
    }

    #[test]
    fn pack_discards_excess_operand_bits() {
        let word = pack(Op::PushNum, u32::MAX);
        assert_eq!(unpack(word), (Op::PushNum.code(), OPERAND_MASK));
    }
}
