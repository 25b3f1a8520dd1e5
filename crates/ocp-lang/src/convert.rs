//! Lowering from the parse tree to bytecode.

use crate::parse::{ActionElem, BinaryOp, Document, Expr, PatternElem, Rule};
use crate::Error;
use crate::ErrorAccumulator;
use ocp::op::{Op, OPERAND_MASK};
use ocp::program::{Program, State};

/// Lowers a document to a program, one state per rule.
///
/// Lowering never aborts; on error it reports to the accumulator and emits a
/// placeholder so the remaining rules are still checked.
pub fn lower<'a>(doc: &Document<'a>, errs: &ErrorAccumulator<'a>) -> Program {
    let mut program = Program::default();
    if let Some(decl) = &doc.input {
        program.input = decl.value;
    }
    if let Some(decl) = &doc.output {
        program.output = decl.value;
    }
    for rule in &doc.rules {
        program.states.push(lower_rule(rule, errs));
    }
    program
}

/// An instruction slot whose jump target is filled in once the failure
/// offset of the state is known.
enum Patch {
    /// The target is or-ed into the operand bits of the word.
    Operand(usize),
    /// The target overwrites the whole word.
    Codeword(usize),
}

fn lower_rule<'a>(rule: &Rule<'a>, errs: &ErrorAccumulator<'a>) -> State {
    let mut state = State::default();
    let mut patches = vec![];
    state.push(Op::LeftStart, 0);
    for elem in &rule.pattern {
        match elem {
            PatternElem::Char { value, .. } => {
                state.push(Op::GotoNe, *value);
                patches.push(Patch::Codeword(state.push_word(0)));
            }
            PatternElem::Wildcard { .. } => {
                patches.push(Patch::Operand(state.push(Op::GotoNoAdvance, 0)));
            }
            PatternElem::Expr(expr) => {
                let value = fold(expr, errs);
                let value = match u32::try_from(value) {
                    Ok(value) if value <= OPERAND_MASK => value,
                    _ => {
                        errs.add(Error::OperandOutOfRange {
                            value,
                            source: expr.source(),
                        });
                        0
                    }
                };
                state.push(Op::GotoNe, value);
                patches.push(Patch::Codeword(state.push_word(0)));
            }
        }
    }
    for elem in &rule.action {
        match elem {
            ActionElem::Char { value, .. } => {
                state.push(Op::RightChar, *value);
            }
            ActionElem::CopyMatch { .. } => {
                state.push(Op::RightSome, 0);
                state.push_word(0);
            }
            ActionElem::Expr(expr) => {
                emit_expr(expr, &mut state, errs);
                state.push(Op::RightNum, 0);
            }
        }
    }
    state.push(Op::RightOutput, 0);
    state.push(Op::Stop, 0);
    let fail = state.words.len() as u32;
    state.push(Op::LeftReturn, 0);
    state.push(Op::Stop, 0);
    for patch in patches {
        match patch {
            Patch::Operand(offset) => state.words[offset] |= fail,
            Patch::Codeword(offset) => state.words[offset] = fail,
        }
    }
    state
}

/// Evaluates a pattern expression at compile time.
///
/// Arithmetic wraps, matching what the emitted bytecode for the same
/// expression in an action would compute.
fn fold<'a>(expr: &Expr<'a>, errs: &ErrorAccumulator<'a>) -> i64 {
    match expr {
        Expr::Num { value, .. } | Expr::Char { value, .. } => *value as i64,
        Expr::Binary {
            op,
            op_source,
            lhs,
            rhs,
        } => {
            let lhs = fold(lhs, errs);
            let rhs = fold(rhs, errs);
            match op {
                BinaryOp::Add => lhs.wrapping_add(rhs),
                BinaryOp::Sub => lhs.wrapping_sub(rhs),
                BinaryOp::Mul => lhs.wrapping_mul(rhs),
                BinaryOp::Div | BinaryOp::Mod => {
                    if rhs == 0 {
                        errs.add(Error::ConstantDivisionByZero {
                            op: op_source.clone(),
                        });
                        return 0;
                    }
                    if *op == BinaryOp::Div {
                        lhs.wrapping_div(rhs)
                    } else {
                        lhs.wrapping_rem(rhs)
                    }
                }
            }
        }
    }
}

/// Emits bytecode that evaluates an action expression on the stack.
fn emit_expr<'a>(expr: &Expr<'a>, state: &mut State, errs: &ErrorAccumulator<'a>) {
    match expr {
        Expr::Num { value, source } => {
            let value = if *value <= OPERAND_MASK {
                *value
            } else {
                errs.add(Error::OperandOutOfRange {
                    value: *value as i64,
                    source: source.clone(),
                });
                0
            };
            state.push(Op::PushNum, value);
        }
        Expr::Char { value, .. } => {
            state.push(Op::PushNum, *value);
        }
        Expr::Binary { op, lhs, rhs, .. } => {
            emit_expr(lhs, state, errs);
            emit_expr(rhs, state, errs);
            let op = match op {
                BinaryOp::Add => Op::Add,
                BinaryOp::Sub => Op::Sub,
                BinaryOp::Mul => Op::Mult,
                BinaryOp::Div => Op::Div,
                BinaryOp::Mod => Op::Mod,
            };
            state.push(op, 0);
        }
    }
}
