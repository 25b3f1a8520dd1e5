//! The OCP virtual machine.
//!
//! A [`Reader`] runs a compiled [`Program`] against a character source and
//! exposes the transformed stream one character per [`Reader::read`] call.
//! All state needed to resume between calls is held in an explicit
//! execution context, so a reader is a resumable coroutine built from
//! ordinary fields.
//!
//! The driver loop works as follows.
//! A match attempt begins at the *search origin*, a position in the buffer
//! of not-yet-committed input characters.
//! States are tried in order; a state signals failure by executing
//! [`Op::Stop`] with the cursor back at the origin, and success by executing
//! it with the cursor advanced.
//! On success the consumed characters are committed (removed from the
//! buffer) and the next attempt starts at state 0.
//! When every state has failed, the origin advances one character, without
//! committing, and the states are retried; input skipped over this way is
//! discarded.
//! If the scan advances more than [`Program::scan_limit`] characters without
//! the output queue being flushed, the input cannot be processed by this
//! program and [`Error::LineOverflow`] is raised.

use crate::op;
use crate::op::{Arity, Op};
use crate::program::Program;
use std::collections::VecDeque;
use std::rc::Rc;

/// A fault raised by the virtual machine.
///
/// All of these are fatal to the reader that raised them: the execution
/// context's validity is no longer guaranteed and the reader must be
/// abandoned.
/// The one partial exception is [`Error::LineOverflow`], which is a property
/// of the input rather than of the program; callers may recover by opening a
/// new reader over input with the offending line skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The program handed to [`Reader::new`] cannot be executed.
    InvalidArgument(InvalidArgument),
    /// A dispatched instruction word does not decode to a catalog entry.
    ///
    /// This signals a corrupt or incompatible program.
    /// A word of 0 with an offset one past the end of a state means the
    /// program counter ran off the end of the state.
    InvalidOpcode {
        word: u32,
        state: usize,
        offset: usize,
    },
    /// An instruction required more operands than the evaluation stack
    /// holds.
    ///
    /// This signals malformed emitted code, not bad input.
    StackUnderflow { op: Op, depth: usize, needed: usize },
    /// A division or remainder instruction executed with a zero divisor.
    DivisionFault { op: Op },
    /// The left-context scan exceeded the compiled maximum before any rule
    /// committed a match.
    LineOverflow { limit: usize, scanned: usize },
}

/// Reasons a program is rejected at reader construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidArgument {
    /// The program declares no states.
    NoStates,
    /// The state with the provided index contains no instructions.
    EmptyState(usize),
}

impl Error {
    pub fn message(&self) -> String {
        match self {
            Error::InvalidArgument(InvalidArgument::NoStates) => {
                "the program declares no states".into()
            }
            Error::InvalidArgument(InvalidArgument::EmptyState(i)) => {
                format!["state {i} of the program contains no instructions"]
            }
            Error::InvalidOpcode {
                word,
                state,
                offset,
            } => {
                format![
                    "invalid instruction word {word:#010x} at state {state} offset {offset}"
                ]
            }
            Error::StackUnderflow { op, depth, needed } => {
                format![
                    "{op} needs {needed} stack operands but only {depth} are present"
                ]
            }
            Error::DivisionFault { op } => format!["{op} with a zero divisor"],
            Error::LineOverflow { limit, scanned } => {
                format![
                    "scanned {scanned} characters without a match; the program allows at most {limit} per line"
                ]
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for Error {}

/// The state a single instruction dispatch is observed in.
///
/// This is the introspection view handed to [`Observer::on_step`]: the
/// decoded instruction, the program counter it sits at, and the evaluation
/// stack at the moment of dispatch.
pub struct Step<'a> {
    pub op: Op,
    pub operand: u32,
    pub state: usize,
    pub offset: usize,
    pub stack: &'a [i64],
}

/// Hook invoked by a [`Reader`] once per executed instruction and once at
/// shutdown.
///
/// Observers exist for tracing and testing; they cannot mutate VM state.
pub trait Observer {
    /// Called before each instruction dispatch.
    fn on_step(&mut self, step: Step<'_>);
    /// Called exactly once, when the reader is closed.
    /// No `on_step` notification follows.
    fn on_close(&mut self);
}

/// Per-reader mutable execution state.
#[derive(Debug, Default)]
struct Context {
    /// Index of the state being attempted.
    state: usize,
    /// Offset of the next instruction word within that state.
    offset: usize,
    /// Fetched input characters that have not been committed.
    left: VecDeque<u32>,
    /// Position in `left` where the current match attempt began.
    start: usize,
    /// Cursor: position in `left` the attempt has advanced to.
    ///
    /// Invariant: `start <= pos <= left.len()`.
    pos: usize,
    /// The evaluation stack.
    stack: Vec<i64>,
    /// Characters produced but not yet delivered through `read()`.
    output: VecDeque<u32>,
    /// Characters fetched from the source since the last output flush.
    scanned: usize,
    /// Input drained, buffer unmatchable: all further reads return
    /// end-of-stream.
    done: bool,
}

/// A pull-based reader running an OCP program over a character source.
///
/// Not safe for concurrent use; share the [`Program`] instead and give each
/// caller its own reader.
pub struct Reader<I> {
    program: Rc<Program>,
    source: Option<I>,
    ctx: Context,
    observers: Vec<Box<dyn Observer>>,
    closed: bool,
}

/// Adapter turning a `&str` into the code-point stream a [`Reader`]
/// consumes.
pub struct CharCodes<'a>(std::str::Chars<'a>);

impl<'a> Iterator for CharCodes<'a> {
    type Item = u32;
    fn next(&mut self) -> Option<u32> {
        self.0.next().map(|c| c as u32)
    }
}

impl<'a> Reader<CharCodes<'a>> {
    /// Opens a reader over a string source.
    pub fn from_str(program: Rc<Program>, source: &'a str) -> Result<Self, Error> {
        Reader::new(program, CharCodes(source.chars()))
    }
}

impl<I: Iterator<Item = u32>> Reader<I> {
    /// Opens a reader.
    ///
    /// The program must declare at least one state and every state must
    /// contain at least one instruction; otherwise
    /// [`Error::InvalidArgument`] is returned.
    pub fn new(program: Rc<Program>, source: I) -> Result<Self, Error> {
        if program.states.is_empty() {
            return Err(Error::InvalidArgument(InvalidArgument::NoStates));
        }
        for (i, state) in program.states.iter().enumerate() {
            if state.words.is_empty() {
                return Err(Error::InvalidArgument(InvalidArgument::EmptyState(i)));
            }
        }
        Ok(Reader {
            program,
            source: Some(source),
            ctx: Context::default(),
            observers: vec![],
            closed: false,
        })
    }

    /// Registers an observer.
    ///
    /// Observers are notified in registration order.
    pub fn register(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    /// Returns the next transformed character, or `None` at end of stream.
    ///
    /// End of stream is idempotent: once returned, every further call
    /// returns it again.
    /// A single call may consume several input characters before producing
    /// one output character, and one matched rule may enqueue several output
    /// characters that are then delivered by several subsequent calls.
    pub fn read(&mut self) -> Result<Option<u32>, Error> {
        if self.closed {
            return Ok(None);
        }
        if let Some(c) = self.ctx.output.pop_front() {
            return Ok(Some(c));
        }
        if self.ctx.done {
            return Ok(None);
        }
        self.run()
    }

    /// Closes the reader, releasing the character source and notifying every
    /// observer once.
    ///
    /// Closing is idempotent: repeated calls do nothing further.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.source = None;
        for observer in &mut self.observers {
            observer.on_close();
        }
    }

    /// The bytecode loop. Returns when output is available or the input is
    /// exhausted.
    fn run(&mut self) -> Result<Option<u32>, Error> {
        loop {
            let words = &self.program.states[self.ctx.state].words;
            let Some(&word) = words.get(self.ctx.offset) else {
                return Err(Error::InvalidOpcode {
                    word: 0,
                    state: self.ctx.state,
                    offset: self.ctx.offset,
                });
            };
            let (raw, operand) = op::unpack(word);
            let Some(op) = Op::from_code(raw) else {
                return Err(Error::InvalidOpcode {
                    word,
                    state: self.ctx.state,
                    offset: self.ctx.offset,
                });
            };
            for observer in &mut self.observers {
                observer.on_step(Step {
                    op,
                    operand,
                    state: self.ctx.state,
                    offset: self.ctx.offset,
                    stack: &self.ctx.stack,
                });
            }
            self.ctx.offset += 1;
            let codeword = match op.arity() {
                Arity::Two => {
                    let words = &self.program.states[self.ctx.state].words;
                    let Some(&codeword) = words.get(self.ctx.offset) else {
                        return Err(Error::InvalidOpcode {
                            word: 0,
                            state: self.ctx.state,
                            offset: self.ctx.offset,
                        });
                    };
                    self.ctx.offset += 1;
                    codeword
                }
                Arity::Zero | Arity::One => 0,
            };
            match op {
                Op::RightOutput => {
                    self.ctx.scanned = 0;
                    if let Some(c) = self.ctx.output.pop_front() {
                        return Ok(Some(c));
                    }
                }
                Op::RightNum => {
                    let value = self.pop1(op)?;
                    self.ctx.output.push_back(value as u32);
                }
                Op::RightChar => self.ctx.output.push_back(operand),
                Op::RightSome => {
                    let from = self.ctx.start + operand as usize;
                    let to = self.ctx.pos.saturating_sub(codeword as usize);
                    for i in from..to {
                        let c = self.ctx.left[i];
                        self.ctx.output.push_back(c);
                    }
                }
                Op::Add => {
                    let (a, b) = self.pop2(op)?;
                    self.ctx.stack.push(a.wrapping_add(b));
                }
                Op::Sub => {
                    let (a, b) = self.pop2(op)?;
                    self.ctx.stack.push(a.wrapping_sub(b));
                }
                Op::Mult => {
                    let (a, b) = self.pop2(op)?;
                    self.ctx.stack.push(a.wrapping_mul(b));
                }
                Op::Div | Op::Mod => {
                    let (a, b) = self.pop2(op)?;
                    if b == 0 {
                        return Err(Error::DivisionFault { op });
                    }
                    self.ctx
                        .stack
                        .push(if op == Op::Div { a / b } else { a % b });
                }
                Op::Lookup => {
                    let key = self.pop1(op)?;
                    let value = usize::try_from(key)
                        .ok()
                        .and_then(|key| {
                            self.program.tables.get(operand as usize)?.get(key).copied()
                        })
                        .unwrap_or(0);
                    self.ctx.stack.push(value as i64);
                }
                Op::PushNum => self.ctx.stack.push(operand as i64),
                Op::PushLchar => {
                    let index = self.ctx.start + operand as usize;
                    let value = self.char_at(index)?.unwrap_or(0);
                    self.ctx.stack.push(value as i64);
                }
                Op::LeftStart | Op::LeftReturn => self.ctx.pos = self.ctx.start,
                Op::LeftBackup => {
                    if self.ctx.pos > self.ctx.start {
                        self.ctx.pos -= 1;
                    }
                }
                Op::Goto => self.ctx.offset = operand as usize,
                Op::GotoNoAdvance => match self.char_at(self.ctx.pos)? {
                    Some(_) => self.ctx.pos += 1,
                    None => self.ctx.offset = operand as usize,
                },
                Op::GotoNe
                | Op::GotoEq
                | Op::GotoLt
                | Op::GotoLe
                | Op::GotoGt
                | Op::GotoGe => {
                    let jump = match self.char_at(self.ctx.pos)? {
                        None => true,
                        Some(c) => match op {
                            Op::GotoNe => c != operand,
                            Op::GotoEq => c == operand,
                            Op::GotoLt => c < operand,
                            Op::GotoLe => c <= operand,
                            Op::GotoGt => c > operand,
                            Op::GotoGe => c >= operand,
                            _ => unreachable!(),
                        },
                    };
                    if jump {
                        self.ctx.offset = codeword as usize;
                    } else {
                        self.ctx.pos += 1;
                    }
                }
                Op::Stop => {
                    if self.ctx.pos > self.ctx.start {
                        // The rule matched: commit, discarding any skipped
                        // prefix before the origin.
                        self.ctx.left.drain(..self.ctx.pos);
                        self.ctx.start = 0;
                        self.ctx.pos = 0;
                        self.ctx.state = 0;
                        self.ctx.offset = 0;
                    } else {
                        self.ctx.state += 1;
                        if self.ctx.state < self.program.states.len() {
                            self.ctx.offset = 0;
                            self.ctx.pos = self.ctx.start;
                        } else if self.char_at(self.ctx.start)?.is_some() {
                            // Every state failed here: re-arm one position
                            // further along, without committing.
                            self.ctx.start += 1;
                            self.ctx.pos = self.ctx.start;
                            self.ctx.state = 0;
                            self.ctx.offset = 0;
                        } else {
                            self.ctx.done = true;
                            return Ok(self.ctx.output.pop_front());
                        }
                    }
                }
            }
        }
    }

    /// Returns the left-buffer character at `index`, fetching lookahead from
    /// the source as needed.
    ///
    /// `Ok(None)` means the source cannot supply that many characters.
    fn char_at(&mut self, index: usize) -> Result<Option<u32>, Error> {
        while self.ctx.left.len() <= index {
            let Some(source) = self.source.as_mut() else {
                return Ok(None);
            };
            let Some(c) = source.next() else {
                self.source = None;
                return Ok(None);
            };
            if self.ctx.scanned >= self.program.scan_limit {
                return Err(Error::LineOverflow {
                    limit: self.program.scan_limit,
                    scanned: self.ctx.scanned + 1,
                });
            }
            self.ctx.scanned += 1;
            self.ctx.left.push_back(c);
        }
        Ok(Some(self.ctx.left[index]))
    }

    fn pop1(&mut self, op: Op) -> Result<i64, Error> {
        let depth = self.ctx.stack.len();
        match self.ctx.stack.pop() {
            Some(value) => Ok(value),
            None => Err(Error::StackUnderflow {
                op,
                depth,
                needed: 1,
            }),
        }
    }

    fn pop2(&mut self, op: Op) -> Result<(i64, i64), Error> {
        let depth = self.ctx.stack.len();
        match (self.ctx.stack.pop(), self.ctx.stack.pop()) {
            (Some(b), Some(a)) => Ok((a, b)),
            _ => Err(Error::StackUnderflow {
                op,
                depth,
                needed: 2,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::State;

    /// Builds a single-state program from (op, operand) pairs, with
    /// codewords spliced in from the `words` argument directly.
    fn program(words: Vec<u32>) -> Rc<Program> {
        Rc::new(Program {
            states: vec![State { words }],
            ..Default::default()
        })
    }

    /// The compiled form of `. => \*;`: copy one character per cycle.
    fn copy_program() -> Rc<Program> {
        program(vec![
            op::pack(Op::LeftStart, 0),
            op::pack(Op::GotoNoAdvance, 7),
            op::pack(Op::RightSome, 0),
            0, // codeword
            op::pack(Op::RightOutput, 0),
            op::pack(Op::Stop, 0),
            op::pack(Op::Stop, 0), // unreachable padding
            op::pack(Op::LeftReturn, 0),
            op::pack(Op::Stop, 0),
        ])
    }

    fn read_all<I: Iterator<Item = u32>>(reader: &mut Reader<I>) -> Result<Vec<u32>, Error> {
        let mut v = vec![];
        while let Some(c) = reader.read()? {
            v.push(c);
        }
        Ok(v)
    }

    #[test]
    fn copy_round_trips_input() {
        let mut reader = Reader::from_str(copy_program(), "ab").unwrap();
        assert_eq!(read_all(&mut reader), Ok(vec![0x61, 0x62]));
    }

    #[test]
    fn end_of_stream_is_idempotent() {
        let mut reader = Reader::from_str(copy_program(), "").unwrap();
        assert_eq!(reader.read(), Ok(None));
        assert_eq!(reader.read(), Ok(None));
    }

    #[test]
    fn close_is_idempotent() {
        let mut reader = Reader::from_str(copy_program(), "ab").unwrap();
        reader.close();
        reader.close();
        assert_eq!(reader.read(), Ok(None));
    }

    #[test]
    fn unknown_opcode_faults_before_any_input_is_consumed() {
        let mut reader = Reader::from_str(program(vec![0x3f << op::OPCODE_OFFSET]), "ab").unwrap();
        assert_eq!(
            reader.read(),
            Err(Error::InvalidOpcode {
                word: 0x3f << op::OPCODE_OFFSET,
                state: 0,
                offset: 0,
            })
        );
    }

    #[test]
    fn running_off_the_end_of_a_state_faults() {
        let mut reader =
            Reader::from_str(program(vec![op::pack(Op::LeftStart, 0)]), "a").unwrap();
        assert_eq!(
            reader.read(),
            Err(Error::InvalidOpcode {
                word: 0,
                state: 0,
                offset: 1,
            })
        );
    }

    #[test]
    fn arithmetic_with_empty_stack_underflows() {
        let mut reader = Reader::from_str(program(vec![op::pack(Op::Add, 0)]), "a").unwrap();
        assert_eq!(
            reader.read(),
            Err(Error::StackUnderflow {
                op: Op::Add,
                depth: 0,
                needed: 2,
            })
        );
    }

    #[test]
    fn lookup_with_empty_stack_underflows() {
        let mut reader = Reader::from_str(program(vec![op::pack(Op::Lookup, 0)]), "a").unwrap();
        assert_eq!(
            reader.read(),
            Err(Error::StackUnderflow {
                op: Op::Lookup,
                depth: 0,
                needed: 1,
            })
        );
    }

    #[test]
    fn lookup_consults_the_selected_table() {
        let mut p = Program {
            states: vec![State::default()],
            tables: vec![vec![7, 8, 9]],
            ..Default::default()
        };
        let state = &mut p.states[0];
        state.push(Op::PushNum, 2);
        state.push(Op::Lookup, 0);
        state.push(Op::RightNum, 0);
        state.push(Op::RightOutput, 0);
        let mut reader = Reader::from_str(Rc::new(p), "").unwrap();
        assert_eq!(reader.read(), Ok(Some(9)));
    }

    #[test]
    fn lookup_out_of_range_key_pushes_zero() {
        let mut p = Program {
            states: vec![State::default()],
            tables: vec![vec![7]],
            ..Default::default()
        };
        let state = &mut p.states[0];
        state.push(Op::PushNum, 100);
        state.push(Op::Lookup, 0);
        state.push(Op::RightNum, 0);
        state.push(Op::RightOutput, 0);
        let mut reader = Reader::from_str(Rc::new(p), "").unwrap();
        assert_eq!(reader.read(), Ok(Some(0)));
    }

    #[test]
    fn division_by_zero_faults() {
        let mut p = Program {
            states: vec![State::default()],
            ..Default::default()
        };
        let state = &mut p.states[0];
        state.push(Op::PushNum, 12);
        state.push(Op::PushNum, 0);
        state.push(Op::Div, 0);
        let mut reader = Reader::from_str(Rc::new(p), "").unwrap();
        assert_eq!(reader.read(), Err(Error::DivisionFault { op: Op::Div }));
    }

    #[test]
    fn comparison_jumps_exercise_every_relation() {
        // For each relation, a program that matches iff the relation holds
        // between the input char and `5`, and outputs 1 on match.
        let cases: Vec<(Op, u32, bool)> = vec![
            (Op::GotoEq, 5, false), // jump on equality: input 5 fails
            (Op::GotoEq, 6, true),
            (Op::GotoLt, 4, false),
            (Op::GotoLt, 5, true),
            (Op::GotoLe, 5, false),
            (Op::GotoLe, 6, true),
            (Op::GotoGt, 6, false),
            (Op::GotoGt, 5, true),
            (Op::GotoGe, 5, false),
            (Op::GotoGe, 4, true),
        ];
        for (op, input, matches) in cases {
            let mut state = State::default();
            state.push(Op::LeftStart, 0);
            state.push(op, 5);
            state.push_word(6);
            state.push(Op::RightChar, 1);
            state.push(Op::RightOutput, 0);
            state.push(Op::Stop, 0);
            state.push(Op::LeftReturn, 0);
            state.push(Op::Stop, 0);
            let p = Rc::new(Program {
                states: vec![state],
                ..Default::default()
            });
            let mut reader = Reader::new(p, std::iter::once(input)).unwrap();
            let want = if matches { Ok(Some(1)) } else { Ok(None) };
            assert_eq!(reader.read(), want, "{op} over {input}");
        }
    }

    #[test]
    fn left_backup_clamps_at_the_cut_point() {
        let mut state = State::default();
        state.push(Op::LeftStart, 0);
        state.push(Op::LeftBackup, 0); // cursor already at the origin
        state.push(Op::GotoNoAdvance, 6);
        state.push(Op::LeftBackup, 0); // undoes the advance
        state.push(Op::GotoNoAdvance, 6);
        state.push(Op::RightSome, 0);
        state.push_word(0);
        state.push(Op::RightOutput, 0);
        state.push(Op::Stop, 0);
        let p = Rc::new(Program {
            states: vec![state],
            ..Default::default()
        });
        let mut reader = Reader::from_str(p, "ab").unwrap();
        // The backup re-reads 'a', so the match is just "a".
        assert_eq!(reader.read(), Ok(Some(0x61)));
    }

    #[test]
    fn push_lchar_reads_ahead_without_consuming() {
        // Matches one char, outputs the *next* char then the matched one.
        let mut state = State::default();
        state.push(Op::LeftStart, 0);
        state.push(Op::GotoNoAdvance, 8);
        state.push(Op::PushLchar, 1);
        state.push(Op::RightNum, 0);
        state.push(Op::RightSome, 0);
        state.push_word(0);
        state.push(Op::RightOutput, 0);
        state.push(Op::Stop, 0);
        state.push(Op::LeftReturn, 0);
        state.push(Op::Stop, 0);
        let p = Rc::new(Program {
            states: vec![state],
            ..Default::default()
        });
        let mut reader = Reader::from_str(p, "ab").unwrap();
        assert_eq!(reader.read(), Ok(Some(0x62)));
        assert_eq!(reader.read(), Ok(Some(0x61)));
        // 'b' itself is still unconsumed and now matches.
        assert_eq!(reader.read(), Ok(Some(0)));
        assert_eq!(reader.read(), Ok(Some(0x62)));
        assert_eq!(reader.read(), Ok(None));
    }

    #[test]
    fn line_overflow_when_no_rule_can_match() {
        // Only matches 'a'; the input is all 'b's.
        let mut state = State::default();
        state.push(Op::LeftStart, 0);
        state.push(Op::GotoNe, 0x61);
        state.push_word(6);
        state.push(Op::RightChar, 0x58);
        state.push(Op::RightOutput, 0);
        state.push(Op::Stop, 0);
        state.push(Op::LeftReturn, 0);
        state.push(Op::Stop, 0);
        let p = Rc::new(Program {
            states: vec![state],
            scan_limit: 4,
            ..Default::default()
        });
        let mut reader = Reader::from_str(p, "bbbbbbbb").unwrap();
        assert_eq!(
            reader.read(),
            Err(Error::LineOverflow {
                limit: 4,
                scanned: 5,
            })
        );
    }

    #[test]
    fn invalid_programs_are_rejected_at_construction() {
        let p = Rc::new(Program::default());
        match Reader::from_str(p, "") {
            Err(Error::InvalidArgument(InvalidArgument::NoStates)) => {}
            other => panic!("expected InvalidArgument, got {:?}", other.err()),
        }
        let p = Rc::new(Program {
            states: vec![State::default()],
            ..Default::default()
        });
        match Reader::from_str(p, "") {
            Err(Error::InvalidArgument(InvalidArgument::EmptyState(0))) => {}
            other => panic!("expected InvalidArgument, got {:?}", other.err()),
        }
    }

    #[test]
    fn one_program_backs_many_readers() {
        let p = copy_program();
        let mut r1 = Reader::from_str(p.clone(), "ab").unwrap();
        let mut r2 = Reader::from_str(p, "cd").unwrap();
        assert_eq!(r1.read(), Ok(Some(0x61)));
        assert_eq!(r2.read(), Ok(Some(0x63)));
        assert_eq!(r1.read(), Ok(Some(0x62)));
        assert_eq!(r2.read(), Ok(Some(0x64)));
    }

    #[derive(Default)]
    struct Recorder {
        steps: std::rc::Rc<std::cell::RefCell<Vec<&'static str>>>,
    }

    impl Observer for Recorder {
        fn on_step(&mut self, step: Step<'_>) {
            self.steps.borrow_mut().push(step.op.name());
        }
        fn on_close(&mut self) {
            self.steps.borrow_mut().push("<close>");
        }
    }

    #[test]
    fn observer_sees_every_dispatch_and_one_close() {
        let steps: std::rc::Rc<std::cell::RefCell<Vec<&'static str>>> = Default::default();
        let mut reader = Reader::from_str(copy_program(), "a").unwrap();
        reader.register(Box::new(Recorder {
            steps: steps.clone(),
        }));
        assert_eq!(reader.read(), Ok(Some(0x61)));
        assert_eq!(reader.read(), Ok(None));
        reader.close();
        reader.close();
        let want = vec![
            // First read: match 'a', copy it, yield.
            "LEFT_START",
            "GOTO_NO_ADVANCE",
            "RIGHT_SOME",
            "RIGHT_OUTPUT",
            // Second read: resume at STOP, commit, fail on empty input.
            "STOP",
            "LEFT_START",
            "GOTO_NO_ADVANCE",
            "LEFT_RETURN",
            "STOP",
            // Close notifies exactly once.
            "<close>",
        ];
        assert_eq!(*steps.borrow(), want);
    }
}
