//! # OCP runtime
//!
//! This crate defines compiled Omega Computational Process (OCP) programs
//!     and the virtual machine that runs them.
//! An OCP program transforms a character input stream into a character
//!     output stream, one `pattern => action` rule at a time;
//!     it is used for tasks such as encoding conversion and character-level
//!     rewriting in a typesetting pipeline.
//! Programs are usually produced by the `ocp-lang` compiler crate,
//!     but they are plain data and can be built by hand:
//!
//! ```
//! use ocp::op::{self, Op};
//! use ocp::program::{Program, State};
//! use ocp::reader::Reader;
//! use std::rc::Rc;
//!
//! // A program that matches any character and emits it shifted up by one.
//! let mut state = State::default();
//! state.push(Op::LeftStart, 0);
//! state.push(Op::GotoNoAdvance, 9);
//! state.push(Op::PushLchar, 0);
//! state.push(Op::PushNum, 1);
//! state.push(Op::Add, 0);
//! state.push(Op::RightNum, 0);
//! state.push(Op::RightOutput, 0);
//! state.push(Op::Stop, 0);
//! state.push(Op::Stop, 0);
//! state.push(Op::LeftReturn, 0);
//! state.push(Op::Stop, 0);
//! let program = Rc::new(Program {
//!     states: vec![state],
//!     ..Default::default()
//! });
//!
//! let mut reader = Reader::from_str(program, "HAL").unwrap();
//! let mut output = String::new();
//! while let Some(c) = reader.read().unwrap() {
//!     output.push(char::from_u32(c).unwrap());
//! }
//! assert_eq!(output, "IBM");
//! ```
//!
//! The crate has three modules:
//!
//! - [`op`]: the instruction catalog and the packed word format.
//! - [`program`]: the immutable compiled artifact.
//! - [`reader`]: the virtual machine, its error taxonomy, and the
//!   [`Observer`](reader::Observer) tracing hook.

pub mod op;
pub mod program;
pub mod reader;

pub use op::Op;
pub use program::Program;
pub use reader::{Observer, Reader};
