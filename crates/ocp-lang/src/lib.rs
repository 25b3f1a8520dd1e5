//! # OCP language
//!
//! This crate compiles Omega Computational Process (OCP) source — a small
//!     pattern-matching language for character-stream rewriting — into the
//!     bytecode programs run by the [`ocp`] crate's virtual machine.
//!
//! An OCP source file has two sections: `key: value;` declarations (the
//!     recognized keys are `input` and `output`, the channel widths) and an
//!     `expressions:` section of `pattern => action;` rules.
//! `%` starts a line comment anywhere.
//!
//! ```
//! use ocp::reader::Reader;
//! use std::rc::Rc;
//!
//! let source = r"
//! % Uppercase the letter a; pass everything else through.
//! input:  1;
//! output: 1;
//! expressions:
//! `a' => `A';
//! .   => \*;
//! ";
//! let program = Rc::new(ocp_lang::compile(source).unwrap());
//!
//! let mut reader = Reader::from_str(program, "aha").unwrap();
//! let mut output = String::new();
//! while let Some(c) = reader.read().unwrap() {
//!     output.push(char::from_u32(c).unwrap());
//! }
//! assert_eq!(output, "AhA");
//! ```
//!
//! ## Patterns and actions
//!
//! A pattern is a sequence of elements, each matching exactly one input
//! character:
//!
//! | Element | Matches |
//! |---------|---------|
//! | `` `c' `` | the character `c` |
//! | `.` | any character |
//! | `#expr`, `\(expr)` | the character whose code the expression evaluates to |
//!
//! An action is a sequence of elements, each appending to the output:
//!
//! | Element | Emits |
//! |---------|-------|
//! | `` `c' `` | the character `c` |
//! | `\*` | the matched input, verbatim |
//! | `#expr`, `\(expr)` | the character whose code the expression evaluates to |
//!
//! Expressions use integers, `` `c' `` character codes, parentheses and the
//! binary operators `+ - * / mod: div:`;
//! `*`, `/`, `mod:` and `div:` bind tighter than `+` and `-`,
//! `/` and `div:` both denote integer division.
//! Pattern expressions are evaluated at compile time;
//! action expressions are compiled to bytecode and evaluated while the
//! program runs.
//!
//! Rules are tried in source order at each input position.

mod convert;
mod error;
pub mod lexer;
pub mod parse;
pub use error::{Error, ErrorLabel};

use std::cell::RefCell;
use std::rc::Rc;

/// Compile OCP source code into a program.
///
/// Compilation is all-or-nothing: either every error in the source is
/// returned, or a complete program is.
pub fn compile(source: &str) -> Result<ocp::Program, Vec<Error<'_>>> {
    let errs: ErrorAccumulator = Default::default();
    let doc = parse::parse(source, errs.clone());
    let program = convert::lower(&doc, &errs);
    errs.check()?;
    Ok(program)
}

/// String type used in error messages.
#[derive(Debug, Clone)]
pub struct Str<'a> {
    value: &'a str,
    start: usize,
    end: usize,
}

impl<'a> Str<'a> {
    fn span(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
    fn str(&self) -> &'a str {
        &self.value[self.span()]
    }
}

impl<'a> From<&'a str> for Str<'a> {
    fn from(value: &'a str) -> Self {
        Str {
            value,
            start: 0,
            end: value.len(),
        }
    }
}

impl<'a> std::fmt::Display for Str<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.str())
    }
}

impl<'a> PartialEq for Str<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.str() == other.str()
    }
}

impl<'a> Eq for Str<'a> {}

/// Shared accumulator that the lexer, parser and lowering write errors to.
#[derive(Clone, Default)]
pub struct ErrorAccumulator<'a> {
    errs: Rc<RefCell<Vec<Error<'a>>>>,
}

impl<'a> ErrorAccumulator<'a> {
    pub fn add(&self, err: Error<'a>) {
        self.errs.borrow_mut().push(err);
    }

    /// Returns every accumulated error, or `Ok` if there are none.
    pub fn check(&self) -> Result<(), Vec<Error<'a>>> {
        let errs = std::mem::take(&mut *self.errs.borrow_mut());
        if errs.is_empty() {
            Ok(())
        } else {
            Err(errs)
        }
    }
}
