//! Lexer and tokens for the OCP language.

use super::Str;
use crate::Error;
use crate::ErrorAccumulator;

/// OCP language lexer.
///
/// Invalid input is reported to the error accumulator and skipped, so the
/// token stream itself is always well-formed.
pub struct Lexer<'a> {
    /// The full source file being lexed.
    s: &'a str,
    /// Position of the next character to lex.
    pos: usize,
    /// Error accumulator.
    errs: ErrorAccumulator<'a>,
}

/// A token in the OCP language.
#[derive(Clone, Debug)]
pub struct Token<'a> {
    pub value: TokenValue,
    pub source: Str<'a>,
}

/// Value of a token in the OCP language.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenValue {
    /// A declaration key or section name; the text is in the token source.
    Ident,
    Colon,
    Semicolon,
    /// The `.` wildcard.
    Dot,
    /// The `=>` separating a pattern from its action.
    Arrow,
    Plus,
    Minus,
    Star,
    Slash,
    /// The `mod:` operator.
    ModOp,
    /// The `div:` operator.
    DivOp,
    /// The `#` introducing an expression.
    Hash,
    LParen,
    RParen,
    /// The `\*` copy-matched-input action.
    CopyMatch,
    /// The `\(` opening an embedded expression.
    ExprOpen,
    Integer(u32),
    /// A back-tick character literal, e.g. `` `a' ``.
    Char(u32),
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, errs: ErrorAccumulator<'a>) -> Self {
        Self {
            s: source,
            pos: 0,
            errs,
        }
    }

    fn str(&self, start: usize, end: usize) -> Str<'a> {
        Str {
            value: self.s,
            start,
            end,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        // Consume whitespace and % comments.
        loop {
            let rest = &self.s[self.pos..];
            let c = rest.chars().next()?;
            if c == '%' {
                match rest.find('\n') {
                    Some(i) => self.pos += i + 1,
                    None => {
                        self.pos = self.s.len();
                        return None;
                    }
                }
            } else if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let start = self.pos;
        let mut iter = self.s[self.pos..].chars();
        let c = iter.next()?;
        self.pos += c.len_utf8();
        use TokenValue::*;
        let value = match c {
            ':' => Colon,
            ';' => Semicolon,
            '.' => Dot,
            '+' => Plus,
            '-' => Minus,
            '*' => Star,
            '/' => Slash,
            '#' => Hash,
            '(' => LParen,
            ')' => RParen,
            '=' => match iter.next() {
                Some('>') => {
                    self.pos += 1;
                    Arrow
                }
                _ => {
                    self.errs.add(Error::InvalidCharacter {
                        char: self.str(start, self.pos),
                    });
                    return self.next();
                }
            },
            '\\' => match iter.next() {
                Some('*') => {
                    self.pos += 1;
                    CopyMatch
                }
                Some('(') => {
                    self.pos += 1;
                    ExprOpen
                }
                other => {
                    if let Some(c) = other {
                        self.pos += c.len_utf8();
                    }
                    self.errs.add(Error::InvalidEscape {
                        escape: self.str(start, self.pos),
                    });
                    return self.next();
                }
            },
            '`' => {
                let Some(c) = iter.next() else {
                    self.errs.add(Error::UnterminatedCharLiteral {
                        literal: self.str(start, self.pos),
                    });
                    return None;
                };
                self.pos += c.len_utf8();
                match iter.next() {
                    Some('\'') => self.pos += 1,
                    _ => self.errs.add(Error::UnterminatedCharLiteral {
                        literal: self.str(start, self.pos),
                    }),
                }
                Char(c as u32)
            }
            '0'..='9' => {
                let mut n = (c as u32) - ('0' as u32);
                let mut overflow = false;
                while let Some(d @ '0'..='9') = iter.next() {
                    self.pos += d.len_utf8();
                    let digit = (d as u32) - ('0' as u32);
                    match n.checked_mul(10).and_then(|n| n.checked_add(digit)) {
                        Some(m) => n = m,
                        None => overflow = true,
                    }
                }
                if overflow {
                    self.errs.add(Error::NumberTooLarge {
                        number: self.str(start, self.pos),
                    });
                    n = 0;
                }
                Integer(n)
            }
            'a'..='z' | 'A'..='Z' => {
                while let Some(l @ ('a'..='z' | 'A'..='Z' | '_')) = iter.next() {
                    self.pos += l.len_utf8();
                }
                let ident = &self.s[start..self.pos];
                if (ident == "mod" || ident == "div") && self.s[self.pos..].starts_with(':') {
                    self.pos += 1;
                    if ident == "mod" {
                        ModOp
                    } else {
                        DivOp
                    }
                } else {
                    Ident
                }
            }
            _ => {
                self.errs.add(Error::InvalidCharacter {
                    char: self.str(start, self.pos),
                });
                return self.next();
            }
        };
        Some(Token {
            value,
            source: self.str(start, self.pos),
        })
    }
}
