//! OCP language parse tree and parser.

use super::lexer;
use super::lexer::TokenValue;
use super::Str;
use crate::Error;
use crate::ErrorAccumulator;

/// A parsed OCP source file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Document<'a> {
    pub input: Option<Decl<'a>>,
    pub output: Option<Decl<'a>>,
    pub rules: Vec<Rule<'a>>,
}

/// A `key: value;` declaration.
#[derive(Debug, PartialEq, Eq)]
pub struct Decl<'a> {
    pub key: Str<'a>,
    pub value: u32,
}

/// A `pattern => action;` rule.
#[derive(Debug, PartialEq, Eq)]
pub struct Rule<'a> {
    pub pattern: Vec<PatternElem<'a>>,
    pub action: Vec<ActionElem<'a>>,
    pub arrow: Str<'a>,
}

/// One element of a rule's pattern. Each element matches exactly one input
/// character.
#[derive(Debug, PartialEq, Eq)]
pub enum PatternElem<'a> {
    /// A back-tick character literal.
    Char { value: u32, source: Str<'a> },
    /// The `.` wildcard.
    Wildcard { source: Str<'a> },
    /// A constant expression; matches the character with the resulting code.
    Expr(Expr<'a>),
}

/// One element of a rule's action.
#[derive(Debug, PartialEq, Eq)]
pub enum ActionElem<'a> {
    /// A back-tick character literal.
    Char { value: u32, source: Str<'a> },
    /// The `\*` copy-matched-input form.
    CopyMatch { source: Str<'a> },
    /// A computed output character.
    Expr(Expr<'a>),
}

/// An arithmetic expression.
#[derive(Debug, PartialEq, Eq)]
pub enum Expr<'a> {
    Num {
        value: u32,
        source: Str<'a>,
    },
    Char {
        value: u32,
        source: Str<'a>,
    },
    Binary {
        op: BinaryOp,
        op_source: Str<'a>,
        lhs: Box<Expr<'a>>,
        rhs: Box<Expr<'a>>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// Integer division; written `/` or `div:`.
    Div,
    /// Integer remainder; written `mod:`.
    Mod,
}

impl<'a> Expr<'a> {
    /// The source span this expression covers.
    pub fn source(&self) -> Str<'a> {
        match self {
            Expr::Num { source, .. } | Expr::Char { source, .. } => source.clone(),
            Expr::Binary { lhs, rhs, .. } => {
                let lhs = lhs.source();
                let rhs = rhs.source();
                Str {
                    value: lhs.value,
                    start: lhs.start,
                    end: rhs.end,
                }
            }
        }
    }
}

/// Parse OCP source code into a document.
///
/// Syntax errors are reported to the accumulator; the returned document is
/// then a best-effort partial parse, only used if the accumulator stays
/// empty.
pub fn parse<'a>(source: &'a str, errs: ErrorAccumulator<'a>) -> Document<'a> {
    let lexer = lexer::Lexer::new(source, errs.clone());
    Parser {
        lexer: lexer.peekable(),
        errs,
        source,
    }
    .document()
}

struct Parser<'a> {
    lexer: std::iter::Peekable<lexer::Lexer<'a>>,
    errs: ErrorAccumulator<'a>,
    source: &'a str,
}

impl<'a> Parser<'a> {
    /// An empty span at the very end of the source.
    fn end(&self) -> Str<'a> {
        Str {
            value: self.source,
            start: self.source.len(),
            end: self.source.len(),
        }
    }

    /// Consumes tokens through the next semicolon, to resume parsing after
    /// an error.
    fn synchronize(&mut self) {
        for token in self.lexer.by_ref() {
            if token.value == TokenValue::Semicolon {
                return;
            }
        }
    }

    fn expect(
        &mut self,
        wanted: &'static str,
        value: TokenValue,
    ) -> Option<lexer::Token<'a>> {
        match self.lexer.next() {
            None => {
                self.errs.add(Error::UnexpectedEndOfInput {
                    wanted,
                    end: self.end(),
                });
                None
            }
            Some(token) if token.value == value => Some(token),
            Some(token) => {
                self.errs.add(Error::ExpectedToken {
                    wanted,
                    got: token.source,
                });
                None
            }
        }
    }

    fn document(mut self) -> Document<'a> {
        let mut doc = Document::default();
        // The declaration section.
        let section = loop {
            let Some(token) = self.lexer.peek() else {
                self.errs.add(Error::MissingExpressionsSection { end: self.end() });
                return doc;
            };
            match token.value {
                TokenValue::Ident if token.source.str() == "expressions" => {
                    let section = token.source.clone();
                    self.lexer.next();
                    self.expect("`:` after `expressions`", TokenValue::Colon);
                    break section;
                }
                TokenValue::Ident => self.declaration(&mut doc),
                _ => {
                    let got = token.source.clone();
                    self.errs.add(Error::ExpectedToken {
                        wanted: "a declaration or `expressions:`",
                        got,
                    });
                    self.synchronize();
                }
            }
        };
        // The rule section.
        let mut parsed_any = false;
        while self.lexer.peek().is_some() {
            parsed_any = true;
            self.rule(&mut doc);
        }
        if !parsed_any {
            self.errs.add(Error::NoRules { section });
        }
        doc
    }

    fn declaration(&mut self, doc: &mut Document<'a>) {
        let key = match self.lexer.next() {
            Some(token) => token.source,
            None => return,
        };
        if self.expect("`:` after the declaration key", TokenValue::Colon).is_none() {
            self.synchronize();
            return;
        }
        let value = match self.lexer.next() {
            Some(token) => match token.value {
                TokenValue::Integer(i) => (i, token.source),
                _ => {
                    self.errs.add(Error::ExpectedToken {
                        wanted: "an integer declaration value",
                        got: token.source,
                    });
                    self.synchronize();
                    return;
                }
            },
            None => {
                self.errs.add(Error::UnexpectedEndOfInput {
                    wanted: "an integer declaration value",
                    end: self.end(),
                });
                return;
            }
        };
        self.expect("`;` after the declaration", TokenValue::Semicolon);
        let slot = match key.str() {
            "input" => &mut doc.input,
            "output" => &mut doc.output,
            _ => {
                self.errs.add(Error::UnrecognizedKey { key });
                return;
            }
        };
        if value.0 == 0 {
            self.errs.add(Error::InvalidWidth { value: value.1 });
            return;
        }
        match slot {
            Some(first) => self.errs.add(Error::DuplicateDeclaration {
                first: first.key.clone(),
                second: key,
            }),
            None => {
                *slot = Some(Decl {
                    key,
                    value: value.0,
                })
            }
        }
    }

    fn rule(&mut self, doc: &mut Document<'a>) {
        let mut pattern = vec![];
        let arrow = loop {
            let Some(token) = self.lexer.next() else {
                self.errs.add(Error::UnexpectedEndOfInput {
                    wanted: "`=>`",
                    end: self.end(),
                });
                return;
            };
            match token.value {
                TokenValue::Char(value) => pattern.push(PatternElem::Char {
                    value,
                    source: token.source,
                }),
                TokenValue::Dot => pattern.push(PatternElem::Wildcard {
                    source: token.source,
                }),
                TokenValue::Hash => pattern.push(PatternElem::Expr(self.factor())),
                TokenValue::ExprOpen => {
                    let expr = self.expr();
                    self.expect("`)` closing the expression", TokenValue::RParen);
                    pattern.push(PatternElem::Expr(expr));
                }
                TokenValue::Arrow => break token.source,
                _ => {
                    self.errs.add(Error::ExpectedToken {
                        wanted: "a pattern element or `=>`",
                        got: token.source,
                    });
                    self.synchronize();
                    return;
                }
            }
        };
        if pattern.is_empty() {
            self.errs.add(Error::EmptyPattern {
                arrow: arrow.clone(),
            });
        }
        let mut action = vec![];
        loop {
            let Some(token) = self.lexer.next() else {
                self.errs.add(Error::UnexpectedEndOfInput {
                    wanted: "`;`",
                    end: self.end(),
                });
                return;
            };
            match token.value {
                TokenValue::Char(value) => action.push(ActionElem::Char {
                    value,
                    source: token.source,
                }),
                TokenValue::CopyMatch => action.push(ActionElem::CopyMatch {
                    source: token.source,
                }),
                TokenValue::Hash => action.push(ActionElem::Expr(self.factor())),
                TokenValue::ExprOpen => {
                    let expr = self.expr();
                    self.expect("`)` closing the expression", TokenValue::RParen);
                    action.push(ActionElem::Expr(expr));
                }
                TokenValue::Semicolon => break,
                _ => {
                    self.errs.add(Error::ExpectedToken {
                        wanted: "an action element or `;`",
                        got: token.source,
                    });
                    self.synchronize();
                    return;
                }
            }
        }
        doc.rules.push(Rule {
            pattern,
            action,
            arrow,
        });
    }

    fn expr(&mut self) -> Expr<'a> {
        let mut lhs = self.term();
        loop {
            let op = match self.lexer.peek().map(|t| t.value) {
                Some(TokenValue::Plus) => BinaryOp::Add,
                Some(TokenValue::Minus) => BinaryOp::Sub,
                _ => return lhs,
            };
            let Some(op_token) = self.lexer.next() else {
                return lhs;
            };
            let op_source = op_token.source;
            let rhs = self.term();
            lhs = Expr::Binary {
                op,
                op_source,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Expr<'a> {
        let mut lhs = self.factor();
        loop {
            let op = match self.lexer.peek().map(|t| t.value) {
                Some(TokenValue::Star) => BinaryOp::Mul,
                Some(TokenValue::Slash) => BinaryOp::Div,
                Some(TokenValue::DivOp) => BinaryOp::Div,
                Some(TokenValue::ModOp) => BinaryOp::Mod,
                _ => return lhs,
            };
            let Some(op_token) = self.lexer.next() else {
                return lhs;
            };
            let op_source = op_token.source;
            let rhs = self.factor();
            lhs = Expr::Binary {
                op,
                op_source,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn factor(&mut self) -> Expr<'a> {
        match self.lexer.next() {
            Some(token) => match token.value {
                TokenValue::Integer(value) => Expr::Num {
                    value,
                    source: token.source,
                },
                TokenValue::Char(value) => Expr::Char {
                    value,
                    source: token.source,
                },
                TokenValue::LParen => {
                    let expr = self.expr();
                    self.expect("`)` closing the expression", TokenValue::RParen);
                    expr
                }
                _ => {
                    self.errs.add(Error::ExpectedToken {
                        wanted: "an expression",
                        got: token.source.clone(),
                    });
                    Expr::Num {
                        value: 0,
                        source: token.source,
                    }
                }
            },
            None => {
                self.errs.add(Error::UnexpectedEndOfInput {
                    wanted: "an expression",
                    end: self.end(),
                });
                Expr::Num {
                    value: 0,
                    source: self.end(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_parse_test(input: &str, want: Document) {
        let errs: ErrorAccumulator = Default::default();
        let got = parse(input, errs.clone());
        assert_eq!(got, want);
        assert_eq!(Ok(()), errs.check());
    }

    macro_rules! parse_tests {
        ( $( (
            $name: ident,
            $input: expr,
            $want: expr,
        ), )+ ) => {
            $(
                #[test]
                fn $name() {
                    let input = $input;
                    let want = $want;
                    run_parse_test(&input, want);
                }
            )+
        };
    }

    parse_tests!(
        (
            declarations_and_one_rule,
            "input: 2;\noutput: 1;\nexpressions:\n. => \\*;",
            Document {
                input: Some(Decl {
                    key: "input".into(),
                    value: 2,
                }),
                output: Some(Decl {
                    key: "output".into(),
                    value: 1,
                }),
                rules: vec![Rule {
                    pattern: vec![PatternElem::Wildcard { source: ".".into() }],
                    action: vec![ActionElem::CopyMatch {
                        source: "\\*".into(),
                    }],
                    arrow: "=>".into(),
                }],
            },
        ),
        (
            char_literals,
            "expressions:\n`a' => `b' `c';",
            Document {
                input: None,
                output: None,
                rules: vec![Rule {
                    pattern: vec![PatternElem::Char {
                        value: 0x61,
                        source: "`a'".into(),
                    }],
                    action: vec![
                        ActionElem::Char {
                            value: 0x62,
                            source: "`b'".into(),
                        },
                        ActionElem::Char {
                            value: 0x63,
                            source: "`c'".into(),
                        },
                    ],
                    arrow: "=>".into(),
                }],
            },
        ),
        (
            precedence_of_sum_and_product,
            "expressions:\n. => #(1+2*3);",
            Document {
                input: None,
                output: None,
                rules: vec![Rule {
                    pattern: vec![PatternElem::Wildcard { source: ".".into() }],
                    action: vec![ActionElem::Expr(Expr::Binary {
                        op: BinaryOp::Add,
                        op_source: "+".into(),
                        lhs: Box::new(Expr::Num {
                            value: 1,
                            source: "1".into(),
                        }),
                        rhs: Box::new(Expr::Binary {
                            op: BinaryOp::Mul,
                            op_source: "*".into(),
                            lhs: Box::new(Expr::Num {
                                value: 2,
                                source: "2".into(),
                            }),
                            rhs: Box::new(Expr::Num {
                                value: 3,
                                source: "3".into(),
                            }),
                        }),
                    })],
                    arrow: "=>".into(),
                }],
            },
        ),
        (
            empty_action,
            "expressions:\n`a' => ;",
            Document {
                input: None,
                output: None,
                rules: vec![Rule {
                    pattern: vec![PatternElem::Char {
                        value: 0x61,
                        source: "`a'".into(),
                    }],
                    action: vec![],
                    arrow: "=>".into(),
                }],
            },
        ),
    );

    #[test]
    fn binary_expression_source_covers_both_operands() {
        let errs: ErrorAccumulator = Default::default();
        let doc = parse("expressions:\n. => #(64+1);", errs.clone());
        assert_eq!(Ok(()), errs.check());
        let ActionElem::Expr(expr) = &doc.rules[0].action[0] else {
            panic!("expected an expression action");
        };
        assert_eq!(expr.source().str(), "64+1");
    }
}
