use super::Str;

/// Error encountered when compiling OCP source.
///
/// Compilation is all-or-nothing: if any of these is produced, no program
/// is.
#[derive(Debug, PartialEq, Eq)]
pub enum Error<'a> {
    /// A character that is not part of the language.
    InvalidCharacter { char: Str<'a> },

    /// A back-tick character literal with no closing apostrophe.
    UnterminatedCharLiteral { literal: Str<'a> },

    /// A backslash followed by something other than `*` or `(`.
    InvalidEscape { escape: Str<'a> },

    /// An integer literal too large for an instruction operand.
    NumberTooLarge { number: Str<'a> },

    /// A declaration with a key the language does not recognize.
    ///
    /// The recognized keys are `input` and `output`.
    UnrecognizedKey { key: Str<'a> },

    /// The same declaration appears twice.
    DuplicateDeclaration { first: Str<'a>, second: Str<'a> },

    /// A channel width that is not a positive integer.
    InvalidWidth { value: Str<'a> },

    /// Something other than the expected construct was found.
    ExpectedToken {
        wanted: &'static str,
        got: Str<'a>,
    },

    /// The source ended in the middle of a construct.
    UnexpectedEndOfInput {
        wanted: &'static str,
        end: Str<'a>,
    },

    /// A rule whose pattern matches nothing.
    EmptyPattern { arrow: Str<'a> },

    /// The source contains no `expressions:` section.
    MissingExpressionsSection { end: Str<'a> },

    /// The `expressions:` section contains no rules.
    NoRules { section: Str<'a> },

    /// A pattern expression divides by zero.
    ///
    /// Pattern expressions are evaluated at compile time, so this is a
    /// compile error; the same expression in an action is emitted as
    /// bytecode and faults at run time instead.
    ConstantDivisionByZero { op: Str<'a> },

    /// A value that does not fit in the operand bits of an instruction
    /// word.
    OperandOutOfRange { value: i64, source: Str<'a> },
}

impl<'a> Error<'a> {
    pub fn message(&self) -> String {
        use Error::*;
        match self {
            InvalidCharacter { char } => {
                format!["The character `{char}` is not part of the OCP language"]
            }
            UnterminatedCharLiteral { .. } => {
                "A character literal is missing its closing apostrophe".into()
            }
            InvalidEscape { escape } => {
                format!["The escape `{escape}` is not valid; only `\\*` and `\\(` are"]
            }
            NumberTooLarge { .. } => "An integer literal is too large".into(),
            UnrecognizedKey { key } => format!["The declaration key `{key}` is not recognized"],
            DuplicateDeclaration { first, .. } => {
                format!["The `{first}` declaration appears more than once"]
            }
            InvalidWidth { .. } => "A channel width must be a positive integer".into(),
            ExpectedToken { wanted, .. } => format!["Expected {wanted}"],
            UnexpectedEndOfInput { wanted, .. } => {
                format!["The source ended where {wanted} was expected"]
            }
            EmptyPattern { .. } => "A rule's pattern must match at least one character".into(),
            MissingExpressionsSection { .. } => {
                "The source has no `expressions:` section".into()
            }
            NoRules { .. } => "The `expressions:` section contains no rules".into(),
            ConstantDivisionByZero { .. } => "A pattern expression divides by zero".into(),
            OperandOutOfRange { value, .. } => {
                format!["The value {value} does not fit in an instruction operand"]
            }
        }
    }

    pub fn main_span(&self) -> std::ops::Range<usize> {
        use Error::*;
        match self {
            InvalidCharacter { char } => char.span(),
            UnterminatedCharLiteral { literal } => literal.span(),
            InvalidEscape { escape } => escape.span(),
            NumberTooLarge { number } => number.span(),
            UnrecognizedKey { key } => key.span(),
            DuplicateDeclaration { second, .. } => second.span(),
            InvalidWidth { value } => value.span(),
            ExpectedToken { got, .. } => got.span(),
            UnexpectedEndOfInput { end, .. } => end.span(),
            EmptyPattern { arrow } => arrow.span(),
            MissingExpressionsSection { end } => end.span(),
            NoRules { section } => section.span(),
            ConstantDivisionByZero { op } => op.span(),
            OperandOutOfRange { source, .. } => source.span(),
        }
    }

    pub fn labels(&self) -> Vec<ErrorLabel> {
        use Error::*;
        match self {
            DuplicateDeclaration { first, second } => vec![
                ErrorLabel {
                    span: first.span(),
                    text: "the first declaration appears here".into(),
                },
                ErrorLabel {
                    span: second.span(),
                    text: "the second declaration appears here".into(),
                },
            ],
            ExpectedToken { wanted, got } => vec![ErrorLabel {
                span: got.span(),
                text: format!["expected {wanted}, found `{got}`"],
            }],
            ConstantDivisionByZero { op } => vec![ErrorLabel {
                span: op.span(),
                text: "the zero divisor is applied here".into(),
            }],
            OperandOutOfRange { value, source } => vec![ErrorLabel {
                span: source.span(),
                text: format!["this evaluates to {value}"],
            }],
            _ => vec![ErrorLabel {
                span: self.main_span(),
                text: self.message(),
            }],
        }
    }

    pub fn notes(&self) -> Vec<String> {
        use Error::*;
        match self {
            ConstantDivisionByZero { .. } => vec![
                "Pattern expressions are evaluated when the program is compiled".to_string(),
            ],
            EmptyPattern { .. } => {
                vec!["Use `.` to match an arbitrary character".to_string()]
            }
            _ => vec![],
        }
    }
}

/// Label on an error message.
///
/// A label identifies a particular piece of source code and some
/// information about it.
pub struct ErrorLabel {
    pub span: std::ops::Range<usize>,
    pub text: String,
}

impl<'a> Error<'a> {
    #[cfg(feature = "ariadne")]
    pub fn ariadne_report(
        &self,
        file_name: &'a str,
    ) -> ariadne::Report<'static, (&str, std::ops::Range<usize>)> {
        let mut report =
            ariadne::Report::build(ariadne::ReportKind::Error, (file_name, self.main_span()))
                .with_message(self.message());
        let mut color = ariadne::Color::BrightRed;
        for label in self.labels() {
            report = report.with_label(
                ariadne::Label::new((file_name, label.span))
                    .with_message(label.text)
                    .with_color(color),
            );
            color = ariadne::Color::BrightYellow;
        }
        for note in self.notes() {
            report = report.with_note(note);
        }
        report.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_unique_err(source: &str) -> Error {
        let mut errs = crate::compile(source).unwrap_err();
        assert_eq!(errs.len(), 1, "{errs:?}");
        errs.pop().unwrap()
    }

    macro_rules! error_tests {
        ( $(
            ($name: ident, $source: expr, Error:: $want_variant: ident,),
        )+ ) => {
            $(
            #[test]
            fn $name() {
                let source = $source;
                let err = get_unique_err(source);
                assert!(
                    matches!(err, Error::$want_variant {..}),
                    "got: {err:?}",
                );
            }
            )+
        };
    }

    error_tests!(
        (
            invalid_character,
            "expressions:\n. => ^;",
            Error::InvalidCharacter,
        ),
        (
            unterminated_char_literal,
            "expressions:\n`a => `b';",
            Error::UnterminatedCharLiteral,
        ),
        (
            invalid_escape,
            "expressions:\n. => \\x;",
            Error::InvalidEscape,
        ),
        (
            number_too_large,
            "expressions:\n. => #99999999999;",
            Error::NumberTooLarge,
        ),
        (
            unrecognized_key,
            "units: 1;\nexpressions:\n. => \\*;",
            Error::UnrecognizedKey,
        ),
        (
            duplicate_declaration,
            "input: 1;\ninput: 2;\nexpressions:\n. => \\*;",
            Error::DuplicateDeclaration,
        ),
        (
            invalid_width,
            "input: 0;\nexpressions:\n. => \\*;",
            Error::InvalidWidth,
        ),
        (
            missing_arrow,
            "expressions:\n. `a';",
            Error::ExpectedToken,
        ),
        (
            truncated_rule,
            "expressions:\n. => `a'",
            Error::UnexpectedEndOfInput,
        ),
        (
            empty_pattern,
            "expressions:\n => `a';",
            Error::EmptyPattern,
        ),
        (
            missing_expressions_section,
            "input: 1;\noutput: 1;",
            Error::MissingExpressionsSection,
        ),
        (
            no_rules,
            "expressions:",
            Error::NoRules,
        ),
        (
            constant_division_by_zero,
            "expressions:\n#(4 div: 0) => `a';",
            Error::ConstantDivisionByZero,
        ),
        (
            operand_out_of_range,
            "expressions:\n. => #(16777216);",
            Error::OperandOutOfRange,
        ),
    );
}
