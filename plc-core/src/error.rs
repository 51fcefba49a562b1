use thiserror::Error;

/// What went wrong while turning characters into tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unrecognized character")]
    UnrecognizedCharacter,
    #[error("malformed number")]
    MalformedNumber,
    #[error("unterminated character literal")]
    UnterminatedCharacter,
    #[error("character literal must contain exactly one character")]
    InvalidCharacterLiteral,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("unknown operator")]
    UnknownOperator,
}

/// What went wrong while turning tokens into an AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("expected ';'")]
    MissingSemicolon,
    #[error("expected expression")]
    ExpectedExpression,
    #[error("expected ')' after arguments")]
    UnclosedArguments,
    #[error("expected ')' after grouped expression")]
    UnclosedGroup,
    #[error("expected identifier")]
    ExpectedIdentifier,
    #[error("expected type name after ':'")]
    ExpectedType,
    #[error("expected '(' before parameters")]
    ExpectedParameters,
    #[error("expected ')' after parameters")]
    UnclosedParameters,
    #[error("expected 'DO'")]
    MissingDo,
    #[error("expected 'END'")]
    MissingEnd,
    #[error("expected 'IN'")]
    MissingIn,
    #[error("literal does not match its token kind")]
    InvalidLiteral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lex error at byte {offset}: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub offset: usize,
}

impl LexError {
    pub fn new(kind: LexErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("parse error at byte {offset}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

/// Failure of the whole lex-then-parse pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl CoreError {
    pub fn offset(&self) -> usize {
        match self {
            CoreError::Lex(err) => err.offset,
            CoreError::Parse(err) => err.offset,
        }
    }
}
