//! Core front end for the PLC language toolchain.
//!
//! The pipeline is:
//!
//!   source text
//!     -> lexer   (tokens, via `CharCursor`)
//!     -> parser  (AST rooted at `Source`, via `TokenCursor`)
//!
//! Semantic analysis and interpretation live downstream and consume the
//! AST. Drivers (the CLI, tests) should depend on this crate rather than
//! reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod error;
pub mod span;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod cursor;
pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use ast::{Expression, Field, Literal, Method, Source, Statement};
pub use error::{CoreError, LexError, LexErrorKind, ParseError, ParseErrorKind};
pub use lexer::{Token, TokenKind, lex};
pub use parser::{
    Associativity, Parser, ParserConfig, parse_expression, parse_source, parse_statement,
};

/// Lex and parse a whole program with the default parser configuration.
pub fn parse(source: &str) -> Result<Source, CoreError> {
    parse_with_config(source, ParserConfig::default())
}

pub fn parse_with_config(source: &str, config: ParserConfig) -> Result<Source, CoreError> {
    let tokens = lex(source)?;
    let mut parser = Parser::with_config(&tokens, config);
    Ok(parser.parse_source()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_small_program() {
        let program = "\
LET total: Integer = 0;
DEF sum(list) DO
    FOR item IN list DO
        total = total + item;
    END
    RETURN total;
END
";
        let source = parse(program).expect("parse");
        assert_eq!(source.fields.len(), 1);
        assert_eq!(source.methods[0].name, "sum");
        assert_eq!(source.methods[0].statements.len(), 2);
    }

    #[test]
    fn lex_errors_surface_with_their_offset() {
        let err = parse("LET x = 007;").unwrap_err();
        assert_eq!(err.offset(), 8);
        assert!(matches!(
            err,
            CoreError::Lex(LexError {
                kind: LexErrorKind::MalformedNumber,
                ..
            })
        ));
    }

    #[test]
    fn parse_errors_surface_with_their_offset() {
        let err = parse("LET x = 1").unwrap_err();
        assert_eq!(err.offset(), 8);
        assert!(matches!(
            err,
            CoreError::Parse(ParseError {
                kind: ParseErrorKind::MissingSemicolon,
                ..
            })
        ));
    }

    #[test]
    fn configuration_reaches_the_parser() {
        let config = ParserConfig {
            associativity: Associativity::Left,
        };
        let source = parse_with_config("LET x = 8 / 4 / 2;", config).expect("parse");
        let value = source.fields[0].value.as_ref().expect("initializer");
        assert_eq!(value.to_string(), "((8 / 4) / 2)");
    }
}
