//! Lexer for the PLC front end.

use crate::cursor::CharCursor;
use crate::error::{LexError, LexErrorKind};

/// Kind of a token produced by the lexer.
///
/// Keywords are not distinguished here: `LET`, `DEF`, `NIL` and friends
/// come out as identifiers and the parser matches them by literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Integer,
    Decimal,
    Character,
    String,
    Operator,
}

/// A single token with its kind, matched text and start offset.
///
/// `literal` is the exact source slice. Character and string tokens keep
/// their quotes and undecoded escapes; decoding happens in the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    /// Byte offset of the first character in the source.
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            offset,
        }
    }

    /// Byte offset just past the last character of the token.
    pub fn end(&self) -> usize {
        self.offset + self.literal.len()
    }
}

/// Lex a source string into tokens.
///
/// Whitespace between tokens is dropped. The first malformed token aborts
/// the whole run.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer {
        chars: CharCursor::new(source),
    };
    lexer.run()
}

struct Lexer<'src> {
    chars: CharCursor<'src>,
}

impl<'src> Lexer<'src> {
    fn run(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) {
                self.consume_char();
                continue;
            }
            tokens.push(self.lex_token(ch)?);
        }

        Ok(tokens)
    }

    /// Picks the sub-rule for the token starting with `ch`. Only looks
    /// ahead; the sub-rule does the consuming.
    fn lex_token(&mut self, ch: char) -> Result<Token, LexError> {
        let start = self.chars.position();

        if is_ident_start(ch) {
            Ok(self.lex_identifier(start))
        } else if ch.is_ascii_digit()
            || (ch == '-' && self.peek_next().is_some_and(|next| next.is_ascii_digit()))
        {
            self.lex_number(start)
        } else if ch == '\'' {
            self.lex_character(start)
        } else if ch == '"' {
            self.lex_string(start)
        } else if is_operator_start(ch) {
            self.lex_operator(start)
        } else {
            Err(LexError::new(LexErrorKind::UnrecognizedCharacter, start))
        }
    }

    fn lex_identifier(&mut self, start: usize) -> Token {
        self.consume_char();
        self.consume_while(is_ident_continue);
        self.emit(TokenKind::Identifier, start)
    }

    fn lex_number(&mut self, start: usize) -> Result<Token, LexError> {
        let malformed = LexError::new(LexErrorKind::MalformedNumber, start);

        if self.peek_char() == Some('-') {
            self.consume_char();
        }

        match self.peek_char() {
            Some('0') => {
                self.consume_char();
                // no leading zeros: "007" is not a number
                if self.peek_char().is_some_and(|ch| ch.is_ascii_digit()) {
                    return Err(malformed);
                }
            }
            Some('1'..='9') => {
                self.consume_char();
                self.consume_while(|ch| ch.is_ascii_digit());
            }
            _ => return Err(malformed),
        }

        if self.peek_char() != Some('.') {
            return Ok(self.emit(TokenKind::Integer, start));
        }

        self.consume_char(); // '.'
        if !self.peek_char().is_some_and(|ch| ch.is_ascii_digit()) {
            return Err(malformed);
        }
        self.consume_while(|ch| ch.is_ascii_digit());
        Ok(self.emit(TokenKind::Decimal, start))
    }

    fn lex_character(&mut self, start: usize) -> Result<Token, LexError> {
        let unterminated = LexError::new(LexErrorKind::UnterminatedCharacter, start);
        let invalid = LexError::new(LexErrorKind::InvalidCharacterLiteral, start);

        self.consume_char(); // opening quote

        match self.peek_char() {
            None => return Err(unterminated),
            Some('\'') => return Err(invalid),
            Some('\\') => self.lex_escape(unterminated)?,
            Some(_) => self.consume_char(),
        }

        match self.peek_char() {
            Some('\'') => {
                self.consume_char();
                Ok(self.emit(TokenKind::Character, start))
            }
            None => Err(unterminated),
            Some(_) => Err(invalid),
        }
    }

    fn lex_string(&mut self, start: usize) -> Result<Token, LexError> {
        let unterminated = LexError::new(LexErrorKind::UnterminatedString, start);

        self.consume_char(); // opening quote

        loop {
            match self.peek_char() {
                None => return Err(unterminated),
                Some('"') => {
                    self.consume_char();
                    return Ok(self.emit(TokenKind::String, start));
                }
                Some('\\') => self.lex_escape(unterminated)?,
                Some(_) => self.consume_char(),
            }
        }
    }

    /// Validates a backslash escape without decoding it. Running out of
    /// input after the backslash reports `unterminated`.
    fn lex_escape(&mut self, unterminated: LexError) -> Result<(), LexError> {
        let backslash = self.chars.position();
        self.consume_char();

        match self.peek_char() {
            None => Err(unterminated),
            Some(ch) if is_escape_char(ch) => {
                self.consume_char();
                Ok(())
            }
            Some(_) => Err(LexError::new(LexErrorKind::InvalidEscape, backslash)),
        }
    }

    fn lex_operator(&mut self, start: usize) -> Result<Token, LexError> {
        let first = self.peek_char();
        let second = self.peek_next();

        let width = match (first, second) {
            (Some('='), Some('='))
            | (Some('!'), Some('='))
            | (Some('>'), Some('='))
            | (Some('<'), Some('='))
            | (Some('&'), Some('&'))
            | (Some('|'), Some('|')) => 2,
            (
                Some(
                    '=' | '>' | '<' | '+' | '-' | '*' | '/' | '!' | '(' | ')' | ';' | ':' | ','
                    | '.',
                ),
                _,
            ) => 1,
            _ => return Err(LexError::new(LexErrorKind::UnknownOperator, start)),
        };

        for _ in 0..width {
            self.consume_char();
        }
        Ok(self.emit(TokenKind::Operator, start))
    }

    fn emit(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, self.chars.slice_from(start), start)
    }

    fn consume_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&pred) {
            self.consume_char();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.peek_char(0)
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.peek_char(1)
    }

    fn consume_char(&mut self) {
        self.chars.advance();
    }
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

fn is_escape_char(ch: char) -> bool {
    matches!(ch, 'n' | 't' | 'r' | '\\' | '"' | '\'')
}

fn is_operator_start(ch: char) -> bool {
    matches!(
        ch,
        '=' | '>' | '<' | '+' | '-' | '*' | '/' | '!' | '(' | ')' | ';' | ':' | ',' | '.' | '&'
            | '|'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .expect("lex")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn single(source: &str) -> Token {
        let mut tokens = lex(source).expect("lex");
        assert_eq!(tokens.len(), 1, "expected one token for {source:?}");
        tokens.remove(0)
    }

    fn error_kind(source: &str) -> LexErrorKind {
        lex(source).unwrap_err().kind
    }

    #[test]
    fn whitespace_only_yields_no_tokens() {
        for source in ["", " ", "\t\r\n", "   \n\n\t "] {
            assert!(lex(source).expect("lex").is_empty());
        }
    }

    #[test]
    fn identifiers_are_single_tokens() {
        for source in ["x", "_", "getName", "thelegend27", "a_b_c", "_1", "LET"] {
            let token = single(source);
            assert_eq!(token.kind, TokenKind::Identifier);
            assert_eq!(token.literal, source);
            assert_eq!(token.offset, 0);
        }
    }

    #[test]
    fn integers_and_decimals() {
        assert_eq!(single("0"), Token::new(TokenKind::Integer, "0", 0));
        assert_eq!(single("123").kind, TokenKind::Integer);
        assert_eq!(single("-42").literal, "-42");
        assert_eq!(single("3.14"), Token::new(TokenKind::Decimal, "3.14", 0));
        assert_eq!(single("-0.5").kind, TokenKind::Decimal);
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert_eq!(error_kind("007"), LexErrorKind::MalformedNumber);
        assert_eq!(error_kind("3."), LexErrorKind::MalformedNumber);
        assert_eq!(error_kind("1.x"), LexErrorKind::MalformedNumber);
        assert_eq!(lex("x = 01;").unwrap_err().offset, 4);
    }

    #[test]
    fn minus_without_digit_is_an_operator() {
        assert_eq!(
            kinds("1 - 2"),
            vec![TokenKind::Integer, TokenKind::Operator, TokenKind::Integer]
        );
        assert_eq!(kinds("-x"), vec![TokenKind::Operator, TokenKind::Identifier]);
    }

    #[test]
    fn minus_before_digit_starts_a_number() {
        let tokens = lex("1 -2").expect("lex");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1], Token::new(TokenKind::Integer, "-2", 2));
    }

    #[test]
    fn character_literals_keep_raw_text() {
        assert_eq!(single("'c'"), Token::new(TokenKind::Character, "'c'", 0));
        assert_eq!(single(r"'\n'").literal, r"'\n'");
        assert_eq!(single(r"'\''").literal, r"'\''");
    }

    #[test]
    fn rejects_bad_character_literals() {
        assert_eq!(error_kind("''"), LexErrorKind::InvalidCharacterLiteral);
        assert_eq!(error_kind("'ab'"), LexErrorKind::InvalidCharacterLiteral);
        assert_eq!(error_kind("'a"), LexErrorKind::UnterminatedCharacter);
        assert_eq!(error_kind("'"), LexErrorKind::UnterminatedCharacter);
        assert_eq!(error_kind(r"'\q'"), LexErrorKind::InvalidEscape);
    }

    #[test]
    fn string_literals_keep_escapes_undecoded() {
        let token = single("\"a\\nb\"");
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.literal, "\"a\\nb\"");
        assert_eq!(single("\"\"").literal, "\"\"");
        assert_eq!(single(r#""say \"hi\"""#).literal, r#""say \"hi\"""#);
    }

    #[test]
    fn rejects_bad_string_literals() {
        assert_eq!(error_kind("\"unterminated"), LexErrorKind::UnterminatedString);
        assert_eq!(error_kind("\"trailing\\"), LexErrorKind::UnterminatedString);

        let err = lex("\"ab\\cd\"").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidEscape);
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn operators_prefer_longest_match() {
        let literals: Vec<String> = lex("== != >= <= && || = > < + - * / ! ( ) ; : , .")
            .expect("lex")
            .into_iter()
            .map(|t| {
                assert_eq!(t.kind, TokenKind::Operator);
                t.literal
            })
            .collect();
        assert_eq!(
            literals,
            [
                "==", "!=", ">=", "<=", "&&", "||", "=", ">", "<", "+", "-", "*", "/", "!", "(",
                ")", ";", ":", ",", "."
            ]
        );
        assert_eq!(lex("===").expect("lex").len(), 2);
    }

    #[test]
    fn rejects_lone_ampersand_and_pipe() {
        assert_eq!(
            lex("a & b").unwrap_err(),
            LexError::new(LexErrorKind::UnknownOperator, 2)
        );
        assert_eq!(error_kind("|"), LexErrorKind::UnknownOperator);
    }

    #[test]
    fn rejects_unrecognized_characters() {
        assert_eq!(
            lex("x # y").unwrap_err(),
            LexError::new(LexErrorKind::UnrecognizedCharacter, 2)
        );
        assert_eq!(error_kind("é"), LexErrorKind::UnrecognizedCharacter);
    }

    #[test]
    fn offsets_follow_source_order() {
        let tokens = lex("LET x = \"é\";\n  foo.bar(1);").expect("lex");
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 4, 6, 8, 12, 16, 19, 20, 23, 24, 25, 26]);
        for pair in tokens.windows(2) {
            assert!(pair[0].end() <= pair[1].offset);
        }
    }

    #[test]
    fn no_non_whitespace_character_is_lost() {
        let source = "DEF main() DO\n\tprint(\"x\", 'y', -1.5 >= z);\nEND";
        let joined: String = lex(source)
            .expect("lex")
            .iter()
            .map(|t| t.literal.as_str())
            .collect();
        let stripped: String = source.chars().filter(|c| !is_whitespace(*c)).collect();
        assert_eq!(joined, stripped);
    }
}
