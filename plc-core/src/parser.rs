//! Recursive-descent parser.
//!
//! ```text
//! source         ::= (field | method)*
//! field          ::= 'LET' identifier (':' identifier)? ('=' expression)? ';'
//! method         ::= 'DEF' identifier '(' (identifier (',' identifier)*)? ')' 'DO' statement* 'END'
//! statement      ::= 'LET' identifier ('=' expression)? ';'
//!                  | 'IF' expression 'DO' statement* ('ELSE' statement*)? 'END'
//!                  | 'FOR' identifier 'IN' expression 'DO' statement* 'END'
//!                  | 'WHILE' expression 'DO' statement* 'END'
//!                  | 'RETURN' expression ';'
//!                  | expression ('=' expression)? ';'
//! logical        ::= equality (('&&' | '||') equality)*
//! equality       ::= additive (('==' | '!=' | '>=' | '>' | '<=' | '<') additive)*
//! additive       ::= multiplicative (('+' | '-') multiplicative)*
//! multiplicative ::= secondary (('*' | '/') secondary)*
//! secondary      ::= primary ('.' identifier ('(' arguments? ')')?)*
//! primary        ::= 'NIL' | 'TRUE' | 'FALSE' | integer | decimal | character | string
//!                  | identifier ('(' arguments? ')')? | '(' expression ')'
//! ```
//!
//! Chains of same-precedence operators nest to the right by default
//! (`1 - 2 - 3` is `1 - (2 - 3)`); [`Associativity::Left`] switches every
//! level to the conventional left fold.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::ast::{Expression, Field, Literal, Method, Source, Statement};
use crate::cursor::TokenCursor;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Token, TokenKind};

const LOGICAL_OPERATORS: &[&str] = &["&&", "||"];
const EQUALITY_OPERATORS: &[&str] = &["==", "!=", ">=", ">", "<=", "<"];
const ADDITIVE_OPERATORS: &[&str] = &["+", "-"];
const MULTIPLICATIVE_OPERATORS: &[&str] = &["*", "/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Associativity {
    /// `a - b - c` parses as `a - (b - c)`.
    #[default]
    Right,
    /// `a - b - c` parses as `(a - b) - c`.
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserConfig {
    pub associativity: Associativity,
}

/// Parse a whole program with the default configuration. Only `LET`
/// fields and `DEF` methods are allowed at the top level.
pub fn parse_source(tokens: &[Token]) -> Result<Source, ParseError> {
    let mut parser = Parser::new(tokens);
    parser.parse_source()
}

/// Parse exactly one statement; leftover tokens are an error.
pub fn parse_statement(tokens: &[Token]) -> Result<Statement, ParseError> {
    let mut parser = Parser::new(tokens);
    let statement = parser.parse_statement()?;
    parser.finish()?;
    Ok(statement)
}

/// Parse exactly one expression; leftover tokens are an error.
pub fn parse_expression(tokens: &[Token]) -> Result<Expression, ParseError> {
    let mut parser = Parser::new(tokens);
    let expression = parser.parse_expression()?;
    parser.finish()?;
    Ok(expression)
}

type Rule<'tok> = fn(&mut Parser<'tok>) -> Result<Expression, ParseError>;

pub struct Parser<'tok> {
    tokens: TokenCursor<'tok>,
    config: ParserConfig,
}

impl<'tok> Parser<'tok> {
    pub fn new(tokens: &'tok [Token]) -> Self {
        Self::with_config(tokens, ParserConfig::default())
    }

    pub fn with_config(tokens: &'tok [Token], config: ParserConfig) -> Self {
        Self {
            tokens: TokenCursor::new(tokens),
            config,
        }
    }

    /// Fails with `UnexpectedToken` if any input is left unconsumed.
    pub fn finish(&self) -> Result<(), ParseError> {
        if self.tokens.has(0) {
            return Err(self.error_here(ParseErrorKind::UnexpectedToken));
        }
        Ok(())
    }

    pub fn parse_source(&mut self) -> Result<Source, ParseError> {
        let mut source = Source::default();

        while self.tokens.has(0) {
            if self.peek_keyword("LET") {
                source.fields.push(self.parse_field()?);
            } else if self.peek_keyword("DEF") {
                source.methods.push(self.parse_method()?);
            } else {
                return Err(self.error_here(ParseErrorKind::UnexpectedToken));
            }
        }

        Ok(source)
    }

    pub fn parse_field(&mut self) -> Result<Field, ParseError> {
        self.expect_keyword("LET", ParseErrorKind::UnexpectedToken)?;
        let name = self.expect_identifier(ParseErrorKind::ExpectedIdentifier)?;

        let type_name = if self.match_literal(":") {
            Some(self.expect_identifier(ParseErrorKind::ExpectedType)?)
        } else {
            None
        };

        let value = if self.match_literal("=") {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect_semicolon()?;
        Ok(Field {
            name,
            type_name,
            value,
        })
    }

    pub fn parse_method(&mut self) -> Result<Method, ParseError> {
        self.expect_keyword("DEF", ParseErrorKind::UnexpectedToken)?;
        let name = self.expect_identifier(ParseErrorKind::ExpectedIdentifier)?;
        self.expect_literal("(", ParseErrorKind::ExpectedParameters)?;

        let mut parameters = Vec::new();
        if !self.match_literal(")") {
            loop {
                parameters.push(self.expect_identifier(ParseErrorKind::ExpectedIdentifier)?);
                if self.match_literal(",") {
                    continue;
                }
                if self.match_literal(")") {
                    break;
                }
                return Err(self.error_here(ParseErrorKind::UnclosedParameters));
            }
        }

        self.expect_keyword("DO", ParseErrorKind::MissingDo)?;
        let statements = self.parse_block(&["END"])?;
        self.expect_keyword("END", ParseErrorKind::MissingEnd)?;

        Ok(Method {
            name,
            parameters,
            statements,
        })
    }

    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let keyword = self
            .tokens
            .peek(0)
            .filter(|token| token.kind == TokenKind::Identifier)
            .map(|token| token.literal.as_str());

        match keyword {
            Some("LET") => self.parse_declaration_statement(),
            Some("IF") => self.parse_if_statement(),
            Some("FOR") => self.parse_for_statement(),
            Some("WHILE") => self.parse_while_statement(),
            Some("RETURN") => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let receiver = self.parse_expression()?;

        if self.match_literal("=") {
            let value = self.parse_expression()?;
            self.expect_semicolon()?;
            return Ok(Statement::Assignment { receiver, value });
        }

        self.expect_semicolon()?;
        Ok(Statement::Expression(receiver))
    }

    fn parse_declaration_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword("LET", ParseErrorKind::UnexpectedToken)?;
        let name = self.expect_identifier(ParseErrorKind::ExpectedIdentifier)?;

        let value = if self.match_literal("=") {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect_semicolon()?;
        Ok(Statement::Declaration { name, value })
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword("IF", ParseErrorKind::UnexpectedToken)?;
        let condition = self.parse_expression()?;
        self.expect_keyword("DO", ParseErrorKind::MissingDo)?;

        let then_statements = self.parse_block(&["ELSE", "END"])?;
        let else_statements = if self.match_keyword("ELSE") {
            self.parse_block(&["END"])?
        } else {
            Vec::new()
        };

        self.expect_keyword("END", ParseErrorKind::MissingEnd)?;
        Ok(Statement::If {
            condition,
            then_statements,
            else_statements,
        })
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword("FOR", ParseErrorKind::UnexpectedToken)?;
        let name = self.expect_identifier(ParseErrorKind::ExpectedIdentifier)?;
        self.expect_keyword("IN", ParseErrorKind::MissingIn)?;
        let value = self.parse_expression()?;
        self.expect_keyword("DO", ParseErrorKind::MissingDo)?;
        let statements = self.parse_block(&["END"])?;
        self.expect_keyword("END", ParseErrorKind::MissingEnd)?;

        Ok(Statement::For {
            name,
            value,
            statements,
        })
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword("WHILE", ParseErrorKind::UnexpectedToken)?;
        let condition = self.parse_expression()?;
        self.expect_keyword("DO", ParseErrorKind::MissingDo)?;
        let statements = self.parse_block(&["END"])?;
        self.expect_keyword("END", ParseErrorKind::MissingEnd)?;

        Ok(Statement::While {
            condition,
            statements,
        })
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword("RETURN", ParseErrorKind::UnexpectedToken)?;
        let value = self.parse_expression()?;
        self.expect_semicolon()?;
        Ok(Statement::Return(value))
    }

    /// Statements up to, but not including, one of `terminators` or the
    /// end of input. The caller consumes the terminator.
    fn parse_block(&mut self, terminators: &[&str]) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        while self.tokens.has(0) && !terminators.iter().any(|kw| self.peek_keyword(kw)) {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_logical_expression()
    }

    fn parse_logical_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary(LOGICAL_OPERATORS, Self::parse_equality_expression)
    }

    fn parse_equality_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary(EQUALITY_OPERATORS, Self::parse_additive_expression)
    }

    fn parse_additive_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary(ADDITIVE_OPERATORS, Self::parse_multiplicative_expression)
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_binary(MULTIPLICATIVE_OPERATORS, Self::parse_secondary_expression)
    }

    /// One precedence level; `operand` parses the next-tighter level.
    ///
    /// Both folds collect the chain in a loop, so a long flat chain costs
    /// heap, not stack.
    fn parse_binary(
        &mut self,
        operators: &[&str],
        operand: Rule<'tok>,
    ) -> Result<Expression, ParseError> {
        let mut current = operand(self)?;

        match self.config.associativity {
            Associativity::Right => {
                let mut pending = Vec::new();
                while let Some(operator) = self.match_operator(operators) {
                    let next = operand(self)?;
                    pending.push((std::mem::replace(&mut current, next), operator));
                }
                Ok(pending
                    .into_iter()
                    .rev()
                    .fold(current, |right, (left, operator)| {
                        Expression::binary(operator, left, right)
                    }))
            }
            Associativity::Left => {
                while let Some(operator) = self.match_operator(operators) {
                    let right = operand(self)?;
                    current = Expression::binary(operator, current, right);
                }
                Ok(current)
            }
        }
    }

    fn parse_secondary_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_primary_expression()?;

        while self.match_literal(".") {
            let name = self.expect_identifier(ParseErrorKind::ExpectedIdentifier)?;
            expression = if self.match_literal("(") {
                let arguments = self.parse_arguments()?;
                Expression::function(Some(expression), name, arguments)
            } else {
                Expression::access(Some(expression), name)
            };
        }

        Ok(expression)
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, ParseError> {
        let Some(token) = self.tokens.peek(0) else {
            return Err(self.error_here(ParseErrorKind::ExpectedExpression));
        };

        let expression = match token.kind {
            TokenKind::Identifier => {
                self.tokens.advance();
                match token.literal.as_str() {
                    "NIL" => Expression::Literal(Literal::Nil),
                    "TRUE" => Expression::Literal(Literal::Boolean(true)),
                    "FALSE" => Expression::Literal(Literal::Boolean(false)),
                    name => {
                        if self.match_literal("(") {
                            let arguments = self.parse_arguments()?;
                            Expression::function(None, name, arguments)
                        } else {
                            Expression::access(None, name)
                        }
                    }
                }
            }
            TokenKind::Integer => {
                self.tokens.advance();
                let value = BigInt::from_str(&token.literal).map_err(|_| invalid_literal(token))?;
                Expression::Literal(Literal::Integer(value))
            }
            TokenKind::Decimal => {
                self.tokens.advance();
                let value =
                    BigDecimal::from_str(&token.literal).map_err(|_| invalid_literal(token))?;
                Expression::Literal(Literal::Decimal(value))
            }
            TokenKind::Character => {
                self.tokens.advance();
                Expression::Literal(Literal::Character(decode_character(token)?))
            }
            TokenKind::String => {
                self.tokens.advance();
                Expression::Literal(Literal::String(decode_string(token)?))
            }
            TokenKind::Operator if token.literal == "(" => {
                self.tokens.advance();
                let inner = self.parse_expression()?;
                if !self.match_literal(")") {
                    return Err(self.error_here(ParseErrorKind::UnclosedGroup));
                }
                Expression::group(inner)
            }
            TokenKind::Operator => {
                return Err(self.error_here(ParseErrorKind::ExpectedExpression));
            }
        };

        Ok(expression)
    }

    /// Comma-separated arguments after an already consumed `(`, through
    /// the closing `)`.
    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut arguments = Vec::new();
        if self.match_literal(")") {
            return Ok(arguments);
        }

        loop {
            arguments.push(self.parse_expression()?);
            if self.match_literal(",") {
                continue;
            }
            if self.match_literal(")") {
                return Ok(arguments);
            }
            return Err(self.error_here(ParseErrorKind::UnclosedArguments));
        }
    }

    fn peek_literal(&self, literal: &str) -> bool {
        self.tokens
            .peek(0)
            .is_some_and(|token| token.literal == literal)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.tokens
            .peek(0)
            .is_some_and(|token| token.kind == TokenKind::Identifier && token.literal == keyword)
    }

    fn match_literal(&mut self, literal: &str) -> bool {
        let matched = self.peek_literal(literal);
        if matched {
            self.tokens.advance();
        }
        matched
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        let matched = self.peek_keyword(keyword);
        if matched {
            self.tokens.advance();
        }
        matched
    }

    fn match_operator(&mut self, operators: &[&str]) -> Option<String> {
        let token = self.tokens.peek(0)?;
        if token.kind != TokenKind::Operator || !operators.contains(&token.literal.as_str()) {
            return None;
        }
        self.tokens.advance();
        Some(token.literal.clone())
    }

    fn expect_literal(&mut self, literal: &str, kind: ParseErrorKind) -> Result<(), ParseError> {
        if self.match_literal(literal) {
            Ok(())
        } else {
            Err(self.error_here(kind))
        }
    }

    fn expect_keyword(&mut self, keyword: &str, kind: ParseErrorKind) -> Result<(), ParseError> {
        if self.match_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error_here(kind))
        }
    }

    fn expect_identifier(&mut self, kind: ParseErrorKind) -> Result<String, ParseError> {
        match self.tokens.peek(0) {
            Some(token) if token.kind == TokenKind::Identifier => {
                self.tokens.advance();
                Ok(token.literal.clone())
            }
            _ => Err(self.error_here(kind)),
        }
    }

    /// A missing `;` is reported at the last token that was consumed.
    fn expect_semicolon(&mut self) -> Result<(), ParseError> {
        if self.match_literal(";") {
            return Ok(());
        }
        let offset = self.tokens.previous().map(|token| token.offset).unwrap_or(0);
        Err(ParseError::new(ParseErrorKind::MissingSemicolon, offset))
    }

    /// Error at the lookahead token, or just past the input when exhausted.
    fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        let offset = self
            .tokens
            .peek(0)
            .map(|token| token.offset)
            .unwrap_or_else(|| self.tokens.end_offset());
        ParseError::new(kind, offset)
    }
}

fn invalid_literal(token: &Token) -> ParseError {
    ParseError::new(ParseErrorKind::InvalidLiteral, token.offset)
}

fn strip_quotes(literal: &str, quote: char) -> Option<&str> {
    literal.strip_prefix(quote)?.strip_suffix(quote)
}

fn decode_character(token: &Token) -> Result<char, ParseError> {
    let decoded = strip_quotes(&token.literal, '\'')
        .and_then(decode_escapes)
        .ok_or_else(|| invalid_literal(token))?;

    let mut chars = decoded.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(invalid_literal(token)),
    }
}

fn decode_string(token: &Token) -> Result<String, ParseError> {
    strip_quotes(&token.literal, '"')
        .and_then(decode_escapes)
        .ok_or_else(|| invalid_literal(token))
}

fn decode_escapes(raw: &str) -> Option<String> {
    let mut decoded = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            decoded.push(ch);
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            _ => return None,
        };
        decoded.push(escaped);
    }

    Some(decoded)
}
