use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

/// Root of a parsed program: global fields followed by methods, each in
/// source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Source {
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Name from a `: Type` annotation, if one was written.
    pub type_name: Option<String>,
    pub value: Option<Expression>,
}

impl Field {
    pub fn has_declared_type(&self) -> bool {
        self.type_name.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub parameters: Vec<String>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expression),
    Assignment {
        receiver: Expression,
        value: Expression,
    },
    Declaration {
        name: String,
        value: Option<Expression>,
    },
    If {
        condition: Expression,
        then_statements: Vec<Statement>,
        else_statements: Vec<Statement>,
    },
    For {
        name: String,
        value: Expression,
        statements: Vec<Statement>,
    },
    While {
        condition: Expression,
        statements: Vec<Statement>,
    },
    Return(Expression),
}

/// Decoded literal value. Character and string contents have their
/// escapes already resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Boolean(bool),
    Integer(BigInt),
    Decimal(BigDecimal),
    Character(char),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Group(Box<Expression>),
    Access {
        receiver: Option<Box<Expression>>,
        name: String,
    },
    Function {
        receiver: Option<Box<Expression>>,
        name: String,
        arguments: Vec<Expression>,
    },
    Binary {
        operator: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn access(receiver: Option<Expression>, name: impl Into<String>) -> Self {
        Expression::Access {
            receiver: receiver.map(Box::new),
            name: name.into(),
        }
    }

    pub fn function(
        receiver: Option<Expression>,
        name: impl Into<String>,
        arguments: Vec<Expression>,
    ) -> Self {
        Expression::Function {
            receiver: receiver.map(Box::new),
            name: name.into(),
            arguments,
        }
    }

    pub fn binary(operator: impl Into<String>, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            operator: operator.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn group(inner: Expression) -> Self {
        Expression::Group(Box::new(inner))
    }

    pub fn integer(value: i64) -> Self {
        Expression::Literal(Literal::Integer(BigInt::from(value)))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Nil => f.write_str("NIL"),
            Literal::Boolean(true) => f.write_str("TRUE"),
            Literal::Boolean(false) => f.write_str("FALSE"),
            Literal::Integer(value) => write!(f, "{value}"),
            Literal::Decimal(value) => write!(f, "{value}"),
            Literal::Character(ch) => {
                f.write_str("'")?;
                write_escaped(f, *ch)?;
                f.write_str("'")
            }
            Literal::String(text) => {
                f.write_str("\"")?;
                for ch in text.chars() {
                    write_escaped(f, ch)?;
                }
                f.write_str("\"")
            }
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, ch: char) -> fmt::Result {
    match ch {
        '\n' => f.write_str("\\n"),
        '\t' => f.write_str("\\t"),
        '\r' => f.write_str("\\r"),
        '\\' => f.write_str("\\\\"),
        '"' => f.write_str("\\\""),
        '\'' => f.write_str("\\'"),
        other => write!(f, "{other}"),
    }
}

/// Renders the tree with every binary node parenthesised, so the nesting
/// chosen by the parser is visible in the output.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{literal}"),
            Expression::Group(inner) => write!(f, "({inner})"),
            Expression::Access { receiver, name } => {
                if let Some(receiver) = receiver {
                    write!(f, "{receiver}.")?;
                }
                f.write_str(name)
            }
            Expression::Function {
                receiver,
                name,
                arguments,
            } => {
                if let Some(receiver) = receiver {
                    write!(f, "{receiver}.")?;
                }
                write!(f, "{name}(")?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str(")")
            }
            Expression::Binary {
                operator,
                left,
                right,
            } => write!(f, "({left} {operator} {right})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_nesting() {
        let expr = Expression::binary(
            "-",
            Expression::integer(1),
            Expression::binary("-", Expression::integer(2), Expression::integer(3)),
        );
        assert_eq!(expr.to_string(), "(1 - (2 - 3))");
    }

    #[test]
    fn display_renders_calls_and_escapes() {
        let call = Expression::function(
            Some(Expression::access(None, "obj")),
            "put",
            vec![
                Expression::Literal(Literal::String("a\"b\n".to_string())),
                Expression::Literal(Literal::Character('\'')),
                Expression::Literal(Literal::Nil),
            ],
        );
        assert_eq!(call.to_string(), r#"obj.put("a\"b\n", '\'', NIL)"#);
    }

    #[test]
    fn field_type_flag_follows_annotation() {
        let field = Field {
            name: "x".to_string(),
            type_name: Some("Integer".to_string()),
            value: None,
        };
        assert!(field.has_declared_type());
    }
}
