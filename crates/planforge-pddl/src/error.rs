//! Parse errors

use std::fmt;

use planforge_core::Requirement;
use thiserror::Error;

/// Which of the two input documents an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    Domain,
    Problem,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Document::Domain => "domain",
            Document::Problem => "problem",
        })
    }
}

/// A parse failure located at the offending token.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{document} {line}:{column}: {kind}")]
pub struct ParseError {
    pub document: Document,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    pub kind: ParseErrorKind,
}

/// What went wrong, naming the expected construct where there is one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("unexpected {found}, expected {expected}")]
    Unexpected { found: String, expected: String },

    #[error("unbalanced closing parenthesis")]
    Unbalanced,

    #[error("lists nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("undeclared {what} `{name}`")]
    Undeclared { what: &'static str, name: String },

    #[error("duplicate {what} `{name}`")]
    Duplicate { what: &'static str, name: String },

    #[error("{construct} requires the {requirement} requirement")]
    MissingRequirement {
        construct: String,
        requirement: Requirement,
    },

    #[error("unsupported requirement `:{0}`")]
    UnsupportedRequirement(String),

    #[error("`{name}` expects {expected} arguments, found {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("`{name}` has type {actual}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("invalid type declaration: {0}")]
    InvalidType(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("problem is for domain `{found}`, but domain `{expected}` was given")]
    DomainMismatch { expected: String, found: String },

    #[error("unsupported construct `{0}`")]
    Unsupported(String),
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;
