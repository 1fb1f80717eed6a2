//! S-expression reader

use std::fmt;

use crate::error::{Document, ParseError, ParseErrorKind, ParseResult};
use crate::lexer::{Token, TokenKind};

/// Deepest list nesting a document may use. The parser and the expression
/// trees it builds recurse on nesting, so deeper input is refused here.
pub const MAX_DEPTH: usize = 256;

/// A parsed s-expression carrying the position of its first token.
#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    Atom(Token),
    List {
        items: Vec<SExpr>,
        line: usize,
        column: usize,
    },
}

impl SExpr {
    pub fn line(&self) -> usize {
        match self {
            SExpr::Atom(t) => t.line,
            SExpr::List { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            SExpr::Atom(t) => t.column,
            SExpr::List { column, .. } => *column,
        }
    }

    pub fn as_list(&self) -> Option<&[SExpr]> {
        match self {
            SExpr::List { items, .. } => Some(items),
            SExpr::Atom(_) => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            SExpr::Atom(Token {
                kind: TokenKind::Symbol(s),
                ..
            }) => Some(s),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&str> {
        match self {
            SExpr::Atom(Token {
                kind: TokenKind::Variable(v),
                ..
            }) => Some(v),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            SExpr::Atom(Token {
                kind: TokenKind::Keyword(k),
                ..
            }) => Some(k),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SExpr::Atom(Token {
                kind: TokenKind::Number(n),
                ..
            }) => Some(*n),
            _ => None,
        }
    }

    /// The leading symbol of a list, e.g. `and` in `(and ...)`.
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.as_symbol()
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            SExpr::Atom(t) => t.kind.to_string(),
            SExpr::List { items, .. } => match items.first() {
                Some(SExpr::Atom(t)) => format!("list starting with {}", t.kind),
                Some(SExpr::List { .. }) => "nested list".to_string(),
                None => "empty list".to_string(),
            },
        }
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExpr::Atom(t) => match &t.kind {
                TokenKind::Variable(v) => f.write_str(v),
                TokenKind::Keyword(k) => write!(f, ":{}", k),
                TokenKind::Number(n) => write!(f, "{}", n),
                TokenKind::Symbol(s) => f.write_str(s),
                TokenKind::Open => f.write_str("("),
                TokenKind::Close => f.write_str(")"),
            },
            SExpr::List { items, .. } => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Reads exactly one top-level list from `tokens`.
pub fn read_document(tokens: Vec<Token>, document: Document) -> ParseResult<SExpr> {
    let mut iter = tokens.into_iter();
    let first = iter.next().ok_or(ParseError {
        document,
        line: 1,
        column: 1,
        kind: ParseErrorKind::UnexpectedEof {
            expected: "`(define ...)`".to_string(),
        },
    })?;
    if first.kind != TokenKind::Open {
        return Err(ParseError {
            document,
            line: first.line,
            column: first.column,
            kind: ParseErrorKind::Unexpected {
                found: first.kind.to_string(),
                expected: "`(define ...)`".to_string(),
            },
        });
    }

    // Stack of open lists: (items, line, column).
    let mut stack: Vec<(Vec<SExpr>, usize, usize)> = vec![(Vec::new(), first.line, first.column)];
    let (mut last_line, mut last_column) = (first.line, first.column);

    while let Some(token) = iter.next() {
        last_line = token.line;
        last_column = token.column;
        match token.kind {
            TokenKind::Open => {
                if stack.len() >= MAX_DEPTH {
                    return Err(ParseError {
                        document,
                        line: token.line,
                        column: token.column,
                        kind: ParseErrorKind::TooDeep { limit: MAX_DEPTH },
                    });
                }
                stack.push((Vec::new(), token.line, token.column));
            }
            TokenKind::Close => {
                let Some((items, line, column)) = stack.pop() else {
                    return Err(ParseError {
                        document,
                        line: token.line,
                        column: token.column,
                        kind: ParseErrorKind::Unbalanced,
                    });
                };
                let list = SExpr::List {
                    items,
                    line,
                    column,
                };
                match stack.last_mut() {
                    Some((parent, _, _)) => parent.push(list),
                    None => {
                        return match iter.next() {
                            None => Ok(list),
                            Some(extra) => Err(ParseError {
                                document,
                                line: extra.line,
                                column: extra.column,
                                kind: match extra.kind {
                                    TokenKind::Close => ParseErrorKind::Unbalanced,
                                    other => ParseErrorKind::Unexpected {
                                        found: other.to_string(),
                                        expected: "end of input".to_string(),
                                    },
                                },
                            }),
                        };
                    }
                }
            }
            _ => {
                if let Some((items, _, _)) = stack.last_mut() {
                    items.push(SExpr::Atom(token));
                }
            }
        }
    }

    Err(ParseError {
        document,
        line: last_line,
        column: last_column,
        kind: ParseErrorKind::UnexpectedEof {
            expected: "`)`".to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn read(text: &str) -> ParseResult<SExpr> {
        read_document(tokenize(text, Document::Domain)?, Document::Domain)
    }

    #[test]
    fn test_nested_lists() {
        let expr = read("(define (domain d) (:types a b))").unwrap();
        let items = expr.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_symbol(), Some("define"));
        assert_eq!(items[1].head(), Some("domain"));
        assert_eq!(expr.to_string(), "(define (domain d) (:types a b))");
    }

    #[test]
    fn test_missing_close() {
        let err = read("(define (domain d)").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedEof { .. }));
    }

    #[test]
    fn test_extra_close() {
        let err = read("(define (domain d)))").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Unbalanced);
        assert_eq!(err.column, 20);
    }

    #[test]
    fn test_depth_limit() {
        let at_limit = format!("{}{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(read(&at_limit).is_ok());

        let too_deep = format!("{}{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        let err = read(&too_deep).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeep { limit: MAX_DEPTH });
        assert_eq!(err.column, MAX_DEPTH + 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(read("  ; nothing\n").is_err());
    }
}
