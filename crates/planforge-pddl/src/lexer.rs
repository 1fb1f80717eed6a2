//! Tokenizer
//!
//! Symbols are case-insensitive and are lowercased here. `;` starts a
//! comment that runs to the end of the line.

use std::fmt;

use crate::error::{Document, ParseError, ParseErrorKind, ParseResult};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Open,
    Close,
    /// `?name`, stored with the question mark.
    Variable(String),
    /// `:name`, stored without the colon.
    Keyword(String),
    Number(f64),
    Symbol(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Open => f.write_str("`(`"),
            TokenKind::Close => f.write_str("`)`"),
            TokenKind::Variable(v) => write!(f, "variable `{}`", v),
            TokenKind::Keyword(k) => write!(f, "keyword `:{}`", k),
            TokenKind::Number(n) => write!(f, "number `{}`", n),
            TokenKind::Symbol(s) => write!(f, "`{}`", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

pub fn tokenize(text: &str, document: Document) -> ParseResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let (mut line, mut column) = (1usize, 1usize);

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                chars.next();
                line += 1;
                column = 1;
            }
            c if c.is_whitespace() => {
                chars.next();
                column += 1;
            }
            ';' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '(' | ')' => {
                chars.next();
                let kind = if c == '(' {
                    TokenKind::Open
                } else {
                    TokenKind::Close
                };
                tokens.push(Token { kind, line, column });
                column += 1;
            }
            _ => {
                let start = column;
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' || c == ';' {
                        break;
                    }
                    word.extend(c.to_lowercase());
                    chars.next();
                    column += 1;
                }
                let kind = classify(&word).ok_or_else(|| ParseError {
                    document,
                    line,
                    column: start,
                    kind: ParseErrorKind::Unexpected {
                        found: format!("`{}`", word),
                        expected: "a name after the prefix".to_string(),
                    },
                })?;
                tokens.push(Token {
                    kind,
                    line,
                    column: start,
                });
            }
        }
    }
    Ok(tokens)
}

fn classify(word: &str) -> Option<TokenKind> {
    if let Some(rest) = word.strip_prefix('?') {
        return (!rest.is_empty()).then(|| TokenKind::Variable(word.to_string()));
    }
    if let Some(rest) = word.strip_prefix(':') {
        return (!rest.is_empty()).then(|| TokenKind::Keyword(rest.to_string()));
    }
    if looks_numeric(word) {
        if let Ok(n) = word.parse::<f64>() {
            return Some(TokenKind::Number(n));
        }
    }
    Some(TokenKind::Symbol(word.to_string()))
}

fn looks_numeric(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    digits
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text, Document::Domain)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_token_kinds() {
        assert_eq!(
            kinds("(At ?X :Typing 2.5 - -1)"),
            vec![
                TokenKind::Open,
                TokenKind::Symbol("at".to_string()),
                TokenKind::Variable("?x".to_string()),
                TokenKind::Keyword("typing".to_string()),
                TokenKind::Number(2.5),
                TokenKind::Symbol("-".to_string()),
                TokenKind::Number(-1.0),
                TokenKind::Close,
            ]
        );
    }

    #[test]
    fn test_comments_and_positions() {
        let tokens = tokenize("; header\n  (a ; trailing\n b)", Document::Problem).unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!((tokens[0].line, tokens[0].column), (2, 3));
        assert_eq!((tokens[2].line, tokens[2].column), (3, 2));
    }

    #[test]
    fn test_symbols_with_digits() {
        assert_eq!(kinds("robot1 1a"), vec![
            TokenKind::Symbol("robot1".to_string()),
            TokenKind::Symbol("1a".to_string()),
        ]);
    }

    #[test]
    fn test_bare_question_mark() {
        let err = tokenize("(p ?)", Document::Domain).unwrap_err();
        assert_eq!((err.line, err.column), (1, 4));
    }
}
