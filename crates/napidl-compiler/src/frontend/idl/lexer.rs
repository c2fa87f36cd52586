//! WebIDL tokenizer.

use crate::diagnostic::Span;

/// Token kinds produced by [`tokenize`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifiers and keywords alike; keywords are matched by text.
    Ident(String),
    /// A string literal, without quotes.
    String(String),
    /// An integer or decimal literal as written.
    Number(String),
    /// Single-character punctuation.
    Punct(char),
    /// `...`
    Ellipsis,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// A tokenizer failure with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

const PUNCTUATION: &[char] = &['(', ')', '{', '}', '[', ']', '<', '>', ',', ';', ':', '=', '?', '-', '*'];

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    fn span(&self) -> Span {
        Span::new(self.offset, self.line, self.column)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (idx, c) = self.chars.next()?;
        self.offset = idx + c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat_while(&mut self, out: &mut String, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Splits WebIDL source into tokens, dropping whitespace and comments.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    loop {
        let span = cursor.span();
        let Some(c) = cursor.peek() else {
            tokens.push(Token {
                kind: TokenKind::Eof,
                span,
            });
            return Ok(tokens);
        };

        if c.is_whitespace() {
            cursor.bump();
            continue;
        }

        if c == '/' {
            cursor.bump();
            match cursor.peek() {
                Some('/') => {
                    while let Some(c) = cursor.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('*') => {
                    cursor.bump();
                    let mut prev = '\0';
                    loop {
                        match cursor.bump() {
                            Some('/') if prev == '*' => break,
                            Some(c) => prev = c,
                            None => {
                                return Err(LexError {
                                    message: "unterminated block comment".to_string(),
                                    span,
                                })
                            }
                        }
                    }
                }
                _ => {
                    return Err(LexError {
                        message: "unexpected character '/'".to_string(),
                        span,
                    })
                }
            }
            continue;
        }

        let kind = if c == '"' {
            cursor.bump();
            let mut value = String::new();
            loop {
                match cursor.bump() {
                    Some('"') => break,
                    Some('\n') | None => {
                        return Err(LexError {
                            message: "unterminated string literal".to_string(),
                            span,
                        })
                    }
                    Some(c) => value.push(c),
                }
            }
            TokenKind::String(value)
        } else if c.is_ascii_digit() || (c == '-' && starts_number(source, cursor.offset)) {
            let mut text = String::new();
            if c == '-' {
                text.push('-');
                cursor.bump();
            }
            cursor.eat_while(&mut text, |c| c.is_ascii_alphanumeric() || c == '.');
            TokenKind::Number(text)
        } else if is_ident_start(c) {
            let mut text = String::new();
            cursor.eat_while(&mut text, is_ident_continue);
            TokenKind::Ident(text)
        } else if c == '.' {
            for _ in 0..3 {
                if cursor.bump() != Some('.') {
                    return Err(LexError {
                        message: "expected '...'".to_string(),
                        span,
                    });
                }
            }
            TokenKind::Ellipsis
        } else if PUNCTUATION.contains(&c) {
            cursor.bump();
            TokenKind::Punct(c)
        } else {
            return Err(LexError {
                message: format!("unexpected character '{}'", c),
                span,
            });
        };

        tokens.push(Token { kind, span });
    }
}

fn starts_number(source: &str, offset: usize) -> bool {
    source[offset..]
        .chars()
        .nth(1)
        .is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_interface_header() {
        assert_eq!(
            kinds("interface Foo : Bar {"),
            vec![
                TokenKind::Ident("interface".to_string()),
                TokenKind::Ident("Foo".to_string()),
                TokenKind::Punct(':'),
                TokenKind::Ident("Bar".to_string()),
                TokenKind::Punct('{'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            kinds("// line\n/* block\n comment */ enum"),
            vec![TokenKind::Ident("enum".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn reads_strings_numbers_and_ellipsis() {
        assert_eq!(
            kinds("\"high-performance\" -4 16384 0.5 ..."),
            vec![
                TokenKind::String("high-performance".to_string()),
                TokenKind::Number("-4".to_string()),
                TokenKind::Number("16384".to_string()),
                TokenKind::Number("0.5".to_string()),
                TokenKind::Ellipsis,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = tokenize("enum\n  Foo").unwrap();
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 3);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("enum E { \"abc").unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!(err.span.column, 10);
    }
}
