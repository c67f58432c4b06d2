/// Lexer for the simulator's native scene syntax.
///
/// Only the structure the supervisor cares about is tokenised: bare words
/// (type names, field names, numbers, keywords), quoted strings and the
/// brace/bracket delimiters. Commas are whitespace, `#` starts a comment.
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Any run of non-delimiter characters: `Solid`, `name`, `0.5`, `DEF`, `TRUE`.
    Word(String),
    /// The unescaped contents of a `"..."` literal.
    Str(String),

    // Punctuation
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Special
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(s) => write!(f, "{s}"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
    pub col: usize,
}

pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.token == Token::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.input.get(self.pos).copied()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(b) = self.peek_byte() {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' | b',' => {
                    self.advance();
                }
                b'#' => {
                    while let Some(c) = self.advance() {
                        if c == b'\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<SpannedToken, LexError> {
        self.skip_whitespace_and_comments();

        let line = self.line;
        let col = self.col;
        let start = self.pos;

        let Some(b) = self.peek_byte() else {
            return Ok(SpannedToken {
                token: Token::Eof,
                line,
                col,
            });
        };

        let punct = match b {
            b'{' => Some(Token::LBrace),
            b'}' => Some(Token::RBrace),
            b'[' => Some(Token::LBracket),
            b']' => Some(Token::RBracket),
            _ => None,
        };

        if let Some(token) = punct {
            self.advance();
            return Ok(SpannedToken {
                token,
                line,
                col,
            });
        }

        if b == b'"' {
            self.advance();
            let mut buf = Vec::new();
            loop {
                match self.advance() {
                    None => {
                        return Err(LexError {
                            line,
                            col,
                            message: "unterminated string literal".to_string(),
                        });
                    }
                    Some(b'"') => break,
                    Some(b'\\') => match self.advance() {
                        Some(escaped) => buf.push(escaped),
                        None => {
                            return Err(LexError {
                                line,
                                col,
                                message: "unterminated string literal".to_string(),
                            });
                        }
                    },
                    Some(c) => buf.push(c),
                }
            }
            return Ok(SpannedToken {
                token: Token::Str(String::from_utf8_lossy(&buf).into_owned()),
                line,
                col,
            });
        }

        while let Some(c) = self.peek_byte() {
            if c.is_ascii_whitespace() || matches!(c, b',' | b'#' | b'"' | b'{' | b'}' | b'[' | b']')
            {
                break;
            }
            self.advance();
        }
        let word = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
        Ok(SpannedToken {
            token: Token::Word(word),
            line,
            col,
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{line}:{col}: {message}")]
pub struct LexError {
    pub line: usize,
    pub col: usize,
    pub message: String,
}
