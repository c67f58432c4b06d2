/// Structural parser for scene fragments.
///
/// A fragment is a sequence of top-level nodes of the form
/// `[DEF <id>] <Type> { <fields> }`. Field values are not interpreted; the
/// parser only checks that delimiters balance and picks out each node's
/// top-level `name` field.
use crate::fragment::lexer::{LexError, Lexer, SpannedToken, Token};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FragmentError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("{line}:{col}: expected {expected}, got {found}")]
    Expected {
        line: usize,
        col: usize,
        expected: &'static str,
        found: String,
    },

    #[error("{line}:{col}: mismatched '{found}'")]
    Mismatched {
        line: usize,
        col: usize,
        found: String,
    },

    #[error("node '{type_name}' is not closed")]
    Unclosed { type_name: String },
}

/// One top-level node found in a fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNode {
    /// The node type, e.g. `Robot` or `Solid`.
    pub type_name: String,
    /// The value of the node's own `name` field, if it has one.
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Name extraction
// ---------------------------------------------------------------------------

/// Returns `true` if `value` only uses the characters allowed in an entity
/// name (`[a-z0-9_]`). The empty string passes; callers reject it separately.
#[must_use]
pub fn is_valid_name(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Find the entity name declared by a fragment.
///
/// Scans for the first `name "<value>"` field sitting directly inside a
/// top-level node whose value matches `[a-z0-9_]*`. Candidates with other
/// characters are skipped. Returns `None` when no candidate exists or the
/// text does not tokenise.
#[must_use]
pub fn extract_name(text: &str) -> Option<String> {
    let tokens = Lexer::new(text).tokenize().ok()?;
    let mut depth = 0usize;
    let mut iter = tokens.iter().peekable();

    while let Some(tok) = iter.next() {
        match &tok.token {
            Token::LBrace => depth += 1,
            Token::RBrace => depth = depth.saturating_sub(1),
            Token::Word(word) if depth == 1 && word == "name" => {
                if let Some(SpannedToken {
                    token: Token::Str(value),
                    ..
                }) = iter.peek()
                    && is_valid_name(value)
                {
                    return Some(value.clone());
                }
            }
            _ => {}
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Node splitting
// ---------------------------------------------------------------------------

/// Split a fragment into its top-level nodes.
///
/// # Errors
///
/// Returns a [`FragmentError`] if the text does not tokenise, a node header
/// is malformed, or the delimiters do not balance.
pub fn split_nodes(text: &str) -> Result<Vec<ParsedNode>, FragmentError> {
    let tokens = Lexer::new(text).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_nodes()
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    // -- Helpers --

    fn peek(&self) -> &SpannedToken {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> SpannedToken {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect_word(&mut self, expected: &'static str) -> Result<String, FragmentError> {
        let tok = self.advance();
        match tok.token {
            Token::Word(word) => Ok(word),
            other => Err(FragmentError::Expected {
                line: tok.line,
                col: tok.col,
                expected,
                found: other.to_string(),
            }),
        }
    }

    // -- Grammar --

    fn parse_nodes(&mut self) -> Result<Vec<ParsedNode>, FragmentError> {
        let mut nodes = Vec::new();
        while self.peek().token != Token::Eof {
            nodes.push(self.parse_node()?);
        }
        Ok(nodes)
    }

    fn parse_node(&mut self) -> Result<ParsedNode, FragmentError> {
        let mut type_name = self.expect_word("node type")?;
        if type_name == "DEF" {
            self.expect_word("DEF identifier")?;
            type_name = self.expect_word("node type")?;
        }

        let open = self.advance();
        if open.token != Token::LBrace {
            return Err(FragmentError::Expected {
                line: open.line,
                col: open.col,
                expected: "'{'",
                found: open.token.to_string(),
            });
        }

        // Delimiters still open inside this node, outermost brace excluded.
        let mut stack: Vec<Token> = Vec::new();
        let mut name = None;

        loop {
            let tok = self.advance();
            match tok.token {
                Token::Eof => return Err(FragmentError::Unclosed { type_name }),
                Token::LBrace | Token::LBracket => stack.push(tok.token.clone()),
                Token::RBrace if stack.is_empty() => break,
                Token::RBrace | Token::RBracket => {
                    let expected_open = if tok.token == Token::RBrace {
                        Token::LBrace
                    } else {
                        Token::LBracket
                    };
                    if stack.pop() != Some(expected_open) {
                        return Err(FragmentError::Mismatched {
                            line: tok.line,
                            col: tok.col,
                            found: tok.token.to_string(),
                        });
                    }
                }
                Token::Word(ref word) if stack.is_empty() && word == "name" && name.is_none() => {
                    if let Token::Str(value) = &self.peek().token {
                        name = Some(value.clone());
                    }
                }
                _ => {}
            }
        }

        Ok(ParsedNode { type_name, name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_name() {
        assert_eq!(
            extract_name(r#"Solid { translation 0 0 1 name "abc123" }"#),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_extract_without_name_field() {
        assert_eq!(extract_name("Solid { translation 0 0 1 }"), None);
        assert_eq!(extract_name("no braces at all"), None);
        assert_eq!(extract_name(""), None);
    }

    #[test]
    fn test_extract_empty_name() {
        assert_eq!(extract_name(r#"Solid { name "" }"#), Some(String::new()));
    }

    #[test]
    fn test_extract_skips_invalid_characters() {
        let text = r#"Solid { name "Big Box" name "box_2" }"#;
        assert_eq!(extract_name(text), Some("box_2".to_string()));
    }

    #[test]
    fn test_extract_ignores_nested_names() {
        let text = r#"
            Robot {
              children [
                Solid { name "wheel" }
              ]
              name "rover"
            }
        "#;
        assert_eq!(extract_name(text), Some("rover".to_string()));
    }

    #[test]
    fn test_extract_ignores_comments_and_strings() {
        let text = "Solid {\n  # name \"commented\"\n  description \"name\" name \"real\"\n}";
        assert_eq!(extract_name(text), Some("real".to_string()));
    }

    #[test]
    fn test_extract_unlexable_text() {
        assert_eq!(extract_name(r#"Solid { name "open"#), None);
    }

    #[test]
    fn test_valid_name_class() {
        assert!(is_valid_name("box_1"));
        assert!(is_valid_name(""));
        assert!(!is_valid_name("Box"));
        assert!(!is_valid_name("box-1"));
    }

    #[test]
    fn test_split_single_node() {
        let nodes = split_nodes(r#"Solid { name "box_1" children [ Shape { } ] }"#).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].type_name, "Solid");
        assert_eq!(nodes[0].name.as_deref(), Some("box_1"));
    }

    #[test]
    fn test_split_multiple_nodes_with_def() {
        let text = r#"DEF A Solid { name "a" } Pose { translation 1 2 3 }"#;
        let nodes = split_nodes(text).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].type_name, "Solid");
        assert_eq!(nodes[0].name.as_deref(), Some("a"));
        assert_eq!(nodes[1].type_name, "Pose");
        assert_eq!(nodes[1].name, None);
    }

    #[test]
    fn test_split_keeps_any_name_value() {
        let nodes = split_nodes(r#"Robot { name "My Robot" }"#).unwrap();
        assert_eq!(nodes[0].name.as_deref(), Some("My Robot"));
    }

    #[test]
    fn test_split_empty_text() {
        assert!(split_nodes("  # nothing here\n").unwrap().is_empty());
    }

    #[test]
    fn test_split_unclosed_node() {
        let err = split_nodes(r#"Solid { name "box_1""#).unwrap_err();
        assert_eq!(
            err,
            FragmentError::Unclosed {
                type_name: "Solid".to_string()
            }
        );
    }

    #[test]
    fn test_split_mismatched_delimiters() {
        let err = split_nodes("Solid { children [ } ]").unwrap_err();
        assert!(matches!(err, FragmentError::Mismatched { .. }));
    }

    #[test]
    fn test_split_missing_brace() {
        let err = split_nodes(r#"Solid name "x""#).unwrap_err();
        assert!(matches!(
            err,
            FragmentError::Expected {
                expected: "'{'",
                ..
            }
        ));
    }
}
