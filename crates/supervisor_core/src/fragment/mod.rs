//! Scene fragments in the simulator's native syntax.
//!
//! - [`lexer`] — tokeniser for fragment text.
//! - [`parser`] — entity name extraction and top-level node splitting.

pub mod lexer;
pub mod parser;

pub use lexer::{LexError, Lexer};
pub use parser::{FragmentError, ParsedNode, extract_name, is_valid_name, split_nodes};
