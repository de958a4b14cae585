//! Source parsers.
//!
//! Each parser reads source text and produces an IR
//! [`CompilationUnit`](crate::ir::CompilationUnit).

pub mod go;
pub mod tags;

pub use go::{parse_go_file, parse_go_source};
pub use tags::{RECOGNIZED_TAG_KEYS, parse_tag};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The source is not a well-formed Go file.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("grammar unavailable: {0}")]
    Grammar(String),
}

impl ParseError {
    pub(crate) fn syntax_at(node: tree_sitter::Node, message: String) -> Self {
        let position = node.start_position();
        ParseError::Syntax {
            line: position.row + 1,
            column: position.column + 1,
            message,
        }
    }
}
