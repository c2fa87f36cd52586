//! WebIDL text frontend.

mod lexer;
mod parser;

use std::path::Path;

use tracing::debug;

use super::ast::Definition;
use super::Frontend;
use crate::diagnostic::CompilerError;

/// Parses WebIDL source text.
#[derive(Debug, Default)]
pub struct IdlFrontend;

impl IdlFrontend {
    pub fn new() -> Self {
        Self
    }
}

/// Parses WebIDL text that did not come from a file.
pub fn parse_str(source: &str) -> Result<Vec<Definition>, CompilerError> {
    parser::parse_document(source, Path::new("<input>"))
}

impl Frontend for IdlFrontend {
    fn format(&self) -> &str {
        "idl"
    }

    fn extensions(&self) -> &[&str] {
        &["idl", "webidl"]
    }

    fn parse(&mut self, source: &str, path: &Path) -> Result<Vec<Definition>, CompilerError> {
        let definitions = parser::parse_document(source, path)?;
        debug!(
            file = %path.display(),
            definitions = definitions.len(),
            "parsed WebIDL text"
        );
        Ok(definitions)
    }
}
