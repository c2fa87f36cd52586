//! Frontends that turn IDL input into the raw syntax tree.
//!
//! Each frontend is responsible for one input format:
//! 1. `idl` parses WebIDL text directly
//! 2. `json` reads the definition array produced by the `webidl2` parser
//!
//! Both produce the same closed [`ast::Definition`] tree, so normalization and
//! code generation never see format-specific shapes.

pub mod ast;
pub mod idl;
pub mod json;

use std::fmt;
use std::path::Path;

use crate::diagnostic::CompilerError;
use ast::Definition;

/// Trait for input frontends.
pub trait Frontend {
    /// Returns the format name (e.g., "idl", "json").
    fn format(&self) -> &str;

    /// Returns file extensions this frontend handles.
    fn extensions(&self) -> &[&str];

    /// Parses one IDL document. `path` is used for diagnostics only.
    fn parse(&mut self, source: &str, path: &Path) -> Result<Vec<Definition>, CompilerError>;

    /// Reads and parses the document at `path`.
    fn parse_file(&mut self, path: &Path) -> Result<Vec<Definition>, CompilerError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| CompilerError::io(path, e.to_string()))?;
        self.parse(&source, path)
    }
}

/// Input formats understood by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Idl,
    Json,
}

impl SourceFormat {
    /// Picks the format from a file extension; anything but `.json` is IDL text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
            _ => SourceFormat::Idl,
        }
    }

    /// Parses a user-supplied format name.
    pub fn from_name(name: &str) -> Result<Self, CompilerError> {
        match name {
            "idl" | "webidl" => Ok(SourceFormat::Idl),
            "json" | "webidl2" => Ok(SourceFormat::Json),
            _ => Err(CompilerError::UnsupportedFormat {
                format: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Idl => f.write_str("idl"),
            SourceFormat::Json => f.write_str("json"),
        }
    }
}

/// Creates a frontend for the given format.
pub fn create_frontend(format: SourceFormat) -> Box<dyn Frontend> {
    match format {
        SourceFormat::Idl => Box::new(idl::IdlFrontend::new()),
        SourceFormat::Json => Box::new(json::JsonFrontend::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("gpu.idl")), SourceFormat::Idl);
        assert_eq!(SourceFormat::from_path(Path::new("gpu.webidl")), SourceFormat::Idl);
        assert_eq!(SourceFormat::from_path(Path::new("tree.JSON")), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("noext")), SourceFormat::Idl);
    }

    #[test]
    fn unknown_format_name_is_rejected() {
        assert!(matches!(
            SourceFormat::from_name("yaml"),
            Err(CompilerError::UnsupportedFormat { .. })
        ));
        assert_eq!(SourceFormat::from_name("webidl2").unwrap(), SourceFormat::Json);
    }
}
