//! Compiler error types.
#![allow(unused_assignments)]

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// The kind of top-level definition an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Interface,
    Mixin,
    Dictionary,
    Enum,
    Typedef,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DefinitionKind::Interface => "interface",
            DefinitionKind::Mixin => "interface mixin",
            DefinitionKind::Dictionary => "dictionary",
            DefinitionKind::Enum => "enum",
            DefinitionKind::Typedef => "typedef",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during compilation.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum CompilerError {
    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("Failed to access '{}': {message}", path.display())]
    #[diagnostic(code(napidl::io::error))]
    IoError {
        path: PathBuf,
        message: String,
    },

    // =========================================================================
    // Frontend Errors
    // =========================================================================
    #[error("Syntax error at {}:{line}:{column}: {message}", file.display())]
    #[diagnostic(code(napidl::parse::syntax_error))]
    SyntaxError {
        message: String,
        file: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("Invalid IDL tree in '{}': {message}", file.display())]
    #[diagnostic(
        code(napidl::parse::invalid_tree),
        help("JSON input must be the array of definitions produced by webidl2's parse()")
    )]
    InvalidTree {
        message: String,
        file: PathBuf,
    },

    #[error("Unsupported input format: {format}")]
    #[diagnostic(
        code(napidl::frontend::unsupported_format),
        help("Supported formats are 'idl' and 'json'")
    )]
    UnsupportedFormat {
        format: String,
    },

    // =========================================================================
    // Normalization Errors
    // =========================================================================
    #[error("Cannot find {kind} '{ancestor}' which is inherited by {kind} '{name}'")]
    #[diagnostic(code(napidl::normalize::unresolved_ancestor))]
    UnresolvedAncestor {
        kind: DefinitionKind,
        name: String,
        ancestor: String,
    },

    #[error("Cannot include '{mixin}' into '{target}' because '{missing}' was not found")]
    #[diagnostic(
        code(napidl::normalize::unresolved_include),
        help("Both sides of an includes statement must be declared in the same document")
    )]
    UnresolvedInclude {
        target: String,
        mixin: String,
        missing: String,
    },

    #[error("Inheritance cycle between {kind}s: {}", cycle.join(" -> "))]
    #[diagnostic(code(napidl::normalize::inheritance_cycle))]
    InheritanceCycle {
        kind: DefinitionKind,
        cycle: Vec<String>,
    },

    #[error("'{name}' is defined more than once")]
    #[diagnostic(
        code(napidl::normalize::duplicate_definition),
        help("Use a partial definition to extend an existing one")
    )]
    DuplicateDefinition {
        name: String,
    },

    #[error("Enum '{enum_name}' values \"{first}\" and \"{second}\" both map to identifier '{identifier}'")]
    #[diagnostic(
        code(napidl::normalize::enum_identifier_collision),
        help("Native enumerator names are derived by upper-casing the first character and replacing non-alphanumerics with '_'")
    )]
    EnumIdentifierCollision {
        enum_name: String,
        first: String,
        second: String,
        identifier: String,
    },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Operation '{interface}.{operation}' mixes static and non-static overloads")]
    #[diagnostic(code(napidl::validate::mixed_static_overload))]
    MixedStaticOverload {
        interface: String,
        operation: String,
    },
}

impl CompilerError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }
}
