//! Diagnostic types for error reporting.

mod error;
mod span;

pub use error::{CompilerError, DefinitionKind};
pub use span::Span;
