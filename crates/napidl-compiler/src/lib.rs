//! # napidl Compiler
//!
//! This crate compiles WebIDL documents into C++ bindings for N-API. The
//! generated translation unit exposes the described interfaces, dictionaries,
//! enums and typedefs to JavaScript on top of a small support header.
//!
//! ## Supported Input Formats
//!
//! - WebIDL text (default)
//! - The JSON tree produced by the `webidl2` parser
//!
//! ## Architecture
//!
//! ```text
//! IDL document (text or JSON)
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Frontend   │  Format-specific parsing
//! │ (src → AST)  │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │      IR      │  Partials, mixins and inheritance merged
//! │ (AST → IR)   │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Validate   │  Overload set checks
//! │    (IR)      │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Codegen    │  Converters, bindings, module init
//! │ (IR → C++)   │
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use napidl_compiler::{Compiler, CompilerConfig};
//!
//! let config = CompilerConfig {
//!     input: "webgpu.idl".into(),
//!     extra_includes: vec!["webgpu-impl.h".to_string()],
//!     ..Default::default()
//! };
//!
//! let compiler = Compiler::new(config);
//! compiler.compile()?;
//! ```

pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod frontend;
pub mod ir;
pub mod typemap;
pub mod validate;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub use codegen::{GenerateOptions, GeneratedCode};
pub use config::CompilerConfig;
pub use diagnostic::CompilerError;
pub use frontend::SourceFormat;

/// The main compiler struct that orchestrates the compilation pipeline.
pub struct Compiler {
    config: CompilerConfig,
}

/// Result of a compilation.
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub interfaces: usize,
    pub dictionaries: usize,
    pub enums: usize,
    pub typedefs: usize,
    /// Constructs whose bindings throw "not implemented".
    pub unsupported: Vec<String>,
    /// Validation warnings such as unreachable overloads.
    pub warnings: Vec<String>,
    /// Files written, empty for [`Compiler::check`].
    pub written: Vec<PathBuf>,
}

/// A generated translation unit with the model summary it was built from.
struct Generation {
    code: GeneratedCode,
    result: CompileResult,
}

impl Compiler {
    /// Creates a new compiler with the given configuration.
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles the input document and writes the generated source.
    ///
    /// This runs the full pipeline:
    /// 1. Parse the input with the frontend for its format
    /// 2. Normalize the raw tree into the canonical model
    /// 3. Validate overload sets
    /// 4. Generate the C++ translation unit in memory
    /// 5. Write the support header if requested, then the output file
    ///
    /// Nothing is written unless every earlier phase succeeds.
    pub fn compile(&self) -> Result<CompileResult, CompilerError> {
        let Generation { code, mut result } = self.run()?;

        let output = self.config.output_path();

        // The header goes first so a failed write leaves no bindings behind.
        if self.config.write_support_header {
            let dir = output.parent().unwrap_or_else(|| Path::new(""));
            let header = dir.join(codegen::runtime::SUPPORT_HEADER_NAME);
            write_file(&header, codegen::runtime::SUPPORT_HEADER)?;
            result.written.push(header);
        }

        write_file(&output, &code.source)?;
        result.written.push(output.clone());

        info!(output = %output.display(), "wrote bindings");
        Ok(result)
    }

    /// Runs the pipeline without writing anything.
    pub fn check(&self) -> Result<CompileResult, CompilerError> {
        Ok(self.run()?.result)
    }

    /// Returns the generated source without writing it.
    pub fn generate_source(&self) -> Result<String, CompilerError> {
        Ok(self.run()?.code.source)
    }

    fn run(&self) -> Result<Generation, CompilerError> {
        let format = self.config.source_format();
        debug!(input = %self.config.input.display(), %format, "parsing");

        // Phase 1: Parse
        let mut frontend = frontend::create_frontend(format);
        let definitions = frontend.parse_file(&self.config.input)?;

        // Phase 2: Normalize
        let model = ir::normalize(definitions)?;

        // Phase 3: Validate
        let warnings = validate::validate_model(&model)?;

        // Phase 4: Generate
        let options = GenerateOptions {
            module_name: self.config.module_name(),
            napi_header: self.config.napi_header.clone(),
            extra_includes: self.config.extra_includes.clone(),
            register_module: self.config.register_module,
            source_name: self
                .config
                .input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
        };
        let code = codegen::generate(&model, &options);

        let result = CompileResult {
            interfaces: model.interfaces.len(),
            dictionaries: model.dictionaries.len(),
            enums: model.enums.len(),
            typedefs: model.typedefs.len(),
            unsupported: code.unsupported.clone(),
            warnings,
            written: Vec::new(),
        };
        Ok(Generation { code, result })
    }
}

/// Generates bindings for an in-memory document.
pub fn generate_bindings(
    source: &str,
    format: SourceFormat,
    options: &GenerateOptions,
) -> Result<GeneratedCode, CompilerError> {
    let mut frontend = frontend::create_frontend(format);
    let definitions = frontend.parse(source, Path::new("<input>"))?;
    let model = ir::normalize(definitions)?;
    validate::validate_model(&model)?;
    Ok(codegen::generate(&model, options))
}

fn write_file(path: &Path, content: &str) -> Result<(), CompilerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CompilerError::io(parent, e.to_string()))?;
    }
    std::fs::write(path, content).map_err(|e| CompilerError::io(path, e.to_string()))
}
