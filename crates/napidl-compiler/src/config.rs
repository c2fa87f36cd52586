//! Compiler configuration.

use std::path::PathBuf;

use crate::codegen::c_identifier;
use crate::frontend::SourceFormat;

/// Configuration for one generator run.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// The IDL document to compile.
    pub input: PathBuf,

    /// Output file (default: the input path with a `.cc` extension).
    pub output: Option<PathBuf>,

    /// Prefix of the generated `<module>_init` function (default: the input
    /// file stem as a C identifier).
    pub module_name: Option<String>,

    /// N-API header included first (default: "js_native_api.h").
    pub napi_header: String,

    /// Headers included after the support header, in order.
    pub extra_includes: Vec<String>,

    /// Input format (default: picked from the input extension).
    pub format: Option<SourceFormat>,

    /// Emit a `NAPI_MODULE_INIT()` registration block.
    pub register_module: bool,

    /// Write `webidl-napi.h` next to the output file.
    pub write_support_header: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("bindings.idl"),
            output: None,
            module_name: None,
            napi_header: "js_native_api.h".to_string(),
            extra_includes: Vec::new(),
            format: None,
            register_module: false,
            write_support_header: false,
        }
    }
}

impl CompilerConfig {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("cc"))
    }

    pub fn module_name(&self) -> String {
        match &self.module_name {
            Some(name) => c_identifier(name),
            None => c_identifier(
                &self
                    .input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
        }
    }

    pub fn source_format(&self) -> SourceFormat {
        self.format
            .unwrap_or_else(|| SourceFormat::from_path(&self.input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_derive_from_input() {
        let config = CompilerConfig {
            input: PathBuf::from("idl/web-gpu.idl"),
            ..Default::default()
        };
        assert_eq!(config.output_path(), PathBuf::from("idl/web-gpu.cc"));
        assert_eq!(config.module_name(), "web_gpu");
        assert_eq!(config.source_format(), SourceFormat::Idl);
    }

    #[test]
    fn explicit_settings_win() {
        let config = CompilerConfig {
            input: PathBuf::from("tree.json"),
            output: Some(PathBuf::from("out/bindings.cc")),
            module_name: Some("my-addon".to_string()),
            format: Some(SourceFormat::Idl),
            ..Default::default()
        };
        assert_eq!(config.output_path(), PathBuf::from("out/bindings.cc"));
        assert_eq!(config.module_name(), "my_addon");
        assert_eq!(config.source_format(), SourceFormat::Idl);
    }
}
