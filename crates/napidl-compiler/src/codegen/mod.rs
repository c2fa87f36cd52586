//! C++ binding generation from the canonical model.
//!
//! The generator emits a single translation unit that includes the support
//! header and contains, in order:
//! - forward declarations for every converter
//! - converter definitions for typedefs, enums, dictionaries and generic
//!   instantiations
//! - per-interface converters and bindings
//! - the module initialization function
//!
//! Each construct has its own emitter function returning a text fragment;
//! [`generate`] concatenates them. Output depends only on the model, so the
//! same input always produces byte-identical code.

mod converters;
mod cpp;
mod interface;
mod module;
pub mod runtime;
pub mod signature;

use tracing::{debug, warn};

use crate::ir::Model;

pub use cpp::c_identifier;

/// Options that shape the generated translation unit.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Prefix of the `<module>_init` entry point.
    pub module_name: String,
    /// The N-API header included first.
    pub napi_header: String,
    /// Additional headers included after the support header.
    pub extra_includes: Vec<String>,
    /// Emit `NAPI_MODULE_INIT()` calling the init function.
    pub register_module: bool,
    /// Input file name recorded in the file comment.
    pub source_name: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            module_name: "module".to_string(),
            napi_header: "js_native_api.h".to_string(),
            extra_includes: Vec::new(),
            register_module: false,
            source_name: None,
        }
    }
}

/// The generated translation unit.
#[derive(Debug, Clone)]
pub struct GeneratedCode {
    pub source: String,
    /// Constructs whose bindings throw "not implemented" at runtime.
    pub unsupported: Vec<String>,
}

/// Collects constructs that have no converter rule.
#[derive(Debug, Default)]
pub struct Unsupported(Vec<String>);

impl Unsupported {
    pub fn record(&mut self, construct: String) {
        warn!(construct = %construct, "no converter rule, binding will throw");
        self.0.push(construct);
    }

    pub fn constructs(&self) -> &[String] {
        &self.0
    }

    fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Generates the C++ translation unit for `model`.
pub fn generate(model: &Model, options: &GenerateOptions) -> GeneratedCode {
    let mut unsupported = Unsupported::default();
    let instantiations = converters::collect_instantiations(model);
    let mut sections = vec![module::prologue(options)];

    let forward = converters::forward_declarations(model, &instantiations);
    if !forward.is_empty() {
        sections.push(format!("{}\n{}", cpp::banner("Forward declarations"), forward.trim_end()));
    }

    for typedef in model.typedefs.values() {
        sections.push(format!(
            "{}\n{}",
            cpp::banner(&format!("Typedef `{}`", typedef.name)),
            converters::typedef_converters(model, typedef, &mut unsupported).trim_end()
        ));
    }

    for e in model.enums.values() {
        sections.push(format!(
            "{}\n{}",
            cpp::banner(&format!("Enum `{}`", e.name)),
            converters::enum_converters(e).trim_end()
        ));
    }

    for dict in model.dictionaries.values() {
        sections.push(format!(
            "{}\n{}",
            cpp::banner(&format!("Dictionary `{}`", dict.name)),
            converters::dictionary_converters(model, dict, &mut unsupported).trim_end()
        ));
    }

    for instantiation in &instantiations {
        sections.push(format!(
            "{}\n{}",
            cpp::banner(&format!("Converter for `{}`", instantiation.native)),
            converters::generic_converters(model, instantiation).trim_end()
        ));
    }

    for iface in model.interfaces.values() {
        sections.push(format!(
            "{}\n{}\n\n{}",
            cpp::banner(&format!("Interface `{}`", iface.name)),
            converters::interface_converters(iface).trim_end(),
            interface::bindings(model, iface, &mut unsupported).trim_end()
        ));
    }

    sections.push(module::init(model, options).trim_end().to_string());
    if options.register_module {
        sections.push(module::registration(options).trim_end().to_string());
    }

    let mut source = sections.join("\n\n");
    source.push('\n');

    debug!(
        bytes = source.len(),
        instantiations = instantiations.len(),
        unsupported = unsupported.constructs().len(),
        "generated bindings"
    );

    GeneratedCode {
        source,
        unsupported: unsupported.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::idl::parse_str;
    use crate::ir::normalize;

    fn generate_from(source: &str) -> GeneratedCode {
        let model = normalize(parse_str(source).unwrap()).unwrap();
        generate(
            &model,
            &GenerateOptions {
                module_name: "example".to_string(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn sections_follow_emission_order() {
        let code = generate_from(
            r#"
            typedef unsigned long Size;
            enum Mode { "a", "b" };
            dictionary Options { Mode mode; };
            interface Thing { Promise<Options> load(); };
            "#,
        )
        .source;

        let positions: Vec<usize> = [
            "#include \"js_native_api.h\"",
            "// Forward declarations",
            "// Typedef `Size`",
            "// Enum `Mode`",
            "// Dictionary `Options`",
            "// Converter for `WebIdlNapi::Promise<Options>`",
            "// Interface `Thing`",
            "example_init(",
        ]
        .iter()
        .map(|needle| code.find(needle).unwrap_or_else(|| panic!("missing {}", needle)))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);
        assert!(code.ends_with("}\n"));
        assert!(!code.contains("NAPI_MODULE_INIT"));
    }

    #[test]
    fn output_is_deterministic() {
        let source = "interface A { attribute long x; }; dictionary D { long y; };";
        assert_eq!(generate_from(source).source, generate_from(source).source);
    }

    #[test]
    fn unsupported_constructs_are_reported() {
        let generated = generate_from("interface A { undefined f(record<DOMString, long> r); };");
        assert_eq!(generated.unsupported.len(), 1);
        assert!(generated.unsupported[0].contains("A.f"));
        assert!(generated.source.contains("WebIdlNapi::ThrowNotImplemented(env, \"A.f(record<DOMString, long>)\")"));
    }

    #[test]
    fn registration_is_optional() {
        let model = normalize(parse_str("interface A { };").unwrap()).unwrap();
        let code = generate(
            &model,
            &GenerateOptions {
                module_name: "example".to_string(),
                register_module: true,
                ..Default::default()
            },
        )
        .source;
        assert!(code.contains("NAPI_MODULE_INIT() {\n  return example_init(env);\n}"));
    }
}
