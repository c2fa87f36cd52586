//! File prologue and module initialization.

use super::cpp;
use super::interface::factory_name;
use super::runtime::SUPPORT_HEADER_NAME;
use super::GenerateOptions;
use crate::ir::Model;

/// File comment and `#include` lines: the N-API header, the support header,
/// then extra includes in the order given.
pub fn prologue(options: &GenerateOptions) -> String {
    let mut output = match &options.source_name {
        Some(source) => format!("// Generated by napidl from {}. Do not edit.\n\n", source),
        None => "// Generated by napidl. Do not edit.\n\n".to_string(),
    };
    let headers = [options.napi_header.as_str(), SUPPORT_HEADER_NAME]
        .into_iter()
        .chain(options.extra_includes.iter().map(String::as_str));
    for header in headers {
        output.push_str(&format!("#include {}\n", cpp::c_string(header)));
    }
    output
}

/// `<module>_init(env)`: builds every interface class and returns an exports
/// object with one enumerable property per interface, in declaration order.
/// Any failure aborts initialization before the exports object is created.
pub fn init(model: &Model, options: &GenerateOptions) -> String {
    let mut output = cpp::banner(&format!("Init module `{}`", options.module_name));
    output.push_str(&format!(
        "\nnapi_value\n{}_init(\n    napi_env env) {{\n",
        options.module_name
    ));

    let names: Vec<String> = (0..model.interfaces.len()).map(|i| format!("interface_{}", i)).collect();
    if !names.is_empty() {
        output.push_str(&format!("  napi_value {};\n\n", names.join(", ")));
        for (iface, value) in model.interfaces.keys().zip(&names) {
            output.push_str(&format!("  NAPI_CALL(env, {}(env, &{}));\n", factory_name(iface), value));
        }
        output.push('\n');

        let descriptors: Vec<cpp::PropertyDescriptor<'_>> = model
            .interfaces
            .keys()
            .zip(&names)
            .map(|(iface, value)| cpp::PropertyDescriptor {
                name: iface,
                method: None,
                getter: None,
                setter: None,
                value: Some(value.clone()),
                attributes: cpp::attributes(&["napi_enumerable"]),
            })
            .collect();
        output.push_str(&cpp::property_array(&descriptors, "  "));
        output.push('\n');
    }

    output.push_str("  napi_value exports;\n");
    output.push_str("  NAPI_CALL(env, napi_create_object(env, &exports));\n");
    if !names.is_empty() {
        output.push_str(
            "  NAPI_CALL(env, napi_define_properties(env, exports, sizeof(props) / sizeof(*props), props));\n",
        );
    }
    output.push_str("  return exports;\n");
    output.push_str("}\n");
    output
}

/// Registers the module with the host through `NAPI_MODULE_INIT`.
pub fn registration(options: &GenerateOptions) -> String {
    format!(
        "NAPI_MODULE_INIT() {{\n  return {}_init(env);\n}}\n",
        options.module_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::idl::parse_str;
    use crate::ir::normalize;

    #[test]
    fn includes_follow_fixed_order() {
        let options = GenerateOptions {
            napi_header: "node_api.h".to_string(),
            extra_includes: vec!["webgpu-impl.h".to_string(), "extra.h".to_string()],
            source_name: Some("webgpu.idl".to_string()),
            ..Default::default()
        };
        assert_eq!(
            prologue(&options),
            "// Generated by napidl from webgpu.idl. Do not edit.\n\n\
             #include \"node_api.h\"\n\
             #include \"webidl-napi.h\"\n\
             #include \"webgpu-impl.h\"\n\
             #include \"extra.h\"\n"
        );
    }

    #[test]
    fn exports_follow_declaration_order() {
        let model = normalize(parse_str("interface GPU { }; interface Navigator { };").unwrap()).unwrap();
        let options = GenerateOptions {
            module_name: "webgpu".to_string(),
            ..Default::default()
        };
        let code = init(&model, &options);

        assert!(code.contains("napi_value\nwebgpu_init(\n    napi_env env) {"));
        assert!(code.contains("  napi_value interface_0, interface_1;\n"));
        assert!(code.contains("NAPI_CALL(env, webidl_napi_create_interface_GPU(env, &interface_0));"));
        let gpu = code.find("{ \"GPU\", nullptr, nullptr, nullptr, nullptr, interface_0, napi_enumerable, nullptr }").unwrap();
        let nav = code.find("{ \"Navigator\", nullptr, nullptr, nullptr, nullptr, interface_1, napi_enumerable, nullptr }").unwrap();
        assert!(gpu < nav);
    }

    #[test]
    fn empty_module_exports_an_empty_object() {
        let code = init(&Model::default(), &GenerateOptions::default());
        assert!(code.contains("napi_create_object(env, &exports)"));
        assert!(!code.contains("props"));
    }
}
