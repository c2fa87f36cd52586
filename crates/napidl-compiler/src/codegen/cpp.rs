//! C++ spelling helpers shared by the emitters.

use xxhash_rust::xxh3::xxh3_128;

use crate::ir::{IdlType, Model, TypeKind};

/// Quotes `text` as a C string literal.
pub fn c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Turns an arbitrary name into a C identifier.
pub fn c_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// The `napi_type_tag` halves `(lower, upper)` for an interface.
pub fn type_tag(interface: &str) -> (u64, u64) {
    let hash = xxh3_128(interface.as_bytes());
    (hash as u64, (hash >> 64) as u64)
}

pub fn type_tag_name(interface: &str) -> String {
    format!("webidl_napi_type_tag_{}", interface)
}

pub fn typedef_converter_name(typedef: &str) -> String {
    format!("webidl_napi_typedef_{}", typedef)
}

/// Native spelling of a supported type, `None` for unsupported ones.
pub fn native_type(model: &Model, idl_type: &IdlType) -> Option<String> {
    match model.resolve(idl_type) {
        TypeKind::Scalar(scalar) => Some(scalar.native.to_string()),
        TypeKind::Enum(e) => Some(e.name.clone()),
        TypeKind::Dictionary(d) => Some(d.name.clone()),
        TypeKind::Interface(i) => Some(i.name.clone()),
        TypeKind::Typedef { typedef, .. } => Some(typedef.name.clone()),
        TypeKind::Generic { wrapper, inner } => {
            let inner = native_type(model, inner)?;
            Some(format!("{}<{}>", wrapper.native_template(), inner))
        }
        TypeKind::Unsupported(_) => None,
    }
}

/// The class whose static `ToNative`/`ToJS` convert a supported type.
pub fn converter(model: &Model, idl_type: &IdlType) -> Option<String> {
    match model.resolve(idl_type) {
        TypeKind::Typedef { typedef, .. } => Some(typedef_converter_name(&typedef.name)),
        TypeKind::Unsupported(_) => None,
        _ => native_type(model, idl_type).map(|native| format!("WebIdlNapi::Converter<{}>", native)),
    }
}

/// Property descriptor initializer for `napi_define_properties`/`napi_define_class`.
pub struct PropertyDescriptor<'a> {
    pub name: &'a str,
    pub method: Option<String>,
    pub getter: Option<String>,
    pub setter: Option<String>,
    pub value: Option<String>,
    pub attributes: String,
}

impl PropertyDescriptor<'_> {
    pub fn render(&self, indent: &str) -> String {
        let or_null = |v: &Option<String>| v.clone().unwrap_or_else(|| "nullptr".to_string());
        format!(
            "{}{{ {}, nullptr, {}, {}, {}, {}, {}, nullptr }}",
            indent,
            c_string(self.name),
            or_null(&self.method),
            or_null(&self.getter),
            or_null(&self.setter),
            or_null(&self.value),
            self.attributes
        )
    }
}

/// Renders a `napi_property_descriptor props[]` array; empty when there are
/// no properties.
pub fn property_array(descriptors: &[PropertyDescriptor<'_>], indent: &str) -> String {
    if descriptors.is_empty() {
        return String::new();
    }
    let mut output = format!("{}napi_property_descriptor props[] = {{\n", indent);
    let inner = format!("{}  ", indent);
    let rows: Vec<String> = descriptors.iter().map(|d| d.render(&inner)).collect();
    output.push_str(&rows.join(",\n"));
    output.push_str(&format!("\n{}}};\n", indent));
    output
}

/// Combines property attribute flags into one expression.
pub fn attributes(flags: &[&str]) -> String {
    match flags {
        [] => "napi_default".to_string(),
        [single] => single.to_string(),
        _ => format!("static_cast<napi_property_attributes>({})", flags.join(" | ")),
    }
}

/// Section banner used between generated blocks.
pub fn banner(title: &str) -> String {
    let rule = "/".repeat(80);
    format!("{}\n// {}\n{}\n", rule, title, rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Enum, Typedef};

    #[test]
    fn escapes_c_strings() {
        assert_eq!(c_string("low-power"), "\"low-power\"");
        assert_eq!(c_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(c_string("\u{1}"), "\"\\x01\"");
    }

    #[test]
    fn sanitizes_identifiers() {
        assert_eq!(c_identifier("webgpu"), "webgpu");
        assert_eq!(c_identifier("my-module.v2"), "my_module_v2");
        assert_eq!(c_identifier("2d"), "_2d");
    }

    #[test]
    fn type_tags_are_stable_and_distinct() {
        assert_eq!(type_tag("GPU"), type_tag("GPU"));
        assert_ne!(type_tag("GPU"), type_tag("GPUAdapter"));
    }

    #[test]
    fn native_types_and_converters() {
        let mut model = Model::default();
        model.enums.insert(
            "E".to_string(),
            Enum {
                name: "E".to_string(),
                values: vec![],
            },
        );
        model.typedefs.insert(
            "Size".to_string(),
            Typedef {
                name: "Size".to_string(),
                target: IdlType::scalar("unsigned long"),
            },
        );

        let seq = IdlType::generic("sequence", IdlType::scalar("E"));
        assert_eq!(native_type(&model, &seq).as_deref(), Some("WebIdlNapi::sequence<E>"));
        assert_eq!(
            converter(&model, &seq).as_deref(),
            Some("WebIdlNapi::Converter<WebIdlNapi::sequence<E>>")
        );
        assert_eq!(
            converter(&model, &IdlType::scalar("DOMString")).as_deref(),
            Some("WebIdlNapi::Converter<DOMString>")
        );
        assert_eq!(
            converter(&model, &IdlType::scalar("Size")).as_deref(),
            Some("webidl_napi_typedef_Size")
        );
        assert_eq!(native_type(&model, &IdlType::scalar("any")), None);
    }

    #[test]
    fn renders_property_arrays() {
        let props = property_array(
            &[PropertyDescriptor {
                name: "gpu",
                method: None,
                getter: Some("get_gpu".to_string()),
                setter: None,
                value: None,
                attributes: attributes(&["napi_enumerable"]),
            }],
            "  ",
        );
        assert!(props.contains("napi_property_descriptor props[] = {"));
        assert!(props.contains("{ \"gpu\", nullptr, nullptr, get_gpu, nullptr, nullptr, napi_enumerable, nullptr }"));
        assert!(property_array(&[], "").is_empty());
    }
}
