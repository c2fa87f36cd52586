//! Converter pairs for user-defined and generic types.
//!
//! Every type gets a `ToNative`/`ToJS` pair. Enums, dictionaries, interfaces
//! and generic instantiations specialize `WebIdlNapi::Converter<T>`; typedefs
//! get a converter struct of their own so that an alias of a scalar never
//! redefines the scalar's specialization.

use indexmap::IndexMap;

use super::cpp::{self, c_string};
use super::Unsupported;
use crate::ir::{Dictionary, Enum, GenericWrapper, IdlType, Interface, Member, Model, TypeKind, Typedef};

/// A generic instantiation keyed by its native spelling.
#[derive(Debug, Clone)]
pub struct Instantiation {
    pub native: String,
    pub wrapper: GenericWrapper,
    pub inner: IdlType,
}

/// Collects every supported generic instantiation in first-use order.
///
/// Instantiations are keyed by native spelling: `sequence<T>` and
/// `FrozenArray<T>` share one, as do generics over the string types.
pub fn collect_instantiations(model: &Model) -> Vec<Instantiation> {
    let mut found: IndexMap<String, Instantiation> = IndexMap::new();
    let mut visit = |idl_type: &IdlType| {
        if let TypeKind::Generic { wrapper, inner } = model.resolve(idl_type) {
            if let Some(native) = cpp::native_type(model, idl_type) {
                found.entry(native.clone()).or_insert_with(|| Instantiation {
                    native,
                    wrapper,
                    inner: inner.clone(),
                });
            }
        }
    };

    for typedef in model.typedefs.values() {
        visit(&typedef.target);
    }
    for dict in model.dictionaries.values() {
        for field in &dict.members {
            visit(&field.idl_type);
        }
    }
    for iface in model.interfaces.values() {
        for member in &iface.members {
            match member {
                Member::Operation(op) => {
                    op.arguments.iter().for_each(|a| visit(&a.idl_type));
                    if let Some(ret) = &op.return_type {
                        visit(ret);
                    }
                }
                Member::Attribute(attr) => visit(&attr.idl_type),
                Member::Constructor(ctor) => ctor.arguments.iter().for_each(|a| visit(&a.idl_type)),
            }
        }
    }

    found.into_values().collect()
}

fn to_native_header(class: &str, native: &str) -> String {
    format!(
        "inline napi_status\n{}::ToNative(\n    napi_env env,\n    napi_value val,\n    {}* result)",
        class, native
    )
}

fn to_js_header(class: &str, native: &str) -> String {
    format!(
        "inline napi_status\n{}::ToJS(\n    napi_env env,\n    const {}& val,\n    napi_value* result)",
        class, native
    )
}

fn specialization(native: &str) -> String {
    format!("WebIdlNapi::Converter<{}>", native)
}

/// Declares a `Converter<native>` specialization.
fn declare_specialization(native: &str) -> String {
    let class = specialization(native);
    format!(
        "template <>\n{};\n\ntemplate <>\n{};\n",
        to_native_header(&class, native),
        to_js_header(&class, native)
    )
}

/// Type tags, converter declarations and typedef converter structs.
pub fn forward_declarations(model: &Model, instantiations: &[Instantiation]) -> String {
    let mut output = String::new();

    for name in model.interfaces.keys() {
        let (lower, upper) = cpp::type_tag(name);
        output.push_str(&format!(
            "static const napi_type_tag {} = {{ 0x{:016x}ULL, 0x{:016x}ULL }};\n",
            cpp::type_tag_name(name),
            lower,
            upper
        ));
    }
    if !model.interfaces.is_empty() {
        output.push('\n');
    }

    let natives = model
        .enums
        .keys()
        .chain(model.dictionaries.keys())
        .chain(model.interfaces.keys())
        .cloned()
        .chain(instantiations.iter().map(|i| i.native.clone()));
    for native in natives {
        output.push_str(&declare_specialization(&native));
        output.push('\n');
    }

    for typedef in model.typedefs.values() {
        output.push_str(&format!(
            "struct {} {{\n  static napi_status ToNative(napi_env env, napi_value val, {}* result);\n  static napi_status ToJS(napi_env env, const {}& val, napi_value* result);\n}};\n\n",
            cpp::typedef_converter_name(&typedef.name),
            typedef.name,
            typedef.name
        ));
    }

    output
}

/// Converter definitions for a typedef.
///
/// A typedef over a scalar converts through the scalar and casts. Any other
/// typedef must be a native alias of its target and delegates to it.
pub fn typedef_converters(model: &Model, typedef: &Typedef, unsupported: &mut Unsupported) -> String {
    let class = cpp::typedef_converter_name(&typedef.name);
    let name = &typedef.name;
    let mut to_native = format!("{} {{\n", to_native_header(&class, name));
    let mut to_js = format!("{} {{\n", to_js_header(&class, name));

    match model.resolve(&IdlType::scalar(name.clone())) {
        TypeKind::Typedef { basic: Some(scalar), .. } => {
            let scalar_conv = specialization(scalar.native);
            to_native.push_str(&format!("  {} native_val;\n", scalar.native));
            to_native.push_str(&format!(
                "  napi_status status = {}::ToNative(env, val, &native_val);\n",
                scalar_conv
            ));
            to_native.push_str("  if (status != napi_ok) return status;\n\n");
            to_native.push_str(&format!("  *result = static_cast<{}>(native_val);\n", name));
            to_native.push_str("  return napi_ok;\n");

            to_js.push_str(&format!(
                "  return {}::ToJS(env, static_cast<{}>(val), result);\n",
                scalar_conv, scalar.native
            ));
        }
        TypeKind::Typedef { basic: None, .. } => {
            let target_conv = cpp::converter(model, &typedef.target).unwrap_or_default();
            to_native.push_str(&format!("  return {}::ToNative(env, val, result);\n", target_conv));
            to_js.push_str(&format!("  return {}::ToJS(env, val, result);\n", target_conv));
        }
        _ => {
            let construct = format!("typedef {} {}", typedef.target, name);
            unsupported.record(construct.clone());
            let throw = format!("  return WebIdlNapi::ThrowNotImplemented(env, {});\n", c_string(&construct));
            to_native.push_str(&throw);
            to_js.push_str(&throw);
        }
    }

    to_native.push_str("}\n");
    to_js.push_str("}\n");
    format!("{}\n{}", to_native, to_js)
}

/// Converter definitions for an enum.
///
/// Both directions test the values in declaration order.
pub fn enum_converters(e: &Enum) -> String {
    let class = specialization(&e.name);
    let mut output = String::from("template <>\n");
    output.push_str(&to_native_header(&class, &e.name));
    output.push_str(" {\n");
    output.push_str("  DOMString str_val;\n");
    output.push_str("  napi_status status = WebIdlNapi::Converter<DOMString>::ToNative(env, val, &str_val);\n");
    output.push_str("  if (status != napi_ok) return status;\n\n");
    for (idx, value) in e.values.iter().enumerate() {
        let keyword = if idx == 0 { "  if" } else { " else if" };
        output.push_str(&format!(
            "{} (str_val == {}) {{\n    *result = {}::{};\n  }}",
            keyword,
            c_string(&value.literal),
            e.name,
            value.ident
        ));
    }
    let reject = format!(
        "return WebIdlNapi::ThrowInvalidEnumValue(env, {}, str_val);",
        c_string(&e.name)
    );
    if e.values.is_empty() {
        output.push_str(&format!("  {}\n", reject));
    } else {
        output.push_str(&format!(" else {{\n    {}\n  }}\n", reject));
        output.push_str("  return napi_ok;\n");
    }
    output.push_str("}\n\n");

    output.push_str("template <>\n");
    output.push_str(&to_js_header(&class, &e.name));
    output.push_str(" {\n");
    output.push_str("  const char* literal = nullptr;\n");
    for (idx, value) in e.values.iter().enumerate() {
        let keyword = if idx == 0 { "  if" } else { " else if" };
        output.push_str(&format!(
            "{} (val == {}::{}) {{\n    literal = {};\n  }}",
            keyword,
            e.name,
            value.ident,
            c_string(&value.literal)
        ));
    }
    if e.values.is_empty() {
        output.push_str("  return napi_invalid_arg;\n");
    } else {
        output.push_str(" else {\n    return napi_invalid_arg;\n  }\n");
        output.push_str("  return napi_create_string_utf8(env, literal, NAPI_AUTO_LENGTH, result);\n");
    }
    output.push_str("}\n");
    output
}

/// Converter definitions for a dictionary.
///
/// `ToNative` reads members by name and stops at the first failing member.
/// `undefined` and `null` leave the destination at its defaults unless a
/// member is required. `ToJS` builds a fresh object with one enumerable
/// property per member, in member order.
pub fn dictionary_converters(model: &Model, dict: &Dictionary, unsupported: &mut Unsupported) -> String {
    let class = specialization(&dict.name);

    if let Some(field) = dict.members.iter().find(|f| !model.resolve(&f.idl_type).is_supported()) {
        let construct = format!("dictionary {} member {} of type {}", dict.name, field.name, field.idl_type);
        unsupported.record(construct.clone());
        let throw = format!("  return WebIdlNapi::ThrowNotImplemented(env, {});\n", c_string(&construct));
        return format!(
            "template <>\n{} {{\n{}}}\n\ntemplate <>\n{} {{\n{}}}\n",
            to_native_header(&class, &dict.name),
            throw,
            to_js_header(&class, &dict.name),
            throw
        );
    }

    let mut output = String::from("template <>\n");
    output.push_str(&to_native_header(&class, &dict.name));
    output.push_str(" {\n");
    output.push_str("  napi_valuetype val_type;\n");
    output.push_str("  napi_status status = napi_typeof(env, val, &val_type);\n");
    output.push_str("  if (status != napi_ok) return status;\n\n");
    output.push_str("  if (val_type == napi_undefined || val_type == napi_null) {\n");
    match dict.members.iter().find(|f| f.required) {
        Some(required) => output.push_str(&format!(
            "    return WebIdlNapi::ThrowMissingMember(env, {}, {});\n",
            c_string(&dict.name),
            c_string(&required.name)
        )),
        None => output.push_str("    return napi_ok;\n"),
    }
    output.push_str("  }\n");
    output.push_str("  if (val_type != napi_object) return napi_object_expected;\n");

    for field in &dict.members {
        let conv = cpp::converter(model, &field.idl_type).unwrap_or_default();
        output.push_str("\n  {\n");
        output.push_str("    napi_value js_member;\n");
        output.push_str(&format!(
            "    status = napi_get_named_property(env, val, {}, &js_member);\n",
            c_string(&field.name)
        ));
        output.push_str("    if (status != napi_ok) return status;\n\n");
        output.push_str("    status = napi_typeof(env, js_member, &val_type);\n");
        output.push_str("    if (status != napi_ok) return status;\n\n");
        output.push_str("    if (val_type != napi_undefined) {\n");
        output.push_str(&format!(
            "      status = {}::ToNative(env, js_member, &(result->{}));\n",
            conv, field.name
        ));
        output.push_str("      if (status != napi_ok) return status;\n");
        if field.required {
            output.push_str("    } else {\n");
            output.push_str(&format!(
                "      return WebIdlNapi::ThrowMissingMember(env, {}, {});\n",
                c_string(&dict.name),
                c_string(&field.name)
            ));
        }
        output.push_str("    }\n");
        output.push_str("  }\n");
    }
    output.push_str("\n  return napi_ok;\n");
    output.push_str("}\n\n");

    output.push_str("template <>\n");
    output.push_str(&to_js_header(&class, &dict.name));
    output.push_str(" {\n");
    output.push_str("  napi_value ret;\n");
    output.push_str("  napi_status status = napi_create_object(env, &ret);\n");
    output.push_str("  if (status != napi_ok) return status;\n");

    if !dict.members.is_empty() {
        let props: Vec<String> = (0..dict.members.len()).map(|i| format!("js_prop_{}", i)).collect();
        output.push_str(&format!("\n  napi_value {};\n", props.join(", ")));
        for (idx, field) in dict.members.iter().enumerate() {
            let conv = cpp::converter(model, &field.idl_type).unwrap_or_default();
            output.push_str(&format!(
                "  status = {}::ToJS(env, val.{}, &js_prop_{});\n",
                conv, field.name, idx
            ));
            output.push_str("  if (status != napi_ok) return status;\n");
        }
        output.push('\n');

        let descriptors: Vec<cpp::PropertyDescriptor<'_>> = dict
            .members
            .iter()
            .enumerate()
            .map(|(idx, field)| cpp::PropertyDescriptor {
                name: &field.name,
                method: None,
                getter: None,
                setter: None,
                value: Some(format!("js_prop_{}", idx)),
                attributes: cpp::attributes(&["napi_writable", "napi_enumerable", "napi_configurable"]),
            })
            .collect();
        output.push_str(&cpp::property_array(&descriptors, "  "));
        output.push_str("  status = napi_define_properties(env, ret, sizeof(props) / sizeof(*props), props);\n");
        output.push_str("  if (status != napi_ok) return status;\n");
    }

    output.push_str("\n  *result = ret;\n");
    output.push_str("  return napi_ok;\n");
    output.push_str("}\n");
    output
}

/// Converter definitions for one generic instantiation.
pub fn generic_converters(model: &Model, instantiation: &Instantiation) -> String {
    let native = &instantiation.native;
    let class = specialization(native);
    let inner_native = cpp::native_type(model, &instantiation.inner).unwrap_or_default();
    let inner_conv = cpp::converter(model, &instantiation.inner).unwrap_or_default();

    let (to_native_body, to_js_body) = match instantiation.wrapper {
        GenericWrapper::Promise => (
            format!(
                "  return WebIdlNapi::ThrowNotImplemented(env, {});\n",
                c_string(&format!("conversion of Promise<{}> to native", instantiation.inner))
            ),
            format!("  return val.Attach(env, &{}::ToJS, result);\n", inner_conv),
        ),
        GenericWrapper::Sequence | GenericWrapper::FrozenArray => (
            format!(
                "  return WebIdlNapi::SequenceToNative<{}>(env, val, &{}::ToNative, result);\n",
                inner_native, inner_conv
            ),
            format!(
                "  return WebIdlNapi::SequenceToJS<{}>(env, val, &{}::ToJS, result);\n",
                inner_native, inner_conv
            ),
        ),
    };

    format!(
        "template <>\n{} {{\n{}}}\n\ntemplate <>\n{} {{\n{}}}\n",
        to_native_header(&class, native),
        to_native_body,
        to_js_header(&class, native),
        to_js_body
    )
}

/// Converter definitions for an interface.
///
/// `ToNative` copies the instance wrapped in the host object. `ToJS` copies
/// the value to the heap and constructs a host object around it through the
/// external path, so constructor argument conversion never runs.
pub fn interface_converters(iface: &Interface) -> String {
    let name = &iface.name;
    let class = specialization(name);
    let tag = cpp::type_tag_name(name);

    let mut output = String::from("template <>\n");
    output.push_str(&to_native_header(&class, name));
    output.push_str(" {\n");
    output.push_str(&format!("  {}* native = nullptr;\n", name));
    output.push_str(&format!(
        "  napi_status status = WebIdlNapi::Unwrap<{}>(env, val, &{}, {}, &native);\n",
        name,
        tag,
        c_string(name)
    ));
    output.push_str("  if (status != napi_ok) return status;\n\n");
    output.push_str("  *result = *native;\n");
    output.push_str("  return napi_ok;\n");
    output.push_str("}\n\n");

    output.push_str("template <>\n");
    output.push_str(&to_js_header(&class, name));
    output.push_str(" {\n");
    output.push_str(&format!(
        "  return WebIdlNapi::NewExternalInstance<{}>(env, {}, &{}, new {}(val), result);\n",
        name,
        c_string(name),
        tag,
        name
    ));
    output.push_str("}\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::idl::parse_str;
    use crate::ir::normalize;

    fn model(source: &str) -> Model {
        normalize(parse_str(source).unwrap()).unwrap()
    }

    #[test]
    fn enum_converters_test_values_in_order() {
        let model = model(r#"enum GPUPowerPreference { "low-power", "high-performance" };"#);
        let code = enum_converters(&model.enums["GPUPowerPreference"]);

        assert!(code.contains("WebIdlNapi::Converter<GPUPowerPreference>::ToNative("));
        let low = code.find("if (str_val == \"low-power\")").unwrap();
        let high = code.find("else if (str_val == \"high-performance\")").unwrap();
        assert!(low < high);
        assert!(code.contains("*result = GPUPowerPreference::Low_power;"));
        assert!(code.contains("WebIdlNapi::ThrowInvalidEnumValue(env, \"GPUPowerPreference\", str_val)"));
        assert!(code.contains("else if (val == GPUPowerPreference::High_performance) {"));
        assert!(code.contains("literal = \"high-performance\";"));
    }

    #[test]
    fn empty_enum_literal_maps_to_sentinel() {
        let model = model(r#"enum E { "" };"#);
        let code = enum_converters(&model.enums["E"]);
        assert!(code.contains("*result = E::_empty;"));
        assert!(code.contains("if (val == E::_empty)"));
    }

    #[test]
    fn dictionary_converters_follow_member_order() {
        let model = model(
            r#"
            dictionary Base { long x; };
            dictionary Derived : Base { DOMString y; };
            "#,
        );
        let code = dictionary_converters(&model, &model.dictionaries["Derived"], &mut Unsupported::default());

        let y = code.find("napi_get_named_property(env, val, \"y\"").unwrap();
        let x = code.find("napi_get_named_property(env, val, \"x\"").unwrap();
        assert!(y < x);
        assert!(code.contains("WebIdlNapi::Converter<DOMString>::ToNative(env, js_member, &(result->y))"));
        assert!(code.contains("WebIdlNapi::Converter<int32_t>::ToNative(env, js_member, &(result->x))"));
        assert!(code.contains("status = WebIdlNapi::Converter<DOMString>::ToJS(env, val.y, &js_prop_0);"));
        assert!(code.contains("{ \"x\", nullptr, nullptr, nullptr, nullptr, js_prop_1,"));
        assert!(code.contains("    return napi_ok;\n  }\n"));
    }

    #[test]
    fn required_members_are_enforced() {
        let model = model("dictionary D { required DOMString label; long count; };");
        let code = dictionary_converters(&model, &model.dictionaries["D"], &mut Unsupported::default());
        assert!(code.contains("return WebIdlNapi::ThrowMissingMember(env, \"D\", \"label\");"));
        assert_eq!(code.matches("ThrowMissingMember").count(), 2);
    }

    #[test]
    fn unsupported_dictionary_members_stub_the_converters() {
        let model = model("dictionary D { (long or DOMString) value; };");
        let mut unsupported = Unsupported::default();
        let code = dictionary_converters(&model, &model.dictionaries["D"], &mut unsupported);
        assert_eq!(code.matches("WebIdlNapi::ThrowNotImplemented").count(), 2);
        assert_eq!(unsupported.constructs().len(), 1);
    }

    #[test]
    fn typedef_converters_cast_or_delegate() {
        let model = model(
            r#"
            typedef unsigned long GPUSize32;
            dictionary Options { };
            typedef Options Alias;
            "#,
        );
        let mut unsupported = Unsupported::default();
        let basic = typedef_converters(&model, &model.typedefs["GPUSize32"], &mut unsupported);
        assert!(basic.contains("webidl_napi_typedef_GPUSize32::ToNative("));
        assert!(basic.contains("*result = static_cast<GPUSize32>(native_val);"));
        assert!(basic.contains("WebIdlNapi::Converter<uint32_t>::ToJS(env, static_cast<uint32_t>(val), result)"));

        let extended = typedef_converters(&model, &model.typedefs["Alias"], &mut unsupported);
        assert!(extended.contains("return WebIdlNapi::Converter<Options>::ToNative(env, val, result);"));
        assert!(unsupported.constructs().is_empty());
    }

    #[test]
    fn instantiations_are_collected_once_in_first_use_order() {
        let model = model(
            r#"
            dictionary D { sequence<DOMString> names; FrozenArray<DOMString> frozen; };
            interface I {
              Promise<D> load();
              Promise<D> reload();
              Promise<sequence<long>> nested();
            };
            "#,
        );
        let natives: Vec<String> = collect_instantiations(&model).into_iter().map(|i| i.native).collect();
        assert_eq!(natives, ["WebIdlNapi::sequence<DOMString>", "WebIdlNapi::Promise<D>"]);
    }

    #[test]
    fn string_types_share_one_instantiation() {
        let model = model(
            r#"
            dictionary Names { sequence<DOMString> a; sequence<USVString> b; FrozenArray<ByteString> c; };
            interface Holder { Promise<USVString> label(); Promise<DOMString> name(); };
            "#,
        );
        let natives: Vec<String> = collect_instantiations(&model).into_iter().map(|i| i.native).collect();
        assert_eq!(natives, ["WebIdlNapi::sequence<DOMString>", "WebIdlNapi::Promise<DOMString>"]);
    }

    #[test]
    fn promise_converters_attach_inner_converter() {
        let model = model("dictionary D { }; interface I { Promise<D> load(); };");
        let instantiations = collect_instantiations(&model);
        let code = generic_converters(&model, &instantiations[0]);
        assert!(code.contains("return val.Attach(env, &WebIdlNapi::Converter<D>::ToJS, result);"));
        assert!(code.contains("\"conversion of Promise<D> to native\""));
    }

    #[test]
    fn interface_converters_use_external_construction() {
        let model = model("interface GPUAdapter { };");
        let code = interface_converters(&model.interfaces["GPUAdapter"]);
        assert!(code.contains(
            "WebIdlNapi::NewExternalInstance<GPUAdapter>(env, \"GPUAdapter\", &webidl_napi_type_tag_GPUAdapter, new GPUAdapter(val), result)"
        ));
        assert!(code.contains("WebIdlNapi::Unwrap<GPUAdapter>(env, val, &webidl_napi_type_tag_GPUAdapter, \"GPUAdapter\", &native)"));
    }

    #[test]
    fn forward_declarations_cover_every_converter() {
        let model = model(
            r#"
            enum E { "a" };
            dictionary D { sequence<E> items; };
            typedef long Count;
            interface I { };
            "#,
        );
        let code = forward_declarations(&model, &collect_instantiations(&model));
        assert!(code.contains("static const napi_type_tag webidl_napi_type_tag_I = { 0x"));
        for native in ["E", "D", "I", "WebIdlNapi::sequence<E>"] {
            assert!(
                code.contains(&format!("WebIdlNapi::Converter<{}>::ToNative(", native)),
                "missing {}",
                native
            );
        }
        assert!(code.contains("struct webidl_napi_typedef_Count {"));
    }
}
