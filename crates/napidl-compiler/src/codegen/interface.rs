//! Bindings for one interface: constructor, operations, attributes and the
//! class factory.
//!
//! Every binding is a `napi_callback`. Instance bindings unwrap the receiver
//! first, which fails with a `TypeError` for objects this interface did not
//! construct.

use super::cpp::{self, c_string};
use super::signature::{self, Callee, Candidate, Invocation};
use super::Unsupported;
use crate::ir::{Argument, Attribute, Interface, Model, Operation, TypeKind};

fn binding_name(iface: &str, suffix: &str) -> String {
    format!("webidl_napi_interface_{}_{}", iface, suffix)
}

pub fn constructor_name(iface: &str) -> String {
    binding_name(iface, "constructor")
}

pub fn operation_name(iface: &str, op: &str) -> String {
    binding_name(iface, op)
}

pub fn getter_name(iface: &str, attr: &str) -> String {
    binding_name(iface, &format!("get_{}", attr))
}

pub fn setter_name(iface: &str, attr: &str) -> String {
    binding_name(iface, &format!("set_{}", attr))
}

pub fn factory_name(iface: &str) -> String {
    format!("webidl_napi_create_interface_{}", iface)
}

fn callback_header(name: &str) -> String {
    format!("static napi_value\n{}(\n    napi_env env,\n    napi_callback_info info) {{\n", name)
}

/// Declares `argc`/`argv` sized for `max_args` and reads the call info.
fn read_arguments(max_args: usize, receiver: bool) -> String {
    let this = if receiver { "&js_this" } else { "nullptr" };
    let mut output = String::new();
    if receiver {
        output.push_str("  napi_value js_this;\n");
    }
    if max_args == 0 {
        output.push_str(&format!(
            "  NAPI_CALL(env, napi_get_cb_info(env, info, nullptr, nullptr, {}, nullptr));\n",
            this
        ));
        return output;
    }
    output.push_str(&format!("  size_t argc = {};\n", max_args));
    output.push_str(&format!("  napi_value argv[{}];\n", max_args));
    output.push_str(&format!(
        "  NAPI_CALL(env, napi_get_cb_info(env, info, &argc, argv, {}, nullptr));\n",
        this
    ));
    output.push_str(&format!("  if (argc > {}) argc = {};\n", max_args, max_args));
    output
}

fn unwrap_receiver(iface: &str) -> String {
    format!(
        "  {}* native = nullptr;\n  NAPI_CALL(env, WebIdlNapi::Unwrap<{}>(env, js_this, &{}, {}, &native));\n",
        iface,
        iface,
        cpp::type_tag_name(iface),
        c_string(iface)
    )
}

/// Emits one invocation per signature, dispatching through `PickSignature`
/// when there is more than one.
fn overload_body(
    model: &Model,
    invocations: &[Invocation<'_>],
    display_name: &str,
    indent: &str,
    unsupported: &mut Unsupported,
) -> String {
    if let [single] = invocations {
        return signature::invoke(model, single, indent, unsupported);
    }

    let candidates: Vec<Candidate> = invocations
        .iter()
        .map(|inv| Candidate::for_arguments(model, inv.arguments))
        .collect();
    let mut output = signature::dispatch(&candidates, display_name, indent);
    output.push('\n');

    let inner = format!("{}  ", indent);
    for (idx, invocation) in invocations.iter().enumerate() {
        let keyword = if idx == 0 {
            format!("{}if", indent)
        } else {
            " else if".to_string()
        };
        output.push_str(&format!("{} (sig_idx == {}) {{\n", keyword, idx));
        output.push_str(&signature::invoke(model, invocation, &inner, unsupported));
        output.push_str(&format!("{}}}", indent));
    }
    output.push('\n');
    output
}

fn max_arity<'a>(signatures: impl Iterator<Item = &'a [Argument]>) -> usize {
    signatures.map(<[Argument]>::len).max().unwrap_or(0)
}

/// The class constructor binding.
///
/// A single tagged external argument adopts an existing native instance.
/// Otherwise the declared constructors are resolved like an overload set;
/// without a declared constructor the native default constructor runs.
pub fn constructor(model: &Model, iface: &Interface, unsupported: &mut Unsupported) -> String {
    let name = &iface.name;
    let ctors = iface.constructors();
    let max_args = max_arity(ctors.iter().map(|c| c.arguments.as_slice()));
    let capacity = max_args.max(1);

    let mut output = callback_header(&constructor_name(name));
    output.push_str(&format!(
        "  NAPI_CALL(env, WebIdlNapi::CheckConstructCall(env, info, {}));\n\n",
        c_string(name)
    ));
    output.push_str("  napi_value js_this;\n");
    output.push_str(&format!("  size_t argc = {};\n", capacity));
    output.push_str(&format!("  napi_value argv[{}];\n", capacity));
    output.push_str("  NAPI_CALL(env, napi_get_cb_info(env, info, &argc, argv, &js_this, nullptr));\n\n");
    output.push_str(&format!("  {}* native = nullptr;\n", name));
    output.push_str(&format!(
        "  NAPI_CALL(env, WebIdlNapi::TakeExternal<{}>(env, argc, argv, &{}, &native));\n",
        name,
        cpp::type_tag_name(name)
    ));
    output.push_str("  if (native == nullptr) {\n");
    output.push_str(&format!("    if (argc > {}) argc = {};\n", max_args, max_args));

    if ctors.is_empty() {
        output.push_str(&format!("    native = new {}();\n", name));
    } else {
        let invocations: Vec<Invocation<'_>> = ctors
            .iter()
            .map(|ctor| Invocation {
                callee: Callee::Constructor { class: name },
                arguments: &ctor.arguments,
                return_type: None,
                display_name: format!("{} constructor", name),
            })
            .collect();
        output.push_str(&overload_body(
            model,
            &invocations,
            &format!("{} constructor", name),
            "    ",
            unsupported,
        ));
    }
    output.push_str("  }\n\n");

    output.push_str(&format!(
        "  NAPI_CALL(env, WebIdlNapi::Wrap<{}>(env, js_this, &{}, native, {}));\n",
        name,
        cpp::type_tag_name(name),
        iface.same_object_slot_count()
    ));
    output.push_str("  return js_this;\n");
    output.push_str("}\n");
    output
}

/// The binding for one overload set.
pub fn operation(
    model: &Model,
    iface: &Interface,
    overloads: &[&Operation],
    unsupported: &mut Unsupported,
) -> String {
    let Some(first) = overloads.first() else {
        return String::new();
    };
    let name = &iface.name;
    let is_static = first.is_static();
    let display_name = format!("{}.{}", name, first.name);
    let max_args = max_arity(overloads.iter().map(|op| op.arguments.as_slice()));

    let mut output = callback_header(&operation_name(name, &first.name));
    output.push_str("  napi_value js_ret = nullptr;\n");
    output.push_str(&read_arguments(max_args, !is_static));
    if !is_static {
        output.push('\n');
        output.push_str(&unwrap_receiver(name));
    }
    output.push('\n');

    let invocations: Vec<Invocation<'_>> = overloads
        .iter()
        .map(|op| Invocation {
            callee: if is_static {
                Callee::Static {
                    class: name,
                    name: &op.name,
                }
            } else {
                Callee::Instance { name: &op.name }
            },
            arguments: &op.arguments,
            return_type: op.return_type.as_ref(),
            display_name: display_name.clone(),
        })
        .collect();
    output.push_str(&overload_body(model, &invocations, &display_name, "  ", unsupported));

    output.push_str("\n  return js_ret;\n");
    output.push_str("}\n");
    output
}

fn native_field(iface: &str, attr: &Attribute) -> String {
    if attr.is_static() {
        format!("{}::{}", iface, attr.name)
    } else {
        format!("native->{}", attr.name)
    }
}

/// Getter for an attribute, consulting the same-object slot if it has one.
pub fn getter(model: &Model, iface: &Interface, attr: &Attribute, unsupported: &mut Unsupported) -> String {
    let name = &iface.name;
    let mut output = callback_header(&getter_name(name, &attr.name));

    let Some(conv) = cpp::converter(model, &attr.idl_type) else {
        let construct = format!("{}.{} of type {}", name, attr.name, attr.idl_type);
        unsupported.record(construct.clone());
        output.push_str(&format!(
            "  WebIdlNapi::ThrowNotImplemented(env, {});\n  return nullptr;\n}}\n",
            c_string(&construct)
        ));
        return output;
    };

    output.push_str("  napi_value js_ret = nullptr;\n");
    if !attr.is_static() {
        output.push_str(&read_arguments(0, true));
        output.push('\n');
        output.push_str(&unwrap_receiver(name));
        output.push('\n');
    }

    let slot = iface.same_object_slot(&attr.name);
    if let Some(slot) = slot {
        output.push_str(&format!(
            "  NAPI_CALL(env, WebIdlNapi::GetSameObject(env, js_this, {}, &js_ret));\n",
            slot
        ));
        output.push_str("  if (js_ret != nullptr) return js_ret;\n\n");
    }

    let field = native_field(name, attr);
    output.push_str(&format!("  NAPI_CALL(env, {}::ToJS(env, {}, &js_ret));\n", conv, field));
    if is_promise(model, attr) {
        output.push_str(&format!("  NAPI_CALL(env, {}.Finalize(env));\n", field));
    }
    if let Some(slot) = slot {
        output.push_str(&format!(
            "  NAPI_CALL(env, WebIdlNapi::SetSameObject(env, js_this, {}, js_ret));\n",
            slot
        ));
    }
    output.push_str("  return js_ret;\n");
    output.push_str("}\n");
    output
}

fn is_promise(model: &Model, attr: &Attribute) -> bool {
    matches!(
        model.resolve(&attr.idl_type),
        TypeKind::Generic {
            wrapper: crate::ir::GenericWrapper::Promise,
            ..
        }
    )
}

/// Setter for a writable attribute. Assigning a same-object attribute drops
/// the cached host value.
pub fn setter(model: &Model, iface: &Interface, attr: &Attribute, unsupported: &mut Unsupported) -> String {
    let name = &iface.name;
    let mut output = callback_header(&setter_name(name, &attr.name));

    let (Some(native), Some(conv)) = (
        cpp::native_type(model, &attr.idl_type),
        cpp::converter(model, &attr.idl_type),
    ) else {
        let construct = format!("{}.{} of type {}", name, attr.name, attr.idl_type);
        unsupported.record(construct.clone());
        output.push_str(&format!(
            "  WebIdlNapi::ThrowNotImplemented(env, {});\n  return nullptr;\n}}\n",
            c_string(&construct)
        ));
        return output;
    };

    output.push_str(&read_arguments(1, !attr.is_static()));
    output.push('\n');
    if !attr.is_static() {
        output.push_str(&unwrap_receiver(name));
        output.push('\n');
    }
    output.push_str(&format!("  {} native_value{{}};\n", native));
    output.push_str(&format!("  NAPI_CALL(env, {}::ToNative(env, argv[0], &native_value));\n", conv));
    output.push_str(&format!("  {} = native_value;\n", native_field(name, attr)));
    if let Some(slot) = iface.same_object_slot(&attr.name) {
        output.push_str(&format!(
            "  NAPI_CALL(env, WebIdlNapi::ClearSameObject(env, js_this, {}));\n",
            slot
        ));
    }
    output.push_str("  return nullptr;\n");
    output.push_str("}\n");
    output
}

/// Defines the class and registers its constructor for external
/// construction.
pub fn factory(iface: &Interface) -> String {
    let name = &iface.name;
    let mut descriptors = Vec::new();

    for (op_name, overloads) in iface.overload_sets() {
        let is_static = overloads.first().is_some_and(|op| op.is_static());
        let mut flags = vec!["napi_enumerable"];
        if is_static {
            flags.push("napi_static");
        }
        descriptors.push(cpp::PropertyDescriptor {
            name: op_name,
            method: Some(operation_name(name, op_name)),
            getter: None,
            setter: None,
            value: None,
            attributes: cpp::attributes(&flags),
        });
    }

    for attr in iface.attributes() {
        let mut flags = vec!["napi_enumerable", "napi_configurable"];
        if attr.is_static() {
            flags.push("napi_static");
        }
        descriptors.push(cpp::PropertyDescriptor {
            name: &attr.name,
            method: None,
            getter: Some(getter_name(name, &attr.name)),
            setter: (!attr.readonly).then(|| setter_name(name, &attr.name)),
            value: None,
            attributes: cpp::attributes(&flags),
        });
    }

    let mut output = format!(
        "static napi_status\n{}(\n    napi_env env,\n    napi_value* result) {{\n",
        factory_name(name)
    );
    let (count, props) = if descriptors.is_empty() {
        ("0", "nullptr")
    } else {
        output.push_str(&cpp::property_array(&descriptors, "  "));
        output.push('\n');
        ("sizeof(props) / sizeof(*props)", "props")
    };
    output.push_str(&format!(
        "  WEBIDL_NAPI_RETURN_IF_FAILED(napi_define_class(env, {}, NAPI_AUTO_LENGTH, {}, nullptr, {}, {}, result));\n",
        c_string(name),
        constructor_name(name),
        count,
        props
    ));
    output.push_str(&format!(
        "  return WebIdlNapi::RegisterConstructor(env, {}, *result);\n",
        c_string(name)
    ));
    output.push_str("}\n");
    output
}

/// All bindings for an interface, ending with its class factory.
pub fn bindings(model: &Model, iface: &Interface, unsupported: &mut Unsupported) -> String {
    let mut parts = vec![constructor(model, iface, unsupported)];
    for overloads in iface.overload_sets().values() {
        parts.push(operation(model, iface, overloads, unsupported));
    }
    for attr in iface.attributes() {
        parts.push(getter(model, iface, attr, unsupported));
        if !attr.readonly {
            parts.push(setter(model, iface, attr, unsupported));
        }
    }
    parts.push(factory(iface));
    parts.join("\n")
}
