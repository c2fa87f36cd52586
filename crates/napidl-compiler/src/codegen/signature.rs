//! Overload resolution.
//!
//! Each signature of an overload set is reduced ahead of time to the value
//! categories its arguments require. At call time the first candidate, in
//! declaration order, that accepts the actual argument categories wins.
//! [`pick_signature`] is the reference implementation of the algorithm the
//! support header's `PickSignature` runs; validation uses it to find
//! candidates that can never be selected.

use super::cpp;
use super::Unsupported;
use crate::ir::{Argument, IdlType, Model, TypeKind};
use crate::typemap::ValueCategory;

const ALL_CATEGORIES: [ValueCategory; 10] = [
    ValueCategory::Undefined,
    ValueCategory::Null,
    ValueCategory::Boolean,
    ValueCategory::Number,
    ValueCategory::String,
    ValueCategory::Symbol,
    ValueCategory::Object,
    ValueCategory::Function,
    ValueCategory::External,
    ValueCategory::BigInt,
];

/// The argument categories one signature accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Expected category per argument; `None` accepts any value.
    pub expected: Vec<Option<ValueCategory>>,
    /// Number of leading required arguments.
    pub required: usize,
}

impl Candidate {
    pub fn new(expected: Vec<Option<ValueCategory>>, required: usize) -> Self {
        Self { expected, required }
    }

    /// Derives the candidate for an argument list.
    pub fn for_arguments(model: &Model, arguments: &[Argument]) -> Self {
        Self {
            expected: arguments
                .iter()
                .map(|arg| expected_category(model, &arg.idl_type))
                .collect(),
            required: arguments.iter().take_while(|arg| !arg.optional).count(),
        }
    }

    /// Whether a call with these argument categories selects this candidate.
    pub fn accepts(&self, args: &[ValueCategory]) -> bool {
        // Missing required arguments read as undefined.
        if args.len() < self.required
            && self.expected[args.len()..self.required]
                .iter()
                .any(Option::is_some)
        {
            return false;
        }

        args.iter().enumerate().all(|(idx, &arg)| match self.expected.get(idx) {
            None => arg == ValueCategory::Undefined,
            Some(_) if arg == ValueCategory::Undefined && idx >= self.required => true,
            Some(None) => true,
            Some(Some(expected)) => *expected == arg,
        })
    }

    /// Categories accepted at argument position `idx`.
    fn accepted_at(&self, idx: usize) -> u16 {
        match self.expected.get(idx) {
            None => bit(ValueCategory::Undefined),
            Some(expected) => {
                let mut mask = match expected {
                    None => ALL_CATEGORIES.iter().fold(0, |m, c| m | bit(*c)),
                    Some(c) => bit(*c),
                };
                if idx >= self.required {
                    mask |= bit(ValueCategory::Undefined);
                }
                mask
            }
        }
    }

    /// Whether this candidate accepts every call `other` accepts.
    pub fn subsumes(&self, other: &Candidate) -> bool {
        (0..=other.expected.len()).all(|argc| {
            if !other.accepts_count(argc) {
                return true;
            }
            self.accepts_count(argc)
                && (0..argc).all(|idx| {
                    let theirs = other.accepted_at(idx);
                    theirs & self.accepted_at(idx) == theirs
                })
        })
    }

    /// Whether some call with exactly `argc` arguments can satisfy the
    /// required-argument check.
    fn accepts_count(&self, argc: usize) -> bool {
        argc >= self.required || self.expected[argc..self.required].iter().all(Option::is_none)
    }
}

fn bit(category: ValueCategory) -> u16 {
    1 << ALL_CATEGORIES
        .iter()
        .position(|c| *c == category)
        .unwrap_or_default()
}

/// The category a host value must have to convert into `idl_type`.
pub fn expected_category(model: &Model, idl_type: &IdlType) -> Option<ValueCategory> {
    match model.resolve(idl_type) {
        TypeKind::Scalar(scalar) => Some(scalar.category),
        TypeKind::Enum(_) => Some(ValueCategory::String),
        TypeKind::Dictionary(_) | TypeKind::Interface(_) => Some(ValueCategory::Object),
        TypeKind::Typedef { typedef, .. } => expected_category(model, &typedef.target),
        TypeKind::Generic { wrapper, .. } => match wrapper {
            crate::ir::GenericWrapper::Promise => None,
            _ => Some(ValueCategory::Object),
        },
        TypeKind::Unsupported(_) => None,
    }
}

/// Picks the first candidate accepting `args`.
///
/// Callers cap `args` at the longest candidate's arity first; arguments
/// beyond it are ignored.
pub fn pick_signature(args: &[ValueCategory], candidates: &[Candidate]) -> Option<usize> {
    candidates.iter().position(|c| c.accepts(args))
}

/// Returns the earliest candidate that accepts every call candidate `index`
/// accepts, making `index` unreachable.
pub fn shadowed_by(candidates: &[Candidate], index: usize) -> Option<usize> {
    let target = candidates.get(index)?;
    candidates[..index].iter().position(|c| c.subsumes(target))
}

/// Renders the `WebIdlNapi::Signature` table for an overload set.
///
/// Rows hold `napi_valuetype` values widened to `int`, with `kAnyValue`
/// for positions that accept any category.
pub fn signature_table(candidates: &[Candidate], indent: &str) -> String {
    let mut output = format!("{}static const WebIdlNapi::Signature webidl_napi_sigs[] = {{\n", indent);
    let rows: Vec<String> = candidates
        .iter()
        .map(|c| {
            let types: Vec<&str> = c
                .expected
                .iter()
                .map(|e| e.map(ValueCategory::napi_name).unwrap_or("WebIdlNapi::kAnyValue"))
                .collect();
            if types.is_empty() {
                format!("{}  {{ {{}}, {} }}", indent, c.required)
            } else {
                format!("{}  {{ {{ {} }}, {} }}", indent, types.join(", "), c.required)
            }
        })
        .collect();
    output.push_str(&rows.join(",\n"));
    output.push_str(&format!("\n{}}};\n", indent));
    output
}

/// Emits the call to `PickSignature` and the no-match check.
pub fn dispatch(candidates: &[Candidate], display_name: &str, indent: &str) -> String {
    let mut output = signature_table(candidates, indent);
    output.push_str(&format!("{}int sig_idx = -1;\n", indent));
    output.push_str(&format!(
        "{}NAPI_CALL(env, WebIdlNapi::PickSignature(env, argc, argv, webidl_napi_sigs, {}, &sig_idx));\n",
        indent,
        candidates.len()
    ));
    output.push_str(&format!("{}if (sig_idx < 0) {{\n", indent));
    output.push_str(&format!(
        "{}  WebIdlNapi::ThrowNoMatch(env, {});\n",
        indent,
        cpp::c_string(display_name)
    ));
    output.push_str(&format!("{}  return nullptr;\n", indent));
    output.push_str(&format!("{}}}\n", indent));
    output
}

/// How a resolved signature reaches native code.
pub enum Callee<'a> {
    /// `native = new Class(...)`
    Constructor { class: &'a str },
    /// `Class::name(...)`
    Static { class: &'a str, name: &'a str },
    /// `native->name(...)`
    Instance { name: &'a str },
}

impl Callee<'_> {
    fn call(&self, args: &str) -> String {
        match self {
            Callee::Constructor { class } => format!("new {}({})", class, args),
            Callee::Static { class, name } => format!("{}::{}({})", class, name, args),
            Callee::Instance { name } => format!("native->{}({})", name, args),
        }
    }
}

/// One signature to bind: its arguments and return type.
pub struct Invocation<'a> {
    pub callee: Callee<'a>,
    pub arguments: &'a [Argument],
    pub return_type: Option<&'a IdlType>,
    /// Human-readable name used in errors, e.g. `GPU.requestAdapter`.
    pub display_name: String,
}

impl Invocation<'_> {
    fn describe(&self) -> String {
        let args: Vec<String> = self
            .arguments
            .iter()
            .map(|a| {
                if a.variadic {
                    format!("{}...", a.idl_type)
                } else {
                    a.idl_type.to_string()
                }
            })
            .collect();
        format!("{}({})", self.display_name, args.join(", "))
    }

    fn is_supported(&self, model: &Model) -> bool {
        self.arguments
            .iter()
            .all(|a| !a.variadic && model.resolve(&a.idl_type).is_supported())
            && self.return_type.map_or(true, |t| model.resolve(t).is_supported())
    }
}

/// Emits argument conversion, the native call and return conversion for one
/// signature. The surrounding function provides `env`, `argc`, `argv`,
/// `js_ret` and, for instance calls, `native`.
pub fn invoke(
    model: &Model,
    invocation: &Invocation<'_>,
    indent: &str,
    unsupported: &mut Unsupported,
) -> String {
    if !invocation.is_supported(model) {
        let construct = invocation.describe();
        unsupported.record(construct.clone());
        return format!(
            "{indent}WebIdlNapi::ThrowNotImplemented(env, {});\n{indent}return nullptr;\n",
            cpp::c_string(&construct),
            indent = indent
        );
    }

    let mut output = String::new();
    let arguments = invocation.arguments;

    for (idx, arg) in arguments.iter().enumerate() {
        output.push_str(&convert_argument(model, arg, idx, indent));
    }

    // Optional arguments without a default are dropped from the call when
    // absent; everything up to the last always-passed argument is passed.
    let always_passed = arguments
        .iter()
        .rposition(|arg| {
            !arg.optional
                || arg.default.is_some()
                || matches!(model.resolve(&arg.idl_type), TypeKind::Dictionary(_))
        })
        .map_or(0, |idx| idx + 1);

    if always_passed == arguments.len() {
        output.push_str(&call_statement(model, invocation, arguments.len(), indent));
        return output;
    }

    let inner = format!("{}  ", indent);
    for (n, count) in (always_passed..=arguments.len()).rev().enumerate() {
        if count == always_passed {
            output.push_str(&format!("{}}} else {{\n", indent));
        } else if n == 0 {
            output.push_str(&format!("{}if (have_arg_{}) {{\n", indent, count - 1));
        } else {
            output.push_str(&format!("{}}} else if (have_arg_{}) {{\n", indent, count - 1));
        }
        output.push_str(&call_statement(model, invocation, count, &inner));
    }
    output.push_str(&format!("{}}}\n", indent));
    output
}

fn convert_argument(model: &Model, arg: &Argument, idx: usize, indent: &str) -> String {
    let native = cpp::native_type(model, &arg.idl_type).unwrap_or_default();
    let conv = cpp::converter(model, &arg.idl_type).unwrap_or_default();
    let to_native = format!(
        "NAPI_CALL(env, {}::ToNative(env, argv[{}], &native_arg_{}));",
        conv, idx, idx
    );

    let mut output = match arg.default.as_deref().and_then(|d| default_initializer(model, &arg.idl_type, d)) {
        Some(init) => format!("{}{} native_arg_{} = {};\n", indent, native, idx, init),
        None => format!("{}{} native_arg_{}{{}};\n", indent, native, idx),
    };

    if arg.optional {
        output.push_str(&format!("{}bool have_arg_{} = false;\n", indent, idx));
        output.push_str(&format!(
            "{}NAPI_CALL(env, WebIdlNapi::HasArgument(env, argc, argv, {}, &have_arg_{}));\n",
            indent, idx, idx
        ));
        output.push_str(&format!("{}if (have_arg_{}) {{\n", indent, idx));
        output.push_str(&format!("{}  {}\n", indent, to_native));
        output.push_str(&format!("{}}}\n", indent));
    } else {
        output.push_str(&format!("{}{}\n", indent, to_native));
    }
    output
}

fn call_statement(model: &Model, invocation: &Invocation<'_>, count: usize, indent: &str) -> String {
    let args: Vec<String> = (0..count).map(|idx| format!("native_arg_{}", idx)).collect();
    let call = invocation.callee.call(&args.join(", "));

    if let Callee::Constructor { .. } = invocation.callee {
        return format!("{}native = {};\n", indent, call);
    }

    let Some(return_type) = invocation.return_type else {
        return format!("{}{};\n", indent, call);
    };

    let native = cpp::native_type(model, return_type).unwrap_or_default();
    let conv = cpp::converter(model, return_type).unwrap_or_default();
    let mut output = format!("{}{} ret = {};\n", indent, native, call);
    output.push_str(&format!("{}NAPI_CALL(env, {}::ToJS(env, ret, &js_ret));\n", indent, conv));
    if matches!(
        model.resolve(return_type),
        TypeKind::Generic {
            wrapper: crate::ir::GenericWrapper::Promise,
            ..
        }
    ) {
        output.push_str(&format!("{}NAPI_CALL(env, ret.Finalize(env));\n", indent));
    }
    output
}

/// C++ initializer for an IDL default value, `None` for value-initialization.
fn default_initializer(model: &Model, idl_type: &IdlType, default: &str) -> Option<String> {
    match default {
        "[]" | "{}" | "null" => None,
        "true" | "false" => Some(default.to_string()),
        "Infinity" => Some("std::numeric_limits<double>::infinity()".to_string()),
        "-Infinity" => Some("-std::numeric_limits<double>::infinity()".to_string()),
        "NaN" => Some("std::numeric_limits<double>::quiet_NaN()".to_string()),
        quoted if quoted.starts_with('"') => {
            let literal = quoted.trim_matches('"');
            match model.resolve(idl_type) {
                TypeKind::Enum(e) => e
                    .values
                    .iter()
                    .find(|v| v.literal == literal)
                    .map(|v| format!("{}::{}", e.name, v.ident)),
                TypeKind::Scalar(_) => Some(cpp::c_string(literal)),
                _ => None,
            }
        }
        number => Some(number.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ValueCategory::*;

    fn cand(expected: &[Option<ValueCategory>], required: usize) -> Candidate {
        Candidate::new(expected.to_vec(), required)
    }

    #[test]
    fn first_matching_candidate_wins() {
        let candidates = [cand(&[Some(Number)], 1), cand(&[Some(String)], 1)];
        assert_eq!(pick_signature(&[Number], &candidates), Some(0));
        assert_eq!(pick_signature(&[String], &candidates), Some(1));
        assert_eq!(pick_signature(&[Boolean], &candidates), None);
    }

    #[test]
    fn declaration_order_beats_specificity() {
        let candidates = [cand(&[None], 1), cand(&[Some(String)], 1)];
        assert_eq!(pick_signature(&[String], &candidates), Some(0));
    }

    #[test]
    fn optional_arguments_may_be_absent_or_undefined() {
        let candidates = [cand(&[Some(Number), Some(String)], 1)];
        assert_eq!(pick_signature(&[Number], &candidates), Some(0));
        assert_eq!(pick_signature(&[Number, Undefined], &candidates), Some(0));
        assert_eq!(pick_signature(&[Number, String], &candidates), Some(0));
        assert_eq!(pick_signature(&[Undefined], &candidates), None);
        assert_eq!(pick_signature(&[], &candidates), None);
    }

    #[test]
    fn extra_arguments_reject_shorter_candidates() {
        let candidates = [cand(&[], 0), cand(&[Some(Number)], 1)];
        assert_eq!(pick_signature(&[], &candidates), Some(0));
        assert_eq!(pick_signature(&[Number], &candidates), Some(1));
        assert_eq!(pick_signature(&[Undefined], &candidates), Some(0));
    }

    #[test]
    fn constructor_overloads_from_class_fixture() {
        // constructor(); constructor(unsigned long); constructor(DOMString);
        let candidates = [cand(&[], 0), cand(&[Some(Number)], 1), cand(&[Some(String)], 1)];
        assert_eq!(pick_signature(&[], &candidates), Some(0));
        assert_eq!(pick_signature(&[Number], &candidates), Some(1));
        assert_eq!(pick_signature(&[String], &candidates), Some(2));
        assert_eq!(pick_signature(&[Object], &candidates), None);
    }

    #[test]
    fn detects_shadowed_candidates() {
        let any_first = [cand(&[None], 1), cand(&[Some(String)], 1)];
        assert_eq!(shadowed_by(&any_first, 1), Some(0));

        let distinct = [cand(&[Some(Number)], 1), cand(&[Some(String)], 1)];
        assert_eq!(shadowed_by(&distinct, 1), None);

        let optional_first = [cand(&[Some(Number), Some(String)], 1), cand(&[Some(Number)], 1)];
        assert_eq!(shadowed_by(&optional_first, 1), Some(0));

        let longer_later = [cand(&[Some(Number)], 1), cand(&[Some(Number), Some(String)], 2)];
        assert_eq!(shadowed_by(&longer_later, 1), None);

        let duplicate = [cand(&[Some(Object)], 1), cand(&[Some(Object)], 1)];
        assert_eq!(shadowed_by(&duplicate, 1), Some(0));
    }

    #[test]
    fn renders_signature_table() {
        let table = signature_table(&[cand(&[Some(String)], 1), cand(&[None, Some(Number)], 1)], "  ");
        assert!(table.contains("static const WebIdlNapi::Signature webidl_napi_sigs[] = {"));
        assert!(table.contains("{ { napi_string }, 1 }"));
        assert!(table.contains("{ { WebIdlNapi::kAnyValue, napi_number }, 1 }"));
    }

    #[test]
    fn dispatch_throws_on_no_match() {
        let code = dispatch(&[cand(&[], 0), cand(&[Some(Number)], 1)], "JSClassExample", "  ");
        assert!(code.contains("WebIdlNapi::PickSignature(env, argc, argv, webidl_napi_sigs, 2, &sig_idx)"));
        assert!(code.contains("WebIdlNapi::ThrowNoMatch(env, \"JSClassExample\");"));
    }
}
