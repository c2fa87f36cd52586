//! Frontend for the JSON tree produced by `webidl2`.
//!
//! Nodes deserialize as internally tagged enums keyed on their `"type"`
//! field, so the set of node kinds is closed: an unknown tag is rejected.
//! Member kinds the generator does not bind are skipped with a warning,
//! matching the text frontend.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::ast::*;
use super::Frontend;
use crate::diagnostic::CompilerError;

/// Parses a `webidl2` JSON definition array.
#[derive(Debug, Default)]
pub struct JsonFrontend;

impl JsonFrontend {
    pub fn new() -> Self {
        Self
    }
}

impl Frontend for JsonFrontend {
    fn format(&self) -> &str {
        "json"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn parse(&mut self, source: &str, path: &Path) -> Result<Vec<Definition>, CompilerError> {
        let invalid = |message: String| CompilerError::InvalidTree {
            message,
            file: path.to_path_buf(),
        };

        let nodes: Vec<RawDefinition> =
            serde_json::from_str(source).map_err(|e| invalid(e.to_string()))?;
        let definitions: Vec<Definition> = nodes.into_iter().filter_map(convert_definition).collect();

        debug!(
            file = %path.display(),
            definitions = definitions.len(),
            "parsed webidl2 tree"
        );
        Ok(definitions)
    }
}

// =============================================================================
// Raw node shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawExtAttr {
    name: String,
    #[serde(default)]
    rhs: Option<RawRhs>,
}

#[derive(Debug, Deserialize)]
struct RawRhs {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct RawType {
    #[serde(default)]
    generic: String,
    #[serde(default)]
    nullable: bool,
    #[serde(default)]
    union: bool,
    #[serde(rename = "idlType")]
    idl_type: RawTypeName,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTypeName {
    Name(String),
    Params(Vec<RawType>),
}

#[derive(Debug, Deserialize)]
struct RawDefault {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    negative: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawArgument {
    name: String,
    #[serde(rename = "idlType")]
    idl_type: RawType,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    variadic: bool,
    #[serde(default)]
    default: Option<RawDefault>,
}

#[derive(Debug, Deserialize)]
struct RawOperation {
    #[serde(default)]
    name: String,
    #[serde(rename = "idlType", default)]
    idl_type: Option<RawType>,
    #[serde(default)]
    arguments: Vec<RawArgument>,
    #[serde(default)]
    special: String,
    #[serde(rename = "extAttrs", default)]
    ext_attrs: Vec<RawExtAttr>,
}

#[derive(Debug, Deserialize)]
struct RawAttribute {
    name: String,
    #[serde(rename = "idlType")]
    idl_type: RawType,
    #[serde(default)]
    readonly: bool,
    #[serde(default)]
    special: String,
    #[serde(rename = "extAttrs", default)]
    ext_attrs: Vec<RawExtAttr>,
}

#[derive(Debug, Deserialize)]
struct RawConstructor {
    #[serde(default)]
    arguments: Vec<RawArgument>,
    #[serde(rename = "extAttrs", default)]
    ext_attrs: Vec<RawExtAttr>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "idlType")]
    idl_type: RawType,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    default: Option<RawDefault>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawDefinition {
    #[serde(rename = "interface")]
    Interface(RawContainer<RawMember>),
    #[serde(rename = "interface mixin")]
    Mixin(RawContainer<RawMember>),
    #[serde(rename = "dictionary")]
    Dictionary(RawContainer<RawField>),
    #[serde(rename = "enum")]
    Enum(RawEnum),
    #[serde(rename = "typedef")]
    Typedef(RawTypedef),
    #[serde(rename = "includes")]
    Includes(RawIncludes),
    #[serde(rename = "eof")]
    Eof,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawMember {
    #[serde(rename = "operation")]
    Operation(RawOperation),
    #[serde(rename = "attribute")]
    Attribute(RawAttribute),
    #[serde(rename = "constructor")]
    Constructor(RawConstructor),
    #[serde(rename = "const")]
    Const,
    #[serde(rename = "iterable")]
    Iterable,
    #[serde(rename = "async iterable")]
    AsyncIterable,
    #[serde(rename = "maplike")]
    Maplike,
    #[serde(rename = "setlike")]
    Setlike,
}

#[derive(Debug, Deserialize)]
struct RawContainer<M> {
    name: String,
    #[serde(default)]
    partial: bool,
    #[serde(default)]
    inheritance: Option<String>,
    #[serde(default = "Vec::new")]
    members: Vec<M>,
    #[serde(rename = "extAttrs", default)]
    ext_attrs: Vec<RawExtAttr>,
}

#[derive(Debug, Deserialize)]
struct RawEnumValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawEnum {
    name: String,
    values: Vec<RawEnumValue>,
}

#[derive(Debug, Deserialize)]
struct RawTypedef {
    name: String,
    #[serde(rename = "idlType")]
    idl_type: RawType,
}

#[derive(Debug, Deserialize)]
struct RawIncludes {
    target: String,
    includes: String,
}

// =============================================================================
// Conversion
// =============================================================================

fn convert_definition(node: RawDefinition) -> Option<Definition> {
    let definition = match node {
        RawDefinition::Interface(raw) => Definition::Interface(InterfaceDecl {
            members: convert_members(raw.members),
            name: raw.name,
            partial: raw.partial,
            inheritance: raw.inheritance,
            ext_attrs: convert_ext_attrs(raw.ext_attrs),
        }),
        RawDefinition::Mixin(raw) => Definition::Mixin(MixinDecl {
            members: convert_members(raw.members),
            name: raw.name,
            partial: raw.partial,
        }),
        RawDefinition::Dictionary(raw) => Definition::Dictionary(DictionaryDecl {
            name: raw.name,
            partial: raw.partial,
            inheritance: raw.inheritance,
            members: raw
                .members
                .into_iter()
                .map(|field| Field {
                    name: field.name,
                    idl_type: convert_type(field.idl_type),
                    required: field.required,
                    default: field.default.map(convert_default),
                })
                .collect(),
        }),
        RawDefinition::Enum(raw) => Definition::Enum(EnumDecl {
            name: raw.name,
            values: raw.values.into_iter().map(|v| v.value).collect(),
        }),
        RawDefinition::Typedef(raw) => Definition::Typedef(TypedefDecl {
            name: raw.name,
            idl_type: convert_type(raw.idl_type),
        }),
        RawDefinition::Includes(raw) => Definition::Includes(IncludesDecl {
            target: raw.target,
            includes: raw.includes,
        }),
        RawDefinition::Eof => return None,
    };
    Some(definition)
}

fn convert_members(members: Vec<RawMember>) -> Vec<Member> {
    let mut converted = Vec::with_capacity(members.len());
    for node in members {
        match node {
            RawMember::Operation(raw) => {
                if raw.name.is_empty() || !matches!(raw.special.as_str(), "" | "static") {
                    warn!(special = %raw.special, "skipping special operation");
                    continue;
                }
                let return_type = raw
                    .idl_type
                    .map(convert_type)
                    .filter(|t| !t.is_undefined());
                converted.push(Member::Operation(Operation {
                    name: raw.name,
                    arguments: convert_arguments(raw.arguments),
                    return_type,
                    special: convert_special(&raw.special),
                    ext_attrs: convert_ext_attrs(raw.ext_attrs),
                }));
            }
            RawMember::Attribute(raw) => {
                if !matches!(raw.special.as_str(), "" | "static") {
                    warn!(attribute = %raw.name, special = %raw.special, "skipping special attribute");
                    continue;
                }
                converted.push(Member::Attribute(Attribute {
                    idl_type: convert_type(raw.idl_type),
                    special: convert_special(&raw.special),
                    name: raw.name,
                    readonly: raw.readonly,
                    ext_attrs: convert_ext_attrs(raw.ext_attrs),
                }));
            }
            RawMember::Constructor(raw) => {
                converted.push(Member::Constructor(Constructor {
                    arguments: convert_arguments(raw.arguments),
                    ext_attrs: convert_ext_attrs(raw.ext_attrs),
                }));
            }
            skipped => {
                warn!(member = ?skipped, "skipping unsupported interface member");
            }
        }
    }
    converted
}

fn convert_special(special: &str) -> Special {
    if special == "static" {
        Special::Static
    } else {
        Special::None
    }
}

fn convert_arguments(arguments: Vec<RawArgument>) -> Vec<Argument> {
    arguments
        .into_iter()
        .map(|arg| Argument {
            name: arg.name,
            idl_type: convert_type(arg.idl_type),
            optional: arg.optional || arg.variadic,
            variadic: arg.variadic,
            default: arg.default.map(convert_default),
        })
        .collect()
}

fn convert_type(raw: RawType) -> IdlType {
    let idl_type = match raw.idl_type {
        RawTypeName::Name(name) => IdlType::Scalar(name),
        RawTypeName::Params(params) if raw.union => {
            let parts: Vec<String> = params
                .into_iter()
                .map(|p| convert_type(p).to_string())
                .collect();
            IdlType::Scalar(format!("({})", parts.join(" or ")))
        }
        RawTypeName::Params(mut params) if params.len() == 1 && !raw.generic.is_empty() => {
            let inner = convert_type(params.remove(0));
            IdlType::generic(raw.generic, inner)
        }
        RawTypeName::Params(params) => {
            let parts: Vec<String> = params
                .into_iter()
                .map(|p| convert_type(p).to_string())
                .collect();
            IdlType::Scalar(format!("{}<{}>", raw.generic, parts.join(", ")))
        }
    };

    if raw.nullable {
        IdlType::Scalar(format!("{}?", idl_type))
    } else {
        idl_type
    }
}

fn convert_default(raw: RawDefault) -> String {
    let negative = raw.negative.unwrap_or(false);
    match raw.kind.as_str() {
        "string" => format!("\"{}\"", raw.value.as_str().unwrap_or_default()),
        "sequence" => "[]".to_string(),
        "dictionary" => "{}".to_string(),
        "null" => "null".to_string(),
        "Infinity" if negative => "-Infinity".to_string(),
        "Infinity" => "Infinity".to_string(),
        "NaN" => "NaN".to_string(),
        _ => match raw.value {
            Value::String(s) => s,
            other => other.to_string(),
        },
    }
}

fn convert_ext_attrs(attrs: Vec<RawExtAttr>) -> Vec<ExtAttr> {
    attrs
        .into_iter()
        .map(|attr| ExtAttr {
            name: attr.name,
            value: attr.rhs.map(|rhs| rhs_text(&rhs.value)),
        })
        .collect()
}

fn rhs_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item.get("value") {
                    Some(inner) => rhs_text(inner),
                    None => rhs_text(item),
                })
                .collect();
            format!("({})", parts.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Vec<Definition>, CompilerError> {
        JsonFrontend::new().parse(source, Path::new("tree.json"))
    }

    #[test]
    fn converts_interfaces_and_members() {
        let defs = parse(
            r#"[
              {
                "type": "interface", "name": "GPU", "partial": false, "inheritance": null,
                "extAttrs": [{"type": "extended-attribute", "name": "Exposed",
                              "rhs": {"type": "identifier", "value": "Window"}, "arguments": []}],
                "members": [
                  {"type": "operation", "name": "requestAdapter", "special": "",
                   "idlType": {"type": "return-type", "generic": "Promise", "nullable": false,
                               "union": false, "extAttrs": [],
                               "idlType": [{"type": null, "generic": "", "nullable": false,
                                            "union": false, "extAttrs": [], "idlType": "GPUAdapter"}]},
                   "arguments": [
                     {"type": "argument", "name": "options", "optional": true, "variadic": false,
                      "default": {"type": "dictionary", "value": []}, "extAttrs": [],
                      "idlType": {"type": "argument-type", "generic": "", "nullable": false,
                                  "union": false, "extAttrs": [], "idlType": "GPURequestAdapterOptions"}}
                   ], "extAttrs": []},
                  {"type": "attribute", "name": "gpu", "special": "", "readonly": true,
                   "extAttrs": [{"type": "extended-attribute", "name": "SameObject", "rhs": null, "arguments": []}],
                   "idlType": {"type": "attribute-type", "generic": "", "nullable": false,
                               "union": false, "extAttrs": [], "idlType": "GPU"}},
                  {"type": "const", "name": "X", "idlType": {"idlType": "long"}, "value": {"type": "number", "value": "1"}}
                ]
              },
              {"type": "eof", "value": ""}
            ]"#,
        )
        .unwrap();

        assert_eq!(defs.len(), 1);
        let Definition::Interface(iface) = &defs[0] else {
            panic!("expected interface");
        };
        assert_eq!(iface.ext_attrs[0].value.as_deref(), Some("Window"));
        assert_eq!(iface.members.len(), 2);

        let Member::Operation(op) = &iface.members[0] else {
            panic!("expected operation");
        };
        assert_eq!(
            op.return_type,
            Some(IdlType::generic("Promise", IdlType::scalar("GPUAdapter")))
        );
        assert!(op.arguments[0].optional);
        assert_eq!(op.arguments[0].default.as_deref(), Some("{}"));

        let Member::Attribute(attr) = &iface.members[1] else {
            panic!("expected attribute");
        };
        assert!(attr.is_same_object());
        assert!(attr.readonly);
    }

    #[test]
    fn converts_enums_dictionaries_typedefs_and_includes() {
        let defs = parse(
            r#"[
              {"type": "enum", "name": "E", "values": [{"type": "enum-value", "value": "a-b"}, {"type": "enum-value", "value": ""}]},
              {"type": "dictionary", "name": "D", "partial": false, "inheritance": "Base",
               "members": [{"type": "field", "name": "x", "required": true, "extAttrs": [], "default": null,
                            "idlType": {"generic": "", "nullable": true, "union": false, "idlType": "long"}}]},
              {"type": "typedef", "name": "Size", "idlType": {"generic": "", "nullable": false, "union": false, "idlType": "unsigned long"}},
              {"type": "includes", "target": "A", "includes": "M"}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            defs[0],
            Definition::Enum(EnumDecl {
                name: "E".to_string(),
                values: vec!["a-b".to_string(), String::new()],
            })
        );
        let Definition::Dictionary(dict) = &defs[1] else {
            panic!("expected dictionary");
        };
        assert_eq!(dict.inheritance.as_deref(), Some("Base"));
        assert!(dict.members[0].required);
        assert_eq!(dict.members[0].idl_type, IdlType::scalar("long?"));
        assert!(matches!(&defs[2], Definition::Typedef(t) if t.idl_type == IdlType::scalar("unsigned long")));
        assert!(matches!(&defs[3], Definition::Includes(i) if i.target == "A" && i.includes == "M"));
    }

    #[test]
    fn unknown_definition_type_is_rejected() {
        let err = parse(r#"[{"type": "callback", "name": "Fn"}]"#).unwrap_err();
        match err {
            CompilerError::InvalidTree { message, .. } => {
                assert!(message.contains("unknown variant `callback`"), "{}", message);
            }
            other => panic!("expected invalid tree, got {:?}", other),
        }
    }

    #[test]
    fn member_kinds_are_a_closed_set() {
        let defs = parse(
            r#"[{"type": "interface mixin", "name": "M", "partial": false,
                 "members": [
                   {"type": "iterable", "idlType": [{"idlType": "long"}], "async": false},
                   {"type": "setlike", "readonly": true, "idlType": [{"idlType": "DOMString"}]},
                   {"type": "constructor", "arguments": []}
                 ]}]"#,
        )
        .unwrap();
        let Definition::Mixin(mixin) = &defs[0] else {
            panic!("expected mixin");
        };
        assert_eq!(mixin.members.len(), 1);
        assert!(matches!(mixin.members[0], Member::Constructor(_)));

        let err = parse(
            r#"[{"type": "interface", "name": "A", "members": [{"type": "stringifier-thing"}]}]"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CompilerError::InvalidTree { ref message, .. } if message.contains("unknown variant `stringifier-thing`")
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            parse("{not json"),
            Err(CompilerError::InvalidTree { .. })
        ));
    }

    #[test]
    fn union_types_become_opaque_names() {
        let defs = parse(
            r#"[{"type": "typedef", "name": "U", "idlType": {"generic": "", "nullable": false, "union": true,
                 "idlType": [{"generic": "", "idlType": "DOMString"},
                             {"generic": "sequence", "idlType": [{"generic": "", "idlType": "long"}]}]}}]"#,
        )
        .unwrap();
        assert!(matches!(
            &defs[0],
            Definition::Typedef(t) if t.idl_type == IdlType::scalar("(DOMString or sequence<long>)")
        ));
    }
}
