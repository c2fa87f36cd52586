//! Canonical model of an IDL document.
//!
//! The model is produced once by [`normalize`] and only read afterwards.
//! Partials, mixins and inheritance have already been merged, so every
//! interface and dictionary carries its complete member list in emission
//! order.

mod normalize;

pub use normalize::normalize;

use indexmap::IndexMap;

pub use crate::frontend::ast::{Argument, Attribute, Constructor, Field, IdlType, Member, Operation};
use crate::typemap::{self, ConverterFamily, ScalarType};

/// A normalized interface.
#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: String,
    /// Own members, then merged partials and mixins, then inherited members.
    pub members: Vec<Member>,
}

impl Interface {
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.members.iter().filter_map(|m| match m {
            Member::Operation(op) => Some(op),
            _ => None,
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.members.iter().filter_map(|m| match m {
            Member::Attribute(attr) => Some(attr),
            _ => None,
        })
    }

    pub fn constructors(&self) -> Vec<&Constructor> {
        self.members
            .iter()
            .filter_map(|m| match m {
                Member::Constructor(ctor) => Some(ctor),
                _ => None,
            })
            .collect()
    }

    /// Operations grouped by name, in order of first declaration.
    pub fn overload_sets(&self) -> IndexMap<&str, Vec<&Operation>> {
        let mut sets: IndexMap<&str, Vec<&Operation>> = IndexMap::new();
        for op in self.operations() {
            sets.entry(op.name.as_str()).or_default().push(op);
        }
        sets
    }

    /// Slot index of a `[SameObject]` attribute on wrapped instances.
    pub fn same_object_slot(&self, attribute: &str) -> Option<usize> {
        self.attributes()
            .filter(|a| a.is_same_object() && !a.is_static())
            .position(|a| a.name == attribute)
    }

    /// Number of same-object slots each wrapped instance reserves.
    pub fn same_object_slot_count(&self) -> usize {
        self.attributes()
            .filter(|a| a.is_same_object() && !a.is_static())
            .count()
    }
}

/// A normalized dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
    pub name: String,
    /// Own members first, then inherited ones.
    pub members: Vec<Field>,
}

impl Dictionary {
    pub fn has_required_members(&self) -> bool {
        self.members.iter().any(|m| m.required)
    }
}

/// An enum literal and the native enumerator it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub literal: String,
    pub ident: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub name: String,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Typedef {
    pub name: String,
    pub target: IdlType,
}

/// Parametrized wrappers with a converter rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericWrapper {
    Promise,
    Sequence,
    FrozenArray,
}

impl GenericWrapper {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Promise" => Some(GenericWrapper::Promise),
            "sequence" => Some(GenericWrapper::Sequence),
            "FrozenArray" => Some(GenericWrapper::FrozenArray),
            _ => None,
        }
    }

    /// Native template in the support header.
    pub fn native_template(self) -> &'static str {
        match self {
            GenericWrapper::Promise => "WebIdlNapi::Promise",
            // Both wrappers share one native representation.
            GenericWrapper::Sequence | GenericWrapper::FrozenArray => "WebIdlNapi::sequence",
        }
    }
}

/// What a type reference resolves to.
#[derive(Debug, Clone, Copy)]
pub enum TypeKind<'a> {
    Scalar(&'static ScalarType),
    Enum(&'a Enum),
    Dictionary(&'a Dictionary),
    Interface(&'a Interface),
    /// `basic` is the scalar the typedef names directly, if any.
    Typedef {
        typedef: &'a Typedef,
        basic: Option<&'static ScalarType>,
    },
    Generic {
        wrapper: GenericWrapper,
        inner: &'a IdlType,
    },
    Unsupported(&'a IdlType),
}

impl TypeKind<'_> {
    pub fn is_supported(&self) -> bool {
        !matches!(self, TypeKind::Unsupported(_))
    }
}

/// The normalized document.
#[derive(Debug, Default)]
pub struct Model {
    pub interfaces: IndexMap<String, Interface>,
    pub dictionaries: IndexMap<String, Dictionary>,
    pub enums: IndexMap<String, Enum>,
    pub typedefs: IndexMap<String, Typedef>,
}

impl Model {
    /// Classifies a type reference.
    pub fn resolve<'a>(&'a self, idl_type: &'a IdlType) -> TypeKind<'a> {
        match idl_type {
            IdlType::Scalar(name) => self.resolve_name(name, idl_type),
            IdlType::Generic(wrapper, inner) => {
                let inner: &IdlType = inner;
                let Some(wrapper) = GenericWrapper::from_name(wrapper) else {
                    return TypeKind::Unsupported(idl_type);
                };
                // Only a single level of wrapping is supported, also through typedefs.
                let nested = match inner {
                    IdlType::Generic(..) => true,
                    IdlType::Scalar(name) => self
                        .typedefs
                        .get(name)
                        .is_some_and(|t| self.is_generic_typedef(t)),
                };
                if nested {
                    return TypeKind::Unsupported(idl_type);
                }
                match self.resolve(inner) {
                    TypeKind::Unsupported(_) => TypeKind::Unsupported(idl_type),
                    TypeKind::Scalar(s)
                        if s.converter == ConverterFamily::Undefined
                            && wrapper != GenericWrapper::Promise =>
                    {
                        TypeKind::Unsupported(idl_type)
                    }
                    _ => TypeKind::Generic { wrapper, inner },
                }
            }
        }
    }

    fn resolve_name<'a>(&'a self, name: &str, idl_type: &'a IdlType) -> TypeKind<'a> {
        if let Some(scalar) = typemap::lookup(name) {
            return TypeKind::Scalar(scalar);
        }
        if let Some(e) = self.enums.get(name) {
            return TypeKind::Enum(e);
        }
        if let Some(d) = self.dictionaries.get(name) {
            return TypeKind::Dictionary(d);
        }
        if let Some(i) = self.interfaces.get(name) {
            return TypeKind::Interface(i);
        }
        if let Some(t) = self.typedefs.get(name) {
            return match &t.target {
                IdlType::Scalar(target) => match typemap::lookup(target) {
                    Some(scalar) => TypeKind::Typedef {
                        typedef: t,
                        basic: Some(scalar),
                    },
                    None if self.typedef_is_supported(t) => TypeKind::Typedef {
                        typedef: t,
                        basic: None,
                    },
                    None => TypeKind::Unsupported(idl_type),
                },
                IdlType::Generic(..) if self.typedef_is_supported(t) => TypeKind::Typedef {
                    typedef: t,
                    basic: None,
                },
                IdlType::Generic(..) => TypeKind::Unsupported(idl_type),
            };
        }
        TypeKind::Unsupported(idl_type)
    }

    /// A typedef is supported when its target chain ends in a convertible
    /// type without revisiting a typedef.
    pub fn typedef_is_supported(&self, typedef: &Typedef) -> bool {
        let mut seen = vec![typedef.name.as_str()];
        let mut target = &typedef.target;
        loop {
            if let IdlType::Scalar(name) = target {
                if let Some(next) = self.typedefs.get(name) {
                    if seen.contains(&next.name.as_str()) {
                        return false;
                    }
                    seen.push(&next.name);
                    target = &next.target;
                    continue;
                }
            }
            return self.resolve(target).is_supported();
        }
    }

    fn is_generic_typedef(&self, typedef: &Typedef) -> bool {
        let mut seen = vec![typedef.name.as_str()];
        let mut target = &typedef.target;
        loop {
            match target {
                IdlType::Generic(..) => return true,
                IdlType::Scalar(name) => match self.typedefs.get(name) {
                    Some(next) if !seen.contains(&next.name.as_str()) => {
                        seen.push(&next.name);
                        target = &next.target;
                    }
                    _ => return false,
                },
            }
        }
    }

    /// Whether a value of this type maps to an interface instance.
    pub fn is_interface(&self, idl_type: &IdlType) -> bool {
        matches!(self.resolve(idl_type), TypeKind::Interface(_))
    }
}

/// Maps an enum literal to its native enumerator name.
///
/// The empty string maps to `_empty`. Otherwise the first character is
/// upper-cased and every character outside `[0-9A-Za-z]` becomes `_`;
/// a leading digit gets a `_` prefix.
pub fn enum_identifier(literal: &str) -> String {
    if literal.is_empty() {
        return "_empty".to_string();
    }

    let mut ident = String::with_capacity(literal.len() + 1);
    for (i, c) in literal.chars().enumerate() {
        let c = if i == 0 { c.to_ascii_uppercase() } else { c };
        ident.push(if c.is_ascii_alphanumeric() { c } else { '_' });
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Model {
        let mut model = Model::default();
        model.enums.insert(
            "E".to_string(),
            Enum {
                name: "E".to_string(),
                values: vec![],
            },
        );
        model.interfaces.insert(
            "GPUAdapter".to_string(),
            Interface {
                name: "GPUAdapter".to_string(),
                members: vec![],
            },
        );
        for (name, target) in [
            ("Size", IdlType::scalar("unsigned long")),
            ("Adapter", IdlType::scalar("GPUAdapter")),
            ("Loop", IdlType::scalar("Loop")),
            ("Names", IdlType::generic("sequence", IdlType::scalar("DOMString"))),
        ] {
            model.typedefs.insert(
                name.to_string(),
                Typedef {
                    name: name.to_string(),
                    target,
                },
            );
        }
        model
    }

    #[test]
    fn enum_identifiers() {
        assert_eq!(enum_identifier("low-power"), "Low_power");
        assert_eq!(enum_identifier("depth24unorm-stencil8"), "Depth24unorm_stencil8");
        assert_eq!(enum_identifier(""), "_empty");
        assert_eq!(enum_identifier("2d"), "_2d");
        assert_eq!(enum_identifier("a b.c"), "A_b_c");
    }

    #[test]
    fn resolves_scalars_and_definitions() {
        let model = model();
        assert!(matches!(model.resolve(&IdlType::scalar("double")), TypeKind::Scalar(s) if s.native == "double"));
        assert!(matches!(model.resolve(&IdlType::scalar("E")), TypeKind::Enum(_)));
        assert!(matches!(model.resolve(&IdlType::scalar("GPUAdapter")), TypeKind::Interface(_)));
        assert!(!model.resolve(&IdlType::scalar("Missing")).is_supported());
    }

    #[test]
    fn classifies_typedefs() {
        let model = model();
        assert!(matches!(
            model.resolve(&IdlType::scalar("Size")),
            TypeKind::Typedef { basic: Some(s), .. } if s.native == "uint32_t"
        ));
        assert!(matches!(
            model.resolve(&IdlType::scalar("Adapter")),
            TypeKind::Typedef { basic: None, .. }
        ));
        assert!(!model.resolve(&IdlType::scalar("Loop")).is_supported());
    }

    #[test]
    fn resolves_single_level_generics_only() {
        let model = model();
        let promise = IdlType::generic("Promise", IdlType::scalar("GPUAdapter"));
        assert!(matches!(
            model.resolve(&promise),
            TypeKind::Generic { wrapper: GenericWrapper::Promise, .. }
        ));

        let nested = IdlType::generic(
            "Promise",
            IdlType::generic("sequence", IdlType::scalar("long")),
        );
        assert!(!model.resolve(&nested).is_supported());

        let through_typedef = IdlType::generic("Promise", IdlType::scalar("Names"));
        assert!(!model.resolve(&through_typedef).is_supported());

        let unknown = IdlType::generic("ObservableArray", IdlType::scalar("long"));
        assert!(!model.resolve(&unknown).is_supported());

        let promise_undefined = IdlType::generic("Promise", IdlType::scalar("undefined"));
        assert!(model.resolve(&promise_undefined).is_supported());
    }

    #[test]
    fn same_object_slots_follow_declaration_order() {
        let attr = |name: &str, same: bool| {
            Member::Attribute(Attribute {
                name: name.to_string(),
                idl_type: IdlType::scalar("object"),
                readonly: true,
                special: Default::default(),
                ext_attrs: if same {
                    vec![crate::frontend::ast::ExtAttr {
                        name: "SameObject".to_string(),
                        value: None,
                    }]
                } else {
                    vec![]
                },
            })
        };
        let iface = Interface {
            name: "Navigator".to_string(),
            members: vec![attr("a", true), attr("b", false), attr("c", true)],
        };
        assert_eq!(iface.same_object_slot("a"), Some(0));
        assert_eq!(iface.same_object_slot("b"), None);
        assert_eq!(iface.same_object_slot("c"), Some(1));
        assert_eq!(iface.same_object_slot_count(), 2);
    }
}
