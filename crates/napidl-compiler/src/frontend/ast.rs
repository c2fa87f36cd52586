//! Raw IDL syntax tree shared by all frontends.
//!
//! This is the fixed-shape tree handed to normalization. Every node kind is a
//! closed variant; frontends reject anything they cannot express here.

use std::fmt;

/// A type reference as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdlType {
    /// A named type: a scalar from the type map, or a user definition.
    ///
    /// Unions and nullable types are carried here by their source text and
    /// never resolve to a converter.
    Scalar(String),
    /// A single-parameter wrapper such as `Promise<T>` or `sequence<T>`.
    Generic(String, Box<IdlType>),
}

impl IdlType {
    pub fn scalar(name: impl Into<String>) -> Self {
        IdlType::Scalar(name.into())
    }

    pub fn generic(wrapper: impl Into<String>, inner: IdlType) -> Self {
        IdlType::Generic(wrapper.into(), Box::new(inner))
    }

    /// Returns `true` for `undefined`/`void`, the "no return value" type.
    pub fn is_undefined(&self) -> bool {
        matches!(self, IdlType::Scalar(name) if name == "undefined" || name == "void")
    }
}

impl fmt::Display for IdlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdlType::Scalar(name) => f.write_str(name),
            IdlType::Generic(wrapper, inner) => write!(f, "{}<{}>", wrapper, inner),
        }
    }
}

/// An extended attribute such as `[SameObject]` or `[Exposed=Window]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtAttr {
    pub name: String,
    /// Right-hand side as written, if any.
    pub value: Option<String>,
}

/// Returns `true` if `attrs` contains an extended attribute named `name`.
pub fn has_ext_attr(attrs: &[ExtAttr], name: &str) -> bool {
    attrs.iter().any(|a| a.name == name)
}

/// An operation or constructor argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub idl_type: IdlType,
    pub optional: bool,
    pub variadic: bool,
    pub default: Option<String>,
}

/// Marker for `static` members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Special {
    #[default]
    None,
    Static,
}

/// A regular or static operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    pub arguments: Vec<Argument>,
    /// `None` when the operation returns `undefined`.
    pub return_type: Option<IdlType>,
    pub special: Special,
    pub ext_attrs: Vec<ExtAttr>,
}

impl Operation {
    pub fn is_static(&self) -> bool {
        self.special == Special::Static
    }
}

/// An attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub idl_type: IdlType,
    pub readonly: bool,
    pub special: Special,
    pub ext_attrs: Vec<ExtAttr>,
}

impl Attribute {
    pub fn is_static(&self) -> bool {
        self.special == Special::Static
    }

    pub fn is_same_object(&self) -> bool {
        has_ext_attr(&self.ext_attrs, "SameObject")
    }
}

/// A constructor declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    pub arguments: Vec<Argument>,
    pub ext_attrs: Vec<ExtAttr>,
}

/// A member of an interface or interface mixin.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Operation(Operation),
    Attribute(Attribute),
    Constructor(Constructor),
}

/// A dictionary member.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub idl_type: IdlType,
    pub required: bool,
    pub default: Option<String>,
}

/// `interface Name : Parent { ... };` or `partial interface Name { ... };`
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub name: String,
    pub partial: bool,
    pub inheritance: Option<String>,
    pub members: Vec<Member>,
    pub ext_attrs: Vec<ExtAttr>,
}

/// `interface mixin Name { ... };`
#[derive(Debug, Clone, PartialEq)]
pub struct MixinDecl {
    pub name: String,
    pub partial: bool,
    pub members: Vec<Member>,
}

/// `dictionary Name : Parent { ... };`
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryDecl {
    pub name: String,
    pub partial: bool,
    pub inheritance: Option<String>,
    pub members: Vec<Field>,
}

/// `enum Name { "a", "b" };`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub values: Vec<String>,
}

/// `typedef Type Name;`
#[derive(Debug, Clone, PartialEq)]
pub struct TypedefDecl {
    pub name: String,
    pub idl_type: IdlType,
}

/// `Target includes Mixin;`
#[derive(Debug, Clone, PartialEq)]
pub struct IncludesDecl {
    pub target: String,
    pub includes: String,
}

/// A top-level definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Interface(InterfaceDecl),
    Mixin(MixinDecl),
    Dictionary(DictionaryDecl),
    Enum(EnumDecl),
    Typedef(TypedefDecl),
    Includes(IncludesDecl),
}

impl Definition {
    /// The declared name; for `includes` statements, the target.
    pub fn name(&self) -> &str {
        match self {
            Definition::Interface(d) => &d.name,
            Definition::Mixin(d) => &d.name,
            Definition::Dictionary(d) => &d.name,
            Definition::Enum(d) => &d.name,
            Definition::Typedef(d) => &d.name,
            Definition::Includes(d) => &d.target,
        }
    }
}
