//! Static table of WebIDL scalar types.
//!
//! Every entry names the native C++ type used for storage, the host value
//! category a script value must have to convert into it, and the converter
//! family the support header implements the conversion with.

use std::fmt;

/// Dynamic value categories reported by `napi_typeof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Symbol,
    Object,
    Function,
    External,
    BigInt,
}

impl ValueCategory {
    /// The `napi_valuetype` enumerator for this category.
    pub fn napi_name(self) -> &'static str {
        match self {
            ValueCategory::Undefined => "napi_undefined",
            ValueCategory::Null => "napi_null",
            ValueCategory::Boolean => "napi_boolean",
            ValueCategory::Number => "napi_number",
            ValueCategory::String => "napi_string",
            ValueCategory::Symbol => "napi_symbol",
            ValueCategory::Object => "napi_object",
            ValueCategory::Function => "napi_function",
            ValueCategory::External => "napi_external",
            ValueCategory::BigInt => "napi_bigint",
        }
    }
}

impl fmt::Display for ValueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.napi_name())
    }
}

/// Conversion routine family in the support header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterFamily {
    Bool,
    Int32,
    Uint32,
    Int64,
    Double,
    String,
    Object,
    Undefined,
}

/// A scalar WebIDL type with a built-in converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarType {
    /// Name as written in IDL.
    pub idl: &'static str,
    /// Native storage type.
    pub native: &'static str,
    /// Category a host value must have to convert.
    pub category: ValueCategory,
    pub converter: ConverterFamily,
}

macro_rules! scalar {
    ($idl:expr, $native:expr, $category:ident, $converter:ident) => {
        ScalarType {
            idl: $idl,
            native: $native,
            category: ValueCategory::$category,
            converter: ConverterFamily::$converter,
        }
    };
}

static SCALARS: &[ScalarType] = &[
    scalar!("boolean", "bool", Boolean, Bool),
    scalar!("byte", "int8_t", Number, Int32),
    scalar!("octet", "uint8_t", Number, Uint32),
    scalar!("short", "int16_t", Number, Int32),
    scalar!("unsigned short", "uint16_t", Number, Uint32),
    scalar!("long", "int32_t", Number, Int32),
    scalar!("unsigned long", "uint32_t", Number, Uint32),
    scalar!("long long", "int64_t", Number, Int64),
    scalar!("unsigned long long", "uint64_t", Number, Int64),
    scalar!("float", "float", Number, Double),
    scalar!("unrestricted float", "float", Number, Double),
    scalar!("double", "double", Number, Double),
    scalar!("unrestricted double", "double", Number, Double),
    scalar!("DOMString", "DOMString", String, String),
    // String types share one native spelling.
    scalar!("ByteString", "DOMString", String, String),
    scalar!("USVString", "DOMString", String, String),
    scalar!("object", "object", Object, Object),
    scalar!("undefined", "WebIdlNapi::Undefined", Undefined, Undefined),
    scalar!("void", "WebIdlNapi::Undefined", Undefined, Undefined),
];

/// Looks up a scalar type by its IDL name.
pub fn lookup(name: &str) -> Option<&'static ScalarType> {
    SCALARS.iter().find(|s| s.idl == name)
}
