//! The C++ support header embedded at compile time.
//!
//! Generated code includes `webidl-napi.h`; users either add the directory
//! returned by [`include_dir`] to their include path or write a copy next to
//! the generated file.

use std::path::PathBuf;

/// File name generated code includes.
pub const SUPPORT_HEADER_NAME: &str = "webidl-napi.h";

/// Contents of the support header.
pub const SUPPORT_HEADER: &str = include_str!("../../runtime/webidl-napi.h");

/// Directory holding the support header in the source tree.
pub fn include_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("runtime")
}
