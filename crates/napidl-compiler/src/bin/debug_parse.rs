//! Debug script to see what the parser and normalizer produce.
//!
//! Pass a file path to inspect it; without one a built-in sample is used.

use std::path::Path;

use napidl_compiler::frontend::{create_frontend, SourceFormat};
use napidl_compiler::ir::normalize;

fn main() {
    let sample = r#"
interface mixin NavigatorGPU {
  [SameObject] readonly attribute GPU gpu;
};
Navigator includes NavigatorGPU;

interface Navigator { };

enum GPUPowerPreference { "low-power", "high-performance" };

dictionary GPURequestAdapterOptions {
  GPUPowerPreference powerPreference;
};

interface GPU {
  Promise<GPUAdapter> requestAdapter(optional GPURequestAdapterOptions options = {});
};

interface GPUAdapter {
  readonly attribute DOMString name;
};
"#;

    let path = std::env::args().nth(1);
    let (source, path) = match &path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(source) => (source, Path::new(path)),
            Err(e) => {
                println!("Error: {}: {}", path, e);
                return;
            }
        },
        None => (sample.to_string(), Path::new("sample.idl")),
    };

    let mut frontend = create_frontend(SourceFormat::from_path(path));
    let definitions = match frontend.parse(&source, path) {
        Ok(definitions) => definitions,
        Err(e) => {
            println!("Error: {:?}", e);
            return;
        }
    };

    println!("Parsed file: {}", path.display());
    println!("\nDefinitions:");
    for definition in &definitions {
        println!("  {}", definition.name());
        println!("    {:?}", definition);
    }

    match normalize(definitions) {
        Ok(model) => {
            println!("\nInterfaces:");
            for iface in model.interfaces.values() {
                println!("  {} ({} members)", iface.name, iface.members.len());
            }
            println!("\nDictionaries:");
            for dict in model.dictionaries.values() {
                let fields: Vec<&str> = dict.members.iter().map(|f| f.name.as_str()).collect();
                println!("  {} {{ {} }}", dict.name, fields.join(", "));
            }
            println!("\nEnums:");
            for e in model.enums.values() {
                let idents: Vec<&str> = e.values.iter().map(|v| v.ident.as_str()).collect();
                println!("  {} [{}]", e.name, idents.join(", "));
            }
        }
        Err(e) => {
            println!("Error: {:?}", e);
        }
    }
}
