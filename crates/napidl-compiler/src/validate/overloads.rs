//! Overload set checks.
//!
//! Resolution at runtime is first-match in declaration order, so a signature
//! that accepts a superset of a later one hides it.

use tracing::warn;

use crate::codegen::signature::{shadowed_by, Candidate};
use crate::diagnostic::CompilerError;
use crate::ir::{Argument, Interface, Model};

/// An overload set must be all static or all instance operations.
pub fn validate_static_consistency(iface: &Interface) -> Result<(), CompilerError> {
    for (name, overloads) in iface.overload_sets() {
        let statics = overloads.iter().filter(|op| op.is_static()).count();
        if statics != 0 && statics != overloads.len() {
            return Err(CompilerError::MixedStaticOverload {
                interface: iface.name.clone(),
                operation: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Describes every overload that can never be selected.
pub fn unreachable_overloads(model: &Model, iface: &Interface) -> Vec<String> {
    let mut warnings = Vec::new();

    let ctors: Vec<&[Argument]> = iface
        .constructors()
        .into_iter()
        .map(|c| c.arguments.as_slice())
        .collect();
    check_set(model, &format!("{} constructor", iface.name), &ctors, &mut warnings);

    for (name, overloads) in iface.overload_sets() {
        let signatures: Vec<&[Argument]> = overloads.iter().map(|op| op.arguments.as_slice()).collect();
        check_set(model, &format!("{}.{}", iface.name, name), &signatures, &mut warnings);
    }

    warnings
}

fn check_set(model: &Model, display_name: &str, signatures: &[&[Argument]], warnings: &mut Vec<String>) {
    if signatures.len() < 2 {
        return;
    }
    let candidates: Vec<Candidate> = signatures
        .iter()
        .map(|args| Candidate::for_arguments(model, args))
        .collect();

    for index in 1..candidates.len() {
        if let Some(earlier) = shadowed_by(&candidates, index) {
            let message = format!(
                "{}{} is unreachable: {}{} accepts every call it accepts",
                display_name,
                describe(signatures[index]),
                display_name,
                describe(signatures[earlier])
            );
            warn!("{}", message);
            warnings.push(message);
        }
    }
}

fn describe(arguments: &[Argument]) -> String {
    let types: Vec<String> = arguments
        .iter()
        .map(|a| {
            if a.optional {
                format!("optional {}", a.idl_type)
            } else {
                a.idl_type.to_string()
            }
        })
        .collect();
    format!("({})", types.join(", "))
}
