//! Validation of the canonical model.

mod overloads;

use tracing::debug;

use crate::diagnostic::CompilerError;
use crate::ir::Model;

/// Validates the whole model.
///
/// Returns the warnings found; errors abort generation.
pub fn validate_model(model: &Model) -> Result<Vec<String>, CompilerError> {
    let mut warnings = Vec::new();

    for iface in model.interfaces.values() {
        overloads::validate_static_consistency(iface)?;
        warnings.extend(overloads::unreachable_overloads(model, iface));
    }

    debug!(warnings = warnings.len(), "validated model");
    Ok(warnings)
}
