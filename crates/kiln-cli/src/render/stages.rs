//! Stage implementations that ship with the CLI.
//!
//! Real compilers and minifiers are external; everything not registered here
//! passes through unchanged.

use kiln_core::rules::stages;
use kiln_core::{StageContext, StageError, StageRegistry};

/// Registry with the built-in stages.
pub fn builtin_registry() -> StageRegistry {
    let mut registry = StageRegistry::new();
    registry.register(stages::JSON, json_module);
    registry
}

/// Turn a JSON document into a CommonJS module, rejecting invalid JSON.
fn json_module(ctx: &StageContext<'_>, source: Vec<u8>) -> Result<Vec<u8>, StageError> {
    let value: serde_json::Value = serde_json::from_slice(&source)
        .map_err(|e| StageError::new(format!("invalid JSON in {}: {e}", ctx.path.display())))?;
    Ok(format!("module.exports = {value};").into_bytes())
}
