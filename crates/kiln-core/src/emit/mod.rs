//! Emission planning: the final, validated description of a build's output.

mod descriptor;
mod emitter;

pub use descriptor::{
    AssetDescriptor, AssetDisposition, DEFAULT_INLINE_THRESHOLD, EmissionPlan, EmissionSettings, Minimizer,
    PlannedModule, StaticCopy,
};
pub use emitter::{EmitOptions, emit};
