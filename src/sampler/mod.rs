//! @acp:module "Variable Sampler"
//! @acp:summary "Stateful non-repeating sampling for element variables and design options"
//! @acp:domain sampler
//! @acp:layer logic
//!
//! Both samplers are stateless themselves; repeat avoidance reads and
//! writes a [`SamplingHistory`] passed in by the caller.

pub mod design;
pub mod history;
pub mod parametric;

pub use design::{ColorChoice, DesignSampler, DesignSelection};
pub use history::{SamplingHistory, SamplingRecord};
pub use parametric::{
    fill_placeholders, unresolved_placeholders, ParametricSampler, RangePreference,
    SampledElement, SampledValue, StyleContext,
};
