//! Stages that can be interposed on a link.
//!
//! A [`Decorator`] is a pure transform: given the same request and values it always
//! produces the same result and it keeps no state between pulls.
//! Anything that needs to remember earlier pulls is an [`Accumulator`], which has to
//! describe how it accumulates.
//!
//! Both traits are serialisable trait objects so that a link chain can be stored as part
//! of a run description.
use crate::errors::RSMIResult;
use crate::exchange_item::ItemSignature;
use crate::time::PullRequest;
use crate::value_set::ValueSet;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[typetag::serde(tag = "type")]
pub trait Decorator: Debug + Send + Sync {
    /// Short description used in link descriptions and diagnostics.
    fn name(&self) -> String;

    /// The signature of the values this decorator produces from values of `input`.
    ///
    /// Returns an error if the decorator cannot accept `input`.
    fn adapt_signature(&self, input: &ItemSignature) -> RSMIResult<ItemSignature>;

    fn transform(&self, request: &PullRequest, values: &ValueSet) -> RSMIResult<ValueSet>;
}

#[typetag::serde(tag = "type")]
pub trait Accumulator: Debug + Send + Sync {
    fn name(&self) -> String;

    /// Human readable statement of what the accumulator remembers between pulls.
    fn accumulation_rule(&self) -> String;

    fn adapt_signature(&self, input: &ItemSignature) -> RSMIResult<ItemSignature>;

    fn accumulate(&mut self, request: &PullRequest, values: &ValueSet) -> RSMIResult<ValueSet>;

    /// Forget everything accumulated so far.
    fn reset(&mut self);
}

/// One step of a link chain.
#[derive(Debug, Serialize, Deserialize)]
pub enum Stage {
    Pure(Box<dyn Decorator>),
    Accumulating(Box<dyn Accumulator>),
}

impl Stage {
    pub fn name(&self) -> String {
        match self {
            Stage::Pure(decorator) => decorator.name(),
            Stage::Accumulating(accumulator) => accumulator.name(),
        }
    }

    pub fn is_stateful(&self) -> bool {
        matches!(self, Stage::Accumulating(_))
    }

    pub fn adapt_signature(&self, input: &ItemSignature) -> RSMIResult<ItemSignature> {
        match self {
            Stage::Pure(decorator) => decorator.adapt_signature(input),
            Stage::Accumulating(accumulator) => accumulator.adapt_signature(input),
        }
    }

    pub fn apply(&mut self, request: &PullRequest, values: &ValueSet) -> RSMIResult<ValueSet> {
        match self {
            Stage::Pure(decorator) => decorator.transform(request, values),
            Stage::Accumulating(accumulator) => accumulator.accumulate(request, values),
        }
    }
}
