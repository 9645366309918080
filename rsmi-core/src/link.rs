//! Directed bindings from a provider output to a consumer input.
use crate::decorator::{Accumulator, Decorator, Stage};
use crate::errors::{RSMIError, RSMIResult};
use crate::exchange_item::{ItemRef, ItemSignature};
use crate::time::PullRequest;
use crate::value_set::ValueSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// When the consumer reads the provider's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LinkTiming {
    /// The consumer needs the provider's values for the consumer's current step.
    #[default]
    Synchronous,
    /// The consumer reads the provider's values at the start of its step.
    ///
    /// Lagged links are the only way to close a cycle in a composition.
    Lagged,
}

impl fmt::Display for LinkTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkTiming::Synchronous => write!(f, "synchronous"),
            LinkTiming::Lagged => write!(f, "lagged"),
        }
    }
}

/// `source output -> [stage]* -> target input`
///
/// Stages are applied in declaration order, each one receiving the output of the
/// previous stage.
#[derive(Debug, Serialize, Deserialize)]
pub struct Link {
    pub source: ItemRef,
    pub target: ItemRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    stages: Vec<Stage>,
    #[serde(default)]
    timing: LinkTiming,
    /// Output signature of each stage, filled in by [`Link::validate`].
    #[serde(skip)]
    signatures: Vec<ItemSignature>,
}

impl Link {
    pub fn new(source: ItemRef, target: ItemRef) -> Self {
        Self {
            source,
            target,
            stages: vec![],
            timing: LinkTiming::default(),
            signatures: vec![],
        }
    }

    /// Link `source_component/source_item` to `target_component/target_item`.
    pub fn between(
        source_component: &str,
        source_item: &str,
        target_component: &str,
        target_item: &str,
    ) -> Self {
        Self::new(
            ItemRef::new(source_component, source_item),
            ItemRef::new(target_component, target_item),
        )
    }

    pub fn with_decorator<D: Decorator + 'static>(self, decorator: D) -> Self {
        self.with_stage(Stage::Pure(Box::new(decorator)))
    }

    pub fn with_accumulator<A: Accumulator + 'static>(self, accumulator: A) -> Self {
        self.with_stage(Stage::Accumulating(Box::new(accumulator)))
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self.signatures.clear();
        self
    }

    pub fn lagged(mut self) -> Self {
        self.timing = LinkTiming::Lagged;
        self
    }

    pub fn timing(&self) -> LinkTiming {
        self.timing
    }

    pub fn is_lagged(&self) -> bool {
        self.timing == LinkTiming::Lagged
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn describe(&self) -> String {
        let mut parts = vec![self.source.to_string()];
        parts.extend(self.stages.iter().map(|stage| stage.name()));
        parts.push(self.target.to_string());
        let description = parts.join(" -> ");
        match self.timing {
            LinkTiming::Synchronous => description,
            LinkTiming::Lagged => format!("{} (lagged)", description),
        }
    }

    /// Check that values with the `source` signature reach the target as `target`.
    ///
    /// Every stage has to accept what the previous stage produces. After the last
    /// stage the element count, value type and unit must agree with the target.
    pub fn validate(&mut self, source: &ItemSignature, target: &ItemSignature) -> RSMIResult<()> {
        let mut signatures = Vec::with_capacity(self.stages.len());
        let mut current = source.clone();
        for stage in &self.stages {
            let next = stage.adapt_signature(&current).map_err(|e| match e {
                RSMIError::IncompatibleUnits {
                    from_unit, to_unit, ..
                } => RSMIError::IncompatibleUnits {
                    link: self.describe(),
                    from_unit,
                    to_unit,
                },
                other => RSMIError::LinkConfiguration {
                    link: self.describe(),
                    reason: format!("{} cannot accept {}: {}", stage.name(), current, other),
                },
            })?;
            signatures.push(next.clone());
            current = next;
        }

        if current.value_type != target.value_type {
            return Err(RSMIError::LinkConfiguration {
                link: self.describe(),
                reason: format!(
                    "{} values arrive but the target expects {} values",
                    current.value_type, target.value_type
                ),
            });
        }
        if current.element_count != target.element_count {
            return Err(RSMIError::ShapeMismatch {
                link: self.describe(),
                detail: format!(
                    "{} elements arrive but the target expects {}",
                    current.element_count, target.element_count
                ),
            });
        }
        if !current.unit.is_equivalent(&target.unit) {
            return Err(RSMIError::IncompatibleUnits {
                link: self.describe(),
                from_unit: current.unit.to_string(),
                to_unit: target.unit.to_string(),
            });
        }
        self.signatures = signatures;
        Ok(())
    }

    /// Run pulled values through the stages.
    ///
    /// Without stages the pulled set is handed on as is, otherwise each stage
    /// produces a new set.
    pub fn transform(
        &mut self,
        request: &PullRequest,
        values: Arc<ValueSet>,
    ) -> RSMIResult<Arc<ValueSet>> {
        let mut current = values;
        for index in 0..self.stages.len() {
            let next = self.stages[index].apply(request, &current)?;
            if let Some(detail) = self.shape_violation(index, &current, &next) {
                return Err(RSMIError::ShapeMismatch {
                    link: self.describe(),
                    detail,
                });
            }
            current = Arc::new(next);
        }
        Ok(current)
    }

    fn shape_violation(&self, index: usize, input: &ValueSet, output: &ValueSet) -> Option<String> {
        let name = self.stages[index].name();
        if output.time_count() != input.time_count() {
            return Some(format!(
                "{} returned {} time steps from {}",
                name,
                output.time_count(),
                input.time_count()
            ));
        }
        let expected = self.signatures.get(index)?;
        if output.element_count() != expected.element_count {
            return Some(format!(
                "{} returned {} elements but declared {}",
                name,
                output.element_count(),
                expected.element_count
            ));
        }
        if output.value_type() != expected.value_type {
            return Some(format!(
                "{} returned {} values but declared {}",
                name,
                output.value_type(),
                expected.value_type
            ));
        }
        None
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
