//! The contract between a simulation component and the composition runner.
use crate::errors::{RSMIError, RSMIResult};
use crate::exchange_item::{ExchangeItemDefinition, ItemRole};
use crate::time::{Time, TimeSpan};
use crate::value_set::{FloatValue, ValueSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Values produced by a component, keyed by output item id.
pub type OutputState = HashMap<String, ValueSet>;

/// Values the runner pulled for a component's inputs, keyed by input item id.
///
/// Inputs without a link are absent.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    values: HashMap<String, Arc<ValueSet>>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: &str, values: Arc<ValueSet>) {
        self.values.insert(item.to_string(), values);
    }

    pub fn get(&self, item: &str) -> Option<&Arc<ValueSet>> {
        self.values.get(item)
    }

    /// The first time step of an element of a scalar input.
    pub fn get_scalar(&self, item: &str, element_index: usize) -> RSMIResult<FloatValue> {
        self.get(item)
            .ok_or_else(|| RSMIError::MissingInput {
                item: item.to_string(),
            })?
            .get_scalar(0, element_index)
    }

    /// Like [`InputState::get_scalar`], defaulting to zero for unlinked inputs.
    pub fn get_scalar_or_zero(&self, item: &str, element_index: usize) -> RSMIResult<FloatValue> {
        match self.get(item) {
            Some(values) => values.get_scalar(0, element_index),
            None => Ok(0.0),
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.values.contains_key(item)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A model engine that can take part in a composition.
///
/// The runner drives a component by calling [`Component::update`] once per step.
/// Before each update every linked input has been resolved, which may have advanced
/// upstream components. A component owns its state exclusively.
pub trait Component: Debug + Send {
    /// Identifier, unique within a composition.
    fn id(&self) -> &str;

    /// The exchange items the component exposes.
    fn definitions(&self) -> Vec<ExchangeItemDefinition>;

    /// The period the component is able to simulate.
    fn time_horizon(&self) -> TimeSpan;

    /// The time the component's state currently represents.
    fn current_time(&self) -> Time;

    /// The time the next call to [`Component::update`] would advance to,
    /// `None` once the component cannot advance any further.
    fn next_time(&self) -> Option<Time>;

    /// Prepare for a run, returning the values of the outputs at the start time.
    ///
    /// Outputs that are not returned start as zero.
    fn initialize(&mut self) -> RSMIResult<OutputState>;

    /// Advance one step to [`Component::next_time`] using the resolved inputs.
    fn update(&mut self, inputs: &InputState) -> RSMIResult<OutputState>;

    /// Release resources once the run has ended for this component.
    ///
    /// Also called when the run is aborted, in which case errors are only logged.
    fn finish(&mut self) -> RSMIResult<()> {
        Ok(())
    }

    fn inputs(&self) -> Vec<ExchangeItemDefinition> {
        self.definitions()
            .into_iter()
            .filter(|definition| definition.role == ItemRole::Input)
            .collect()
    }

    fn outputs(&self) -> Vec<ExchangeItemDefinition> {
        self.definitions()
            .into_iter()
            .filter(|definition| definition.role == ItemRole::Output)
            .collect()
    }
}

/// Lifecycle of a component inside a composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentStatus {
    Created,
    Initialized,
    /// Advancing its own clock, or idle between steps.
    Running,
    /// The runner is resolving its input links.
    WaitingOnInputs,
    Finished,
    Failed,
}

impl ComponentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ComponentStatus::Finished | ComponentStatus::Failed)
    }

    pub fn can_transition_to(&self, next: ComponentStatus) -> bool {
        use ComponentStatus::*;
        match (self, next) {
            (Finished, _) | (Failed, _) => false,
            (_, Failed) => true,
            (Created, Initialized) => true,
            (Initialized, WaitingOnInputs) | (Initialized, Finished) => true,
            (Running, WaitingOnInputs) | (Running, Finished) => true,
            (WaitingOnInputs, Running) => true,
            _ => false,
        }
    }

    /// Move to `next`, failing if the lifecycle does not allow it.
    pub fn transition(&mut self, next: ComponentStatus, component: &str) -> RSMIResult<()> {
        if !self.can_transition_to(next) {
            return Err(RSMIError::InvalidStatusTransition {
                component: component.to_string(),
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut status = ComponentStatus::Created;
        status.transition(ComponentStatus::Initialized, "a").unwrap();
        status
            .transition(ComponentStatus::WaitingOnInputs, "a")
            .unwrap();
        status.transition(ComponentStatus::Running, "a").unwrap();
        status
            .transition(ComponentStatus::WaitingOnInputs, "a")
            .unwrap();
        status.transition(ComponentStatus::Running, "a").unwrap();
        status.transition(ComponentStatus::Finished, "a").unwrap();
        assert!(status.is_terminal());
    }

    #[test]
    fn terminal_states_are_final() {
        let mut status = ComponentStatus::Finished;
        let res = status.transition(ComponentStatus::Failed, "a");
        assert!(matches!(
            res,
            Err(RSMIError::InvalidStatusTransition {
                from: ComponentStatus::Finished,
                to: ComponentStatus::Failed,
                ..
            })
        ));
        let mut status = ComponentStatus::Created;
        assert!(status.transition(ComponentStatus::Running, "a").is_err());
        status.transition(ComponentStatus::Failed, "a").unwrap();
        assert!(!status.can_transition_to(ComponentStatus::Initialized));
    }

    #[test]
    fn missing_inputs() {
        let mut inputs = InputState::new();
        inputs.insert("Inflow", Arc::new(ValueSet::from_element_values(vec![2.0, 3.0])));
        assert_eq!(inputs.get_scalar("Inflow", 1).unwrap(), 3.0);
        assert!(matches!(
            inputs.get_scalar("Rainfall", 0),
            Err(RSMIError::MissingInput { .. })
        ));
        assert_eq!(inputs.get_scalar_or_zero("Rainfall", 0).unwrap(), 0.0);
        assert!(inputs.get_scalar("Inflow", 2).is_err());
    }
}
