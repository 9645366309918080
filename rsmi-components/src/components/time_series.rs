//! Boundary time series component
//!
//! Provides prescribed values for a single output, stepping through a fixed list of
//! times. Useful as a boundary condition for another component or in place of an
//! upstream model.

use ndarray::Array2;
use rsmi_core::component::{Component, InputState, OutputState};
use rsmi_core::errors::{RSMIError, RSMIResult};
use rsmi_core::exchange_item::ExchangeItemDefinition;
use rsmi_core::quantity::Quantity;
use rsmi_core::spatial::ElementSet;
use rsmi_core::time::{Time, TimeSpan};
use rsmi_core::value_set::{FloatValue, ValueSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Piecewise constant values for one output.
///
/// Row `i` of `values` holds the value of every element over `(times[i - 1], times[i]]`,
/// and row 0 is the initial value at `times[0]`. The component advances from one time
/// to the next on each update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesComponent {
    id: String,
    item: String,
    quantity: Quantity,
    element_set: ElementSet,
    times: Vec<Time>,
    values: Array2<FloatValue>,
    #[serde(default)]
    step: usize,
}

impl TimeSeriesComponent {
    pub fn new(
        id: &str,
        item: &str,
        quantity: Quantity,
        element_set: ElementSet,
        times: Vec<Time>,
        values: Array2<FloatValue>,
    ) -> RSMIResult<Self> {
        let component = Self {
            id: id.to_string(),
            item: item.to_string(),
            quantity,
            element_set,
            times,
            values,
            step: 0,
        };
        component.validate()?;
        Ok(component)
    }

    /// The same value on every element at every time.
    pub fn constant(
        id: &str,
        item: &str,
        quantity: Quantity,
        element_set: ElementSet,
        times: Vec<Time>,
        value: FloatValue,
    ) -> RSMIResult<Self> {
        let shape = (times.len(), element_set.element_count());
        Self::new(
            id,
            item,
            quantity,
            element_set,
            times,
            Array2::from_elem(shape, value),
        )
    }

    fn validate(&self) -> RSMIResult<()> {
        if self.times.len() < 2 {
            return Err(RSMIError::Error(format!(
                "time series {} needs at least two times",
                self.id
            )));
        }
        if self
            .times
            .windows(2)
            .any(|pair| pair[1].partial_cmp(&pair[0]) != Some(Ordering::Greater))
        {
            return Err(RSMIError::Error(format!(
                "times of time series {} must be strictly increasing",
                self.id
            )));
        }
        let expected = (self.times.len(), self.element_set.element_count());
        if self.values.dim() != expected {
            return Err(RSMIError::Error(format!(
                "time series {} has values of shape {:?}, expected {:?}",
                self.id,
                self.values.dim(),
                expected
            )));
        }
        Ok(())
    }

    /// Value of an element for a time, using the same rule as the output.
    pub fn value_at(&self, time: Time, element_index: usize) -> Option<FloatValue> {
        let row = self
            .times
            .iter()
            .position(|&t| time <= t)
            .unwrap_or(self.times.len().saturating_sub(1));
        self.values.get((row, element_index)).copied()
    }

    fn produce(&self) -> OutputState {
        let row = self.values.row(self.step).to_vec();
        HashMap::from([(self.item.clone(), ValueSet::from_element_values(row))])
    }
}

impl Component for TimeSeriesComponent {
    fn id(&self) -> &str {
        &self.id
    }

    fn definitions(&self) -> Vec<ExchangeItemDefinition> {
        vec![ExchangeItemDefinition::output(
            &self.item,
            self.quantity.clone(),
            self.element_set.clone(),
        )]
    }

    fn time_horizon(&self) -> TimeSpan {
        let start = self.times.first().copied().unwrap_or_default();
        let end = self.times.last().copied().unwrap_or(start);
        TimeSpan::new(start, end)
    }

    fn current_time(&self) -> Time {
        self.times.get(self.step).copied().unwrap_or(Time::NAN)
    }

    fn next_time(&self) -> Option<Time> {
        self.times.get(self.step + 1).copied()
    }

    fn initialize(&mut self) -> RSMIResult<OutputState> {
        self.validate()?;
        self.step = 0;
        Ok(self.produce())
    }

    fn update(&mut self, _inputs: &InputState) -> RSMIResult<OutputState> {
        if self.step + 1 >= self.times.len() {
            return Err(RSMIError::Error(format!(
                "time series {} has no values after t={}",
                self.id,
                self.current_time()
            )));
        }
        self.step += 1;
        Ok(self.produce())
    }
}
