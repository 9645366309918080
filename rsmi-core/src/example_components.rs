use crate::component::{Component, InputState, OutputState};
use crate::errors::{RSMIError, RSMIResult};
use crate::exchange_item::{ExchangeItemDefinition, TimeDependence};
use crate::quantity::{Dimension, Quantity, Unit};
use crate::spatial::ElementSet;
use crate::time::{Time, TimeSpan};
use crate::value_set::{FloatValue, ValueSet};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared record of what the test components did, in order.
pub(crate) type EventLog = Arc<Mutex<Vec<String>>>;

pub(crate) fn new_log() -> EventLog {
    Arc::new(Mutex::new(vec![]))
}

pub(crate) fn flow() -> Quantity {
    Quantity::scalar("Flow", Unit::si("m3/s", Dimension::FLOW))
}

// ============================================================================
// StepComponent - a fixed-step component with configurable inputs
// ============================================================================

/// Component with a fixed time step producing `rate * t + sum(inputs)` on every element
/// of its `Value` output.
///
/// Every update and finish is appended to the event log as `id@t` and `id finished`.
#[derive(Debug)]
pub(crate) struct StepComponent {
    id: String,
    start: Time,
    dt: Time,
    steps: usize,
    step: usize,
    rate: FloatValue,
    element_count: usize,
    inputs: Vec<(String, usize, TimeDependence)>,
    stall: bool,
    fail_at_step: Option<usize>,
    log: EventLog,
}

impl StepComponent {
    pub fn new(id: &str, dt: Time, steps: usize, log: &EventLog) -> Self {
        Self {
            id: id.to_string(),
            start: 0.0,
            dt,
            steps,
            step: 0,
            rate: 0.0,
            element_count: 1,
            inputs: vec![],
            stall: false,
            fail_at_step: None,
            log: log.clone(),
        }
    }

    pub fn with_rate(mut self, rate: FloatValue) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_elements(mut self, element_count: usize) -> Self {
        self.element_count = element_count;
        self
    }

    pub fn with_input(self, item: &str) -> Self {
        self.with_input_elements(item, 1, TimeDependence::Span)
    }

    pub fn with_input_elements(
        mut self,
        item: &str,
        element_count: usize,
        time_dependence: TimeDependence,
    ) -> Self {
        self.inputs
            .push((item.to_string(), element_count, time_dependence));
        self
    }

    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    pub fn failing_at(mut self, step: usize) -> Self {
        self.fail_at_step = Some(step);
        self
    }

    fn record(&self, event: String) {
        if let Ok(mut log) = self.log.lock() {
            log.push(event);
        }
    }

    fn produce(&self, input_total: FloatValue) -> OutputState {
        let value = self.rate * self.current_time() + input_total;
        HashMap::from([(
            "Value".to_string(),
            ValueSet::from_element_values(vec![value; self.element_count]),
        )])
    }
}

impl Component for StepComponent {
    fn id(&self) -> &str {
        &self.id
    }

    fn definitions(&self) -> Vec<ExchangeItemDefinition> {
        let mut definitions: Vec<ExchangeItemDefinition> = self
            .inputs
            .iter()
            .map(|(item, element_count, time_dependence)| {
                let elements: Vec<String> = (0..*element_count).map(|i| i.to_string()).collect();
                let elements: Vec<&str> = elements.iter().map(|e| e.as_str()).collect();
                ExchangeItemDefinition::input(item, flow(), ElementSet::id_based(item, &elements))
                    .with_time_dependence(*time_dependence)
            })
            .collect();
        let elements: Vec<String> = (0..self.element_count).map(|i| i.to_string()).collect();
        let elements: Vec<&str> = elements.iter().map(|e| e.as_str()).collect();
        definitions.push(ExchangeItemDefinition::output(
            "Value",
            flow(),
            ElementSet::id_based("Value", &elements),
        ));
        definitions
    }

    fn time_horizon(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.start + self.dt * self.steps as Time)
    }

    fn current_time(&self) -> Time {
        self.start + self.dt * self.step as Time
    }

    fn next_time(&self) -> Option<Time> {
        (self.step < self.steps).then(|| self.start + self.dt * (self.step + 1) as Time)
    }

    fn initialize(&mut self) -> RSMIResult<OutputState> {
        self.step = 0;
        Ok(self.produce(0.0))
    }

    fn update(&mut self, inputs: &InputState) -> RSMIResult<OutputState> {
        if self.fail_at_step == Some(self.step + 1) {
            return Err(RSMIError::Error(format!("{} blew up", self.id)));
        }
        let mut input_total = 0.0;
        for (item, _, _) in &self.inputs {
            input_total += inputs.get_scalar_or_zero(item, 0)?;
        }
        if !self.stall {
            self.step += 1;
        }
        self.record(format!("{}@{}", self.id, self.current_time()));
        Ok(self.produce(input_total))
    }

    fn finish(&mut self) -> RSMIResult<()> {
        self.record(format!("{} finished", self.id));
        Ok(())
    }
}

/// Everything recorded so far.
pub(crate) fn events(log: &EventLog) -> Vec<String> {
    log.lock().map(|log| log.clone()).unwrap_or_default()
}
