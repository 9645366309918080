//! Recorder component
//!
//! Pulls values from linked outputs at fixed times and writes them to a result sink,
//! one record per step.

use rsmi_core::component::{Component, InputState, OutputState};
use rsmi_core::errors::RSMIResult;
use rsmi_core::exchange_item::{ExchangeItemDefinition, TimeDependence};
use rsmi_core::quantity::Quantity;
use rsmi_core::results::ResultSink;
use rsmi_core::spatial::ElementSet;
use rsmi_core::time::{Time, TimeSpan};
use rsmi_core::value_set::FloatValue;
use tracing::debug;

/// A single recorded column, read from the first element of an input.
#[derive(Debug, Clone)]
struct Column {
    item: String,
    quantity: Quantity,
}

/// Writes `time` followed by one column per input at the end of every step.
///
/// Inputs are read at the step's end time rather than averaged over the step, so the
/// records show the instantaneous values of the linked outputs. Every column must be
/// linked.
#[derive(Debug)]
pub struct Recorder {
    id: String,
    start: Time,
    dt: Time,
    steps: usize,
    step: usize,
    columns: Vec<Column>,
    sink: Box<dyn ResultSink>,
}

impl Recorder {
    pub fn new(id: &str, start: Time, dt: Time, steps: usize, sink: Box<dyn ResultSink>) -> Self {
        Self {
            id: id.to_string(),
            start,
            dt,
            steps,
            step: 0,
            columns: vec![],
            sink,
        }
    }

    /// Record an input named `item`. Columns are written in the order they are added.
    pub fn with_column(mut self, item: &str, quantity: Quantity) -> Self {
        self.columns.push(Column {
            item: item.to_string(),
            quantity,
        });
        self
    }

    fn record(&mut self, inputs: &InputState) -> RSMIResult<()> {
        let mut record: Vec<FloatValue> = Vec::with_capacity(self.columns.len() + 1);
        record.push(self.current_time());
        for column in &self.columns {
            record.push(inputs.get_scalar(&column.item, 0)?);
        }
        self.sink.write_record(&record)
    }
}

impl Component for Recorder {
    fn id(&self) -> &str {
        &self.id
    }

    fn definitions(&self) -> Vec<ExchangeItemDefinition> {
        self.columns
            .iter()
            .map(|column| {
                ExchangeItemDefinition::input(
                    &column.item,
                    column.quantity.clone(),
                    ElementSet::single(&column.item),
                )
                .with_time_dependence(TimeDependence::Stamp)
            })
            .collect()
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
        let mut header = vec!["time"];
        header.extend(self.columns.iter().map(|column| column.item.as_str()));
        self.sink.write_header(&header)?;
        Ok(OutputState::new())
    }

    fn update(&mut self, inputs: &InputState) -> RSMIResult<OutputState> {
        self.step += 1;
        self.record(inputs)?;
        debug!(component = %self.id, time = self.current_time(), "Recorded values");
        Ok(OutputState::new())
    }

    fn finish(&mut self) -> RSMIResult<()> {
        self.sink.flush()
    }
}
