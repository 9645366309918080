//! Time-indexed storage of the values an output has produced.
//!
//! Each record holds the values a component produced when advancing over a span of
//! time, starting with the initial values which cover only the start time.
//! A value produced for `[start, end]` is the answer to any query for a time `t`
//! with `start < t <= end`.
use crate::errors::{RSMIError, RSMIResult};
use crate::exchange_item::ItemRef;
use crate::time::{Time, TimeQuery, TimeSpan};
use crate::value_set::{ValueSet, ValueType};
use ndarray::Array2;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
struct Record {
    span: TimeSpan,
    values: Arc<ValueSet>,
}

impl Record {
    fn answers(&self, time: Time) -> bool {
        (self.span.start < time && time <= self.span.end)
            || (self.span.is_instant() && self.span.start == time)
    }
}

#[derive(Debug, Clone)]
pub struct OutputBuffer {
    item: ItemRef,
    records: VecDeque<Record>,
}

impl OutputBuffer {
    pub fn new(item: ItemRef, start: Time, initial: ValueSet) -> Self {
        let mut records = VecDeque::new();
        records.push_back(Record {
            span: TimeSpan::instant(start),
            values: Arc::new(initial),
        });
        Self { item, records }
    }

    pub fn item(&self) -> &ItemRef {
        &self.item
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The last time for which values exist.
    pub fn latest_time(&self) -> Time {
        self.records.back().map(|r| r.span.end).unwrap_or(Time::NAN)
    }

    /// The earliest time that can still be queried.
    pub fn earliest_time(&self) -> Time {
        self.records.front().map(|r| r.span.start).unwrap_or(Time::NAN)
    }

    pub fn latest(&self) -> Option<Arc<ValueSet>> {
        self.records.back().map(|r| r.values.clone())
    }

    /// Append the values produced for `span`.
    pub fn push(&mut self, span: TimeSpan, values: ValueSet) {
        self.records.push_back(Record {
            span,
            values: Arc::new(values),
        });
    }

    /// Repeat the most recent values for `span`.
    pub fn carry_forward(&mut self, span: TimeSpan) {
        if let Some(values) = self.latest() {
            self.records.push_back(Record { span, values });
        }
    }

    /// Discard records that can no longer answer a query for `time` or later.
    ///
    /// The most recent record is always kept.
    pub fn clear_before(&mut self, time: Time) {
        let mut discarded = 0;
        while self.records.len() > 1 {
            match self.records.front() {
                Some(record) if record.span.end < time => {
                    self.records.pop_front();
                    discarded += 1;
                }
                _ => break,
            }
        }
        if discarded > 0 {
            debug!(item = %self.item, discarded, before = time, "Discarded buffered values");
        }
    }

    fn unavailable(&self, query: &TimeQuery, reason: String) -> RSMIError {
        RSMIError::UnavailableData {
            component: self.item.component.clone(),
            item: self.item.item.clone(),
            requested: *query,
            reason,
        }
    }

    /// Answer a query from the buffered records.
    ///
    /// An exactly matching record is returned without copying. Spans covering several
    /// records are averaged, weighting each record by its overlap with the span.
    pub fn get(&self, query: &TimeQuery) -> RSMIResult<Arc<ValueSet>> {
        match *query {
            TimeQuery::Latest => self
                .latest()
                .ok_or_else(|| self.unavailable(query, "nothing has been produced".to_string())),
            TimeQuery::At(time) => self.at(query, time),
            TimeQuery::Span { start, end } if start >= end => self.at(query, end),
            TimeQuery::Span { start, end } => self.span(query, TimeSpan::new(start, end)),
        }
    }

    fn check_range(&self, query: &TimeQuery, start: Time, end: Time) -> RSMIResult<()> {
        if end > self.latest_time() {
            return Err(self.unavailable(
                query,
                format!("values only exist up to t={}", self.latest_time()),
            ));
        }
        if start < self.earliest_time() {
            return Err(self.unavailable(
                query,
                format!("values before t={} have been discarded", self.earliest_time()),
            ));
        }
        Ok(())
    }

    fn at(&self, query: &TimeQuery, time: Time) -> RSMIResult<Arc<ValueSet>> {
        self.check_range(query, time, time)?;
        self.records
            .iter()
            .find(|record| record.answers(time))
            .map(|record| record.values.clone())
            .ok_or_else(|| {
                self.unavailable(
                    query,
                    format!("values before t={} have been discarded", self.earliest_time()),
                )
            })
    }

    fn span(&self, query: &TimeQuery, span: TimeSpan) -> RSMIResult<Arc<ValueSet>> {
        self.check_range(query, span.start, span.end)?;
        if let Some(record) = self.records.iter().find(|record| record.span == span) {
            return Ok(record.values.clone());
        }

        let overlapping: Vec<(&Record, Time)> = self
            .records
            .iter()
            .map(|record| (record, record.span.overlap(&span)))
            .filter(|(_, overlap)| *overlap > 0.0)
            .collect();
        let covered: Time = overlapping.iter().map(|(_, overlap)| overlap).sum();
        if overlapping.is_empty() || covered < span.duration() * (1.0 - 1e-12) {
            return Err(self.unavailable(
                query,
                "the buffered records do not cover the span".to_string(),
            ));
        }

        let shape = overlapping[0].0.values.shape();
        let mut average = Array2::zeros(shape);
        for (record, overlap) in overlapping {
            if record.values.value_type() != ValueType::Scalar {
                return Err(self.unavailable(
                    query,
                    format!(
                        "{} values cannot be averaged over a span",
                        record.values.value_type()
                    ),
                ));
            }
            if record.values.shape() != shape {
                return Err(self.unavailable(
                    query,
                    "records in the span have different shapes".to_string(),
                ));
            }
            average.scaled_add(overlap / span.duration(), record.values.scalars()?);
        }
        Ok(Arc::new(ValueSet::from_scalars(average)))
    }
}
