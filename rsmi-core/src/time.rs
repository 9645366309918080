//! Time stamps, spans and the queries a consumer sends to a provider.
use crate::exchange_item::ItemRef;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type Time = f64;

/// A closed interval of time.
///
/// A span with `start == end` represents a single time stamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: Time,
    pub end: Time,
}

impl TimeSpan {
    pub fn new(start: Time, end: Time) -> Self {
        Self { start, end }
    }

    pub fn instant(time: Time) -> Self {
        Self::new(time, time)
    }

    pub fn duration(&self) -> Time {
        self.end - self.start
    }

    pub fn is_instant(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, time: Time) -> bool {
        self.start <= time && time <= self.end
    }

    /// Length of the intersection between two spans, zero if they are disjoint.
    pub fn overlap(&self, other: &TimeSpan) -> Time {
        (self.end.min(other.end) - self.start.max(other.start)).max(0.0)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// The time a consumer asks an output for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimeQuery {
    /// The value valid at a single time stamp.
    At(Time),
    /// The value representative of a span, averaged over the provider's steps if needed.
    Span { start: Time, end: Time },
    /// Whatever the provider most recently produced.
    Latest,
}

impl TimeQuery {
    /// Time the provider has to reach before the query can be answered.
    pub fn required_time(&self) -> Option<Time> {
        match self {
            TimeQuery::At(time) => Some(*time),
            TimeQuery::Span { end, .. } => Some(*end),
            TimeQuery::Latest => None,
        }
    }

    /// Earliest time the query reads.
    pub fn earliest_time(&self) -> Option<Time> {
        match self {
            TimeQuery::At(time) => Some(*time),
            TimeQuery::Span { start, .. } => Some(*start),
            TimeQuery::Latest => None,
        }
    }
}

impl fmt::Display for TimeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeQuery::At(time) => write!(f, "t={}", time),
            TimeQuery::Span { start, end } => write!(f, "span [{}, {}]", start, end),
            TimeQuery::Latest => write!(f, "latest"),
        }
    }
}

/// A request from a consumer input for the values of a provider output.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequest {
    pub consumer: ItemRef,
    pub query: TimeQuery,
}

impl PullRequest {
    pub fn new(consumer: ItemRef, query: TimeQuery) -> Self {
        Self { consumer, query }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_of_spans() {
        let a = TimeSpan::new(0.0, 10.0);
        assert_eq!(a.overlap(&TimeSpan::new(5.0, 20.0)), 5.0);
        assert_eq!(a.overlap(&TimeSpan::new(10.0, 20.0)), 0.0);
        assert_eq!(a.overlap(&TimeSpan::new(15.0, 20.0)), 0.0);
        assert_eq!(a.overlap(&TimeSpan::new(2.0, 3.0)), 1.0);
    }

    #[test]
    fn query_times() {
        let span = TimeQuery::Span {
            start: 1.0,
            end: 3.0,
        };
        assert_eq!(span.required_time(), Some(3.0));
        assert_eq!(span.earliest_time(), Some(1.0));
        assert_eq!(TimeQuery::At(2.0).required_time(), Some(2.0));
        assert_eq!(TimeQuery::Latest.required_time(), None);
        assert_eq!(format!("{}", span), "span [1, 3]");
    }
}
