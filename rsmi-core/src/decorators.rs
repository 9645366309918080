//! Link stages shipped with the crate.
//!
//! All of them operate on scalar value sets and keep the time axis of the pulled set
//! unchanged, only the element axis or the values themselves are transformed.
use crate::decorator::{Accumulator, Decorator};
use crate::errors::{RSMIError, RSMIResult};
use crate::exchange_item::ItemSignature;
use crate::quantity::Unit;
use crate::time::{PullRequest, Time};
use crate::value_set::{FloatValue, ValueSet, ValueType};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

fn require_scalar(input: &ItemSignature) -> RSMIResult<()> {
    if input.value_type != ValueType::Scalar {
        return Err(RSMIError::ValueTypeMismatch {
            expected: ValueType::Scalar,
            found: input.value_type,
        });
    }
    Ok(())
}

/// Multiplies every value by a constant factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub factor: FloatValue,
}

impl Scale {
    pub fn new(factor: FloatValue) -> Self {
        Self { factor }
    }
}

#[typetag::serde]
impl Decorator for Scale {
    fn name(&self) -> String {
        format!("scale({})", self.factor)
    }

    fn adapt_signature(&self, input: &ItemSignature) -> RSMIResult<ItemSignature> {
        require_scalar(input)?;
        Ok(input.clone())
    }

    fn transform(&self, _request: &PullRequest, values: &ValueSet) -> RSMIResult<ValueSet> {
        values.map_scalars(|value| value * self.factor)
    }
}

/// Converts values between two compatible units via SI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConversion {
    pub from: Unit,
    pub to: Unit,
}

impl UnitConversion {
    pub fn new(from: Unit, to: Unit) -> Self {
        Self { from, to }
    }
}

#[typetag::serde]
impl Decorator for UnitConversion {
    fn name(&self) -> String {
        format!("convert({} -> {})", self.from.caption, self.to.caption)
    }

    fn adapt_signature(&self, input: &ItemSignature) -> RSMIResult<ItemSignature> {
        require_scalar(input)?;
        if !input.unit.is_equivalent(&self.from) || !self.from.is_compatible(&self.to) {
            return Err(RSMIError::IncompatibleUnits {
                link: self.name(),
                from_unit: input.unit.to_string(),
                to_unit: self.to.to_string(),
            });
        }
        Ok(ItemSignature {
            unit: self.to.clone(),
            ..input.clone()
        })
    }

    fn transform(&self, _request: &PullRequest, values: &ValueSet) -> RSMIResult<ValueSet> {
        values.map_scalars(|value| self.to.from_si(self.from.to_si(value)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AggregationMethod {
    Sum,
    Mean,
    /// Weighted sum with one weight per source element.
    Weighted(Vec<FloatValue>),
}

/// Reduces all source elements to a single element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialAggregate {
    pub method: AggregationMethod,
}

impl SpatialAggregate {
    pub fn sum() -> Self {
        Self {
            method: AggregationMethod::Sum,
        }
    }

    pub fn mean() -> Self {
        Self {
            method: AggregationMethod::Mean,
        }
    }

    pub fn weighted(weights: Vec<FloatValue>) -> Self {
        Self {
            method: AggregationMethod::Weighted(weights),
        }
    }
}

#[typetag::serde]
impl Decorator for SpatialAggregate {
    fn name(&self) -> String {
        match &self.method {
            AggregationMethod::Sum => "aggregate(sum)".to_string(),
            AggregationMethod::Mean => "aggregate(mean)".to_string(),
            AggregationMethod::Weighted(weights) => format!("aggregate(weighted {:?})", weights),
        }
    }

    fn adapt_signature(&self, input: &ItemSignature) -> RSMIResult<ItemSignature> {
        require_scalar(input)?;
        if input.element_count == 0 {
            return Err(RSMIError::Error(
                "cannot aggregate a set without elements".to_string(),
            ));
        }
        if let AggregationMethod::Weighted(weights) = &self.method {
            if weights.len() != input.element_count {
                return Err(RSMIError::Error(format!(
                    "{} weights given for {} elements",
                    weights.len(),
                    input.element_count
                )));
            }
        }
        Ok(ItemSignature {
            element_count: 1,
            ..input.clone()
        })
    }

    fn transform(&self, _request: &PullRequest, values: &ValueSet) -> RSMIResult<ValueSet> {
        let scalars = values.scalars()?;
        let aggregated = match &self.method {
            AggregationMethod::Sum => scalars.sum_axis(Axis(1)),
            AggregationMethod::Mean => scalars
                .mean_axis(Axis(1))
                .ok_or_else(|| RSMIError::Error("cannot average zero elements".to_string()))?,
            AggregationMethod::Weighted(weights) => {
                if weights.len() != scalars.ncols() {
                    return Err(RSMIError::Error(format!(
                        "{} weights given for {} elements",
                        weights.len(),
                        scalars.ncols()
                    )));
                }
                scalars.dot(&ndarray::Array1::from(weights.clone()))
            }
        };
        Ok(ValueSet::from_scalars(aggregated.insert_axis(Axis(1))))
    }
}

/// Picks source elements by index, in the given order.
///
/// Indices may repeat, which maps one source element onto several target elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSelection {
    pub indices: Vec<usize>,
}

impl ElementSelection {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }
}

#[typetag::serde]
impl Decorator for ElementSelection {
    fn name(&self) -> String {
        format!("select({:?})", self.indices)
    }

    fn adapt_signature(&self, input: &ItemSignature) -> RSMIResult<ItemSignature> {
        if let Some(&index) = self.indices.iter().find(|&&i| i >= input.element_count) {
            return Err(RSMIError::Error(format!(
                "element {} selected from a set of {} elements",
                index, input.element_count
            )));
        }
        Ok(ItemSignature {
            element_count: self.indices.len(),
            ..input.clone()
        })
    }

    fn transform(&self, _request: &PullRequest, values: &ValueSet) -> RSMIResult<ValueSet> {
        values.select_elements(&self.indices)
    }
}

/// Keeps a per-element running total of the pulled values.
///
/// Every distinct request time adds the pulled values once. Pulling again for a time
/// that was already added returns the totals without adding them a second time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningTotal {
    #[serde(default)]
    totals: Vec<FloatValue>,
    #[serde(default)]
    added_times: Vec<Time>,
}

impl RunningTotal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn totals(&self) -> &[FloatValue] {
        &self.totals
    }
}

#[typetag::serde]
impl Accumulator for RunningTotal {
    fn name(&self) -> String {
        "running_total".to_string()
    }

    fn accumulation_rule(&self) -> String {
        "adds the pulled values once per distinct request time and returns the totals"
            .to_string()
    }

    fn adapt_signature(&self, input: &ItemSignature) -> RSMIResult<ItemSignature> {
        require_scalar(input)?;
        Ok(input.clone())
    }

    fn accumulate(&mut self, request: &PullRequest, values: &ValueSet) -> RSMIResult<ValueSet> {
        let scalars = values.scalars()?;
        let (time_count, element_count) = scalars.dim();
        if self.totals.len() != element_count {
            self.totals = vec![0.0; element_count];
        }

        let request_time = request.query.required_time();
        let repeated = request_time.map_or(false, |time| self.added_times.contains(&time));

        let mut result = Array2::zeros((time_count, element_count));
        for (t, row) in scalars.outer_iter().enumerate() {
            for (e, value) in row.iter().enumerate() {
                if !repeated {
                    self.totals[e] += value;
                }
                result[[t, e]] = self.totals[e];
            }
        }
        if let (Some(time), false) = (request_time, repeated) {
            self.added_times.push(time);
        }
        Ok(ValueSet::from_scalars(result))
    }

    fn reset(&mut self) {
        self.totals.clear();
        self.added_times.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::Stage;
    use crate::exchange_item::ItemRef;
    use crate::quantity::Dimension;
    use crate::time::TimeQuery;
    use is_close::is_close;
    use ndarray::array;

    fn request(time: Time) -> PullRequest {
        PullRequest::new(ItemRef::new("consumer", "Inflow"), TimeQuery::At(time))
    }

    fn signature(element_count: usize) -> ItemSignature {
        ItemSignature {
            element_count,
            value_type: ValueType::Scalar,
            unit: Unit::si("m3/s", Dimension::FLOW),
        }
    }

    #[test]
    fn scale_is_pure() {
        let scale = Scale::new(2.0);
        let values = ValueSet::from_element_values(vec![1.0, 40.0]);
        let first = scale.transform(&request(1.0), &values).unwrap();
        let second = scale.transform(&request(1.0), &values).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.get_scalar(0, 1).unwrap(), 80.0);
        // The pulled set is left untouched
        assert_eq!(values.get_scalar(0, 1).unwrap(), 40.0);
    }

    #[test]
    fn scale_rejects_non_scalar_values() {
        let mut input = signature(1);
        input.value_type = ValueType::Opaque;
        assert!(matches!(
            Scale::new(2.0).adapt_signature(&input),
            Err(RSMIError::ValueTypeMismatch { .. })
        ));
    }

    #[test]
    fn unit_conversion() {
        let litres = Unit::new("l/s", Dimension::FLOW, 1e-3, 0.0);
        let cumecs = Unit::si("m3/s", Dimension::FLOW);
        let conversion = UnitConversion::new(cumecs.clone(), litres.clone());

        let adapted = conversion.adapt_signature(&signature(1)).unwrap();
        assert_eq!(adapted.unit, litres);

        let converted = conversion
            .transform(&request(0.0), &ValueSet::scalar(2.5))
            .unwrap();
        assert!(is_close!(converted.get_scalar(0, 0).unwrap(), 2500.0));

        let metres = Unit::si("m", Dimension::LENGTH);
        let invalid = UnitConversion::new(cumecs, metres);
        assert!(matches!(
            invalid.adapt_signature(&signature(1)),
            Err(RSMIError::IncompatibleUnits { .. })
        ));
    }

    #[test]
    fn spatial_aggregation() {
        let values = ValueSet::from_scalars(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);

        let sum = SpatialAggregate::sum();
        assert_eq!(sum.adapt_signature(&signature(3)).unwrap().element_count, 1);
        let summed = sum.transform(&request(0.0), &values).unwrap();
        assert_eq!(summed.scalars().unwrap(), &array![[6.0], [15.0]]);

        let mean = SpatialAggregate::mean()
            .transform(&request(0.0), &values)
            .unwrap();
        assert_eq!(mean.scalars().unwrap(), &array![[2.0], [5.0]]);

        let weighted = SpatialAggregate::weighted(vec![0.5, 0.5, 0.0]);
        let result = weighted.transform(&request(0.0), &values).unwrap();
        assert_eq!(result.scalars().unwrap(), &array![[1.5], [4.5]]);
        assert!(weighted.adapt_signature(&signature(2)).is_err());
    }

    #[test]
    fn element_selection() {
        let selection = ElementSelection::new(vec![2, 0]);
        assert_eq!(
            selection.adapt_signature(&signature(3)).unwrap().element_count,
            2
        );
        assert!(selection.adapt_signature(&signature(2)).is_err());
        let selected = selection
            .transform(
                &request(0.0),
                &ValueSet::from_element_values(vec![1.0, 2.0, 3.0]),
            )
            .unwrap();
        assert_eq!(selected.scalars().unwrap(), &array![[3.0, 1.0]]);
    }

    #[test]
    fn running_total_adds_each_time_once() {
        let mut total = RunningTotal::new();
        let values = ValueSet::from_element_values(vec![1.0, 10.0]);

        total.accumulate(&request(1.0), &values).unwrap();
        let repeated = total.accumulate(&request(1.0), &values).unwrap();
        assert_eq!(repeated.scalars().unwrap(), &array![[1.0, 10.0]]);

        let next = total.accumulate(&request(2.0), &values).unwrap();
        assert_eq!(next.scalars().unwrap(), &array![[2.0, 20.0]]);
        assert_eq!(total.totals(), &[2.0, 20.0]);

        let earlier = total.accumulate(&request(1.0), &values).unwrap();
        assert_eq!(earlier.scalars().unwrap(), &array![[2.0, 20.0]]);
        assert_eq!(total.totals(), &[2.0, 20.0]);

        total.reset();
        assert!(total.totals().is_empty());
    }

    #[test]
    fn stages_serialise() {
        let stages = vec![
            Stage::Pure(Box::new(Scale::new(2.0))),
            Stage::Pure(Box::new(ElementSelection::new(vec![0]))),
            Stage::Accumulating(Box::new(RunningTotal::new())),
        ];
        let serialised = serde_json::to_string(&stages).unwrap();
        let deserialised: Vec<Stage> = serde_json::from_str(&serialised).unwrap();

        assert_eq!(deserialised.len(), 3);
        assert_eq!(deserialised[0].name(), "scale(2)");
        assert_eq!(deserialised[1].name(), "select([0])");
        assert!(deserialised[2].is_stateful());
    }
}
