//! Typed, two dimensional containers of exchanged values.
//!
//! A [`ValueSet`] is indexed first by time-step position and then by element position.
//! The element type is fixed when the set is created and every access is bounds checked,
//! an index outside of the set is always an error rather than being clamped.
use crate::errors::{RSMIError, RSMIResult};
use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type FloatValue = f64;

/// The closed set of element types a value set can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Scalar,
    Vector,
    Opaque,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Scalar => write!(f, "scalar"),
            ValueType::Vector => write!(f, "vector"),
            ValueType::Opaque => write!(f, "opaque"),
        }
    }
}

/// A single element of a value set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Scalar(FloatValue),
    Vector(Vec<FloatValue>),
    Opaque(Vec<u8>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Scalar(_) => ValueType::Scalar,
            Value::Vector(_) => ValueType::Vector,
            Value::Opaque(_) => ValueType::Opaque,
        }
    }

    pub fn as_scalar(&self) -> Option<FloatValue> {
        match self {
            Value::Scalar(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<FloatValue> for Value {
    fn from(value: FloatValue) -> Self {
        Value::Scalar(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Values {
    Scalar(Array2<FloatValue>),
    Vector(Array2<Vec<FloatValue>>),
    Opaque(Array2<Vec<u8>>),
}

fn resized<A: Clone + Default>(
    values: &Array2<A>,
    time_count: usize,
    element_count: usize,
) -> Array2<A> {
    let mut new = Array2::default((time_count, element_count));
    let rows = values.nrows().min(time_count);
    let cols = values.ncols().min(element_count);
    new.slice_mut(s![..rows, ..cols])
        .assign(&values.slice(s![..rows, ..cols]));
    new
}

/// Time by element container of values of a single [`ValueType`].
///
/// Time-independent sets always have a single time step and space-independent sets
/// always have a single element. The indexing contract is the same for both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSet {
    values: Values,
    time_independent: bool,
    space_independent: bool,
}

impl ValueSet {
    /// Create a set filled with the default value of `value_type`
    /// (zero for scalars, empty for vectors and opaque values).
    pub fn new(value_type: ValueType, time_count: usize, element_count: usize) -> Self {
        let shape = (time_count, element_count);
        let values = match value_type {
            ValueType::Scalar => Values::Scalar(Array2::zeros(shape)),
            ValueType::Vector => Values::Vector(Array2::default(shape)),
            ValueType::Opaque => Values::Opaque(Array2::default(shape)),
        };
        Self {
            values,
            time_independent: false,
            space_independent: false,
        }
    }

    /// A set with a single time step that cannot grow along the time axis.
    pub fn time_independent(value_type: ValueType, element_count: usize) -> Self {
        let mut set = Self::new(value_type, 1, element_count);
        set.time_independent = true;
        set
    }

    /// A set with a single element that cannot grow along the element axis.
    pub fn space_independent(value_type: ValueType, time_count: usize) -> Self {
        let mut set = Self::new(value_type, time_count, 1);
        set.space_independent = true;
        set
    }

    /// Scalar values with time along the first axis and elements along the second.
    pub fn from_scalars(values: Array2<FloatValue>) -> Self {
        Self {
            values: Values::Scalar(values),
            time_independent: false,
            space_independent: false,
        }
    }

    /// A single time step of scalar element values.
    pub fn from_element_values(values: Vec<FloatValue>) -> Self {
        Self::from_scalars(Array1::from(values).insert_axis(Axis(0)))
    }

    /// A single scalar value.
    pub fn scalar(value: FloatValue) -> Self {
        Self::from_element_values(vec![value])
    }

    pub fn value_type(&self) -> ValueType {
        match &self.values {
            Values::Scalar(_) => ValueType::Scalar,
            Values::Vector(_) => ValueType::Vector,
            Values::Opaque(_) => ValueType::Opaque,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        match &self.values {
            Values::Scalar(values) => values.dim(),
            Values::Vector(values) => values.dim(),
            Values::Opaque(values) => values.dim(),
        }
    }

    pub fn time_count(&self) -> usize {
        self.shape().0
    }

    pub fn element_count(&self) -> usize {
        self.shape().1
    }

    pub fn is_time_independent(&self) -> bool {
        self.time_independent
    }

    pub fn is_space_independent(&self) -> bool {
        self.space_independent
    }

    fn check_index(&self, time_index: usize, element_index: usize) -> RSMIResult<()> {
        let (time_count, element_count) = self.shape();
        if time_index >= time_count || element_index >= element_count {
            return Err(RSMIError::IndexOutOfRange {
                time_index,
                element_index,
                time_count,
                element_count,
            });
        }
        Ok(())
    }

    pub fn get(&self, time_index: usize, element_index: usize) -> RSMIResult<Value> {
        self.check_index(time_index, element_index)?;
        let index = [time_index, element_index];
        Ok(match &self.values {
            Values::Scalar(values) => Value::Scalar(values[index]),
            Values::Vector(values) => Value::Vector(values[index].clone()),
            Values::Opaque(values) => Value::Opaque(values[index].clone()),
        })
    }

    pub fn set(&mut self, time_index: usize, element_index: usize, value: Value) -> RSMIResult<()> {
        self.check_index(time_index, element_index)?;
        let expected = self.value_type();
        let index = [time_index, element_index];
        match (&mut self.values, value) {
            (Values::Scalar(values), Value::Scalar(value)) => values[index] = value,
            (Values::Vector(values), Value::Vector(value)) => values[index] = value,
            (Values::Opaque(values), Value::Opaque(value)) => values[index] = value,
            (_, value) => {
                return Err(RSMIError::ValueTypeMismatch {
                    expected,
                    found: value.value_type(),
                })
            }
        }
        Ok(())
    }

    pub fn get_scalar(&self, time_index: usize, element_index: usize) -> RSMIResult<FloatValue> {
        self.check_index(time_index, element_index)?;
        Ok(self.scalars()?[[time_index, element_index]])
    }

    pub fn set_scalar(
        &mut self,
        time_index: usize,
        element_index: usize,
        value: FloatValue,
    ) -> RSMIResult<()> {
        self.set(time_index, element_index, Value::Scalar(value))
    }

    /// All element values at a time step.
    pub fn element_values(&self, time_index: usize) -> RSMIResult<Vec<Value>> {
        self.check_time_index(time_index)?;
        (0..self.element_count())
            .map(|element_index| self.get(time_index, element_index))
            .collect()
    }

    /// All values of one element across the time steps.
    pub fn timeseries_for_element(&self, element_index: usize) -> RSMIResult<Vec<Value>> {
        if element_index >= self.element_count() {
            return Err(RSMIError::IndexOutOfRange {
                time_index: 0,
                element_index,
                time_count: self.time_count(),
                element_count: self.element_count(),
            });
        }
        (0..self.time_count())
            .map(|time_index| self.get(time_index, element_index))
            .collect()
    }

    fn check_time_index(&self, time_index: usize) -> RSMIResult<()> {
        if time_index >= self.time_count() {
            return Err(RSMIError::IndexOutOfRange {
                time_index,
                element_index: 0,
                time_count: self.time_count(),
                element_count: self.element_count(),
            });
        }
        Ok(())
    }

    /// Borrow the underlying scalar array.
    pub fn scalars(&self) -> RSMIResult<&Array2<FloatValue>> {
        match &self.values {
            Values::Scalar(values) => Ok(values),
            _ => Err(RSMIError::ValueTypeMismatch {
                expected: ValueType::Scalar,
                found: self.value_type(),
            }),
        }
    }

    /// A new set with `f` applied to every scalar value.
    pub fn map_scalars<F: Fn(FloatValue) -> FloatValue>(&self, f: F) -> RSMIResult<ValueSet> {
        let values = self.scalars()?.mapv(f);
        Ok(Self {
            values: Values::Scalar(values),
            time_independent: self.time_independent,
            space_independent: self.space_independent,
        })
    }

    /// A new set containing the given elements, in the given order.
    pub fn select_elements(&self, indices: &[usize]) -> RSMIResult<ValueSet> {
        if let Some(&element_index) = indices.iter().find(|&&i| i >= self.element_count()) {
            return Err(RSMIError::IndexOutOfRange {
                time_index: 0,
                element_index,
                time_count: self.time_count(),
                element_count: self.element_count(),
            });
        }
        let values = match &self.values {
            Values::Scalar(values) => Values::Scalar(values.select(Axis(1), indices)),
            Values::Vector(values) => Values::Vector(values.select(Axis(1), indices)),
            Values::Opaque(values) => Values::Opaque(values.select(Axis(1), indices)),
        };
        Ok(Self {
            values,
            time_independent: self.time_independent,
            space_independent: self.space_independent && indices.len() == 1,
        })
    }

    /// Change the shape of the set, keeping the values that still fit.
    ///
    /// Requires exclusive access, so a set that is shared with a consumer can never
    /// change shape underneath it.
    pub fn resize(&mut self, time_count: usize, element_count: usize) -> RSMIResult<()> {
        if self.time_independent && time_count != 1 {
            return Err(RSMIError::InvalidResize {
                reason: format!("time-independent set must keep 1 time step, not {}", time_count),
            });
        }
        if self.space_independent && element_count != 1 {
            return Err(RSMIError::InvalidResize {
                reason: format!(
                    "space-independent set must keep 1 element, not {}",
                    element_count
                ),
            });
        }
        self.values = match &self.values {
            Values::Scalar(values) => {
                Values::Scalar(resized(values, time_count, element_count))
            }
            Values::Vector(values) => {
                Values::Vector(resized(values, time_count, element_count))
            }
            Values::Opaque(values) => {
                Values::Opaque(resized(values, time_count, element_count))
            }
        };
        Ok(())
    }
}
