//! Quantities, units and physical dimensions of exchanged values.
//!
//! Units are described by how they convert to SI (`si = value * factor + offset`)
//! and by their dimension, the integer powers of the base quantities.
//! Links only accept units that are equivalent, a conversion between compatible
//! units has to be requested explicitly with a
//! [`UnitConversion`](crate::decorators::UnitConversion) stage.
use crate::errors::{RSMIError, RSMIResult};
use crate::value_set::ValueType;
use is_close::is_close;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Div, Mul};

/// Physical dimension as integer exponents of the base quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Dimension {
    #[serde(default)]
    pub length: i8,
    #[serde(default)]
    pub mass: i8,
    #[serde(default)]
    pub time: i8,
    #[serde(default)]
    pub current: i8,
    #[serde(default)]
    pub temperature: i8,
    #[serde(default)]
    pub amount: i8,
    #[serde(default)]
    pub luminosity: i8,
    #[serde(default)]
    pub currency: i8,
}

impl Dimension {
    pub const DIMENSIONLESS: Self = Self::new(0, 0, 0);
    pub const LENGTH: Self = Self::new(1, 0, 0);
    pub const MASS: Self = Self::new(0, 1, 0);
    pub const TIME: Self = Self::new(0, 0, 1);
    pub const AREA: Self = Self::new(2, 0, 0);
    pub const VOLUME: Self = Self::new(3, 0, 0);
    /// Volume per time (L³·T⁻¹), e.g. river discharge.
    pub const FLOW: Self = Self::new(3, 0, -1);

    /// A dimension in terms of length, mass and time.
    pub const fn new(length: i8, mass: i8, time: i8) -> Self {
        Self {
            length,
            mass,
            time,
            current: 0,
            temperature: 0,
            amount: 0,
            luminosity: 0,
            currency: 0,
        }
    }

    fn exponents(&self) -> [(i8, &'static str); 8] {
        [
            (self.length, "L"),
            (self.mass, "M"),
            (self.time, "T"),
            (self.current, "I"),
            (self.temperature, "Θ"),
            (self.amount, "N"),
            (self.luminosity, "J"),
            (self.currency, "C"),
        ]
    }

    fn combine(self, other: Self, op: fn(i8, i8) -> i8) -> Self {
        Self {
            length: op(self.length, other.length),
            mass: op(self.mass, other.mass),
            time: op(self.time, other.time),
            current: op(self.current, other.current),
            temperature: op(self.temperature, other.temperature),
            amount: op(self.amount, other.amount),
            luminosity: op(self.luminosity, other.luminosity),
            currency: op(self.currency, other.currency),
        }
    }
}

impl Mul for Dimension {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.combine(rhs, |a, b| a + b)
    }
}

impl Div for Dimension {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        self.combine(rhs, |a, b| a - b)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .exponents()
            .iter()
            .filter(|(power, _)| *power != 0)
            .map(|(power, symbol)| match power {
                1 => symbol.to_string(),
                _ => format!("{}^{}", symbol, power),
            })
            .collect();
        if parts.is_empty() {
            write!(f, "1")
        } else {
            write!(f, "{}", parts.join("·"))
        }
    }
}

/// A unit of measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub caption: String,
    pub conversion_factor_to_si: f64,
    #[serde(default)]
    pub offset_to_si: f64,
    pub dimension: Dimension,
}

impl Unit {
    /// A unit that is already expressed in SI.
    pub fn si(caption: &str, dimension: Dimension) -> Self {
        Self::new(caption, dimension, 1.0, 0.0)
    }

    pub fn new(caption: &str, dimension: Dimension, factor: f64, offset: f64) -> Self {
        Self {
            caption: caption.to_string(),
            conversion_factor_to_si: factor,
            offset_to_si: offset,
            dimension,
        }
    }

    pub fn dimensionless() -> Self {
        Self::si("-", Dimension::DIMENSIONLESS)
    }

    /// Whether a value in this unit can be converted into `other`.
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    /// Whether values in this unit can be used as `other` without conversion.
    pub fn is_equivalent(&self, other: &Unit) -> bool {
        self.is_compatible(other)
            && is_close!(self.conversion_factor_to_si, other.conversion_factor_to_si)
            && (self.offset_to_si == other.offset_to_si
                || is_close!(self.offset_to_si, other.offset_to_si))
    }

    pub fn to_si(&self, value: f64) -> f64 {
        value * self.conversion_factor_to_si + self.offset_to_si
    }

    pub fn from_si(&self, value: f64) -> f64 {
        (value - self.offset_to_si) / self.conversion_factor_to_si
    }

    /// Convert a value in this unit into `target`.
    pub fn convert(&self, value: f64, target: &Unit) -> RSMIResult<f64> {
        if !self.is_compatible(target) {
            return Err(RSMIError::IncompatibleUnits {
                link: String::new(),
                from_unit: self.to_string(),
                to_unit: target.to_string(),
            });
        }
        Ok(target.from_si(self.to_si(value)))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.caption, self.dimension)
    }
}

/// What an exchange item measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub caption: String,
    pub unit: Unit,
    pub value_type: ValueType,
}

impl Quantity {
    /// A quantity with scalar values.
    pub fn scalar(caption: &str, unit: Unit) -> Self {
        Self {
            caption: caption.to_string(),
            unit,
            value_type: ValueType::Scalar,
        }
    }

    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_algebra() {
        assert_eq!(Dimension::VOLUME / Dimension::TIME, Dimension::FLOW);
        assert_eq!(Dimension::LENGTH * Dimension::LENGTH, Dimension::AREA);
        assert_eq!(format!("{}", Dimension::FLOW), "L^3·T^-1");
        assert_eq!(format!("{}", Dimension::DIMENSIONLESS), "1");
    }

    #[test]
    fn conversion_through_si() {
        let celsius = Unit::new("degC", Dimension::default(), 1.0, 273.15);
        let kelvin = Unit::si("K", Dimension::default());
        let converted = celsius.convert(10.0, &kelvin).unwrap();
        assert!(is_close!(converted, 283.15));

        let litres_per_second = Unit::new("l/s", Dimension::FLOW, 1e-3, 0.0);
        let cumecs = Unit::si("m3/s", Dimension::FLOW);
        assert!(is_close!(litres_per_second.convert(2500.0, &cumecs).unwrap(), 2.5));
        assert!(litres_per_second.is_compatible(&cumecs));
        assert!(!litres_per_second.is_equivalent(&cumecs));
        assert!(cumecs.is_equivalent(&Unit::si("m^3/s", Dimension::FLOW)));
    }

    #[test]
    fn incompatible_dimensions() {
        let metre = Unit::si("m", Dimension::LENGTH);
        let second = Unit::si("s", Dimension::TIME);
        assert!(!metre.is_compatible(&second));
        assert!(matches!(
            metre.convert(1.0, &second),
            Err(RSMIError::IncompatibleUnits { .. })
        ));
    }
}
