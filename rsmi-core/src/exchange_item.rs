//! Exchange items, the named inputs and outputs components expose to each other.
use crate::quantity::{Quantity, Unit};
use crate::spatial::ElementSet;
use crate::value_set::ValueType;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemRole {
    Input,
    Output,
}

impl fmt::Display for ItemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRole::Input => write!(f, "input"),
            ItemRole::Output => write!(f, "output"),
        }
    }
}

/// How the values of an item relate to the time axis.
///
/// For inputs this decides what is asked of the provider:
/// `Span` items receive a value representative of the whole consumer step,
/// `Stamp` items the value at the end of the step and
/// `Independent` items whatever the provider last produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeDependence {
    #[default]
    Span,
    Stamp,
    Independent,
}

/// The declaration of an exchange item by a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeItemDefinition {
    pub id: String,
    pub role: ItemRole,
    pub quantity: Quantity,
    pub element_set: ElementSet,
    #[serde(default)]
    pub time_dependence: TimeDependence,
}

impl ExchangeItemDefinition {
    pub fn new(id: &str, role: ItemRole, quantity: Quantity, element_set: ElementSet) -> Self {
        Self {
            id: id.to_string(),
            role,
            quantity,
            element_set,
            time_dependence: TimeDependence::default(),
        }
    }

    pub fn input(id: &str, quantity: Quantity, element_set: ElementSet) -> Self {
        Self::new(id, ItemRole::Input, quantity, element_set)
    }

    pub fn output(id: &str, quantity: Quantity, element_set: ElementSet) -> Self {
        Self::new(id, ItemRole::Output, quantity, element_set)
    }

    pub fn with_time_dependence(mut self, time_dependence: TimeDependence) -> Self {
        self.time_dependence = time_dependence;
        self
    }

    pub fn element_count(&self) -> usize {
        self.element_set.element_count()
    }

    pub fn signature(&self) -> ItemSignature {
        ItemSignature {
            element_count: self.element_count(),
            value_type: self.quantity.value_type,
            unit: self.quantity.unit.clone(),
        }
    }
}

/// The shape of the values flowing through one point of a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSignature {
    pub element_count: usize,
    pub value_type: ValueType,
    pub unit: Unit,
}

impl fmt::Display for ItemSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} in {}",
            self.element_count, self.value_type, self.unit.caption
        )
    }
}

/// Identifies an exchange item within a composition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemRef {
    pub component: String,
    pub item: String,
}

impl ItemRef {
    pub fn new(component: &str, item: &str) -> Self {
        Self {
            component: component.to_string(),
            item: item.to_string(),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.component, self.item)
    }
}
