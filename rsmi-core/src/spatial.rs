//! Element sets describing where exchanged values apply.
//!
//! The position of an element in its set is the element index used by
//! [`ValueSet`](crate::value_set::ValueSet). Geometry is carried along for
//! components that need it but the runner only relies on the element count.
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    /// Elements identified only by their id, e.g. named nodes of a network.
    IdBased,
    Point,
    Polyline,
    Polygon,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::IdBased => "id-based",
            ElementType::Point => "point",
            ElementType::Polyline => "polyline",
            ElementType::Polygon => "polygon",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vertices: Vec<(f64, f64)>,
}

impl Element {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            vertices: vec![],
        }
    }

    pub fn with_vertices(id: &str, vertices: Vec<(f64, f64)>) -> Self {
        Self {
            id: id.to_string(),
            vertices,
        }
    }
}

/// An ordered set of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSet {
    pub id: String,
    pub element_type: ElementType,
    pub elements: Vec<Element>,
}

impl ElementSet {
    pub fn new(id: &str, element_type: ElementType, elements: Vec<Element>) -> Self {
        Self {
            id: id.to_string(),
            element_type,
            elements,
        }
    }

    /// An id-based set with one element per id.
    pub fn id_based(id: &str, element_ids: &[&str]) -> Self {
        Self::new(
            id,
            ElementType::IdBased,
            element_ids.iter().map(|element| Element::new(element)).collect(),
        )
    }

    /// A set with a single element sharing the set's id.
    pub fn single(id: &str) -> Self {
        Self::id_based(id, &[id])
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn element_index(&self, element_id: &str) -> Option<usize> {
        self.elements.iter().position(|element| element.id == element_id)
    }

    pub fn element_ids(&self) -> Vec<&str> {
        self.elements.iter().map(|element| element.id.as_str()).collect()
    }
}
