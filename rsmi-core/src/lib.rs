//! Core types for linking independently developed simulation components.
//!
//! Components expose named exchange items and hold their values in [`value_set::ValueSet`]s.
//! Links connect provider outputs to consumer inputs, optionally through decorator stages,
//! and a [`composition::Composition`] drives the linked components to a joint solution by
//! pulling values on demand.

pub mod buffer;
pub mod component;
pub mod composition;
pub mod config;
pub mod decorator;
pub mod decorators;
pub mod exchange_item;
pub mod link;
pub mod quantity;
pub mod results;
pub mod spatial;
pub mod time;
pub mod value_set;

pub mod errors;

#[cfg(test)]
mod example_components;
