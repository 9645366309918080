//! Validation functions for composition building.

use crate::component::OutputState;
use crate::errors::{RSMIError, RSMIResult};
use crate::exchange_item::{ExchangeItemDefinition, ItemRef, ItemRole};
use crate::link::LinkTiming;
use crate::value_set::ValueSet;
use petgraph::algo::tarjan_scc;
use std::collections::{HashMap, HashSet};

use super::types::{CGraph, ComponentSlot};

/// Checks that a component declares each exchange item only once.
pub(crate) fn verify_definitions(
    component: &str,
    definitions: &[ExchangeItemDefinition],
) -> RSMIResult<()> {
    let mut seen = HashSet::new();
    for definition in definitions {
        if !seen.insert(definition.id.as_str()) {
            return Err(RSMIError::DuplicateExchangeItem {
                component: component.to_string(),
                item: definition.id.clone(),
            });
        }
    }
    Ok(())
}

/// Finds the definition an end of a link refers to and checks its role.
pub(crate) fn resolve_endpoint<'a>(
    slots: &'a [ComponentSlot],
    index: &HashMap<String, usize>,
    item: &ItemRef,
    role: ItemRole,
    link: &str,
) -> RSMIResult<&'a ExchangeItemDefinition> {
    let slot = index
        .get(&item.component)
        .map(|&i| &slots[i])
        .ok_or_else(|| RSMIError::UnknownComponent(item.component.clone()))?;
    let definition = slot
        .definition(&item.item)
        .ok_or_else(|| RSMIError::UnknownExchangeItem {
            component: item.component.clone(),
            item: item.item.clone(),
        })?;
    if definition.role != role {
        return Err(RSMIError::LinkConfiguration {
            link: link.to_string(),
            reason: format!("{} is an {}, expected an {}", item, definition.role, role),
        });
    }
    Ok(definition)
}

/// Components that are part of a cycle of synchronous links.
///
/// Lagged links are ignored, so cycles closed by a lagged link are allowed.
/// The ids of the first offending cycle are returned in sorted order.
pub(crate) fn find_synchronous_cycle(graph: &CGraph) -> Option<Vec<String>> {
    let synchronous = graph.filter_map(
        |_, id| Some(id.clone()),
        |_, timing| (*timing == LinkTiming::Synchronous).then_some(()),
    );
    tarjan_scc(&synchronous)
        .into_iter()
        .find(|scc| scc.len() > 1 || synchronous.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut ids: Vec<String> = scc.iter().map(|&n| synchronous[n].clone()).collect();
            ids.sort();
            ids
        })
}

/// Builds the initial value of every output, checking what the component provided.
///
/// Outputs the component did not provide start as zero.
pub(crate) fn initial_output_values(
    component: &str,
    definitions: &[ExchangeItemDefinition],
    mut initial: OutputState,
) -> RSMIResult<Vec<(String, ValueSet)>> {
    if let Some(item) = initial
        .keys()
        .find(|item| !definitions.iter().any(|d| &d.id == *item && d.role == ItemRole::Output))
    {
        return Err(RSMIError::UnknownExchangeItem {
            component: component.to_string(),
            item: item.clone(),
        });
    }

    definitions
        .iter()
        .filter(|definition| definition.role == ItemRole::Output)
        .map(|definition| {
            let values = initial.remove(&definition.id).unwrap_or_else(|| {
                ValueSet::new(definition.quantity.value_type, 1, definition.element_count())
            });
            verify_output_shape(component, definition, &values)?;
            Ok((definition.id.clone(), values))
        })
        .collect()
}

/// Checks that values produced for an output match its declaration.
pub(crate) fn verify_output_shape(
    component: &str,
    definition: &ExchangeItemDefinition,
    values: &ValueSet,
) -> RSMIResult<()> {
    if values.value_type() != definition.quantity.value_type {
        return Err(RSMIError::ValueTypeMismatch {
            expected: definition.quantity.value_type,
            found: values.value_type(),
        });
    }
    if values.element_count() != definition.element_count() {
        return Err(RSMIError::ShapeMismatch {
            link: format!("{}/{}", component, definition.id),
            detail: format!(
                "{} elements produced but {} declared",
                values.element_count(),
                definition.element_count()
            ),
        });
    }
    Ok(())
}
