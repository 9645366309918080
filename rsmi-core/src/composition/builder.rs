//! Composition builder for linking components into a runnable composition.

use crate::buffer::OutputBuffer;
use crate::component::{Component, ComponentStatus, InputState};
use crate::config::RunSettings;
use crate::errors::{RSMIError, RSMIResult};
use crate::exchange_item::{ItemRef, ItemRole};
use crate::link::Link;
use std::collections::HashMap;
use tracing::{debug, info};

use super::runtime::Composition;
use super::types::{CGraph, ComponentSlot};
use super::validation::{
    find_synchronous_cycle, initial_output_values, resolve_endpoint, verify_definitions,
};

/// Build a composition from a set of components and the links between them.
///
/// Building validates every link, rejects cycles of synchronous links and
/// initialises each component, after which the composition is ready to run.
pub struct CompositionBuilder {
    components: Vec<Box<dyn Component>>,
    links: Vec<Link>,
    settings: RunSettings,
}

impl Default for CompositionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositionBuilder {
    pub fn new() -> Self {
        Self {
            components: vec![],
            links: vec![],
            settings: RunSettings::default(),
        }
    }

    /// Register a component with the builder.
    pub fn with_component<T: Component + 'static>(&mut self, component: T) -> &mut Self {
        self.components.push(Box::new(component));
        self
    }

    /// Register an already boxed component.
    pub fn with_boxed_component(&mut self, component: Box<dyn Component>) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Add a link. Input links of a component are resolved in the order they are added.
    pub fn with_link(&mut self, link: Link) -> &mut Self {
        self.links.push(link);
        self
    }

    pub fn with_settings(&mut self, settings: RunSettings) -> &mut Self {
        self.settings = settings;
        self
    }

    /// Validate the composition and initialise its components.
    ///
    /// The registered components and links are moved into the composition.
    pub fn build(&mut self) -> RSMIResult<Composition> {
        let components = std::mem::take(&mut self.components);
        let mut links = std::mem::take(&mut self.links);

        let mut slots: Vec<ComponentSlot> = Vec::with_capacity(components.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        for component in components {
            let id = component.id().to_string();
            if index.contains_key(&id) {
                return Err(RSMIError::DuplicateComponent(id));
            }
            let definitions = component.definitions();
            verify_definitions(&id, &definitions)?;
            let horizon_end = component.time_horizon().end;
            let end_time = match self.settings.end_time {
                Some(end_time) => end_time.min(horizon_end),
                None => horizon_end,
            };
            index.insert(id, slots.len());
            slots.push(ComponentSlot {
                component,
                status: ComponentStatus::Created,
                definitions,
                inputs: InputState::new(),
                input_links: vec![],
                end_time,
            });
        }

        let mut graph = CGraph::new();
        let nodes: Vec<_> = slots
            .iter()
            .map(|slot| graph.add_node(slot.id().to_string()))
            .collect();

        let mut providers: HashMap<ItemRef, ItemRef> = HashMap::new();
        let mut drive_order: Vec<usize> = vec![];
        for (link_index, link) in links.iter_mut().enumerate() {
            let description = link.describe();
            let source =
                resolve_endpoint(&slots, &index, &link.source, ItemRole::Output, &description)?;
            let source = source.signature();
            let target =
                resolve_endpoint(&slots, &index, &link.target, ItemRole::Input, &description)?;
            let target = target.signature();
            if let Some(existing) = providers.get(&link.target) {
                return Err(RSMIError::DuplicateProvider {
                    input: link.target.to_string(),
                    existing: existing.to_string(),
                    provider: link.source.to_string(),
                });
            }
            link.validate(&source, &target)?;
            debug!(link = %description, "Validated link");

            let source_index = index[&link.source.component];
            let target_index = index[&link.target.component];
            providers.insert(link.target.clone(), link.source.clone());
            slots[target_index].input_links.push(link_index);
            graph.add_edge(nodes[source_index], nodes[target_index], link.timing());
            for component in [source_index, target_index] {
                if !drive_order.contains(&component) {
                    drive_order.push(component);
                }
            }
        }
        for component in 0..slots.len() {
            if !drive_order.contains(&component) {
                drive_order.push(component);
            }
        }

        if let Some(components) = find_synchronous_cycle(&graph) {
            return Err(RSMIError::SynchronousCycle { components });
        }

        let mut buffers = HashMap::new();
        for slot in slots.iter_mut() {
            let id = slot.id().to_string();
            let initial = slot
                .component
                .initialize()
                .map_err(|e| RSMIError::ComponentFailure {
                    component: id.clone(),
                    time: slot.component.time_horizon().start,
                    cause: Box::new(e),
                })?;
            let start = slot.component.current_time();
            for (item, values) in initial_output_values(&id, &slot.definitions, initial)? {
                let item = ItemRef::new(&id, &item);
                buffers.insert(item.clone(), OutputBuffer::new(item, start, values));
            }
            slot.status.transition(ComponentStatus::Initialized, &id)?;
        }

        info!(
            components = slots.len(),
            links = links.len(),
            "Built composition"
        );
        Ok(Composition::new(
            slots,
            index,
            links,
            buffers,
            drive_order,
            graph,
            self.settings.clone(),
        ))
    }
}
