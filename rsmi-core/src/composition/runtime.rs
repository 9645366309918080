//! Composition struct and runtime execution.

use crate::buffer::OutputBuffer;
use crate::component::{ComponentStatus, InputState};
use crate::config::{Retention, RunSettings};
use crate::errors::{RSMIError, RSMIResult};
use crate::exchange_item::{ItemRef, ItemRole, TimeDependence};
use crate::link::Link;
use crate::time::{PullRequest, Time, TimeQuery, TimeSpan};
use crate::value_set::ValueSet;
use petgraph::dot::Dot;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::types::{CGraph, ComponentSlot};
use super::validation::verify_output_shape;

/// A set of linked components driven to a joint solution.
///
/// Components are advanced on demand. The runner repeatedly picks the unfinished
/// component with the earliest next time (ties are broken by the order in which
/// components first appear in the links) and advances it. Before a component advances,
/// each of its input links is resolved by pulling the linked output, which advances
/// the providing component first if it has not yet computed far enough.
///
/// Any error aborts the run and marks every unfinished component as failed.
/// Failed components are still given the chance to `finish`.
#[derive(Debug)]
pub struct Composition {
    slots: Vec<ComponentSlot>,
    index: HashMap<String, usize>,
    links: Vec<Link>,
    buffers: HashMap<ItemRef, OutputBuffer>,
    /// Indices of the links reading from each output.
    consumers: HashMap<ItemRef, Vec<usize>>,
    /// Outputs that have been pulled from outside of the composition.
    external: HashSet<ItemRef>,
    drive_order: Vec<usize>,
    graph: CGraph,
    settings: RunSettings,
}

impl Composition {
    pub(crate) fn new(
        slots: Vec<ComponentSlot>,
        index: HashMap<String, usize>,
        links: Vec<Link>,
        buffers: HashMap<ItemRef, OutputBuffer>,
        drive_order: Vec<usize>,
        graph: CGraph,
        settings: RunSettings,
    ) -> Self {
        let mut consumers: HashMap<ItemRef, Vec<usize>> = HashMap::new();
        for (link_index, link) in links.iter().enumerate() {
            consumers
                .entry(link.source.clone())
                .or_default()
                .push(link_index);
        }
        Self {
            slots,
            index,
            links,
            buffers,
            consumers,
            external: HashSet::new(),
            drive_order,
            graph,
            settings,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Component ids in the order used to break ties between equal next times.
    pub fn drive_order(&self) -> Vec<&str> {
        self.drive_order
            .iter()
            .map(|&i| self.slots[i].id())
            .collect()
    }

    fn slot_index(&self, component: &str) -> RSMIResult<usize> {
        self.index
            .get(component)
            .copied()
            .ok_or_else(|| RSMIError::UnknownComponent(component.to_string()))
    }

    pub fn status(&self, component: &str) -> RSMIResult<ComponentStatus> {
        Ok(self.slots[self.slot_index(component)?].status)
    }

    pub fn current_time(&self, component: &str) -> RSMIResult<Time> {
        Ok(self.slots[self.slot_index(component)?]
            .component
            .current_time())
    }

    /// Whether every component has finished, or the run was aborted.
    pub fn finished(&self) -> bool {
        self.slots.iter().all(|slot| slot.status.is_terminal())
    }

    /// The values written into an input for the component's most recent update.
    pub fn input_values(&self, component: &str, item: &str) -> RSMIResult<Arc<ValueSet>> {
        let slot = &self.slots[self.slot_index(component)?];
        slot.inputs.get(item).cloned().ok_or_else(|| {
            RSMIError::UnknownExchangeItem {
                component: component.to_string(),
                item: item.to_string(),
            }
        })
    }

    /// The most recent values of an output.
    pub fn output_values(&self, component: &str, item: &str) -> RSMIResult<Arc<ValueSet>> {
        self.buffer(&ItemRef::new(component, item))?
            .get(&TimeQuery::Latest)
    }

    fn buffer(&self, item: &ItemRef) -> RSMIResult<&OutputBuffer> {
        self.buffers
            .get(item)
            .ok_or_else(|| RSMIError::UnknownExchangeItem {
                component: item.component.clone(),
                item: item.item.clone(),
            })
    }

    /// Pull the values of an output from outside of the composition.
    ///
    /// The providing component is advanced as needed, exactly as if a linked
    /// consumer had asked. From the first external pull on, the output keeps every
    /// value it produces. Values discarded before that are gone, so asking for them
    /// fails with `UnavailableData` and aborts the run.
    pub fn get_values(&mut self, output: &ItemRef, query: TimeQuery) -> RSMIResult<Arc<ValueSet>> {
        if self.buffers.contains_key(output) {
            self.external.insert(output.clone());
        }
        let request = PullRequest::new(ItemRef::new("<external>", &output.item), query);
        let result = self.pull(output, &request, 0);
        if let Err(e) = &result {
            self.abort(e);
        }
        result
    }

    /// Advance the component that is furthest behind by one step.
    ///
    /// Returns `false` once every component has finished.
    pub fn step(&mut self) -> RSMIResult<bool> {
        let next = match self.select_next() {
            Some(next) => next,
            None => return Ok(false),
        };
        if let Err(e) = self.advance(next, 0) {
            self.abort(&e);
            return Err(e);
        }
        Ok(true)
    }

    /// Run every component to the end of the run.
    pub fn run(&mut self) -> RSMIResult<()> {
        while self.step()? {}
        info!("Composition run finished");
        Ok(())
    }

    /// Finish every component that has not finished yet, ending the run early.
    pub fn finish(&mut self) -> RSMIResult<()> {
        for index in 0..self.slots.len() {
            if !self.slots[index].status.is_terminal() {
                if let Err(e) = self.complete(index) {
                    self.abort(&e);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Graphviz representation of the components and the links between them.
    pub fn as_dot(&self) -> String {
        format!("{}", Dot::with_config(&self.graph, &[]))
    }

    fn select_next(&self) -> Option<usize> {
        let mut selected: Option<(usize, Time)> = None;
        for &index in &self.drive_order {
            let slot = &self.slots[index];
            if slot.status.is_terminal() {
                continue;
            }
            let next_time = slot
                .component
                .next_time()
                .unwrap_or_else(|| slot.component.current_time());
            match selected {
                Some((_, earliest)) if earliest <= next_time => {}
                _ => selected = Some((index, next_time)),
            }
        }
        selected.map(|(index, _)| index)
    }

    fn abort(&mut self, error: &RSMIError) {
        error!(error = %error, "Aborting composition run");
        for slot in self.slots.iter_mut() {
            if slot.status.is_terminal() {
                continue;
            }
            if let Err(e) = slot.component.finish() {
                warn!(component = %slot.id(), error = %e, "Failed to finish aborted component");
            }
            slot.status = ComponentStatus::Failed;
        }
    }

    fn complete(&mut self, index: usize) -> RSMIResult<()> {
        let slot = &mut self.slots[index];
        let id = slot.id().to_string();
        slot.component
            .finish()
            .map_err(|e| RSMIError::ComponentFailure {
                component: id.clone(),
                time: slot.component.current_time(),
                cause: Box::new(e),
            })?;
        slot.status.transition(ComponentStatus::Finished, &id)?;
        info!(component = %id, time = slot.component.current_time(), "Component finished");
        Ok(())
    }

    /// Resolve the inputs of a component, then advance it by one step.
    fn advance(&mut self, index: usize, depth: usize) -> RSMIResult<()> {
        if self.slots[index].at_end() {
            return self.complete(index);
        }
        let id = self.slots[index].id().to_string();
        let t_current = self.slots[index].component.current_time();
        let t_next = self.slots[index]
            .component
            .next_time()
            .unwrap_or(t_current);

        self.slots[index]
            .status
            .transition(ComponentStatus::WaitingOnInputs, &id)?;
        debug!(component = %id, t_current, t_next, "Resolving inputs");
        let mut inputs = InputState::new();
        for link_index in self.slots[index].input_links.clone() {
            let (item, values) = self.resolve_link(link_index, t_current, t_next, depth)?;
            inputs.insert(&item, values);
        }

        let slot = &mut self.slots[index];
        slot.status.transition(ComponentStatus::Running, &id)?;
        slot.inputs = inputs;
        let outputs = slot
            .component
            .update(&slot.inputs)
            .map_err(|e| RSMIError::ComponentFailure {
                component: id.clone(),
                time: t_current,
                cause: Box::new(e),
            })?;
        let t_now = slot.component.current_time();
        if t_now <= t_current {
            return Err(RSMIError::StalledComponent {
                component: id,
                time: t_current,
            });
        }

        let span = TimeSpan::new(t_current, t_now);
        for (item, values) in outputs.iter() {
            let definition = slot
                .definition(item)
                .filter(|definition| definition.role == ItemRole::Output)
                .ok_or_else(|| RSMIError::UnknownExchangeItem {
                    component: id.clone(),
                    item: item.clone(),
                })?;
            verify_output_shape(&id, definition, values)?;
        }
        let mut produced = outputs;
        for definition in slot
            .definitions
            .iter()
            .filter(|definition| definition.role == ItemRole::Output)
        {
            let key = ItemRef::new(&id, &definition.id);
            if let Some(buffer) = self.buffers.get_mut(&key) {
                match produced.remove(&definition.id) {
                    Some(values) => buffer.push(span, values),
                    None => buffer.carry_forward(span),
                }
            }
        }
        debug!(component = %id, time = t_now, "Advanced component");

        self.prune(index);
        if self.slots[index].at_end() {
            self.complete(index)?;
        }
        Ok(())
    }

    /// Pull the source of a link for a consumer step `[t_current, t_next]` and
    /// run the values through the link's stages.
    ///
    /// Lagged links never advance their provider. They read the values of the
    /// provider's last completed step at or before `t_current`.
    fn resolve_link(
        &mut self,
        link_index: usize,
        t_current: Time,
        t_next: Time,
        depth: usize,
    ) -> RSMIResult<(String, Arc<ValueSet>)> {
        let link = &self.links[link_index];
        let source = link.source.clone();
        let target = link.target.clone();
        let lagged = link.is_lagged();

        let consumer = self.slot_index(&target.component)?;
        let dependence = self.slots[consumer]
            .definition(&target.item)
            .map(|definition| definition.time_dependence)
            .unwrap_or_default();
        let (request, values) = if lagged {
            let provider = self.slot_index(&source.component)?;
            let time = t_current.min(self.slots[provider].component.current_time());
            let request = PullRequest::new(target.clone(), TimeQuery::At(time));
            let values = self.buffer(&source)?.get(&request.query)?;
            (request, values)
        } else {
            let query = match dependence {
                TimeDependence::Span => TimeQuery::Span {
                    start: t_current,
                    end: t_next,
                },
                TimeDependence::Stamp => TimeQuery::At(t_next),
                TimeDependence::Independent => TimeQuery::Latest,
            };
            let request = PullRequest::new(target.clone(), query);
            let values = self.pull(&source, &request, depth + 1)?;
            (request, values)
        };
        let values = self.links[link_index].transform(&request, values)?;
        Ok((target.item, values))
    }

    /// Answer a request for an output, advancing its component as far as needed.
    ///
    /// A provider that is itself waiting on inputs cannot be advanced, so the request
    /// fails.
    fn pull(
        &mut self,
        source: &ItemRef,
        request: &PullRequest,
        depth: usize,
    ) -> RSMIResult<Arc<ValueSet>> {
        if depth > self.settings.max_pull_depth {
            return Err(RSMIError::PullDepthExceeded {
                component: source.component.clone(),
                item: source.item.clone(),
                max_depth: self.settings.max_pull_depth,
            });
        }
        let provider = self.slot_index(&source.component)?;

        if let Some(required) = request.query.required_time() {
            while self.slots[provider].component.current_time() < required {
                let slot = &self.slots[provider];
                let unavailable = |reason: String| RSMIError::UnavailableData {
                    component: source.component.clone(),
                    item: source.item.clone(),
                    requested: request.query,
                    reason,
                };
                if slot.status == ComponentStatus::WaitingOnInputs {
                    return Err(unavailable(format!(
                        "{} is waiting on its own inputs at t={}",
                        source.component,
                        slot.component.current_time()
                    )));
                }
                if slot.status.is_terminal() || slot.at_end() {
                    return Err(unavailable(format!(
                        "{} stops at t={}",
                        source.component,
                        slot.component.current_time()
                    )));
                }
                self.advance(provider, depth)?;
            }
        }
        self.buffer(source)?.get(&request.query)
    }

    /// Discard buffered values that the consumers of the affected outputs no longer need.
    fn prune(&mut self, index: usize) {
        if self.settings.retention == Retention::KeepAll {
            return;
        }
        let slot = &self.slots[index];
        let mut items: Vec<ItemRef> = slot
            .definitions
            .iter()
            .filter(|definition| definition.role == ItemRole::Output)
            .map(|definition| ItemRef::new(slot.id(), &definition.id))
            .collect();
        items.extend(
            slot.input_links
                .iter()
                .map(|&link_index| self.links[link_index].source.clone()),
        );

        for item in items {
            if self.external.contains(&item) {
                continue;
            }
            let horizon = match self.consumers.get(&item) {
                Some(links) => links
                    .iter()
                    .filter_map(|&link_index| {
                        let consumer = self.index.get(&self.links[link_index].target.component)?;
                        Some(self.slots[*consumer].component.current_time())
                    })
                    .fold(Time::INFINITY, Time::min),
                None => match self.buffers.get(&item) {
                    Some(buffer) => buffer.latest_time(),
                    None => continue,
                },
            };
            if let Some(buffer) = self.buffers.get_mut(&item) {
                buffer.clear_before(horizon);
            }
        }
    }
}
