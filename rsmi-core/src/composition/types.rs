//! Type definitions for the composition module.

use crate::component::{Component, ComponentStatus, InputState};
use crate::exchange_item::ExchangeItemDefinition;
use crate::link::LinkTiming;
use crate::time::Time;
use petgraph::Graph;

/// Component dependency graph: nodes are component ids, edges run from provider to consumer.
pub type CGraph = Graph<String, LinkTiming>;

/// A component together with the bookkeeping the runner keeps for it.
#[derive(Debug)]
pub(crate) struct ComponentSlot {
    pub component: Box<dyn Component>,
    pub status: ComponentStatus,
    pub definitions: Vec<ExchangeItemDefinition>,
    /// Values resolved for the most recent update.
    pub inputs: InputState,
    /// Link indices targeting this component, in declaration order.
    pub input_links: Vec<usize>,
    /// The time at which the runner stops advancing this component.
    pub end_time: Time,
}

impl ComponentSlot {
    pub fn id(&self) -> &str {
        self.component.id()
    }

    pub fn definition(&self, item: &str) -> Option<&ExchangeItemDefinition> {
        self.definitions.iter().find(|definition| definition.id == item)
    }

    /// Whether the component cannot or should not advance any further.
    pub fn at_end(&self) -> bool {
        self.component.current_time() >= self.end_time || self.component.next_time().is_none()
    }
}
