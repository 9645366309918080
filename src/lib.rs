//! Link independently developed simulation components into a composition that is
//! driven to a joint solution by pulling values on demand.
//!
//! This crate bundles the core types with the reusable components.

pub use rsmi_components::components;
pub use rsmi_core::{
    buffer, component, composition, config, decorator, decorators, errors, exchange_item, link,
    quantity, results, spatial, time, value_set,
};

pub use ndarray;

pub mod prelude {
    pub use rsmi_components::components::{Recorder, TimeSeriesComponent};
    pub use rsmi_core::component::{Component, InputState, OutputState};
    pub use rsmi_core::composition::{Composition, CompositionBuilder};
    pub use rsmi_core::config::RunSettings;
    pub use rsmi_core::errors::{RSMIError, RSMIResult};
    pub use rsmi_core::exchange_item::{ExchangeItemDefinition, ItemRef, TimeDependence};
    pub use rsmi_core::link::Link;
    pub use rsmi_core::value_set::ValueSet;
}
