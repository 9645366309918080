use crate::component::ComponentStatus;
use crate::time::{Time, TimeQuery};
use crate::value_set::ValueType;
use thiserror::Error;

/// Error type for invalid operations.
///
/// Every error raised while a composition is running carries enough context
/// (component, exchange item and time) to locate the failure.
/// None of them are recoverable mid-run.
#[derive(Error, Debug)]
pub enum RSMIError {
    #[error("{0}")]
    Error(String),
    #[error("Index out of range: time index {time_index} (time count {time_count}), element index {element_index} (element count {element_count})")]
    IndexOutOfRange {
        time_index: usize,
        element_index: usize,
        time_count: usize,
        element_count: usize,
    },
    #[error("Wrong value type. Expected {expected}, got {found}")]
    ValueTypeMismatch { expected: ValueType, found: ValueType },
    #[error("Cannot resize value set: {reason}")]
    InvalidResize { reason: String },
    #[error("Shape mismatch on link {link}: {detail}")]
    ShapeMismatch { link: String, detail: String },
    #[error("Data for {component}/{item} is unavailable at {requested}: {reason}")]
    UnavailableData {
        component: String,
        item: String,
        requested: TimeQuery,
        reason: String,
    },
    #[error("Invalid link {link}: {reason}")]
    LinkConfiguration { link: String, reason: String },
    #[error("Incompatible units on link {link}: {from_unit} cannot be converted to {to_unit}")]
    IncompatibleUnits {
        link: String,
        from_unit: String,
        to_unit: String,
    },
    #[error("Synchronous links form a cycle between components {components:?}. Mark one of the links as lagged to break the cycle")]
    SynchronousCycle { components: Vec<String> },
    #[error("Unknown component {0}")]
    UnknownComponent(String),
    #[error("Component {0} is registered more than once")]
    DuplicateComponent(String),
    #[error("Component {component} has no exchange item {item}")]
    UnknownExchangeItem { component: String, item: String },
    #[error("Component {component} declares exchange item {item} more than once")]
    DuplicateExchangeItem { component: String, item: String },
    #[error("Input {input} is already provided by {existing}, cannot also link {provider}")]
    DuplicateProvider {
        input: String,
        existing: String,
        provider: String,
    },
    #[error("No value for input {item}")]
    MissingInput { item: String },
    #[error("Component {component} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        component: String,
        from: ComponentStatus,
        to: ComponentStatus,
    },
    #[error("Pull of {component}/{item} exceeded the maximum depth of {max_depth}")]
    PullDepthExceeded {
        component: String,
        item: String,
        max_depth: usize,
    },
    #[error("Component {component} did not advance beyond t={time}")]
    StalledComponent { component: String, time: Time },
    #[error("Component {component} failed at t={time}: {cause}")]
    ComponentFailure {
        component: String,
        time: Time,
        #[source]
        cause: Box<RSMIError>,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid run settings: {0}")]
    Config(#[from] toml::de::Error),
}

/// Convenience type for `Result<T, RSMIError>`.
pub type RSMIResult<T> = Result<T, RSMIError>;
