//! A composition is a set of linked components that are run together.
//!
//! Components never call each other directly. Each declares its exchange items and
//! the composition connects outputs to inputs through links. While running, a
//! component only advances once the values for all of its linked inputs have been
//! pulled, which in turn advances the components providing them.
//!
//! The composition is validated when it is built: every link must connect an
//! existing output to an existing input with matching shape and unit, each input
//! may only have one provider and the synchronous links may not form a cycle.

mod builder;
mod runtime;
mod types;
mod validation;

#[cfg(test)]
mod tests;

// Public re-exports
pub use builder::CompositionBuilder;
pub use runtime::Composition;
pub use types::CGraph;
