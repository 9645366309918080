//! Reusable components for rsmi compositions.
//!
//! None of these components model a physical process. They provide prescribed boundary
//! values and record what other components produce.

pub mod components;
