//! Tests for building and running compositions.

#[cfg(test)]
mod basic;
