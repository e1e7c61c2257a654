//! Test support: isolated workspaces and canned fixtures.

pub mod fixtures;
mod world;

pub use world::{CliResult, TestWorld};
