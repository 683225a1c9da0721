//! Ordered request pipeline
//!
//! A pipeline is a list of [`Link`]s ending in a [`Transport`]. Each link
//! receives the operation plus a [`Next`] continuation over the rest of
//! the chain and resolves with the operation's eventual result.

pub mod builder;
pub mod link;

pub use builder::{Pipeline, PipelineBuilder};
pub use link::{Link, Next};
