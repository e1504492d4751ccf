#![doc = include_str!("../README.md")]
#![warn(rustdoc::all)]
#![deny(unused_must_use, rust_2018_idioms)]

#[macro_use]
extern crate tracing;

pub mod error;

pub mod path;

pub mod manifest;

pub mod dependency_map;

pub mod outputs;

pub mod status;

pub mod graph;

pub mod context;

pub mod host;

pub mod compiler;

pub mod report;

pub mod solution;

pub mod cli;

pub use error::{BuildError, Result};
pub use solution::SolutionBuilder;
pub use status::Status;
