//! This library is the foundation for the `para-segy-in` and `para-segy-out` crates. It holds
//! everything the two file layers share: the collective communicator abstraction, the parallel
//! IO drivers, the number and text codecs, and the rule-driven trace metadata machinery.
//!
//! The crates are designed for distributed-memory (SPMD) use: every rank of a process group
//! opens the same SEG-Y file, and the trace-oriented operations are collective over the group.
//! A single-process program simply runs as a group of one rank.
#![allow(clippy::derive_partial_eq_without_eq)]
extern crate num;
#[macro_use]
extern crate num_derive;
extern crate ibmfloat;

#[cfg(any(feature = "to_json", feature = "serde"))]
extern crate serde;
#[cfg(feature = "to_json")]
extern crate serde_json;

pub mod bitconverter;
pub mod communicator;
pub mod distributed_vector;
pub mod enums;
pub mod errors;
pub mod header_structs;
pub mod io_driver;
pub mod keys;
pub mod metadata;
pub mod operations;
pub mod parser;
pub mod rules;
pub mod segy;
pub mod settings;

pub use errors::PsgError;

pub use communicator::{Communicator, LocalCommunicator};
pub use distributed_vector::{DistributedVector, InMemoryVector};
pub use enums::*;
pub use header_structs::*;
pub use io_driver::{FileMode, IoDriver, IoDriverDistributedVector, IoDriverFile, IoDriverOpt};
pub use keys::{TraceField, TraceHeaderOffset};
pub use metadata::TraceMetadata;
pub use rules::Rule;
pub use settings::SegySettings;

pub const TEXT_HEADER_LEN: usize = 3200;
pub const BIN_HEADER_LEN: usize = 400;
pub const FILE_HEADER_LEN: usize = 3600;
pub const TRACE_HEADER_LEN: usize = 240;
