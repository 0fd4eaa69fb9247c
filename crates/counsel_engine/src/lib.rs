//! Counsel query engine
//!
//! Answers legal questions by planning which capabilities to consult
//! (ranking), consulting them one by one or in parallel groups (engine),
//! classifying each result (interpreter), merging parallel results
//! (synthesizer), and guaranteeing a terminal answer when everything else
//! fails (fallback).

pub mod capability;
pub mod config;
pub mod direct_answer;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod interpreter;
pub mod oracle;
pub mod ranking;
pub mod source_store;
pub mod synthesizer;
pub mod web_search;

pub use capability::{
    CallMode, Capability, CapabilityCall, CapabilityOutput, CapabilityRegistry, FakeCapability,
};
pub use config::{EngineConfig, OracleConfig};
pub use engine::QueryEngine;
pub use error::{CapabilityError, OracleError, SynthesisError};
pub use oracle::{FakeOracle, HttpOracle, Oracle};
