//! # IO Module - Scenario, Result, and Model Persistence
//!
//! This module is the only place the engine touches the filesystem. It
//! covers three concerns:
//!
//! 1. **Scenario documents**: JSON load/save of scenarios
//!    (see [`scenario_store`]).
//! 2. **Result envelopes**: pretty JSON for inspection and a compact binary
//!    form for bulk storage (see [`results`]).
//! 3. **Policy models**: two files per model id, a JSON metadata document
//!    plus an opaque binary weights blob the engine never interprets
//!    (see [`model_store`]).
//!
//! All functions map filesystem and serialization failures onto the engine
//! error type; a missing model id surfaces as `NotFound`.

// Scenario JSON documents
pub mod scenario_store;
// Result envelope persistence
pub mod results;
// Policy model store
pub mod model_store;
