//! Tool-call boundary for the TripSync engine.
//!
//! This crate exposes the engine to an AI orchestrator as a fixed set of
//! named tools. The registry is explicit: a mapping from tool name to a
//! typed handler plus a declared parameter schema, built once at startup —
//! there is no runtime discovery. Every dispatch returns a structured JSON
//! result; failures populate an `error` value instead of raising, so a tool
//! fault never aborts the conversation.
//!
//! # Architecture
//!
//! - `types`: serializable tool inputs (with JSON Schema derivation) and outputs
//! - `registry`: the tool name → handler mapping and dispatch entry point
//! - `tools`: handler implementations over [`tripsync_lib::TripContext`]
//! - `error`: structured tool errors embedded in results

#![deny(warnings)]

pub mod error;
pub mod registry;
pub mod tools;
pub mod types;

pub use error::{ToolError, ToolResult};
pub use registry::{ToolDescriptor, ToolRegistry};
