//! Collection definition validation.
//!
//! Schema normalization, inheritance composition, registry resolution, MCP
//! block checks and quality rules, tied together by the validation
//! pipeline. Domain types live in `curator-types::collection`.

pub mod inheritance;
pub mod mcp;
pub mod pipeline;
pub mod quality;
pub mod resolver;
pub mod schema;

#[cfg(test)]
pub(crate) mod testing;
