//! MCP server exposing Twitter/X marketing tools (post, timeline, DMs,
//! username history, web search) over stdio or Streamable HTTP.

pub mod cli;
pub mod clients;
pub mod core;
pub mod domain;
pub mod infra;
pub mod tools;
