//! An MCP-style tool surface for LLM clients.
//!
//! Exposes the same operations as the JSON API as named tools: a client
//! fetches the tool descriptors, then POSTs an arguments object to call one.
//! Calls are authenticated with the same Bearer token as the REST endpoints
//! and dispatch to the same store functions, so a tool call can do exactly
//! what the signed-in user could do through the app and nothing more.

mod dispatch;
mod tools;

pub use dispatch::call_tool;
pub use tools::get_tool_descriptors;
