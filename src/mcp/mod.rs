//! MCP server
//!
//! Exposes the CostChef tools over the Model Context Protocol.

mod server;

pub use server::CostChefService;
