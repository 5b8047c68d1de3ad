//! CostChef Library
//!
//! Warehouse pricing, dish costing and the MCP server that exposes them.

pub mod build_info;
pub mod config;
pub mod costing;
pub mod db;
pub mod mcp;
pub mod models;
pub mod tools;
