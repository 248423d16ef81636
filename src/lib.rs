//! Fatebook MCP Server Library
//!
//! A Model Context Protocol (MCP) server for Fatebook prediction tracking.
//! Provides tools for creating, forecasting on, resolving and managing questions via the Fatebook API.

pub mod config;
pub mod error;
pub mod fatebook;
pub mod mcp;

pub use config::Config;
pub use error::{FatebookMcpError, Result};
