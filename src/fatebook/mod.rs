//! Fatebook API module
//!
//! Contains types, requests, and the client for interacting with the Fatebook API.

pub mod client;
pub mod requests;
pub mod types;
pub mod utils;
