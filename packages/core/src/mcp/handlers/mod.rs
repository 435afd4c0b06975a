//! MCP Request Handlers
//!
//! Handler modules for the protocol methods that carry logic of their own.
//! `ping`, `initialized`, `resources/list` and `prompts/list` are answered
//! inline by the dispatcher.

pub mod initialize;
pub mod tools;
