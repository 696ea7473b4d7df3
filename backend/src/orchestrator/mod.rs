//! Orchestrator module
//!
//! Contains the generation workflow: upstream client and capability traits,
//! single generation tasks, the video job poller, prompt composition and
//! the fan-out coordinator that runs template variants concurrently.

pub mod api_client;
pub mod backends;
pub mod config;
pub mod constants;
pub mod error;
pub mod fan_out;
pub mod openai_types;
pub mod poller;
pub mod prompt;
pub mod tasks;
