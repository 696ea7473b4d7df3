//! Service layer for business logic
//!
//! This module contains service abstractions that separate storage and
//! catalog concerns from HTTP handlers, making the code more modular and testable.

pub mod artifacts;
pub mod templates;
