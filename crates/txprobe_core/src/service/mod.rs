//! Core use-case services.
//!
//! # Responsibility
//! - Decide transaction boundaries and orchestrate repository calls.
//! - Keep CLI callers decoupled from storage details.

pub mod counter_service;
