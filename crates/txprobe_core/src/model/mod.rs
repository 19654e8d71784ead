//! Domain model for the transactional counter.
//!
//! # Responsibility
//! - Define the row entity stored in table `foo` and its well-known values.
//! - Describe the observable table lifecycle (`absent` -> `present`).

pub mod row;
