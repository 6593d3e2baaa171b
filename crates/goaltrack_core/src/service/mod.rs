//! Core use-case services.
//!
//! # Responsibility
//! - Resolve caller time input into canonical intervals.
//! - Orchestrate repository calls into time log, stats and goal use cases.
//! - Keep CLI and other outer layers decoupled from storage details.

pub mod goal_service;
pub mod interval;
pub mod stats_service;
pub mod time_log_service;
