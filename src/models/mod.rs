//! Data models for the Sentinel monitor
//!
//! This module contains the core domain models organized by concern:
//! - Location: location queries and resolved coordinates
//! - Reading: atmosphere and entropy readings with their provenance
//! - Report: the output of one refresh cycle

pub mod location;
pub mod reading;
pub mod report;

// Re-export all public types for convenient access
pub use location::{LocationQuery, ResolvedLocation};
pub use reading::{AtmosphereReading, EntropySample, ReadingSource};
pub use report::RiskReport;
