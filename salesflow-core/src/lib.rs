// salesflow-core/src/lib.rs

// 1. Documentation
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (traits)
// Contract with the relational store (Connector).
pub mod ports;

// 2. Domain
// Record types, cleaning, outliers, enrichment, aggregation.
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure (adapters)
// DuckDB, CSV files, YAML configuration.
// Depends on Domain and Ports.
pub mod infrastructure;

// 4. Application (use cases)
// Seed, extract, transform, load, report, pipeline.
pub mod application;

// --- GLOBAL ERROR ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// use salesflow_core::SalesflowError;
pub use error::SalesflowError;
