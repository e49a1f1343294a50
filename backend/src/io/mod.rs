//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Handlers
//! translate requests into service calls and domain errors into status
//! codes; no business rule lives here.

pub mod rest;

pub use rest::*;
