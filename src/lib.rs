// Bearing monitor - Streaming telemetry consumer for remote condition simulations
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;
