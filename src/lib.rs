pub mod analysis;
pub mod classify;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod narrative;
pub mod report;
pub mod standards;
