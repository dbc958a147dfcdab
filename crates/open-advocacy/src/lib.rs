//! District resolution and status aggregation for the open advocacy platform.
//!
//! An address is geocoded to a point, the point is resolved to the districts whose
//! boundaries cover it, and the districts to the officials who represent them. For a
//! project, the recorded positions of any entity scope are tallied into a complete
//! distribution in which missing positions stay `unknown`.

pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod lookup;
pub mod metrics;
pub mod resolution;
pub mod router;
pub mod service;
pub mod status;
pub mod store;
pub mod telemetry;

pub use router::advocacy_router;
pub use service::{AdvocacyService, ProjectDistribution, ServiceError};
