//! Storage abstractions consumed read-only by the resolution and aggregation core.
//!
//! Jurisdictions, districts, entities, projects and status records are written by import
//! and editor flows elsewhere; the traits here only expose the reads the core needs so each
//! component can be exercised against an in-memory store or a failing double.

pub mod memory;

use crate::domain::{
    District, DistrictId, Entity, EntityId, Jurisdiction, JurisdictionId, Project, ProjectId,
    StatusRecord,
};
use crate::geometry::BoundaryGeometry;

pub use memory::{IngestError, InMemoryStore};

/// A district together with its stored boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictBoundary {
    pub district: District,
    pub geometry: BoundaryGeometry,
}

/// Boundary lookups. Districts without geometry are never returned.
pub trait GeometryStore: Send + Sync {
    fn boundaries(
        &self,
        jurisdiction: Option<&JurisdictionId>,
    ) -> Result<Vec<DistrictBoundary>, StoreError>;
}

/// Jurisdiction and official lookups.
pub trait EntityDirectory: Send + Sync {
    fn jurisdiction(&self, id: &JurisdictionId) -> Result<Option<Jurisdiction>, StoreError>;
    fn district(&self, id: &DistrictId) -> Result<Option<District>, StoreError>;
    fn entity(&self, id: &EntityId) -> Result<Option<Entity>, StoreError>;
    fn entities_in_districts(&self, districts: &[DistrictId]) -> Result<Vec<Entity>, StoreError>;
    /// Entities of the given jurisdictions that hold no district seat.
    fn at_large_entities(
        &self,
        jurisdictions: &[JurisdictionId],
    ) -> Result<Vec<Entity>, StoreError>;
    fn entities_in_jurisdiction(&self, id: &JurisdictionId) -> Result<Vec<Entity>, StoreError>;
}

/// Project and recorded-position lookups.
pub trait StatusRecordStore: Send + Sync {
    fn project(&self, id: &ProjectId) -> Result<Option<Project>, StoreError>;
    fn projects(&self) -> Result<Vec<Project>, StoreError>;
    /// Every record for the project, including superseded ones.
    fn records_for_project(&self, id: &ProjectId) -> Result<Vec<StatusRecord>, StoreError>;
}

/// Everything the HTTP surface reads from.
pub trait AdvocacyStore: GeometryStore + EntityDirectory + StatusRecordStore {}

impl<T> AdvocacyStore for T where T: GeometryStore + EntityDirectory + StatusRecordStore {}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
