use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::{DistrictBoundary, EntityDirectory, GeometryStore, StatusRecordStore, StoreError};
use crate::domain::{
    District, DistrictId, Entity, EntityId, Jurisdiction, JurisdictionId, Project, ProjectId,
    StatusRecord,
};
use crate::geometry::{BoundaryGeometry, GeometryError};

/// Process-local store backing the service and the test suites.
///
/// Every write path validates foreign keys and boundary geometry, so readers can rely on
/// the stored data being consistent.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    jurisdictions: BTreeMap<JurisdictionId, Jurisdiction>,
    districts: BTreeMap<DistrictId, District>,
    boundaries: BTreeMap<DistrictId, BoundaryGeometry>,
    entities: BTreeMap<EntityId, Entity>,
    projects: BTreeMap<ProjectId, Project>,
    records: Vec<StatusRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{kind} '{id}' already exists")]
    Duplicate { kind: &'static str, id: String },
    #[error("jurisdiction '{0}' does not exist")]
    UnknownJurisdiction(JurisdictionId),
    #[error("district '{0}' does not exist")]
    UnknownDistrict(DistrictId),
    #[error("district '{district}' does not belong to jurisdiction '{jurisdiction}'")]
    DistrictOutsideJurisdiction {
        district: DistrictId,
        jurisdiction: JurisdictionId,
    },
    #[error("entity '{0}' does not exist")]
    UnknownEntity(EntityId),
    #[error("project '{0}' does not exist")]
    UnknownProject(ProjectId),
    #[error("district '{district}' has invalid geometry: {source}")]
    InvalidGeometry {
        district: DistrictId,
        #[source]
        source: GeometryError,
    },
    #[error("store unavailable: lock poisoned")]
    Poisoned,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, IngestError> {
        self.tables.write().map_err(|_| IngestError::Poisoned)
    }

    pub fn insert_jurisdiction(&self, jurisdiction: Jurisdiction) -> Result<(), IngestError> {
        let mut tables = self.write()?;
        if tables.jurisdictions.contains_key(&jurisdiction.id) {
            return Err(IngestError::Duplicate {
                kind: "jurisdiction",
                id: jurisdiction.id.0,
            });
        }
        tables
            .jurisdictions
            .insert(jurisdiction.id.clone(), jurisdiction);
        Ok(())
    }

    /// Adds a district, rejecting boundaries that fail validation.
    pub fn insert_district(
        &self,
        district: District,
        boundary: Option<BoundaryGeometry>,
    ) -> Result<(), IngestError> {
        if let Some(geometry) = &boundary {
            validate_boundary(&district.id, geometry)?;
        }

        let mut tables = self.write()?;
        if tables.districts.contains_key(&district.id) {
            return Err(IngestError::Duplicate {
                kind: "district",
                id: district.id.0,
            });
        }
        if !tables.jurisdictions.contains_key(&district.jurisdiction_id) {
            return Err(IngestError::UnknownJurisdiction(district.jurisdiction_id));
        }

        if let Some(geometry) = boundary {
            tables.boundaries.insert(district.id.clone(), geometry);
        }
        tables.districts.insert(district.id.clone(), district);
        Ok(())
    }

    /// Swaps a district's boundary. The previous boundary stays in place on rejection.
    pub fn replace_boundary(
        &self,
        id: &DistrictId,
        boundary: BoundaryGeometry,
    ) -> Result<(), IngestError> {
        validate_boundary(id, &boundary)?;

        let mut tables = self.write()?;
        if !tables.districts.contains_key(id) {
            return Err(IngestError::UnknownDistrict(id.clone()));
        }
        tables.boundaries.insert(id.clone(), boundary);
        debug!(district = %id, "district boundary replaced");
        Ok(())
    }

    pub fn insert_entity(&self, entity: Entity) -> Result<(), IngestError> {
        let mut tables = self.write()?;
        if tables.entities.contains_key(&entity.id) {
            return Err(IngestError::Duplicate {
                kind: "entity",
                id: entity.id.0,
            });
        }
        if !tables.jurisdictions.contains_key(&entity.jurisdiction_id) {
            return Err(IngestError::UnknownJurisdiction(entity.jurisdiction_id));
        }
        if let Some(district_id) = &entity.district_id {
            let district = tables
                .districts
                .get(district_id)
                .ok_or_else(|| IngestError::UnknownDistrict(district_id.clone()))?;
            if district.jurisdiction_id != entity.jurisdiction_id {
                return Err(IngestError::DistrictOutsideJurisdiction {
                    district: district_id.clone(),
                    jurisdiction: entity.jurisdiction_id,
                });
            }
        }

        tables.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    pub fn insert_project(&self, project: Project) -> Result<(), IngestError> {
        let mut tables = self.write()?;
        if tables.projects.contains_key(&project.id) {
            return Err(IngestError::Duplicate {
                kind: "project",
                id: project.id.0,
            });
        }
        if !tables.jurisdictions.contains_key(&project.jurisdiction_id) {
            return Err(IngestError::UnknownJurisdiction(project.jurisdiction_id));
        }
        tables.projects.insert(project.id.clone(), project);
        Ok(())
    }

    /// Appends a status record. Earlier records for the same pair are kept as history.
    pub fn record_status(&self, record: StatusRecord) -> Result<(), IngestError> {
        let mut tables = self.write()?;
        if tables.records.iter().any(|existing| existing.id == record.id) {
            return Err(IngestError::Duplicate {
                kind: "status record",
                id: record.id.0,
            });
        }
        if !tables.entities.contains_key(&record.entity_id) {
            return Err(IngestError::UnknownEntity(record.entity_id));
        }
        if !tables.projects.contains_key(&record.project_id) {
            return Err(IngestError::UnknownProject(record.project_id));
        }
        tables.records.push(record);
        Ok(())
    }
}

fn validate_boundary(id: &DistrictId, geometry: &BoundaryGeometry) -> Result<(), IngestError> {
    geometry
        .validate()
        .map_err(|source| IngestError::InvalidGeometry {
            district: id.clone(),
            source,
        })
}

impl GeometryStore for InMemoryStore {
    fn boundaries(
        &self,
        jurisdiction: Option<&JurisdictionId>,
    ) -> Result<Vec<DistrictBoundary>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .boundaries
            .iter()
            .filter_map(|(id, geometry)| {
                let district = tables.districts.get(id)?;
                let wanted = jurisdiction.map_or(true, |filter| &district.jurisdiction_id == filter);
                wanted.then(|| DistrictBoundary {
                    district: district.clone(),
                    geometry: geometry.clone(),
                })
            })
            .collect())
    }
}

impl EntityDirectory for InMemoryStore {
    fn jurisdiction(&self, id: &JurisdictionId) -> Result<Option<Jurisdiction>, StoreError> {
        Ok(self.read()?.jurisdictions.get(id).cloned())
    }

    fn district(&self, id: &DistrictId) -> Result<Option<District>, StoreError> {
        Ok(self.read()?.districts.get(id).cloned())
    }

    fn entity(&self, id: &EntityId) -> Result<Option<Entity>, StoreError> {
        Ok(self.read()?.entities.get(id).cloned())
    }

    fn entities_in_districts(&self, districts: &[DistrictId]) -> Result<Vec<Entity>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .entities
            .values()
            .filter(|entity| {
                entity
                    .district_id
                    .as_ref()
                    .is_some_and(|district| districts.contains(district))
            })
            .cloned()
            .collect())
    }

    fn at_large_entities(
        &self,
        jurisdictions: &[JurisdictionId],
    ) -> Result<Vec<Entity>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .entities
            .values()
            .filter(|entity| {
                entity.is_at_large() && jurisdictions.contains(&entity.jurisdiction_id)
            })
            .cloned()
            .collect())
    }

    fn entities_in_jurisdiction(&self, id: &JurisdictionId) -> Result<Vec<Entity>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .entities
            .values()
            .filter(|entity| &entity.jurisdiction_id == id)
            .cloned()
            .collect())
    }
}

impl StatusRecordStore for InMemoryStore {
    fn project(&self, id: &ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.read()?.projects.get(id).cloned())
    }

    fn projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.read()?.projects.values().cloned().collect())
    }

    fn records_for_project(&self, id: &ProjectId) -> Result<Vec<StatusRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .records
            .iter()
            .filter(|record| &record.project_id == id)
            .cloned()
            .collect())
    }
}
