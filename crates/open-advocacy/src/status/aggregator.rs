use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::distribution::{current_records, StatusDistribution};
use crate::domain::{Entity, EntityId, EntityStatus, Project, StatusRecord};
use crate::store::{StatusRecordStore, StoreError};

/// Computes status distributions for a project over a caller-supplied entity scope.
///
/// The aggregator never decides who is in scope; see [`super::ScopeSelector`].
pub struct StatusAggregator<S> {
    store: Arc<S>,
}

/// An entity's current position on a project, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityPosition {
    pub entity_id: EntityId,
    pub entity_name: String,
    pub status: Option<EntityStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<S> StatusAggregator<S>
where
    S: StatusRecordStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn distribution_for(
        &self,
        project: &Project,
        scope: &[Entity],
    ) -> Result<StatusDistribution, AggregationError> {
        let records = self.project_records(project)?;
        let distribution =
            StatusDistribution::tally(scope.iter().map(|entity| &entity.id), &records);

        debug!(
            project = %project.id,
            scope = distribution.total,
            unknown = distribution.unknown,
            "status distribution computed"
        );
        Ok(distribution)
    }

    /// Current position of every entity in scope, in scope order, one row per entity.
    pub fn positions(
        &self,
        project: &Project,
        scope: &[Entity],
    ) -> Result<Vec<EntityPosition>, AggregationError> {
        let records = self.project_records(project)?;
        let current = current_records(&records);

        let mut seen = std::collections::HashSet::new();
        Ok(scope
            .iter()
            .filter(|entity| seen.insert(&entity.id))
            .map(|entity| {
                let record = current.get(&entity.id);
                EntityPosition {
                    entity_id: entity.id.clone(),
                    entity_name: entity.name.clone(),
                    status: record.map(|record| record.status),
                    notes: record.and_then(|record| record.notes.clone()),
                    updated_at: record.map(|record| record.updated_at),
                    updated_by: record.map(|record| record.updated_by.clone()),
                }
            })
            .collect())
    }

    fn project_records(&self, project: &Project) -> Result<Vec<StatusRecord>, StoreError> {
        let mut records = self.store.records_for_project(&project.id)?;
        records.retain(|record| record.project_id == project.id);
        Ok(records)
    }
}
