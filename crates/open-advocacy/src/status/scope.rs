use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;

use crate::domain::{Entity, EntityId, JurisdictionId, Project};
use crate::store::{EntityDirectory, StoreError};

/// Which entities a distribution counts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityScope {
    /// Every official of a jurisdiction.
    Jurisdiction { jurisdiction_id: JurisdictionId },
    /// An explicit set, e.g. the caller's own representatives.
    Entities { entity_ids: Vec<EntityId> },
}

impl EntityScope {
    pub fn for_project(project: &Project) -> Self {
        Self::Jurisdiction {
            jurisdiction_id: project.jurisdiction_id.clone(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Jurisdiction { .. } => "jurisdiction",
            Self::Entities { .. } => "entities",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    #[error("entity '{0}' does not exist")]
    UnknownEntity(EntityId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Turns an [`EntityScope`] into concrete entities, kept apart from aggregation so both
/// the jurisdiction-wide and the personal views share one aggregator.
pub struct ScopeSelector<D> {
    directory: Arc<D>,
}

impl<D> ScopeSelector<D>
where
    D: EntityDirectory,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    pub fn select(&self, scope: &EntityScope) -> Result<Vec<Entity>, ScopeError> {
        match scope {
            EntityScope::Jurisdiction { jurisdiction_id } => Ok(self
                .directory
                .entities_in_jurisdiction(jurisdiction_id)?),
            EntityScope::Entities { entity_ids } => {
                let mut seen = HashSet::new();
                entity_ids
                    .iter()
                    .filter(|id| seen.insert(*id))
                    .map(|id| -> Result<Entity, ScopeError> {
                        self.directory
                            .entity(id)?
                            .ok_or_else(|| ScopeError::UnknownEntity(id.clone()))
                    })
                    .collect()
            }
        }
    }
}
