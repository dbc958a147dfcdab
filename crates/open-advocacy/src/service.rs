use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::domain::{EntityId, JurisdictionId, Project, ProjectId};
use crate::lookup::{Geocoder, LookupError, LookupService, Representation};
use crate::status::{
    AggregationError, EntityPosition, EntityScope, ScopeError, ScopeSelector, StatusAggregator,
    StatusDistribution,
};
use crate::store::{AdvocacyStore, StoreError};

/// Facade composing address lookup with status aggregation over a single store.
pub struct AdvocacyService<S> {
    store: Arc<S>,
    lookup: LookupService<S>,
    scopes: ScopeSelector<S>,
    aggregator: StatusAggregator<S>,
}

/// A project's distribution over one scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDistribution {
    pub project: Project,
    pub scope: &'static str,
    pub distribution: StatusDistribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<EntityPosition>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("project '{0}' does not exist")]
    UnknownProject(ProjectId),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<S> AdvocacyService<S>
where
    S: AdvocacyStore + 'static,
{
    pub fn new(store: Arc<S>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            lookup: LookupService::new(store.clone(), geocoder),
            scopes: ScopeSelector::new(store.clone()),
            aggregator: StatusAggregator::new(store.clone()),
            store,
        }
    }

    pub fn with_geocode_timeout(mut self, timeout: Duration) -> Self {
        self.lookup = self.lookup.with_timeout(timeout);
        self
    }

    pub async fn lookup(
        &self,
        address: &str,
        jurisdiction: Option<&JurisdictionId>,
    ) -> Result<Representation, ServiceError> {
        Ok(self.lookup.find_representatives(address, jurisdiction).await?)
    }

    pub fn project(&self, id: &ProjectId) -> Result<Project, ServiceError> {
        self.store
            .project(id)?
            .ok_or_else(|| ServiceError::UnknownProject(id.clone()))
    }

    /// Distribution over every official of the project's jurisdiction.
    pub fn jurisdiction_distribution(
        &self,
        id: &ProjectId,
    ) -> Result<ProjectDistribution, ServiceError> {
        let project = self.project(id)?;
        self.distribution(project, None, false)
    }

    /// Distribution over an explicit entity set, with each entity's position.
    pub fn scoped_distribution(
        &self,
        id: &ProjectId,
        entity_ids: Vec<EntityId>,
    ) -> Result<ProjectDistribution, ServiceError> {
        let project = self.project(id)?;
        self.distribution(project, Some(EntityScope::Entities { entity_ids }), true)
    }

    /// Every project with its jurisdiction-wide distribution.
    pub fn projects_overview(&self) -> Result<Vec<ProjectDistribution>, ServiceError> {
        self.store
            .projects()?
            .into_iter()
            .map(|project| self.distribution(project, None, false))
            .collect()
    }

    fn distribution(
        &self,
        project: Project,
        scope: Option<EntityScope>,
        with_positions: bool,
    ) -> Result<ProjectDistribution, ServiceError> {
        let scope = scope.unwrap_or_else(|| EntityScope::for_project(&project));
        let entities = self.scopes.select(&scope)?;
        let distribution = self.aggregator.distribution_for(&project, &entities)?;
        let positions = if with_positions {
            Some(self.aggregator.positions(&project, &entities)?)
        } else {
            None
        };

        info!(
            project = %project.id,
            scope = scope.label(),
            total = distribution.total,
            "status distribution served"
        );

        Ok(ProjectDistribution {
            project,
            scope: scope.label(),
            distribution,
            positions,
        })
    }
}
