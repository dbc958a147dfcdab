use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{District, JurisdictionId};
use crate::geometry::{self, GeoPoint};
use crate::metrics;
use crate::store::{GeometryStore, StoreError};

/// Point-in-polygon resolution over the current contents of a [`GeometryStore`].
///
/// Nothing is cached between calls, so results always reflect the boundaries stored at
/// the time of the query.
pub struct DistrictResolver<S> {
    store: Arc<S>,
}

impl<S> DistrictResolver<S>
where
    S: GeometryStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Every district whose boundary covers `point`, boundary included.
    ///
    /// Without a filter all jurisdictions are searched. Stored boundaries that fail
    /// structural checks are excluded and reported rather than failing the lookup.
    pub fn resolve(
        &self,
        point: GeoPoint,
        jurisdiction: Option<&JurisdictionId>,
    ) -> Result<ResolvedDistricts, StoreError> {
        let boundaries = self.store.boundaries(jurisdiction)?;
        let searched = boundaries.len();

        let mut matched = BTreeMap::new();
        for boundary in boundaries {
            if let Some(filter) = jurisdiction {
                if &boundary.district.jurisdiction_id != filter {
                    continue;
                }
            }

            let shape = match boundary.geometry.to_multi_polygon() {
                Ok(shape) => shape,
                Err(error) => {
                    warn!(
                        district = %boundary.district.id,
                        jurisdiction = %boundary.district.jurisdiction_id,
                        %error,
                        "excluding district with invalid stored geometry"
                    );
                    metrics::record_invalid_geometry(boundary.district.id.as_str());
                    continue;
                }
            };

            if geometry::covers(&shape, &point) {
                let district = boundary.district;
                matched.insert(
                    (district.jurisdiction_id.clone(), district.id.clone()),
                    district,
                );
            }
        }

        let resolved = ResolvedDistricts {
            districts: matched.into_values().collect(),
        };

        for jurisdiction in resolved.ambiguous_jurisdictions() {
            warn!(
                %jurisdiction,
                latitude = point.latitude,
                longitude = point.longitude,
                "point matched overlapping districts of one jurisdiction"
            );
            metrics::record_ambiguous_overlap(jurisdiction.as_str());
        }

        debug!(
            searched,
            matched = resolved.len(),
            "district resolution complete"
        );
        Ok(resolved)
    }
}

/// Districts containing a point, ordered by jurisdiction then district id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedDistricts {
    districts: Vec<District>,
}

impl ResolvedDistricts {
    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn into_districts(self) -> Vec<District> {
        self.districts
    }

    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    /// Distinct jurisdictions owning at least one matched district.
    pub fn jurisdictions(&self) -> Vec<JurisdictionId> {
        let mut ids: Vec<JurisdictionId> = self
            .districts
            .iter()
            .map(|district| district.jurisdiction_id.clone())
            .collect();
        ids.dedup();
        ids
    }

    /// Jurisdictions with more than one matched district, which signals overlapping
    /// boundaries in the source data.
    pub fn ambiguous_jurisdictions(&self) -> Vec<JurisdictionId> {
        let mut counts: BTreeMap<&JurisdictionId, usize> = BTreeMap::new();
        for district in &self.districts {
            *counts.entry(&district.jurisdiction_id).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
