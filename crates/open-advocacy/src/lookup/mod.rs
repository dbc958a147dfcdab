//! Address → coordinates → districts → representatives.

pub mod geocoder;
pub mod providers;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{Jurisdiction, JurisdictionId, JurisdictionLevel};
use crate::geometry::GeoPoint;
use crate::metrics;
use crate::resolution::{DistrictResolver, Representative, RepresentativeResolver};
use crate::store::{EntityDirectory, GeometryStore, StoreError};

pub use geocoder::{CachingGeocoder, GeocodeError, Geocoder, StaticGeocoder};
pub use providers::{geocoder_from_config, GoogleGeocoder, NominatimGeocoder};

pub const DEFAULT_GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Officials of one jurisdiction, for grouped display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JurisdictionRepresentatives {
    pub id: JurisdictionId,
    pub name: String,
    pub level: Option<JurisdictionLevel>,
    pub entities: Vec<Representative>,
}

/// Everything a constituent needs after an address lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Representation {
    pub address: String,
    pub coordinates: GeoPoint,
    pub districts: Vec<crate::domain::District>,
    pub entities: Vec<Representative>,
    pub jurisdictions: Vec<JurisdictionRepresentatives>,
    pub ambiguous_jurisdictions: Vec<JurisdictionId>,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("could not locate that address: {0}")]
    GeocodeFailed(#[from] GeocodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Composes geocoding with district and representative resolution. Never writes.
pub struct LookupService<S> {
    geocoder: Arc<dyn Geocoder>,
    districts: DistrictResolver<S>,
    representatives: RepresentativeResolver<S>,
    directory: Arc<S>,
    geocode_timeout: Duration,
}

impl<S> LookupService<S>
where
    S: GeometryStore + EntityDirectory,
{
    pub fn new(store: Arc<S>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            districts: DistrictResolver::new(store.clone()),
            representatives: RepresentativeResolver::new(store.clone()),
            directory: store,
            geocode_timeout: DEFAULT_GEOCODE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.geocode_timeout = timeout;
        self
    }

    pub async fn find_representatives(
        &self,
        address: &str,
        jurisdiction: Option<&JurisdictionId>,
    ) -> Result<Representation, LookupError> {
        let point = match self.geocode(address).await {
            Ok(point) => point,
            Err(err) => {
                metrics::record_geocode_failure(err.reason());
                warn!(reason = err.reason(), error = %err, "address lookup failed to geocode");
                return Err(err.into());
            }
        };
        debug!(
            latitude = point.latitude,
            longitude = point.longitude,
            "address geocoded"
        );

        let resolved = self.districts.resolve(point, jurisdiction)?;
        let entities = self.representatives.entities_for(resolved.districts())?;
        let jurisdictions = self.group_by_jurisdiction(&entities)?;
        let ambiguous_jurisdictions = resolved.ambiguous_jurisdictions();

        info!(
            districts = resolved.len(),
            entities = entities.len(),
            "representatives resolved"
        );

        Ok(Representation {
            address: address.trim().to_string(),
            coordinates: point,
            districts: resolved.into_districts(),
            entities,
            jurisdictions,
            ambiguous_jurisdictions,
        })
    }

    async fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        if address.trim().is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }
        tokio::time::timeout(self.geocode_timeout, self.geocoder.geocode(address))
            .await
            .map_err(|_| GeocodeError::Timeout(self.geocode_timeout))?
    }

    fn group_by_jurisdiction(
        &self,
        entities: &[Representative],
    ) -> Result<Vec<JurisdictionRepresentatives>, StoreError> {
        let mut grouped: BTreeMap<&JurisdictionId, Vec<Representative>> = BTreeMap::new();
        for representative in entities {
            grouped
                .entry(&representative.entity.jurisdiction_id)
                .or_default()
                .push(representative.clone());
        }

        grouped
            .into_iter()
            .map(|(id, entities)| -> Result<JurisdictionRepresentatives, StoreError> {
                let jurisdiction: Option<Jurisdiction> = self.directory.jurisdiction(id)?;
                Ok(JurisdictionRepresentatives {
                    id: id.clone(),
                    name: jurisdiction
                        .as_ref()
                        .map(|jurisdiction| jurisdiction.name.clone())
                        .unwrap_or_else(|| id.to_string()),
                    level: jurisdiction.map(|jurisdiction| jurisdiction.level),
                    entities,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContactInfo, District, DistrictId, Entity, EntityId};
    use crate::geometry::BoundaryGeometry;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;

    struct Stalled;

    #[async_trait]
    impl Geocoder for Stalled {
        async fn geocode(&self, _address: &str) -> Result<GeoPoint, GeocodeError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(GeocodeError::NoCandidates)
        }
    }

    fn square(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> BoundaryGeometry {
        BoundaryGeometry::Polygon(vec![vec![
            [min_lon, min_lat],
            [max_lon, min_lat],
            [max_lon, max_lat],
            [min_lon, max_lat],
            [min_lon, min_lat],
        ]])
    }

    fn store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        store
            .insert_jurisdiction(Jurisdiction {
                id: JurisdictionId::new("springfield"),
                name: "Springfield Council".to_string(),
                level: JurisdictionLevel::City,
                description: None,
            })
            .expect("jurisdiction");
        store
            .insert_district(
                District {
                    id: DistrictId::new("springfield-1"),
                    jurisdiction_id: JurisdictionId::new("springfield"),
                    name: "Ward 1".to_string(),
                    code: Some("1".to_string()),
                },
                Some(square(-90.0, 39.0, -89.0, 40.0)),
            )
            .expect("district");
        for (id, district) in [("councilor", Some("springfield-1")), ("mayor", None)] {
            store
                .insert_entity(Entity {
                    id: EntityId::new(id),
                    name: id.to_string(),
                    title: None,
                    entity_type: "official".to_string(),
                    jurisdiction_id: JurisdictionId::new("springfield"),
                    district_id: district.map(DistrictId::new),
                    contact: ContactInfo::default(),
                })
                .expect("entity");
        }
        Arc::new(store)
    }

    fn geocoder() -> Arc<dyn Geocoder> {
        Arc::new(StaticGeocoder::new().with_entry(
            "1 Main St",
            GeoPoint::new(39.5, -89.5).expect("valid point"),
        ))
    }

    #[tokio::test]
    async fn groups_seat_holders_and_at_large_by_jurisdiction() {
        let service = LookupService::new(store(), geocoder());
        let representation = service
            .find_representatives("1 Main St", None)
            .await
            .expect("lookup succeeds");

        assert_eq!(representation.districts.len(), 1);
        assert_eq!(representation.entities.len(), 2);
        assert_eq!(representation.jurisdictions.len(), 1);
        let group = &representation.jurisdictions[0];
        assert_eq!(group.name, "Springfield Council");
        assert_eq!(group.level, Some(JurisdictionLevel::City));
        assert_eq!(group.entities.len(), 2);
    }

    #[tokio::test]
    async fn unknown_address_is_a_geocode_failure() {
        let service = LookupService::new(store(), geocoder());
        let result = service.find_representatives("404 Nowhere", None).await;
        assert!(matches!(
            result,
            Err(LookupError::GeocodeFailed(GeocodeError::NoCandidates))
        ));

        let blank = service.find_representatives("   ", None).await;
        assert!(matches!(
            blank,
            Err(LookupError::GeocodeFailed(GeocodeError::EmptyAddress))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_geocoder_times_out() {
        let service =
            LookupService::new(store(), Arc::new(Stalled)).with_timeout(Duration::from_secs(2));
        let result = service.find_representatives("1 Main St", None).await;
        assert!(matches!(
            result,
            Err(LookupError::GeocodeFailed(GeocodeError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn point_outside_every_district_is_empty_not_an_error() {
        let geocoder: Arc<dyn Geocoder> = Arc::new(StaticGeocoder::new().with_entry(
            "far away",
            GeoPoint::new(10.0, 10.0).expect("valid point"),
        ));
        let service = LookupService::new(store(), geocoder);
        let representation = service
            .find_representatives("far away", None)
            .await
            .expect("lookup succeeds");
        assert!(representation.districts.is_empty());
        assert!(representation.entities.is_empty());
        assert!(representation.jurisdictions.is_empty());
    }
}
