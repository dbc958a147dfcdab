use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{District, DistrictId, Entity, EntityId, JurisdictionId};
use crate::store::{EntityDirectory, StoreError};

/// An official reached through a resolved district, or at-large for its jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Representative {
    #[serde(flatten)]
    pub entity: Entity,
    /// Matched district; `None` for at-large officials.
    pub district: Option<District>,
}

impl Representative {
    pub fn district_name(&self) -> Option<&str> {
        self.district.as_ref().map(|district| district.name.as_str())
    }
}

/// Maps resolved districts onto the officials who hold them.
pub struct RepresentativeResolver<D> {
    directory: Arc<D>,
}

impl<D> RepresentativeResolver<D>
where
    D: EntityDirectory,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Seat holders of every district plus the at-large officials of every jurisdiction
    /// owning one of them. Each entity appears once.
    pub fn entities_for(&self, districts: &[District]) -> Result<Vec<Representative>, StoreError> {
        if districts.is_empty() {
            return Ok(Vec::new());
        }

        let by_id: BTreeMap<&DistrictId, &District> = districts
            .iter()
            .map(|district| (&district.id, district))
            .collect();
        let district_ids: Vec<DistrictId> = by_id.keys().map(|id| (*id).clone()).collect();

        let mut jurisdictions: Vec<JurisdictionId> = districts
            .iter()
            .map(|district| district.jurisdiction_id.clone())
            .collect();
        jurisdictions.sort();
        jurisdictions.dedup();

        let mut found: BTreeMap<EntityId, Representative> = BTreeMap::new();

        for entity in self.directory.entities_in_districts(&district_ids)? {
            let district = entity
                .district_id
                .as_ref()
                .and_then(|id| by_id.get(id))
                .map(|district| (*district).clone());
            found
                .entry(entity.id.clone())
                .or_insert(Representative { entity, district });
        }

        for entity in self.directory.at_large_entities(&jurisdictions)? {
            found
                .entry(entity.id.clone())
                .or_insert(Representative {
                    entity,
                    district: None,
                });
        }

        let mut representatives: Vec<Representative> = found.into_values().collect();
        representatives.sort_by(|a, b| {
            (&a.entity.jurisdiction_id, &a.entity.name, &a.entity.id).cmp(&(
                &b.entity.jurisdiction_id,
                &b.entity.name,
                &b.entity.id,
            ))
        });
        Ok(representatives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContactInfo, Jurisdiction};

    /// Directory that returns duplicated rows, as a careless join might.
    struct DuplicatingDirectory {
        entities: Vec<Entity>,
    }

    impl EntityDirectory for DuplicatingDirectory {
        fn jurisdiction(&self, _id: &JurisdictionId) -> Result<Option<Jurisdiction>, StoreError> {
            Ok(None)
        }

        fn district(&self, _id: &DistrictId) -> Result<Option<District>, StoreError> {
            Ok(None)
        }

        fn entity(&self, _id: &EntityId) -> Result<Option<Entity>, StoreError> {
            Ok(None)
        }

        fn entities_in_districts(
            &self,
            districts: &[DistrictId],
        ) -> Result<Vec<Entity>, StoreError> {
            let seated: Vec<Entity> = self
                .entities
                .iter()
                .filter(|e| e.district_id.as_ref().is_some_and(|d| districts.contains(d)))
                .cloned()
                .collect();
            Ok(seated.iter().chain(seated.iter()).cloned().collect())
        }

        fn at_large_entities(
            &self,
            jurisdictions: &[JurisdictionId],
        ) -> Result<Vec<Entity>, StoreError> {
            Ok(self
                .entities
                .iter()
                .filter(|e| e.is_at_large() && jurisdictions.contains(&e.jurisdiction_id))
                .cloned()
                .collect())
        }

        fn entities_in_jurisdiction(&self, _id: &JurisdictionId) -> Result<Vec<Entity>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn district(id: &str, jurisdiction: &str) -> District {
        District {
            id: DistrictId::new(id),
            jurisdiction_id: JurisdictionId::new(jurisdiction),
            name: format!("District {id}"),
            code: None,
        }
    }

    fn entity(id: &str, jurisdiction: &str, district: Option<&str>) -> Entity {
        Entity {
            id: EntityId::new(id),
            name: id.to_string(),
            title: None,
            entity_type: "official".to_string(),
            jurisdiction_id: JurisdictionId::new(jurisdiction),
            district_id: district.map(DistrictId::new),
            contact: ContactInfo::default(),
        }
    }

    fn resolver() -> RepresentativeResolver<DuplicatingDirectory> {
        RepresentativeResolver::new(Arc::new(DuplicatingDirectory {
            entities: vec![
                entity("ald-5", "council", Some("ward-5")),
                entity("ald-6", "council", Some("ward-6")),
                entity("clerk", "council", None),
                entity("governor", "state", None),
            ],
        }))
    }

    #[test]
    fn includes_seat_holders_and_at_large_once_each() {
        let found = resolver()
            .entities_for(&[district("ward-5", "council")])
            .expect("resolves");

        let ids: Vec<&str> = found.iter().map(|r| r.entity.id.as_str()).collect();
        assert_eq!(ids, vec!["ald-5", "clerk"]);
        assert_eq!(found[0].district_name(), Some("District ward-5"));
        assert!(found[1].district.is_none());
    }

    #[test]
    fn at_large_entities_of_unmatched_jurisdictions_are_excluded() {
        let found = resolver()
            .entities_for(&[district("ward-6", "council")])
            .expect("resolves");
        assert!(found.iter().all(|r| r.entity.id.as_str() != "governor"));
    }

    #[test]
    fn no_districts_means_no_representatives() {
        assert!(resolver().entities_for(&[]).expect("resolves").is_empty());
    }
}
