use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{EntityId, EntityStatus, StatusRecord};

/// Complete tally of positions across an entity scope.
///
/// Every entity in scope lands in exactly one bucket, so `total` always equals both the
/// scope size and the sum of the six buckets. Entities with no record count as `unknown`;
/// `neutral` only ever reflects an explicit neutral record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDistribution {
    pub solid_approval: usize,
    pub leaning_approval: usize,
    pub neutral: usize,
    pub leaning_disapproval: usize,
    pub solid_disapproval: usize,
    pub unknown: usize,
    pub total: usize,
}

impl StatusDistribution {
    /// Tallies `scope` against `records`.
    ///
    /// Duplicate scope ids are counted once. Records for entities outside the scope are
    /// ignored; callers are expected to pass records of a single project.
    pub fn tally<'a, I>(scope: I, records: &[StatusRecord]) -> Self
    where
        I: IntoIterator<Item = &'a EntityId>,
    {
        let scope: BTreeSet<&EntityId> = scope.into_iter().collect();
        let current = current_records(records);

        let mut distribution = Self::default();
        for entity_id in scope {
            distribution.add(current.get(entity_id).map(|record| record.status));
        }
        distribution
    }

    fn add(&mut self, status: Option<EntityStatus>) {
        let bucket = match status {
            Some(EntityStatus::SolidApproval) => &mut self.solid_approval,
            Some(EntityStatus::LeaningApproval) => &mut self.leaning_approval,
            Some(EntityStatus::Neutral) => &mut self.neutral,
            Some(EntityStatus::LeaningDisapproval) => &mut self.leaning_disapproval,
            Some(EntityStatus::SolidDisapproval) => &mut self.solid_disapproval,
            None => &mut self.unknown,
        };
        *bucket += 1;
        self.total += 1;
    }

    pub fn count(&self, status: EntityStatus) -> usize {
        match status {
            EntityStatus::SolidApproval => self.solid_approval,
            EntityStatus::LeaningApproval => self.leaning_approval,
            EntityStatus::Neutral => self.neutral,
            EntityStatus::LeaningDisapproval => self.leaning_disapproval,
            EntityStatus::SolidDisapproval => self.solid_disapproval,
        }
    }

    /// Sum of the six buckets; equal to `total` by construction.
    pub fn bucket_sum(&self) -> usize {
        EntityStatus::ordered()
            .into_iter()
            .map(|status| self.count(status))
            .sum::<usize>()
            + self.unknown
    }

    /// Entities with a recorded position.
    pub fn known(&self) -> usize {
        self.total - self.unknown
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Latest record per entity: greatest `updated_at`, ties broken by the greatest record id.
pub(crate) fn current_records(records: &[StatusRecord]) -> BTreeMap<&EntityId, &StatusRecord> {
    let mut current: BTreeMap<&EntityId, &StatusRecord> = BTreeMap::new();
    for record in records {
        current
            .entry(&record.entity_id)
            .and_modify(|existing| {
                if record.supersedes(*existing) {
                    *existing = record;
                }
            })
            .or_insert(record);
    }
    current
}
