use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier wrapper for governing bodies.
    JurisdictionId
);
string_id!(
    /// Identifier wrapper for districts within a jurisdiction.
    DistrictId
);
string_id!(
    /// Identifier wrapper for officials and representatives.
    EntityId
);
string_id!(
    /// Identifier wrapper for advocacy projects.
    ProjectId
);
string_id!(
    /// Identifier wrapper for recorded positions.
    StatusRecordId
);

/// Tier of government a jurisdiction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JurisdictionLevel {
    City,
    State,
    Federal,
}

impl JurisdictionLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::City => "City",
            Self::State => "State",
            Self::Federal => "Federal",
        }
    }
}

/// Governing body owning districts and officials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jurisdiction {
    pub id: JurisdictionId,
    pub name: String,
    pub level: JurisdictionLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Named subdivision of a jurisdiction. Boundaries live in the geometry store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub id: DistrictId,
    pub jurisdiction_id: JurisdictionId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Elected official or representative.
///
/// An entity without a district represents its whole jurisdiction (at-large).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub entity_type: String,
    pub jurisdiction_id: JurisdictionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district_id: Option<DistrictId>,
    #[serde(default)]
    pub contact: ContactInfo,
}

impl Entity {
    pub fn is_at_large(&self) -> bool {
        self.district_id.is_none()
    }
}

/// Position an entity holds on a project, strongest approval first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    SolidApproval,
    LeaningApproval,
    Neutral,
    LeaningDisapproval,
    SolidDisapproval,
}

impl EntityStatus {
    pub fn ordered() -> [Self; 5] {
        [
            Self::SolidApproval,
            Self::LeaningApproval,
            Self::Neutral,
            Self::LeaningDisapproval,
            Self::SolidDisapproval,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SolidApproval => "Solid approval",
            Self::LeaningApproval => "Leaning approval",
            Self::Neutral => "Neutral",
            Self::LeaningDisapproval => "Leaning disapproval",
            Self::SolidDisapproval => "Solid disapproval",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Active,
    Completed,
    Archived,
}

/// Advocacy initiative tracked against a jurisdiction's officials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub jurisdiction_id: JurisdictionId,
    pub preferred_status: EntityStatus,
    #[serde(default)]
    pub status: ProjectStatus,
}

/// One entity's recorded position on one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: StatusRecordId,
    pub entity_id: EntityId,
    pub project_id: ProjectId,
    pub status: EntityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl StatusRecord {
    /// Ordering used to pick the current record: latest `updated_at`, then greatest id.
    pub fn recency_cmp(&self, other: &Self) -> Ordering {
        self.updated_at
            .cmp(&other.updated_at)
            .then_with(|| self.id.cmp(&other.id))
    }

    pub fn supersedes(&self, other: &Self) -> bool {
        self.recency_cmp(other) == Ordering::Greater
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: &str, hour: u32) -> StatusRecord {
        StatusRecord {
            id: StatusRecordId::new(id),
            entity_id: EntityId::new("ald-05"),
            project_id: ProjectId::new("zoning-reform"),
            status: EntityStatus::Neutral,
            notes: None,
            updated_at: Utc
                .with_ymd_and_hms(2025, 3, 1, hour, 0, 0)
                .single()
                .expect("valid timestamp"),
            updated_by: "editor".to_string(),
        }
    }

    #[test]
    fn later_update_supersedes_earlier() {
        let earlier = record("rec-2", 9);
        let later = record("rec-1", 10);
        assert!(later.supersedes(&earlier));
        assert!(!earlier.supersedes(&later));
    }

    #[test]
    fn identical_timestamps_fall_back_to_record_id() {
        let first = record("rec-1", 9);
        let second = record("rec-2", 9);
        assert!(second.supersedes(&first));
        assert!(!first.supersedes(&first));
    }

    #[test]
    fn statuses_serialize_in_snake_case() {
        let value = serde_json::to_value(EntityStatus::LeaningDisapproval).expect("serialize");
        assert_eq!(value, serde_json::json!("leaning_disapproval"));
        assert_eq!(EntityStatus::ordered()[0], EntityStatus::SolidApproval);
    }

    #[test]
    fn identifiers_serialize_as_plain_strings() {
        let value = serde_json::to_value(DistrictId::new("ward-05")).expect("serialize");
        assert_eq!(value, serde_json::json!("ward-05"));
    }
}
