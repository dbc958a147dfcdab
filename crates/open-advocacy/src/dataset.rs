//! JSON dataset snapshots and the built-in Chicago demo data.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    ContactInfo, District, DistrictId, Entity, EntityId, EntityStatus, Jurisdiction,
    JurisdictionId, JurisdictionLevel, Project, ProjectId, ProjectStatus, StatusRecord,
    StatusRecordId,
};
use crate::geometry::{BoundaryGeometry, GeoPoint};
use crate::lookup::StaticGeocoder;
use crate::store::{InMemoryStore, IngestError};

pub const DEMO_COUNCIL: &str = "chicago-city-council";
pub const DEMO_CITY: &str = "city-of-chicago";
pub const DEMO_PROJECT: &str = "zoning-reform-abc";
pub const DEMO_ADDRESS: &str = "5801 S Ellis Ave, Chicago, IL 60637";

const WARD_COLUMNS: u32 = 10;
const WARD_ROWS: u32 = 5;
const WEST: f64 = -87.94;
const SOUTH: f64 = 41.64;
const COLUMN_WIDTH: f64 = 0.042;
const ROW_HEIGHT: f64 = 0.076;

/// A district and, optionally, its GeoJSON-shaped boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictSeed {
    #[serde(flatten)]
    pub district: District,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryGeometry>,
}

/// Everything needed to seed an [`InMemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub jurisdictions: Vec<Jurisdiction>,
    #[serde(default)]
    pub districts: Vec<DistrictSeed>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub status_records: Vec<StatusRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("unable to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset rejected: {0}")]
    Ingest(#[from] IngestError),
}

impl Dataset {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Loads in dependency order so every foreign key is checked on the way in.
    pub fn load_into(self, store: &InMemoryStore) -> Result<(), DatasetError> {
        let counts = (
            self.jurisdictions.len(),
            self.districts.len(),
            self.entities.len(),
            self.projects.len(),
            self.status_records.len(),
        );

        for jurisdiction in self.jurisdictions {
            store.insert_jurisdiction(jurisdiction)?;
        }
        for seed in self.districts {
            store.insert_district(seed.district, seed.boundary)?;
        }
        for entity in self.entities {
            store.insert_entity(entity)?;
        }
        for project in self.projects {
            store.insert_project(project)?;
        }
        for record in self.status_records {
            store.record_status(record)?;
        }

        info!(
            jurisdictions = counts.0,
            districts = counts.1,
            entities = counts.2,
            projects = counts.3,
            status_records = counts.4,
            "dataset loaded"
        );
        Ok(())
    }

    pub fn into_store(self) -> Result<InMemoryStore, DatasetError> {
        let store = InMemoryStore::new();
        self.load_into(&store)?;
        Ok(store)
    }

    /// Chicago demo: a 50-ward council laid out as a grid, citywide at-large officials,
    /// and two projects with recorded positions.
    pub fn demo() -> Self {
        let council = JurisdictionId::new(DEMO_COUNCIL);
        let city = JurisdictionId::new(DEMO_CITY);

        let jurisdictions = vec![
            Jurisdiction {
                id: council.clone(),
                name: "Chicago City Council".to_string(),
                level: JurisdictionLevel::City,
                description: Some("Legislative body of the City of Chicago".to_string()),
            },
            Jurisdiction {
                id: city.clone(),
                name: "City of Chicago".to_string(),
                level: JurisdictionLevel::City,
                description: Some("Citywide elected offices".to_string()),
            },
        ];

        let mut districts: Vec<DistrictSeed> = (1..=WARD_COLUMNS * WARD_ROWS)
            .map(|ward| DistrictSeed {
                district: District {
                    id: ward_id(ward),
                    jurisdiction_id: council.clone(),
                    name: format!("Ward {ward}"),
                    code: Some(ward.to_string()),
                },
                boundary: Some(ward_boundary(ward)),
            })
            .collect();
        districts.push(DistrictSeed {
            district: District {
                id: DistrictId::new("chicago-citywide"),
                jurisdiction_id: city.clone(),
                name: "Citywide".to_string(),
                code: None,
            },
            boundary: Some(rectangle(
                WEST,
                SOUTH,
                cell_edge(WEST, COLUMN_WIDTH, WARD_COLUMNS),
                cell_edge(SOUTH, ROW_HEIGHT, WARD_ROWS),
            )),
        });

        let mut entities: Vec<Entity> = (1..=WARD_COLUMNS * WARD_ROWS)
            .map(|ward| Entity {
                id: alderperson_id(ward),
                name: if ward == 5 {
                    "Jane Doe".to_string()
                } else {
                    format!("Ward {ward} Alderperson")
                },
                title: Some(format!("Alderperson, Ward {ward}")),
                entity_type: "alderperson".to_string(),
                jurisdiction_id: council.clone(),
                district_id: Some(ward_id(ward)),
                contact: ContactInfo {
                    email: Some(format!("ward{ward:02}@cityofchicago.org")),
                    phone: None,
                    website: Some(format!("https://www.chicago.gov/city/en/about/wards/{ward:02}.html")),
                    address: Some("121 N LaSalle St, Chicago, IL 60602".to_string()),
                },
            })
            .collect();
        entities.push(at_large(&city, "chicago-mayor", "Alex Rivera", "Mayor"));
        entities.push(at_large(&city, "chicago-clerk", "Sam Patel", "City Clerk"));

        let projects = vec![
            Project {
                id: ProjectId::new(DEMO_PROJECT),
                title: "Zoning Reform ABC".to_string(),
                description: Some("Legalize accessory dwelling units citywide".to_string()),
                jurisdiction_id: council.clone(),
                preferred_status: EntityStatus::SolidApproval,
                status: ProjectStatus::Active,
            },
            Project {
                id: ProjectId::new("transit-equity"),
                title: "Transit Equity Ordinance".to_string(),
                description: None,
                jurisdiction_id: council,
                preferred_status: EntityStatus::SolidApproval,
                status: ProjectStatus::Active,
            },
        ];

        let status_records = vec![
            position("rec-001", 5, DEMO_PROJECT, EntityStatus::SolidApproval, 3),
            position("rec-002", 12, DEMO_PROJECT, EntityStatus::SolidApproval, 4),
            position("rec-003", 33, DEMO_PROJECT, EntityStatus::SolidApproval, 6),
            position("rec-004", 5, "transit-equity", EntityStatus::SolidDisapproval, 1),
            position("rec-005", 5, "transit-equity", EntityStatus::Neutral, 9),
            position("rec-006", 7, "transit-equity", EntityStatus::LeaningDisapproval, 2),
            position("rec-007", 41, "transit-equity", EntityStatus::LeaningApproval, 2),
        ];

        Self {
            jurisdictions,
            districts,
            entities,
            projects,
            status_records,
        }
    }
}

/// Addresses the demo geocoder knows, each placed inside a ward of the demo grid.
pub fn demo_addresses() -> Vec<(&'static str, GeoPoint)> {
    [
        (DEMO_ADDRESS, 5),
        ("121 N LaSalle St, Chicago, IL 60602", 42),
        ("1060 W Addison St, Chicago, IL 60613", 44),
        ("2430 N Cannon Dr, Chicago, IL 60614", 43),
    ]
    .into_iter()
    .filter_map(|(address, ward)| ward_center(ward).map(|point| (address, point)))
    .chain(
        GeoPoint::new(38.8977, -77.0365)
            .ok()
            .map(|point| ("1600 Pennsylvania Ave NW, Washington, DC 20500", point)),
    )
    .collect()
}

/// Static geocoder preloaded with [`demo_addresses`].
pub fn demo_geocoder() -> StaticGeocoder {
    demo_addresses()
        .into_iter()
        .fold(StaticGeocoder::new(), |geocoder, (address, point)| {
            geocoder.with_entry(address, point)
        })
}

fn ward_id(ward: u32) -> DistrictId {
    DistrictId::new(format!("chicago-ward-{ward:02}"))
}

fn alderperson_id(ward: u32) -> EntityId {
    EntityId::new(format!("chicago-ald-{ward:02}"))
}

fn cell_edge(origin: f64, step: f64, index: u32) -> f64 {
    origin + step * f64::from(index)
}

fn ward_cell(ward: u32) -> (u32, u32) {
    let index = ward - 1;
    (index / WARD_COLUMNS, index % WARD_COLUMNS)
}

fn ward_boundary(ward: u32) -> BoundaryGeometry {
    let (row, column) = ward_cell(ward);
    rectangle(
        cell_edge(WEST, COLUMN_WIDTH, column),
        cell_edge(SOUTH, ROW_HEIGHT, row),
        cell_edge(WEST, COLUMN_WIDTH, column + 1),
        cell_edge(SOUTH, ROW_HEIGHT, row + 1),
    )
}

fn ward_center(ward: u32) -> Option<GeoPoint> {
    let (row, column) = ward_cell(ward);
    let longitude = cell_edge(WEST, COLUMN_WIDTH, column) + COLUMN_WIDTH / 2.0;
    let latitude = cell_edge(SOUTH, ROW_HEIGHT, row) + ROW_HEIGHT / 2.0;
    GeoPoint::new(latitude, longitude).ok()
}

fn rectangle(west: f64, south: f64, east: f64, north: f64) -> BoundaryGeometry {
    BoundaryGeometry::Polygon(vec![vec![
        [west, south],
        [east, south],
        [east, north],
        [west, north],
        [west, south],
    ]])
}

fn at_large(jurisdiction: &JurisdictionId, id: &str, name: &str, title: &str) -> Entity {
    Entity {
        id: EntityId::new(id),
        name: name.to_string(),
        title: Some(title.to_string()),
        entity_type: "citywide_official".to_string(),
        jurisdiction_id: jurisdiction.clone(),
        district_id: None,
        contact: ContactInfo {
            address: Some("121 N LaSalle St, Chicago, IL 60602".to_string()),
            ..ContactInfo::default()
        },
    }
}

fn position(id: &str, ward: u32, project: &str, status: EntityStatus, day: u32) -> StatusRecord {
    StatusRecord {
        id: StatusRecordId::new(id),
        entity_id: alderperson_id(ward),
        project_id: ProjectId::new(project),
        status,
        notes: None,
        updated_at: demo_timestamp(day),
        updated_by: "demo-editor".to_string(),
    }
}

fn demo_timestamp(day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .and_then(|date| date.and_hms_opt(15, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}
