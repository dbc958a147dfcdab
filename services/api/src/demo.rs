use crate::infra::{build_service, load_store};
use clap::Args;
use open_advocacy::config::{AppConfig, GeocoderConfig};
use open_advocacy::dataset::{demo_geocoder, Dataset, DEMO_ADDRESS, DEMO_PROJECT};
use open_advocacy::domain::{EntityId, EntityStatus, JurisdictionId, ProjectId};
use open_advocacy::error::AppError;
use open_advocacy::lookup::Representation;
use open_advocacy::status::StatusDistribution;
use open_advocacy::{AdvocacyService, ProjectDistribution};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct LookupArgs {
    /// Street address to resolve
    #[arg(long)]
    pub(crate) address: String,
    /// Restrict the search to one jurisdiction id
    #[arg(long)]
    pub(crate) jurisdiction: Option<String>,
    /// JSON dataset snapshot (defaults to APP_DATASET_PATH, then the demo data)
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct DistributionArgs {
    /// Project id
    #[arg(long)]
    pub(crate) project: String,
    /// Limit the scope to these entity ids (repeatable); defaults to the whole jurisdiction
    #[arg(long = "entity")]
    pub(crate) entities: Vec<String>,
    /// JSON dataset snapshot (defaults to APP_DATASET_PATH, then the demo data)
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
}

pub(crate) async fn run_lookup(args: LookupArgs) -> Result<(), AppError> {
    let LookupArgs {
        address,
        jurisdiction,
        dataset,
    } = args;

    let config = AppConfig::load()?;
    let store = load_store(dataset.as_deref().or(config.dataset_path.as_deref()))?;
    let service = build_service(&config, store)?;

    let jurisdiction = jurisdiction.map(JurisdictionId::new);
    let representation = service.lookup(&address, jurisdiction.as_ref()).await?;
    render_representation(&representation);
    Ok(())
}

pub(crate) fn run_distribution(args: DistributionArgs) -> Result<(), AppError> {
    let DistributionArgs {
        project,
        entities,
        dataset,
    } = args;

    let config = AppConfig::load()?;
    let store = load_store(dataset.as_deref().or(config.dataset_path.as_deref()))?;
    let service = build_service(&config, store)?;

    let project = ProjectId::new(project);
    let result = if entities.is_empty() {
        service.jurisdiction_distribution(&project)?
    } else {
        let scope = entities.into_iter().map(EntityId::new).collect();
        service.scoped_distribution(&project, scope)?
    };
    render_project_distribution(&result);
    Ok(())
}

pub(crate) async fn run_demo() -> Result<(), AppError> {
    let store = Arc::new(Dataset::demo().into_store()?);
    let geocoder = GeocoderConfig::offline();
    let service = AdvocacyService::new(store, Arc::new(demo_geocoder()))
        .with_geocode_timeout(geocoder.timeout);

    println!("Open advocacy demo (offline geocoder, Chicago demo data)");
    println!("\nStep 1: who represents {DEMO_ADDRESS}?");
    let representation = service.lookup(DEMO_ADDRESS, None).await?;
    render_representation(&representation);

    let project = ProjectId::new(DEMO_PROJECT);
    println!("\nStep 2: where does the whole council stand?");
    let council = service.jurisdiction_distribution(&project)?;
    render_project_distribution(&council);

    println!("\nStep 3: where do my representatives stand?");
    let mine: Vec<EntityId> = representation
        .entities
        .iter()
        .map(|representative| representative.entity.id.clone())
        .collect();
    let personal = service.scoped_distribution(&project, mine)?;
    render_project_distribution(&personal);

    println!("\nStep 4: an address nobody can find");
    match service.lookup("742 Evergreen Terrace, Springfield", None).await {
        Ok(_) => println!("  Unexpectedly resolved"),
        Err(err) => println!("  Lookup rejected: {}", err),
    }

    Ok(())
}

fn render_representation(representation: &Representation) {
    println!(
        "- {} -> ({:.5}, {:.5})",
        representation.address,
        representation.coordinates.latitude,
        representation.coordinates.longitude
    );
    if representation.districts.is_empty() {
        println!("  No districts cover this location");
        return;
    }

    let districts: Vec<&str> = representation
        .districts
        .iter()
        .map(|district| district.name.as_str())
        .collect();
    println!("  Districts: {}", districts.join(", "));

    for group in &representation.jurisdictions {
        let level = group.level.map(|level| level.label()).unwrap_or("Unknown");
        println!("  {} ({})", group.name, level);
        for representative in &group.entities {
            let title = representative.entity.title.as_deref().unwrap_or("Official");
            match representative.district_name() {
                Some(district) => println!(
                    "    - {} | {} | {}",
                    representative.entity.name, title, district
                ),
                None => println!("    - {} | {} | at-large", representative.entity.name, title),
            }
        }
    }

    if !representation.ambiguous_jurisdictions.is_empty() {
        let ids: Vec<&str> = representation
            .ambiguous_jurisdictions
            .iter()
            .map(|id| id.as_str())
            .collect();
        println!("  Overlapping districts matched in: {}", ids.join(", "));
    }
}

fn render_project_distribution(result: &ProjectDistribution) {
    println!(
        "- {} ({} scope, {} entities)",
        result.project.title, result.scope, result.distribution.total
    );
    render_distribution(&result.distribution);

    if let Some(positions) = &result.positions {
        println!("  Positions:");
        for position in positions {
            let status = position.status.map(EntityStatus::label).unwrap_or("Unknown");
            println!("    - {}: {}", position.entity_name, status);
        }
    }
}

fn render_distribution(distribution: &StatusDistribution) {
    for status in EntityStatus::ordered() {
        println!("  {:<20} {}", status.label(), distribution.count(status));
    }
    println!("  {:<20} {}", "Unknown", distribution.unknown);
}
