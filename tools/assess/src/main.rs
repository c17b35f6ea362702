/// Parcel compliance assessment CLI: reads an assessment payload (GeoJSON
/// site boundary + options), runs slope and runout classification against
/// the resolved DEM and prints the report as JSON.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use hazard_core::assessor::AssessmentMode;
use hazard_core::config::DemSourceMode;
use hazard_core::hybrid::{FixedHybridModel, HybridModel, UnavailableHybridModel};
use hazard_core::{AssessmentConfig, AssessmentPayload, AssessmentReport, Assessor};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "assess", about = "Geotechnical compliance assessment of land parcels")]
#[command(group(ArgGroup::new("input").required(true).args(["payload", "batch"])))]
struct Args {
    /// Assessment payload JSON ({project_id, geometry, config}).
    #[arg(short, long)]
    payload: Option<PathBuf>,

    /// Directory of payload JSON files to assess in one run.
    #[arg(long)]
    batch: Option<PathBuf>,

    /// Assessment config JSON (DEM sources, search buffer).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// DEM to use directly (GeoTIFF or serialised RasterWindow JSON).
    /// Overrides the configured sources.
    #[arg(short, long)]
    dem: Option<PathBuf>,

    /// Vicinity search radius in metres.
    #[arg(long)]
    buffer: Option<f64>,

    /// Force research mode (phase 2 hybrid model) for every payload.
    #[arg(long)]
    research: bool,

    /// Disable the phase 2 hybrid model even in research mode.
    #[arg(long)]
    no_hybrid: bool,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,
}

fn read_payload(path: &Path) -> Result<AssessmentPayload> {
    let text = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse payload {}", path.display()))
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

/// Report or failure for one payload file in batch mode.
#[derive(Serialize)]
#[serde(untagged)]
enum BatchEntry {
    Report(Box<AssessmentReport>),
    Failed { file: String, error: String },
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AssessmentConfig::load(path)?,
        None => AssessmentConfig::default(),
    };
    if let Some(buffer) = args.buffer {
        config.search_buffer_meters = buffer;
    }
    if let Some(dem) = &args.dem {
        config.dem_source = DemSourceMode::LocalOverride;
        config.local_dem_path = Some(dem.clone());
    }
    config.validate()?;

    let hybrid: Box<dyn HybridModel> = if args.no_hybrid {
        Box::new(UnavailableHybridModel)
    } else {
        Box::new(FixedHybridModel::default())
    };
    let assessor = Assessor::new(config, hybrid);

    let prepare = |mut p: AssessmentPayload| {
        if args.research {
            p.config.mode = AssessmentMode::Research;
        }
        p
    };

    if let Some(path) = &args.payload {
        let payload = prepare(read_payload(path)?);
        let report = assessor.run(&payload)?;
        return emit(&report, args.pretty);
    }

    let Some(dir) = &args.batch else {
        anyhow::bail!("either --payload or --batch is required");
    };

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Cannot read {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    files.sort();
    log::info!("[assess] {} payloads in {}", files.len(), dir.display());

    let mut entries = Vec::with_capacity(files.len());
    let mut payloads = Vec::with_capacity(files.len());
    let mut names = Vec::with_capacity(files.len());
    for file in &files {
        match read_payload(file) {
            Ok(p) => {
                payloads.push(prepare(p));
                names.push(file.display().to_string());
            }
            Err(e) => {
                log::warn!("Skipping {} ({e:#})", file.display());
                entries.push(BatchEntry::Failed {
                    file: file.display().to_string(),
                    error: format!("{e:#}"),
                });
            }
        }
    }

    for (name, result) in names.into_iter().zip(assessor.run_batch(&payloads)) {
        entries.push(match result {
            Ok(report) => BatchEntry::Report(Box::new(report)),
            Err(e) => BatchEntry::Failed {
                file: name,
                error: format!("{e:#}"),
            },
        });
    }

    emit(&entries, args.pretty)
}
