//! Main application entry point

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gv_core::{ColumnSelection, ParseOutcome, VisualizationStore};
use gv_data::{DelimitedParser, TextSource};
use gv_map::{sync_all, LayerHandle, MapFacade, RecordingSurface, SurfaceOp, SyncReport};

mod config;

use config::{AppConfig, Args};

/// What ended up on the map
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    source: &'a str,
    rows: usize,
    columns: Vec<String>,
    selection: ColumnSelection,
    sync: SyncReport,
    base_tile: &'a str,
    layers: Vec<LayerSummary<'a>>,
    ops: &'a [SurfaceOp],
}

#[derive(Debug, Serialize)]
struct LayerSummary<'a> {
    handle: LayerHandle,
    kind: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = AppConfig::resolve(&args)?;

    let source = TextSource::load(args.input.clone())
        .await
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    info!("Loaded {} ({} bytes)", source.source_name(), source.text().len());

    let parser = Arc::new(DelimitedParser::new(config.parse.clone()));
    let store = VisualizationStore::with_config(parser, config.visualization.clone())
        .context("Invalid visualization settings")?;

    match store.update_content_async(source.text()).await.context("Failed to parse input")? {
        ParseOutcome::Committed { rows, columns, .. } => info!("Parsed {} rows, {} columns", rows, columns),
        ParseOutcome::Superseded { generation, latest } => {
            warn!("Parse #{} superseded by #{}", generation, latest)
        }
    }

    let mut map = MapFacade::new(RecordingSurface::new(), config.map.clone())?;
    let report = sync_all(&store, &mut map)?;
    if !report.heat_mounted {
        warn!("No heat layer mounted; check the latitude/longitude column selection");
    }

    let layers = map
        .surface()
        .mounted_layers()
        .iter()
        .map(|(handle, shape)| LayerSummary { handle: *handle, kind: shape.kind() })
        .collect();

    let summary = Summary {
        source: source.source_name(),
        rows: store.dataset().len(),
        columns: store.get_columns(),
        selection: store.selection(),
        sync: report,
        base_tile: map.base_tile_url(),
        layers,
        ops: map.surface().ops(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
