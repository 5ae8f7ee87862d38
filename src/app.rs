//! Build and export orchestration.
//!
//! A build loads the reference targets, ingests the combined gene table and
//! then runs every configured annotation adapter in a fixed order, so two
//! builds from the same inputs produce the same snapshot. Adapters whose
//! mapping file is not configured are skipped with a log line; the
//! header-only adapters always run.

use camino::Utf8Path;
use serde::Serialize;
use tracing::info;

use crate::config::ResolvedConfig;
use crate::databases;
use crate::databases::panres::IngestStats;
use crate::domain::ExportColumn;
use crate::error::PanResError;
use crate::export::{Snapshot, write_csv, write_turtle};
use crate::model::KnowledgeBase;
use crate::report::AdapterReport;
use crate::targets;

#[derive(Debug, Serialize)]
pub struct BuildSummary {
    pub built_at: String,
    pub ingest: IngestStats,
    pub taxonomy_nodes: usize,
    pub pruned_nodes: usize,
    pub reports: Vec<AdapterReport>,
}

impl BuildSummary {
    pub fn failure_count(&self) -> usize {
        self.reports.iter().map(AdapterReport::failure_count).sum()
    }
}

pub fn build(
    config: &ResolvedConfig,
    snapshot_path: &Utf8Path,
    turtle_path: Option<&Utf8Path>,
) -> Result<BuildSummary, PanResError> {
    let mut kb = KnowledgeBase::new();

    info!("Loading reference targets from {}", config.targets);
    targets::load_targets(&mut kb.taxonomy, &config.targets)?;
    info!("Loaded {} target nodes.", kb.taxonomy.len());

    info!("Ingesting combined gene table from {}", config.panres);
    let ingest = databases::panres::ingest(&mut kb, &config.panres)?;
    info!(
        "Ingested {} genes with {} original gene variants.",
        ingest.genes, ingest.original_genes
    );

    let mut reports = Vec::new();
    match &config.resfinder {
        Some(path) => reports.push(databases::resfinder::annotate(&mut kb, path)?),
        None => info!("ResFinder mapping file not configured, skipping."),
    }
    match &config.card {
        Some(path) => reports.push(databases::card::annotate(&mut kb, path)?),
        None => info!("CARD mapping file not configured, skipping."),
    }
    match &config.amrfinderplus {
        Some(path) => reports.push(databases::amrfinderplus::annotate(&mut kb, path)?),
        None => info!("AMRFinderPlus mapping file not configured, skipping."),
    }
    reports.push(databases::megares::annotate(&mut kb)?);
    reports.push(databases::argannot::annotate(&mut kb)?);
    reports.push(databases::resfinderfg::annotate(
        &mut kb,
        config.resfinderfg_acronyms.as_deref(),
    )?);
    match &config.bacmet {
        Some(path) => reports.push(databases::bacmet::annotate(&mut kb, path)?),
        None => info!("BacMet mapping file not configured, skipping."),
    }
    reports.push(databases::metalres::annotate(&mut kb)?);
    match &config.csabapal {
        Some(path) => reports.push(databases::csabapal::annotate(&mut kb, path)?),
        None => info!("CsabaPal mapping file not configured, skipping."),
    }

    let pruned_nodes = if config.prune {
        let removed = kb.prune_unreferenced();
        info!("Pruned {removed} unreferenced target nodes.");
        removed
    } else {
        0
    };

    let summary = BuildSummary {
        built_at: iso_timestamp(),
        ingest,
        taxonomy_nodes: kb.taxonomy.len(),
        pruned_nodes,
        reports,
    };

    if let Some(turtle_path) = turtle_path {
        write_turtle(&kb, turtle_path)?;
        info!("Wrote knowledge base as Turtle to {turtle_path}");
    }

    let snapshot = Snapshot::new(kb, summary.built_at.clone());
    snapshot.save(snapshot_path)?;
    info!("Wrote knowledge base snapshot to {snapshot_path}");

    Ok(summary)
}

pub fn export_csv(
    snapshot_path: &Utf8Path,
    output: &Utf8Path,
    columns: &[ExportColumn],
) -> Result<usize, PanResError> {
    let snapshot = Snapshot::load(snapshot_path)?;
    let written = write_csv(&snapshot.knowledge_base, columns, output)?;
    info!("Wrote {written} gene rows to {output}");
    Ok(written)
}

pub fn export_turtle(snapshot_path: &Utf8Path, output: &Utf8Path) -> Result<(), PanResError> {
    let snapshot = Snapshot::load(snapshot_path)?;
    write_turtle(&snapshot.knowledge_base, output)?;
    info!("Wrote knowledge base as Turtle to {output}");
    Ok(())
}

/// Default column set for the flattened CSV export.
pub fn default_export_columns() -> Vec<ExportColumn> {
    vec![
        ExportColumn::Name,
        ExportColumn::Accession,
        ExportColumn::PredictedPhenotype,
        ExportColumn::ResistanceClass,
        ExportColumn::Database,
        ExportColumn::SameAs,
    ]
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
